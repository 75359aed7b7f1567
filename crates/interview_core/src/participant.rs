//! crates/interview_core/src/participant.rs
//!
//! The state machine behind one live interview-taking session.
//!
//! The controller is pure: it consumes user actions and `VoiceEvent`s and
//! reports what changed. Talking to the provider and persisting the result is
//! left to whoever drives it.

use serde::Serialize;

use crate::domain::{join_transcript, Speaker, TranscriptEntry};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::VoiceEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Idle,
    Connecting,
    Connected,
    Speaking,
    Listening,
    Processing,
    Completed,
    Error,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Idle => "idle",
            ParticipantStatus::Connecting => "connecting",
            ParticipantStatus::Connected => "connected",
            ParticipantStatus::Speaking => "speaking",
            ParticipantStatus::Listening => "listening",
            ParticipantStatus::Processing => "processing",
            ParticipantStatus::Completed => "completed",
            ParticipantStatus::Error => "error",
        }
    }

    /// A voice session is (or is about to be) open.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ParticipantStatus::Connecting
                | ParticipantStatus::Connected
                | ParticipantStatus::Speaking
                | ParticipantStatus::Listening
                | ParticipantStatus::Processing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicrophonePermission {
    Granted,
    Denied,
}

/// What applying a voice event did to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The event does not apply in the current state.
    Ignored,
    Status(ParticipantStatus),
    Entry(ParticipantStatus, TranscriptEntry),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ParticipantController {
    status: ParticipantStatus,
    transcript: Vec<TranscriptEntry>,
    microphone_enabled: bool,
    audio_enabled: bool,
    started: bool,
}

impl Default for ParticipantController {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticipantController {
    pub fn new() -> Self {
        Self {
            status: ParticipantStatus::Idle,
            transcript: Vec::new(),
            microphone_enabled: false,
            audio_enabled: true,
            started: false,
        }
    }

    pub fn status(&self) -> ParticipantStatus {
        self.status
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn microphone_enabled(&self) -> bool {
        self.microphone_enabled
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    fn reject(&self, action: &'static str) -> ServiceError {
        ServiceError::InvalidSessionState {
            state: self.status.as_str(),
            action,
        }
    }

    /// The "start" action. Only valid from `idle` or `error`; every accepted
    /// start begins a fresh session with an empty transcript.
    pub fn begin(&mut self, permission: MicrophonePermission) -> ServiceResult<()> {
        match self.status {
            ParticipantStatus::Idle | ParticipantStatus::Error => {}
            _ => return Err(self.reject("start")),
        }
        if permission == MicrophonePermission::Denied {
            self.status = ParticipantStatus::Idle;
            return Err(ServiceError::PermissionDenied);
        }
        self.transcript.clear();
        self.started = false;
        self.microphone_enabled = false;
        self.status = ParticipantStatus::Connecting;
        Ok(())
    }

    /// Records the agent's opening line once the provider accepted the session.
    pub fn session_opened(&mut self, opening_line: &str) -> TranscriptEntry {
        self.started = true;
        self.microphone_enabled = true;
        self.push(Speaker::Ai, opening_line)
    }

    /// The provider refused or dropped the session outside the event stream.
    pub fn fail(&mut self) {
        self.status = ParticipantStatus::Error;
        self.microphone_enabled = false;
    }

    fn push(&mut self, speaker: Speaker, text: &str) -> TranscriptEntry {
        let entry = TranscriptEntry::new(speaker, text);
        self.transcript.push(entry.clone());
        entry
    }

    pub fn apply(&mut self, event: VoiceEvent) -> Effect {
        if matches!(
            self.status,
            ParticipantStatus::Completed | ParticipantStatus::Error
        ) {
            return Effect::Ignored;
        }
        if self.status == ParticipantStatus::Idle && event != VoiceEvent::Connected {
            return Effect::Ignored;
        }
        match event {
            VoiceEvent::Connected => {
                self.status = ParticipantStatus::Connected;
                Effect::Status(self.status)
            }
            VoiceEvent::Disconnected => {
                self.status = ParticipantStatus::Idle;
                Effect::Status(self.status)
            }
            VoiceEvent::AgentMessage(text) => {
                self.status = ParticipantStatus::Speaking;
                Effect::Entry(self.status, self.push(Speaker::Ai, &text))
            }
            VoiceEvent::UserMessage(text) => {
                self.status = ParticipantStatus::Listening;
                Effect::Entry(self.status, self.push(Speaker::Candidate, &text))
            }
            VoiceEvent::Thinking => {
                self.status = ParticipantStatus::Processing;
                Effect::Status(self.status)
            }
            VoiceEvent::Error(reason) => {
                self.fail();
                Effect::Failed(reason)
            }
        }
    }

    pub fn toggle_microphone(&mut self) -> bool {
        self.microphone_enabled = !self.microphone_enabled;
        self.microphone_enabled
    }

    pub fn toggle_audio(&mut self) -> bool {
        self.audio_enabled = !self.audio_enabled;
        self.audio_enabled
    }

    /// Moves to `completed` and returns the joined transcript.
    pub fn complete(&mut self) -> ServiceResult<String> {
        if !self.started || matches!(
            self.status,
            ParticipantStatus::Completed | ParticipantStatus::Error
        ) {
            return Err(self.reject("complete"));
        }
        self.status = ParticipantStatus::Completed;
        self.microphone_enabled = false;
        Ok(join_transcript(&self.transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live() -> ParticipantController {
        let mut controller = ParticipantController::new();
        controller.begin(MicrophonePermission::Granted).unwrap();
        controller.session_opened("Hello Jane");
        controller
    }

    #[test]
    fn denied_microphone_returns_to_idle() {
        let mut controller = ParticipantController::new();
        let result = controller.begin(MicrophonePermission::Denied);
        assert!(matches!(result, Err(ServiceError::PermissionDenied)));
        assert_eq!(controller.status(), ParticipantStatus::Idle);
        assert!(controller.transcript().is_empty());
    }

    #[test]
    fn start_records_opening_line() {
        let controller = live();
        assert_eq!(controller.status(), ParticipantStatus::Connecting);
        assert_eq!(controller.transcript(), &[TranscriptEntry::new(Speaker::Ai, "Hello Jane")]);
        assert!(controller.microphone_enabled());
    }

    #[test]
    fn events_drive_status_and_transcript() {
        let mut controller = live();
        assert_eq!(
            controller.apply(VoiceEvent::Connected),
            Effect::Status(ParticipantStatus::Connected)
        );
        assert_eq!(
            controller.apply(VoiceEvent::AgentMessage("Tell me about yourself".into())),
            Effect::Entry(
                ParticipantStatus::Speaking,
                TranscriptEntry::new(Speaker::Ai, "Tell me about yourself")
            )
        );
        controller.apply(VoiceEvent::Thinking);
        assert_eq!(controller.status(), ParticipantStatus::Processing);
        controller.apply(VoiceEvent::UserMessage("I build APIs".into()));
        assert_eq!(controller.status(), ParticipantStatus::Listening);
        assert_eq!(controller.transcript().len(), 3);
        assert_eq!(controller.transcript()[2].speaker, Speaker::Candidate);
    }

    #[test]
    fn toggles_do_not_change_status() {
        let mut controller = live();
        controller.apply(VoiceEvent::Connected);
        assert!(!controller.toggle_microphone());
        assert!(!controller.toggle_audio());
        assert!(controller.toggle_audio());
        assert_eq!(controller.status(), ParticipantStatus::Connected);
    }

    #[test]
    fn error_is_terminal_until_restart() {
        let mut controller = live();
        assert_eq!(
            controller.apply(VoiceEvent::Error("socket closed".into())),
            Effect::Failed("socket closed".into())
        );
        assert_eq!(controller.status(), ParticipantStatus::Error);
        assert_eq!(controller.apply(VoiceEvent::AgentMessage("late".into())), Effect::Ignored);
        assert!(controller.complete().is_err());

        controller.begin(MicrophonePermission::Granted).unwrap();
        assert_eq!(controller.status(), ParticipantStatus::Connecting);
        assert!(controller.transcript().is_empty());
    }

    #[test]
    fn restart_after_error_and_denial_drops_old_session() {
        let mut controller = live();
        controller.apply(VoiceEvent::AgentMessage("old question".into()));
        controller.apply(VoiceEvent::Error("dropped".into()));

        assert!(matches!(
            controller.begin(MicrophonePermission::Denied),
            Err(ServiceError::PermissionDenied)
        ));
        assert_eq!(controller.status(), ParticipantStatus::Idle);

        controller.begin(MicrophonePermission::Granted).unwrap();
        assert!(controller.transcript().is_empty());
        assert!(!controller.has_started());
        assert!(controller.complete().is_err());

        controller.session_opened("Hello");
        assert_eq!(controller.complete().unwrap(), "AI: Hello");
    }

    #[test]
    fn restart_after_disconnect_starts_clean() {
        let mut controller = live();
        controller.apply(VoiceEvent::Connected);
        controller.apply(VoiceEvent::Disconnected);
        assert_eq!(controller.status(), ParticipantStatus::Idle);

        controller.begin(MicrophonePermission::Granted).unwrap();
        controller.session_opened("Hello again");
        assert_eq!(controller.complete().unwrap(), "AI: Hello again");
    }

    #[test]
    fn complete_joins_transcript_once() {
        let mut controller = live();
        controller.apply(VoiceEvent::AgentMessage("Question one".into()));
        let joined = controller.complete().unwrap();
        assert_eq!(joined, "AI: Hello Jane\nAI: Question one");
        assert_eq!(controller.status(), ParticipantStatus::Completed);
        assert!(controller.complete().is_err());
        assert_eq!(controller.apply(VoiceEvent::Disconnected), Effect::Ignored);
    }

    #[test]
    fn cannot_complete_before_start() {
        let mut controller = ParticipantController::new();
        assert!(matches!(
            controller.complete(),
            Err(ServiceError::InvalidSessionState { action: "complete", .. })
        ));
    }
}
