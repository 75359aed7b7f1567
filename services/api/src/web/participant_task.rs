//! services/api/src/web/participant_task.rs
//!
//! This module contains the asynchronous "worker" that drives one participant
//! session: it feeds candidate actions and voice-provider events into the
//! `ParticipantController`, enforces the forced-completion deadline, and writes
//! the finished interview back through the repository.

use crate::stores::InterviewRepository;
use crate::web::protocol::ServerMessage;
use futures::StreamExt;
use interview_core::domain::{CompletionRecord, Interview, InterviewStatus};
use interview_core::participant::{Effect, MicrophonePermission, ParticipantController, ParticipantStatus};
use interview_core::ports::{
    SessionHandle, VoiceAgentService, VoiceEvent, VoiceEventStream, VoiceSessionConfig,
};
use interview_core::prompts::{build_opening_line, build_prompt, map_language};
use interview_core::{ServiceError, ServiceResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Candidate actions forwarded from the WebSocket.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticipantCommand {
    Start(MicrophonePermission),
    Speak(String),
    ToggleMicrophone,
    ToggleAudio,
    Finish,
}

pub struct ParticipantRunner {
    interview_id: Uuid,
    interviews: Arc<InterviewRepository>,
    voice: Arc<dyn VoiceAgentService>,
    agent_id: String,
    controller: ParticipantController,
    handle: Option<SessionHandle>,
    events: Option<VoiceEventStream>,
}

impl ParticipantRunner {
    pub fn new(
        interview_id: Uuid,
        interviews: Arc<InterviewRepository>,
        voice: Arc<dyn VoiceAgentService>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            interview_id,
            interviews,
            voice,
            agent_id: agent_id.into(),
            controller: ParticipantController::new(),
            handle: None,
            events: None,
        }
    }

    pub fn controller(&self) -> &ParticipantController {
        &self.controller
    }

    pub fn session_handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    fn status_message(&self) -> ServerMessage {
        ServerMessage::Status {
            status: self.controller.status(),
        }
    }

    /// The "start" action: checks the microphone, opens the voice session and
    /// records the opening line.
    pub async fn start(&mut self, permission: MicrophonePermission) -> ServiceResult<Vec<ServerMessage>> {
        let interview = scheduled_interview(&self.interviews, self.interview_id).await?;
        self.controller.begin(permission)?;
        // A previous attempt may still hold a provider session.
        self.teardown().await;

        let first_message = build_opening_line(&interview.candidate_name, &interview.job_role);
        let config = VoiceSessionConfig {
            agent_id: self.agent_id.clone(),
            prompt: build_prompt(&interview.job_role, &interview.questions),
            first_message: first_message.clone(),
            language: map_language(interview.language.code()),
            questions: interview.questions.clone(),
        };

        let session = match self.voice.start_session(config).await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to start voice session for {}: {}", self.interview_id, e);
                self.controller.fail();
                return Err(ServiceError::VoiceSession(e.to_string()));
            }
        };
        info!(
            "Interview {} started on voice session {}",
            self.interview_id, session.handle
        );
        self.handle = Some(session.handle);
        self.events = Some(session.events);

        let entry = self.controller.session_opened(&first_message);
        Ok(vec![
            self.status_message(),
            ServerMessage::from(entry),
            ServerMessage::Microphone {
                enabled: self.controller.microphone_enabled(),
            },
        ])
    }

    /// Waits for the next provider event. Returns `None` once the stream ends
    /// or when no session is open.
    pub async fn next_event(&mut self) -> Option<VoiceEvent> {
        self.events.as_ref()?;
        let event = next_voice_event(&mut self.events).await;
        if event.is_none() {
            self.events = None;
        }
        event
    }

    pub async fn handle_event(&mut self, event: VoiceEvent) -> Vec<ServerMessage> {
        match self.controller.apply(event) {
            Effect::Ignored => Vec::new(),
            Effect::Status(ParticipantStatus::Idle) => {
                info!("Voice session for interview {} disconnected", self.interview_id);
                self.teardown().await;
                vec![self.status_message()]
            }
            Effect::Status(_) => vec![self.status_message()],
            Effect::Entry(_, entry) => vec![self.status_message(), ServerMessage::from(entry)],
            Effect::Failed(reason) => {
                error!("Voice session error on interview {}: {}", self.interview_id, reason);
                self.teardown().await;
                vec![
                    self.status_message(),
                    ServerMessage::Error {
                        message: ServiceError::VoiceSession(reason).to_string(),
                    },
                ]
            }
        }
    }

    pub async fn speak(&mut self, text: &str) -> ServiceResult<()> {
        let handle = self.live_handle("speak")?;
        self.voice
            .send_user_message(&handle, text)
            .await
            .map_err(|e| ServiceError::VoiceSession(e.to_string()))
    }

    pub fn toggle_microphone(&mut self) -> bool {
        let enabled = self.controller.toggle_microphone();
        info!(
            "Microphone {} for interview {}",
            if enabled { "enabled" } else { "disabled" },
            self.interview_id
        );
        enabled
    }

    /// Mutes or unmutes the agent's voice on the live session.
    pub async fn toggle_audio(&mut self) -> ServiceResult<bool> {
        let handle = self.live_handle("toggle audio")?;
        let volume = if self.controller.audio_enabled() { 0.0 } else { 1.0 };
        self.voice
            .set_volume(&handle, volume)
            .await
            .map_err(|e| ServiceError::VoiceSession(e.to_string()))?;
        Ok(self.controller.toggle_audio())
    }

    fn live_handle(&self, action: &'static str) -> ServiceResult<SessionHandle> {
        match (&self.handle, self.controller.status().is_live()) {
            (Some(handle), true) => Ok(handle.clone()),
            _ => Err(ServiceError::InvalidSessionState {
                state: self.controller.status().as_str(),
                action,
            }),
        }
    }

    /// Completes the interview: closes the session, joins the transcript and
    /// hands it to the repository together with the provider's results.
    pub async fn finish(&mut self) -> ServiceResult<Interview> {
        let transcript = self.controller.complete()?;
        self.teardown().await;

        let results = match self.voice.fetch_results(self.interview_id).await {
            Ok(results) => Some(results),
            Err(e) => {
                warn!("No results available for interview {}: {}", self.interview_id, e);
                None
            }
        };
        let record = CompletionRecord {
            transcript,
            summary: results.as_ref().map(|r| r.summary.clone()),
            candidate_queries: results.map(|r| r.candidate_queries),
        };
        self.interviews.complete(self.interview_id, record).await
    }

    /// Ends the voice session if one is open. Safe to call repeatedly.
    pub async fn teardown(&mut self) {
        self.events = None;
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.voice.end_session(&handle).await {
                warn!("Failed to end voice session {}: {}", handle, e);
            }
        }
    }

    async fn execute(&mut self, command: ParticipantCommand) -> ServiceResult<Vec<ServerMessage>> {
        match command {
            ParticipantCommand::Start(permission) => self.start(permission).await,
            ParticipantCommand::Speak(text) => {
                self.speak(&text).await?;
                Ok(Vec::new())
            }
            ParticipantCommand::ToggleMicrophone => Ok(vec![ServerMessage::Microphone {
                enabled: self.toggle_microphone(),
            }]),
            ParticipantCommand::ToggleAudio => Ok(vec![ServerMessage::Audio {
                enabled: self.toggle_audio().await?,
            }]),
            ParticipantCommand::Finish => self.finish_messages().await,
        }
    }

    async fn finish_messages(&mut self) -> ServiceResult<Vec<ServerMessage>> {
        let interview = self.finish().await?;
        Ok(vec![
            self.status_message(),
            ServerMessage::Completed {
                interview_id: interview.id,
            },
        ])
    }

    /// The main loop for one participant connection.
    ///
    /// Runs until the interview completes, the command channel closes, or
    /// `cancel` fires. The forced-completion deadline is armed when a session
    /// starts and disarmed once the session errors or disconnects; it never
    /// outlives this loop.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ParticipantCommand>,
        updates: mpsc::Sender<ServerMessage>,
        timeout: Duration,
        cancel: CancellationToken,
    ) {
        info!("Participant session for interview {} opened", self.interview_id);
        let mut deadline: Option<Instant> = None;

        loop {
            let outgoing = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Participant session for {} cancelled", self.interview_id);
                    break;
                }
                _ = wait_until(deadline) => {
                    info!("Interview {} reached its time limit, completing", self.interview_id);
                    deadline = None;
                    match self.finish_messages().await {
                        Ok(messages) => messages,
                        Err(e) => vec![ServerMessage::Error { message: e.to_string() }],
                    }
                }
                event = next_voice_event(&mut self.events) => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        self.events = None;
                        Vec::new()
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => {
                        let starting = matches!(command, ParticipantCommand::Start(_));
                        match self.execute(command).await {
                            Ok(messages) => {
                                if starting {
                                    deadline = Some(Instant::now() + timeout);
                                }
                                messages
                            }
                            Err(e) => {
                                warn!("Participant action failed on {}: {}", self.interview_id, e);
                                let mut messages = Vec::new();
                                if starting {
                                    messages.push(self.status_message());
                                }
                                messages.push(ServerMessage::Error { message: e.to_string() });
                                messages
                            }
                        }
                    }
                    None => {
                        info!("Participant for {} disconnected", self.interview_id);
                        break;
                    }
                },
            };

            if matches!(
                self.controller.status(),
                ParticipantStatus::Error | ParticipantStatus::Idle
            ) {
                deadline = None;
            }
            for message in outgoing {
                if updates.send(message).await.is_err() {
                    warn!("Participant update channel closed for {}", self.interview_id);
                    self.teardown().await;
                    return;
                }
            }
            if self.controller.status() == ParticipantStatus::Completed {
                break;
            }
        }

        self.teardown().await;
        info!("Participant session for interview {} closed", self.interview_id);
    }
}

async fn scheduled_interview(
    interviews: &InterviewRepository,
    interview_id: Uuid,
) -> ServiceResult<Interview> {
    let interview = interviews
        .get(interview_id)
        .await
        .ok_or(ServiceError::InterviewNotFound(interview_id))?;
    if interview.status != InterviewStatus::Scheduled {
        return Err(ServiceError::InvalidTransition {
            from: interview.status,
            action: "start",
        });
    }
    Ok(interview)
}

async fn next_voice_event(events: &mut Option<VoiceEventStream>) -> Option<VoiceEvent> {
    match events.as_mut() {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
