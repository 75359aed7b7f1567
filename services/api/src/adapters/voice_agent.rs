//! services/api/src/adapters/voice_agent.rs
//!
//! A scripted stand-in for the conversational voice provider. It implements the
//! `VoiceAgentService` port entirely in process: sessions push their events
//! over a channel, the agent answers every candidate turn with the next
//! configured question, and post-call results come from a small fixed set.

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use interview_core::domain::{InterviewResults, Language};
use interview_core::ports::{
    AgentDefinition, PortError, PortResult, SessionHandle, VoiceAgentService, VoiceEvent,
    VoiceSession, VoiceSessionConfig,
};
use interview_core::prompts::build_prompt;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

const CLOSING_LINE: &str =
    "Thank you, that was my last question. We appreciate your time and will be in touch soon.";

struct LiveSession {
    sender: UnboundedSender<VoiceEvent>,
    pending_questions: VecDeque<String>,
    volume: f32,
}

impl LiveSession {
    fn push(&self, event: VoiceEvent) -> PortResult<()> {
        self.sender
            .unbounded_send(event)
            .map_err(|e| PortError::Unexpected(format!("voice session receiver dropped: {}", e)))
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Default)]
pub struct MockVoiceAgent {
    sessions: Mutex<HashMap<SessionHandle, LiveSession>>,
}

impl MockVoiceAgent {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionHandle, LiveSession>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pushes an arbitrary event onto a live session, as the provider would.
    pub fn inject(&self, handle: &SessionHandle, event: VoiceEvent) -> PortResult<()> {
        let sessions = self.sessions();
        let session = sessions
            .get(handle)
            .ok_or_else(|| PortError::NotFound(format!("voice session {}", handle)))?;
        session.push(event)
    }

    pub fn is_live(&self, handle: &SessionHandle) -> bool {
        self.sessions().contains_key(handle)
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions().len()
    }

    pub fn volume(&self, handle: &SessionHandle) -> Option<f32> {
        self.sessions().get(handle).map(|s| s.volume)
    }
}

/// The canned post-call artifacts. Which one an interview gets depends only on
/// the first character of its identifier.
fn sample_results() -> [InterviewResults; 2] {
    [
        InterviewResults {
            transcript: "Interviewer: Walk me through a project you led recently.\n\n\
Candidate: I led the migration of our billing system to a new event pipeline. \
I coordinated four engineers, set weekly milestones and we shipped two weeks early."
                .to_string(),
            summary: "The candidate recently led a four-person billing migration, planned it \
with weekly milestones and delivered ahead of schedule."
                .to_string(),
            candidate_queries: vec![
                "How is the engineering team structured?".to_string(),
                "What does the onboarding process look like?".to_string(),
            ],
        },
        InterviewResults {
            transcript: "Interviewer: How do you handle disagreements within a team?\n\n\
Candidate: I start with one-on-one conversations to understand each position, then bring \
people together around shared goals. Most disagreements come from unclear expectations."
                .to_string(),
            summary: "The candidate resolves conflict by listening to each side first and then \
aligning the group on shared goals, and sees unclear expectations as the usual root cause."
                .to_string(),
            candidate_queries: vec![
                "How often does the team run retrospectives?".to_string(),
                "What is the next step in the hiring process?".to_string(),
            ],
        },
    ]
}

//=========================================================================================
// `VoiceAgentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VoiceAgentService for MockVoiceAgent {
    async fn create_agent(
        &self,
        job_role: &str,
        questions: &[String],
        language: Language,
    ) -> PortResult<AgentDefinition> {
        info!(
            "Creating conversational agent for '{}' ({} questions, language {})",
            job_role,
            questions.len(),
            language.code()
        );
        Ok(AgentDefinition {
            agent_id: Uuid::new_v4().simple().to_string(),
            prompt: build_prompt(job_role, questions),
        })
    }

    async fn start_session(&self, config: VoiceSessionConfig) -> PortResult<VoiceSession> {
        let handle = SessionHandle::new();
        let (sender, receiver) = mpsc::unbounded();
        let session = LiveSession {
            sender,
            pending_questions: config.questions.into_iter().collect(),
            volume: 1.0,
        };
        session.push(VoiceEvent::Connected)?;
        self.sessions().insert(handle.clone(), session);
        info!(
            "Voice session {} started (agent {}, language {})",
            handle, config.agent_id, config.language
        );
        Ok(VoiceSession {
            handle,
            events: Box::pin(receiver),
        })
    }

    async fn send_user_message(&self, handle: &SessionHandle, text: &str) -> PortResult<()> {
        let mut sessions = self.sessions();
        let session = sessions
            .get_mut(handle)
            .ok_or_else(|| PortError::NotFound(format!("voice session {}", handle)))?;
        session.push(VoiceEvent::UserMessage(text.to_string()))?;
        session.push(VoiceEvent::Thinking)?;
        let reply = session
            .pending_questions
            .pop_front()
            .unwrap_or_else(|| CLOSING_LINE.to_string());
        session.push(VoiceEvent::AgentMessage(reply))
    }

    async fn end_session(&self, handle: &SessionHandle) -> PortResult<()> {
        match self.sessions().remove(handle) {
            Some(session) => {
                // The receiver may already be gone; ending must still succeed.
                let _ = session.push(VoiceEvent::Disconnected);
                info!("Voice session {} ended", handle);
            }
            None => debug!("Voice session {} already ended", handle),
        }
        Ok(())
    }

    async fn set_volume(&self, handle: &SessionHandle, volume: f32) -> PortResult<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PortError::Unexpected(format!(
                "volume {} is outside 0.0..=1.0",
                volume
            )));
        }
        let mut sessions = self.sessions();
        let session = sessions
            .get_mut(handle)
            .ok_or_else(|| PortError::NotFound(format!("voice session {}", handle)))?;
        session.volume = volume;
        Ok(())
    }

    async fn fetch_results(&self, interview_id: Uuid) -> PortResult<InterviewResults> {
        let samples = sample_results();
        let key = interview_id.to_string().bytes().next().unwrap_or(0) as usize;
        let index = key % samples.len();
        debug!("Serving sample results #{} for interview {}", index, interview_id);
        samples
            .into_iter()
            .nth(index)
            .ok_or_else(|| PortError::NotFound(format!("results for {}", interview_id)))
    }
}
