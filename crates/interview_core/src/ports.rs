//! crates/interview_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the key-value store and the voice provider behind them.

use async_trait::async_trait;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{InterviewResults, Language};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., filesystem, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence
//=========================================================================================

/// An opaque key-value store holding whole-collection snapshots.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

//=========================================================================================
// Voice Agent
//=========================================================================================

/// Identifies one live voice session at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of events a live voice session pushes to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Connected,
    Disconnected,
    AgentMessage(String),
    UserMessage(String),
    /// The agent is working on its next turn.
    Thinking,
    Error(String),
}

pub type VoiceEventStream = Pin<Box<dyn Stream<Item = VoiceEvent> + Send>>;

/// Everything the provider needs to run one interview conversation.
#[derive(Debug, Clone)]
pub struct VoiceSessionConfig {
    pub agent_id: String,
    pub prompt: String,
    pub first_message: String,
    /// Provider-side language identifier, see `prompts::map_language`.
    pub language: &'static str,
    pub questions: Vec<String>,
}

/// A started session: its handle plus the inbound event stream.
pub struct VoiceSession {
    pub handle: SessionHandle,
    pub events: VoiceEventStream,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub agent_id: String,
    pub prompt: String,
}

#[async_trait]
pub trait VoiceAgentService: Send + Sync {
    /// Registers an agent persona for an interview definition.
    async fn create_agent(
        &self,
        job_role: &str,
        questions: &[String],
        language: Language,
    ) -> PortResult<AgentDefinition>;

    /// Opens a live session. Events are pushed on the returned stream until the
    /// session ends.
    async fn start_session(&self, config: VoiceSessionConfig) -> PortResult<VoiceSession>;

    /// Sends a text turn on behalf of the candidate.
    async fn send_user_message(&self, handle: &SessionHandle, text: &str) -> PortResult<()>;

    /// Terminates a session. Ending an unknown or already-ended session is a no-op.
    async fn end_session(&self, handle: &SessionHandle) -> PortResult<()>;

    /// Sets playback volume in the range 0.0..=1.0.
    async fn set_volume(&self, handle: &SessionHandle, volume: f32) -> PortResult<()>;

    /// Retrieves post-call artifacts for a finished interview.
    async fn fetch_results(&self, interview_id: Uuid) -> PortResult<InterviewResults>;
}
