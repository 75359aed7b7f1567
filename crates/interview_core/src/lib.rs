pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod participant;
pub mod ports;
pub mod prompts;

pub use domain::{
    Account, AccountCredentials, CompletionRecord, DashboardStats, Interview, InterviewDraft,
    InterviewPatch, InterviewQuery, InterviewResults, InterviewStatus, Language, Speaker,
    TranscriptEntry,
};
pub use error::{ServiceError, ServiceResult};
pub use lifecycle::LifecycleEvent;
pub use participant::{Effect, MicrophonePermission, ParticipantController, ParticipantStatus};
pub use ports::{
    AgentDefinition, KeyValueStore, PortError, PortResult, SessionHandle, VoiceAgentService,
    VoiceEvent, VoiceEventStream, VoiceSession, VoiceSessionConfig,
};
