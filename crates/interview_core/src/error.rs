//! crates/interview_core/src/error.rs
//!
//! The error taxonomy surfaced to users by every interview operation.

use crate::domain::InterviewStatus;
use crate::ports::PortError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("An account with email {0} already exists")]
    DuplicateAccount(String),

    /// Covers both unknown emails and wrong passwords.
    #[error("No account matches these credentials")]
    AccountNotFound,

    #[error("Interview {0} not found")]
    InterviewNotFound(Uuid),

    #[error("Microphone access is required for the interview")]
    PermissionDenied,

    #[error("Voice session error: {0}")]
    VoiceSession(String),

    #[error("Cannot {action} an interview that is {from}")]
    InvalidTransition {
        from: InterviewStatus,
        action: &'static str,
    },

    #[error("Participant session cannot {action} while {state}")]
    InvalidSessionState {
        state: &'static str,
        action: &'static str,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

/// A convenience type alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = Result<T, ServiceError>;
