//! crates/interview_core/src/lifecycle.rs
//!
//! The interview status state machine.
//!
//! `scheduled` is the only non-terminal state. A recruiter may cancel it, and a
//! finished participant session completes it with the transcript attached in the
//! same step. Any other transition is rejected and leaves the record untouched.

use crate::domain::{CompletionRecord, Interview, InterviewStatus};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Cancel,
    Complete,
}

impl LifecycleEvent {
    fn action(&self) -> &'static str {
        match self {
            LifecycleEvent::Cancel => "cancel",
            LifecycleEvent::Complete => "complete",
        }
    }
}

impl InterviewStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InterviewStatus::Scheduled)
    }

    /// Returns the state reached by applying `event`, or an error if the
    /// transition is not permitted.
    pub fn transition(self, event: LifecycleEvent) -> ServiceResult<InterviewStatus> {
        match (self, event) {
            (InterviewStatus::Scheduled, LifecycleEvent::Cancel) => Ok(InterviewStatus::Cancelled),
            (InterviewStatus::Scheduled, LifecycleEvent::Complete) => Ok(InterviewStatus::Completed),
            (from, event) => Err(ServiceError::InvalidTransition {
                from,
                action: event.action(),
            }),
        }
    }
}

impl Interview {
    pub fn cancel(&mut self) -> ServiceResult<()> {
        self.status = self.status.transition(LifecycleEvent::Cancel)?;
        Ok(())
    }

    /// Completes the interview and attaches its results.
    pub fn complete(&mut self, record: CompletionRecord) -> ServiceResult<()> {
        self.status = self.status.transition(LifecycleEvent::Complete)?;
        self.transcript = Some(record.transcript);
        self.summary = record.summary;
        self.candidate_queries = record.candidate_queries;
        Ok(())
    }
}
