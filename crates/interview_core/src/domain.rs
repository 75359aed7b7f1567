//! crates/interview_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Field names serialize in camelCase so persisted snapshots keep the layout
//! the dashboard has always stored.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Interview lengths (in minutes) a recruiter can choose from.
pub const DURATION_OPTIONS: [u32; 4] = [15, 30, 45, 60];

/// Duration used when a draft does not specify one.
pub const DEFAULT_DURATION: u32 = 30;

/// Questions used when a draft does not provide any.
pub const DEFAULT_QUESTIONS: [&str; 3] = [
    "Can you tell me about yourself and your background?",
    "Why are you interested in this position?",
    "What are your strengths and weaknesses?",
];

//=========================================================================================
// Accounts
//=========================================================================================

/// A recruiter account - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

// Only used internally for sign-in/sign-up - contains sensitive data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCredentials {
    #[serde(flatten)]
    pub account: Account,
    pub hashed_password: String,
}

//=========================================================================================
// Interviews
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(InterviewStatus::Scheduled),
            "completed" => Some(InterviewStatus::Completed),
            "cancelled" => Some(InterviewStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The interview languages, stored by their short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Pl,
    Hi,
    Ar,
    Zh,
    Ja,
    Ko,
    Nl,
}

impl Language {
    pub const ALL: [Language; 13] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::It,
        Language::Pt,
        Language::Pl,
        Language::Hi,
        Language::Ar,
        Language::Zh,
        Language::Ja,
        Language::Ko,
        Language::Nl,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Pl => "pl",
            Language::Hi => "hi",
            Language::Ar => "ar",
            Language::Zh => "zh",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Nl => "nl",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|language| language.code() == code)
    }
}

/// The persisted interview record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_role: String,
    pub questions: Vec<String>,
    pub max_duration: u32,
    pub language: Language,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_queries: Option<Vec<String>>,
    pub interview_link: String,
    pub user_id: Uuid,
}

/// Builds the shareable link a candidate uses to join their interview.
pub fn interview_link(origin: &str, id: Uuid) -> String {
    format!("{}/interview/{}", origin.trim_end_matches('/'), id)
}

impl Interview {
    /// Materializes a validated draft into a freshly scheduled interview.
    pub fn from_draft(draft: InterviewDraft, origin: &str, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            candidate_name: draft.candidate_name,
            candidate_email: draft.candidate_email,
            job_role: draft.job_role,
            questions: draft.questions,
            max_duration: draft.max_duration,
            language: draft.language,
            status: InterviewStatus::Scheduled,
            created_at: now,
            scheduled_for: draft.scheduled_for,
            transcript: None,
            summary: None,
            candidate_queries: None,
            interview_link: interview_link(origin, id),
            user_id: draft.user_id,
        }
    }

    /// Case-insensitive match over candidate name and job role.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.candidate_name.to_lowercase().contains(&term)
            || self.job_role.to_lowercase().contains(&term)
    }
}

/// Everything a recruiter supplies when creating an interview.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewDraft {
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_role: String,
    pub questions: Vec<String>,
    pub max_duration: u32,
    pub language: Language,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub user_id: Uuid,
}

impl InterviewDraft {
    /// A draft with the default question set, duration and language.
    pub fn new(
        user_id: Uuid,
        candidate_name: impl Into<String>,
        candidate_email: impl Into<String>,
        job_role: impl Into<String>,
    ) -> Self {
        Self {
            candidate_name: candidate_name.into(),
            candidate_email: candidate_email.into(),
            job_role: job_role.into(),
            questions: DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            max_duration: DEFAULT_DURATION,
            language: Language::default(),
            scheduled_for: None,
            user_id,
        }
    }

    pub fn validate(&self) -> ServiceResult<()> {
        require_text("candidateName", &self.candidate_name)?;
        validate_email(&self.candidate_email)?;
        require_text("jobRole", &self.job_role)?;
        require_questions(&self.questions)?;
        require_duration(self.max_duration)
    }
}

/// A partial update of an interview. Only the listed fields can be changed;
/// identity, ownership, status and link are fixed once the record exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InterviewPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_queries: Option<Vec<String>>,
}

impl InterviewPatch {
    pub fn is_empty(&self) -> bool {
        *self == InterviewPatch::default()
    }

    fn touches_results(&self) -> bool {
        self.transcript.is_some() || self.summary.is_some() || self.candidate_queries.is_some()
    }

    /// Checks the patch against the record it is about to be merged into.
    pub fn validate(&self, target: &Interview) -> ServiceResult<()> {
        if let Some(name) = &self.candidate_name {
            require_text("candidateName", name)?;
        }
        if let Some(email) = &self.candidate_email {
            validate_email(email)?;
        }
        if let Some(role) = &self.job_role {
            require_text("jobRole", role)?;
        }
        if let Some(questions) = &self.questions {
            require_questions(questions)?;
        }
        if let Some(minutes) = self.max_duration {
            require_duration(minutes)?;
        }
        if self.touches_results() && target.status != InterviewStatus::Completed {
            return Err(ServiceError::Validation(format!(
                "results can only be attached to a completed interview (status is {})",
                target.status
            )));
        }
        Ok(())
    }

    /// Shallow merge: fields absent from the patch are left untouched.
    pub fn apply_to(self, target: &mut Interview) {
        if let Some(v) = self.candidate_name {
            target.candidate_name = v;
        }
        if let Some(v) = self.candidate_email {
            target.candidate_email = v;
        }
        if let Some(v) = self.job_role {
            target.job_role = v;
        }
        if let Some(v) = self.questions {
            target.questions = v;
        }
        if let Some(v) = self.max_duration {
            target.max_duration = v;
        }
        if let Some(v) = self.language {
            target.language = v;
        }
        if let Some(v) = self.scheduled_for {
            target.scheduled_for = Some(v);
        }
        if let Some(v) = self.transcript {
            target.transcript = Some(v);
        }
        if let Some(v) = self.summary {
            target.summary = Some(v);
        }
        if let Some(v) = self.candidate_queries {
            target.candidate_queries = Some(v);
        }
    }
}

fn require_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> ServiceResult<()> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    });
    if !pattern.is_match(value.trim()) {
        return Err(ServiceError::Validation(format!(
            "'{value}' is not a valid email address"
        )));
    }
    Ok(())
}

fn require_questions(questions: &[String]) -> ServiceResult<()> {
    if questions.is_empty() {
        return Err(ServiceError::Validation(
            "at least one question is required".to_string(),
        ));
    }
    if questions.iter().any(|q| q.trim().is_empty()) {
        return Err(ServiceError::Validation(
            "questions must not be blank".to_string(),
        ));
    }
    Ok(())
}

fn require_duration(minutes: u32) -> ServiceResult<()> {
    if !DURATION_OPTIONS.contains(&minutes) {
        return Err(ServiceError::Validation(format!(
            "maxDuration must be one of {:?} minutes, got {}",
            DURATION_OPTIONS, minutes
        )));
    }
    Ok(())
}

//=========================================================================================
// Listing helpers
//=========================================================================================

/// Filters applied by the dashboard views on top of `list_by_owner`.
#[derive(Debug, Clone, Default)]
pub struct InterviewQuery {
    pub status: Option<InterviewStatus>,
    pub search: Option<String>,
}

impl InterviewQuery {
    /// Applies the filters and orders the result newest first.
    pub fn apply(&self, interviews: Vec<Interview>) -> Vec<Interview> {
        let mut selected: Vec<Interview> = interviews
            .into_iter()
            .filter(|i| self.status.map_or(true, |status| i.status == status))
            .filter(|i| self.search.as_deref().map_or(true, |term| i.matches_search(term)))
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        selected
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total: usize,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub recent: Vec<Interview>,
}

impl DashboardStats {
    pub const RECENT_LIMIT: usize = 5;

    pub fn from_interviews(interviews: Vec<Interview>) -> Self {
        let count = |status| interviews.iter().filter(|i| i.status == status).count();
        let scheduled = count(InterviewStatus::Scheduled);
        let completed = count(InterviewStatus::Completed);
        let cancelled = count(InterviewStatus::Cancelled);
        let total = interviews.len();
        let mut recent = InterviewQuery::default().apply(interviews);
        recent.truncate(Self::RECENT_LIMIT);
        Self {
            total,
            scheduled,
            completed,
            cancelled,
            recent,
        }
    }
}

//=========================================================================================
// Transcripts
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    #[serde(rename = "AI")]
    Ai,
    Candidate,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Ai => f.write_str("AI"),
            Speaker::Candidate => f.write_str("Candidate"),
        }
    }
}

/// A single line spoken during a participant session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker, self.text)
    }
}

/// Joins entries in append order, one line per entry.
pub fn join_transcript(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Post-call artifacts produced by the voice provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResults {
    pub transcript: String,
    pub summary: String,
    pub candidate_queries: Vec<String>,
}

/// What gets attached to an interview when it completes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRecord {
    pub transcript: String,
    pub summary: Option<String>,
    pub candidate_queries: Option<Vec<String>>,
}
