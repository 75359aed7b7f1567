//! services/api/src/stores/interviews.rs
//!
//! The Interview Repository: CRUD over the interview collection plus the
//! lifecycle transitions. Mutations are applied to a copy of the collection,
//! persisted, and only then made visible, so a failed write changes nothing.

use chrono::Utc;
use interview_core::domain::{
    CompletionRecord, DashboardStats, Interview, InterviewDraft, InterviewPatch, InterviewQuery,
};
use interview_core::ports::KeyValueStore;
use interview_core::{ServiceError, ServiceResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::{load_snapshot, save_snapshot, INTERVIEWS_KEY};

pub struct InterviewRepository {
    kv: Arc<dyn KeyValueStore>,
    origin: String,
    interviews: Mutex<Vec<Interview>>,
}

impl InterviewRepository {
    /// Loads the persisted collection. `origin` is the base of every
    /// shareable link this repository hands out.
    pub async fn load(kv: Arc<dyn KeyValueStore>, origin: impl Into<String>) -> ServiceResult<Self> {
        let interviews: Vec<Interview> =
            load_snapshot(kv.as_ref(), INTERVIEWS_KEY).await?.unwrap_or_default();
        info!("Loaded {} interview(s)", interviews.len());
        Ok(Self {
            kv,
            origin: origin.into(),
            interviews: Mutex::new(interviews),
        })
    }

    /// Runs `f` against a copy of the collection and commits it if the
    /// snapshot write succeeds.
    async fn mutate<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Vec<Interview>) -> ServiceResult<T>,
    {
        let mut interviews = self.interviews.lock().await;
        let mut next = interviews.clone();
        let output = f(&mut next)?;
        save_snapshot(self.kv.as_ref(), INTERVIEWS_KEY, &next).await?;
        *interviews = next;
        Ok(output)
    }

    /// Modifies one record in place and returns its new state.
    async fn mutate_one<F>(&self, id: Uuid, f: F) -> ServiceResult<Interview>
    where
        F: FnOnce(&mut Interview) -> ServiceResult<()>,
    {
        self.mutate(|interviews| {
            let interview = interviews
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or(ServiceError::InterviewNotFound(id))?;
            f(interview)?;
            Ok(interview.clone())
        })
        .await
    }

    pub async fn create(&self, draft: InterviewDraft) -> ServiceResult<Interview> {
        draft.validate()?;
        let interview = Interview::from_draft(draft, &self.origin, Utc::now());
        let created = interview.clone();
        self.mutate(move |interviews| {
            interviews.push(interview);
            Ok(())
        })
        .await?;
        info!(
            "Interview {} created for {} ({})",
            created.id, created.candidate_name, created.job_role
        );
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Option<Interview> {
        self.interviews
            .lock()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    /// Shallow-merges `patch` into the record.
    pub async fn update(&self, id: Uuid, patch: InterviewPatch) -> ServiceResult<Interview> {
        let updated = self
            .mutate_one(id, |interview| {
                patch.validate(interview)?;
                patch.apply_to(interview);
                Ok(())
            })
            .await;
        match &updated {
            Ok(_) => info!("Interview {} updated", id),
            Err(e) => warn!("Failed to update interview {}: {}", id, e),
        }
        updated
    }

    /// Removes the record if present. Deleting an unknown id is a no-op.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let removed = self
            .mutate(|interviews| {
                let before = interviews.len();
                interviews.retain(|i| i.id != id);
                Ok(before != interviews.len())
            })
            .await?;
        if removed {
            info!("Interview {} deleted", id);
        }
        Ok(())
    }

    /// Every interview owned by `owner`, in storage order.
    pub async fn list_by_owner(&self, owner: Uuid) -> Vec<Interview> {
        self.interviews
            .lock()
            .await
            .iter()
            .filter(|i| i.user_id == owner)
            .cloned()
            .collect()
    }

    pub async fn search(&self, owner: Uuid, query: &InterviewQuery) -> Vec<Interview> {
        query.apply(self.list_by_owner(owner).await)
    }

    pub async fn stats(&self, owner: Uuid) -> DashboardStats {
        DashboardStats::from_interviews(self.list_by_owner(owner).await)
    }

    /// Recruiter cancellation. Only scheduled interviews can be cancelled.
    pub async fn cancel(&self, id: Uuid) -> ServiceResult<Interview> {
        let cancelled = self.mutate_one(id, Interview::cancel).await;
        match &cancelled {
            Ok(_) => info!("Interview {} cancelled", id),
            Err(e) => warn!("Failed to cancel interview {}: {}", id, e),
        }
        cancelled
    }

    /// Completion by a finished participant session.
    pub async fn complete(&self, id: Uuid, record: CompletionRecord) -> ServiceResult<Interview> {
        let completed = self
            .mutate_one(id, move |interview| interview.complete(record))
            .await;
        match &completed {
            Ok(_) => info!("Interview {} completed", id),
            Err(e) => warn!("Failed to complete interview {}: {}", id, e),
        }
        completed
    }

    pub async fn len(&self) -> usize {
        self.interviews.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use interview_core::domain::{InterviewStatus, Language};

    const ORIGIN: &str = "http://localhost:3000";

    async fn repository() -> (Arc<MemoryStore>, InterviewRepository) {
        let kv = Arc::new(MemoryStore::new());
        let repo = InterviewRepository::load(kv.clone(), ORIGIN).await.unwrap();
        (kv, repo)
    }

    fn draft(owner: Uuid, name: &str) -> InterviewDraft {
        InterviewDraft::new(owner, name, "candidate@example.com", "Backend Engineer")
    }

    fn record() -> CompletionRecord {
        CompletionRecord {
            transcript: "AI: Hello".to_string(),
            summary: Some("Solid".to_string()),
            candidate_queries: Some(vec!["Remote?".to_string()]),
        }
    }

    #[tokio::test]
    async fn test_create_schedules_with_unique_ids_and_links() {
        let (_, repo) = repository().await;
        let owner = Uuid::new_v4();
        let a = repo.create(draft(owner, "Jane Roe")).await.unwrap();
        let b = repo.create(draft(owner, "John Doe")).await.unwrap();

        assert_ne!(a.id, b.id);
        for interview in [&a, &b] {
            assert_eq!(interview.status, InterviewStatus::Scheduled);
            assert!(interview.interview_link.contains(&interview.id.to_string()));
            assert!(interview.interview_link.starts_with(ORIGIN));
        }
        assert_eq!(repo.get(a.id).await, Some(a));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft() {
        let (_, repo) = repository().await;
        let mut invalid = draft(Uuid::new_v4(), "Jane Roe");
        invalid.questions.clear();
        assert!(matches!(repo.create(invalid).await, Err(ServiceError::Validation(_))));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let (_, repo) = repository().await;
        let created = repo.create(draft(Uuid::new_v4(), "Jane Roe")).await.unwrap();
        let completed = repo.complete(created.id, record()).await.unwrap();

        let patch = InterviewPatch {
            summary: Some("x".to_string()),
            ..Default::default()
        };
        let updated = repo.update(created.id, patch).await.unwrap();

        let mut expected = completed.clone();
        expected.summary = Some("x".to_string());
        assert_eq!(updated, expected);
        assert_eq!(repo.get(created.id).await, Some(expected));
    }

    #[tokio::test]
    async fn test_update_recruiter_fields_while_scheduled() {
        let (_, repo) = repository().await;
        let created = repo.create(draft(Uuid::new_v4(), "Jane Roe")).await.unwrap();
        let patch = InterviewPatch {
            language: Some(Language::Fr),
            max_duration: Some(45),
            ..Default::default()
        };
        let updated = repo.update(created.id, patch).await.unwrap();
        assert_eq!(updated.language, Language::Fr);
        assert_eq!(updated.max_duration, 45);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.interview_link, created.interview_link);
    }

    #[tokio::test]
    async fn test_update_missing_interview_fails() {
        let (_, repo) = repository().await;
        let result = repo
            .update(Uuid::new_v4(), InterviewPatch::default())
            .await;
        assert!(matches!(result, Err(ServiceError::InterviewNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let (_, repo) = repository().await;
        repo.create(draft(Uuid::new_v4(), "Jane Roe")).await.unwrap();
        repo.delete(Uuid::new_v4()).await.unwrap();
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let (_, repo) = repository().await;
        let created = repo.create(draft(Uuid::new_v4(), "Jane Roe")).await.unwrap();
        repo.delete(created.id).await.unwrap();
        assert_eq!(repo.get(created.id).await, None);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_cancel_completed_is_rejected_and_status_kept() {
        let (_, repo) = repository().await;
        let created = repo.create(draft(Uuid::new_v4(), "Jane Roe")).await.unwrap();
        repo.complete(created.id, record()).await.unwrap();

        let result = repo.cancel(created.id).await;
        assert!(matches!(result, Err(ServiceError::InvalidTransition { .. })));
        assert_eq!(
            repo.get(created.id).await.unwrap().status,
            InterviewStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_list_by_owner_and_stats() {
        let (_, repo) = repository().await;
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let a = repo.create(draft(owner, "Jane Roe")).await.unwrap();
        repo.create(draft(owner, "John Doe")).await.unwrap();
        repo.create(draft(other, "Someone Else")).await.unwrap();
        repo.cancel(a.id).await.unwrap();

        assert_eq!(repo.list_by_owner(owner).await.len(), 2);
        let stats = repo.stats(owner).await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.scheduled, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.completed, 0);

        let query = InterviewQuery {
            status: Some(InterviewStatus::Scheduled),
            search: Some("john".to_string()),
        };
        let found = repo.search(owner, &query).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].candidate_name, "John Doe");
    }

    #[tokio::test]
    async fn test_collection_persists_across_reload() {
        let (kv, repo) = repository().await;
        let created = repo.create(draft(Uuid::new_v4(), "Jane Roe")).await.unwrap();

        let reloaded = InterviewRepository::load(kv, ORIGIN).await.unwrap();
        assert_eq!(reloaded.get(created.id).await, Some(created));
    }
}
