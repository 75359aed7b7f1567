//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::{FileStore, MockVoiceAgent};
use crate::config::Config;
use crate::stores::{AccountStore, InterviewRepository, SessionManager};
use interview_core::ports::{KeyValueStore, VoiceAgentService};
use interview_core::ServiceResult;
use std::sync::Arc;
use tokio::sync::RwLock;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Only the repository writes the interview collection and only the session
/// manager writes the signed-in identity; everything else reads through them.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyValueStore>,
    pub accounts: Arc<AccountStore>,
    pub session: Arc<RwLock<SessionManager>>,
    pub interviews: Arc<InterviewRepository>,
    pub voice: Arc<dyn VoiceAgentService>,
}

impl AppState {
    /// Loads every persisted collection from `store` and hydrates the session.
    pub async fn build(
        config: Arc<Config>,
        store: Arc<dyn KeyValueStore>,
        voice: Arc<dyn VoiceAgentService>,
    ) -> ServiceResult<Self> {
        let accounts = Arc::new(AccountStore::load(store.clone()).await?);
        let interviews =
            Arc::new(InterviewRepository::load(store.clone(), config.public_origin.clone()).await?);

        let mut session = SessionManager::new(accounts.clone(), store.clone());
        session.hydrate().await?;

        Ok(Self {
            config,
            store,
            accounts,
            session: Arc::new(RwLock::new(session)),
            interviews,
            voice,
        })
    }

    /// The production wiring: a file-backed store under `config.data_dir` and
    /// the scripted voice agent.
    pub async fn from_config(config: Arc<Config>) -> ServiceResult<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir).await?);
        let voice: Arc<dyn VoiceAgentService> = Arc::new(MockVoiceAgent::new());
        Self::build(config, store, voice).await
    }
}
