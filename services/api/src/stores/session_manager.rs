//! services/api/src/stores/session_manager.rs
//!
//! The Session Manager: tracks which account is signed in to this client and
//! keeps a persisted copy so the identity survives a restart.

use interview_core::domain::Account;
use interview_core::ports::KeyValueStore;
use interview_core::{ServiceError, ServiceResult};
use std::sync::Arc;
use tracing::{info, warn};

use super::{load_snapshot, save_snapshot, AccountStore, CURRENT_SESSION_KEY};

pub struct SessionManager {
    accounts: Arc<AccountStore>,
    kv: Arc<dyn KeyValueStore>,
    current: Option<Account>,
    loading: bool,
}

impl SessionManager {
    /// Creates a manager that still has to be hydrated from storage.
    pub fn new(accounts: Arc<AccountStore>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            accounts,
            kv,
            current: None,
            loading: true,
        }
    }

    /// Restores the persisted identity. A stored identity whose account no
    /// longer exists is discarded.
    pub async fn hydrate(&mut self) -> ServiceResult<()> {
        let stored: Option<Account> = load_snapshot(self.kv.as_ref(), CURRENT_SESSION_KEY).await?;
        self.current = match stored {
            Some(account) => {
                let known = self.accounts.find(&account.email).await;
                if known.as_ref() == Some(&account) {
                    info!("Restored session for {}", account.email);
                    Some(account)
                } else {
                    warn!("Discarding stale session for {}", account.email);
                    self.kv.remove(CURRENT_SESSION_KEY).await?;
                    None
                }
            }
            None => None,
        };
        self.loading = false;
        Ok(())
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> ServiceResult<Account> {
        let account = match self.accounts.verify(email, password).await {
            Ok(account) => account,
            Err(e) => {
                warn!("Login failed for {}: {}", email, e);
                return Err(e);
            }
        };
        self.establish(account.clone()).await?;
        info!("Logged in successfully as {}", account.email);
        Ok(account)
    }

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
        company: Option<String>,
    ) -> ServiceResult<Account> {
        let account = match self.accounts.register(email, password, name, company).await {
            Ok(account) => account,
            Err(e) => {
                warn!("Signup failed for {}: {}", email, e);
                return Err(e);
            }
        };
        self.establish(account.clone()).await?;
        info!("Account created successfully for {}", account.email);
        Ok(account)
    }

    /// Clears the current identity. Signing out twice is harmless.
    pub async fn sign_out(&mut self) -> ServiceResult<()> {
        self.kv.remove(CURRENT_SESSION_KEY).await?;
        if let Some(account) = self.current.take() {
            info!("Logged out {}", account.email);
        }
        Ok(())
    }

    pub fn current(&self) -> Option<&Account> {
        self.current.as_ref()
    }

    /// True only until `hydrate` has finished.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    async fn establish(&mut self, account: Account) -> ServiceResult<()> {
        save_snapshot(self.kv.as_ref(), CURRENT_SESSION_KEY, &account).await?;
        self.current = Some(account);
        Ok(())
    }

    /// The signed-in account, or `AccountNotFound` when nobody is signed in.
    pub fn require_current(&self) -> ServiceResult<Account> {
        self.current.clone().ok_or(ServiceError::AccountNotFound)
    }
}
