//! services/api/src/stores/accounts.rs
//!
//! The Account Store: owns recruiter identities and their password hashes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use interview_core::domain::{validate_email, Account, AccountCredentials};
use interview_core::ports::{KeyValueStore, PortError};
use interview_core::{ServiceError, ServiceResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{load_snapshot, save_snapshot, ACCOUNTS_KEY};

pub struct AccountStore {
    kv: Arc<dyn KeyValueStore>,
    accounts: Mutex<Vec<AccountCredentials>>,
}

impl AccountStore {
    /// Loads the persisted account collection.
    pub async fn load(kv: Arc<dyn KeyValueStore>) -> ServiceResult<Self> {
        let accounts: Vec<AccountCredentials> =
            load_snapshot(kv.as_ref(), ACCOUNTS_KEY).await?.unwrap_or_default();
        info!("Loaded {} account(s)", accounts.len());
        Ok(Self {
            kv,
            accounts: Mutex::new(accounts),
        })
    }

    /// Creates a new account. Emails are compared exactly as stored.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        company: Option<String>,
    ) -> ServiceResult<Account> {
        validate_email(email)?;
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(ServiceError::Validation("password must not be empty".to_string()));
        }

        let mut accounts = self.accounts.lock().await;
        if accounts.iter().any(|c| c.account.email == email) {
            warn!("Signup rejected, {} is already registered", email);
            return Err(ServiceError::DuplicateAccount(email.to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                PortError::Unexpected("failed to hash password".to_string())
            })?
            .to_string();

        let credentials = AccountCredentials {
            account: Account {
                id: Uuid::new_v4(),
                email: email.to_string(),
                name: name.trim().to_string(),
                company: company.filter(|c| !c.trim().is_empty()),
            },
            hashed_password,
        };

        let mut next = accounts.clone();
        next.push(credentials.clone());
        save_snapshot(self.kv.as_ref(), ACCOUNTS_KEY, &next).await?;
        *accounts = next;

        info!("Registered account {} ({})", credentials.account.id, email);
        Ok(credentials.account)
    }

    /// Exact-match lookup by email.
    pub async fn find(&self, email: &str) -> Option<Account> {
        self.accounts
            .lock()
            .await
            .iter()
            .find(|c| c.account.email == email)
            .map(|c| c.account.clone())
    }

    /// Checks a password against the stored hash. Unknown emails and wrong
    /// passwords are reported identically.
    pub async fn verify(&self, email: &str, password: &str) -> ServiceResult<Account> {
        let credentials = {
            let accounts = self.accounts.lock().await;
            accounts
                .iter()
                .find(|c| c.account.email == email)
                .cloned()
                .ok_or(ServiceError::AccountNotFound)?
        };

        let parsed_hash = PasswordHash::new(&credentials.hashed_password).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            PortError::Unexpected("stored password hash is unreadable".to_string())
        })?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| ServiceError::AccountNotFound)?;

        Ok(credentials.account)
    }

    pub async fn len(&self) -> usize {
        self.accounts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;

    async fn store() -> (Arc<MemoryStore>, AccountStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = AccountStore::load(kv.clone()).await.unwrap();
        (kv, store)
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let (_, store) = store().await;
        let account = store
            .register("ada@example.com", "s3cret", "Ada", Some("Acme".to_string()))
            .await
            .unwrap();
        assert_eq!(store.find("ada@example.com").await, Some(account.clone()));
        assert_eq!(store.find("ADA@example.com").await, None);
        assert_eq!(account.company.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_duplicate_email_leaves_store_unchanged() {
        let (kv, store) = store().await;
        store.register("ada@example.com", "one", "Ada", None).await.unwrap();
        let snapshot = kv.get(ACCOUNTS_KEY).await.unwrap();

        let result = store.register("ada@example.com", "two", "Other Ada", None).await;
        assert!(matches!(result, Err(ServiceError::DuplicateAccount(_))));
        assert_eq!(store.len().await, 1);
        assert_eq!(kv.get(ACCOUNTS_KEY).await.unwrap(), snapshot);
        assert_eq!(store.find("ada@example.com").await.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_verify_does_not_distinguish_failures() {
        let (_, store) = store().await;
        store.register("ada@example.com", "right", "Ada", None).await.unwrap();

        assert!(store.verify("ada@example.com", "right").await.is_ok());
        assert!(matches!(
            store.verify("ada@example.com", "wrong").await,
            Err(ServiceError::AccountNotFound)
        ));
        assert!(matches!(
            store.verify("nobody@example.com", "right").await,
            Err(ServiceError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn test_passwords_are_not_stored_in_clear() {
        let (kv, store) = store().await;
        store.register("ada@example.com", "plain-text", "Ada", None).await.unwrap();
        let raw = kv.get(ACCOUNTS_KEY).await.unwrap().unwrap();
        assert!(!raw.contains("plain-text"));
        assert!(raw.contains("$argon2"));

        let reloaded = AccountStore::load(kv.clone()).await.unwrap();
        assert!(reloaded.verify("ada@example.com", "plain-text").await.is_ok());
    }
}
