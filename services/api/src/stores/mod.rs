//! services/api/src/stores/mod.rs
//!
//! The stateful components built on top of the `KeyValueStore` port. Each one
//! owns one persisted collection and is the only writer of it; every mutation
//! rewrites the full snapshot.

pub mod accounts;
pub mod interviews;
pub mod session_manager;

pub use accounts::AccountStore;
pub use interviews::InterviewRepository;
pub use session_manager::SessionManager;

use interview_core::ports::{KeyValueStore, PortError};
use interview_core::ServiceResult;
use serde::{de::DeserializeOwned, Serialize};

/// Storage key of the account collection.
pub const ACCOUNTS_KEY: &str = "accounts";
/// Storage key of the interview collection.
pub const INTERVIEWS_KEY: &str = "interviews";
/// Storage key of the signed-in account.
pub const CURRENT_SESSION_KEY: &str = "current_session";

/// Reads and decodes one snapshot. A missing key yields `None`.
pub(crate) async fn load_snapshot<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> ServiceResult<Option<T>> {
    let Some(raw) = kv.get(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw)
        .map_err(|e| PortError::Unexpected(format!("corrupt '{}' snapshot: {}", key, e)))?;
    Ok(Some(value))
}

/// Encodes and writes one snapshot, replacing what was stored before.
pub(crate) async fn save_snapshot<T: Serialize + ?Sized>(
    kv: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> ServiceResult<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| PortError::Unexpected(format!("cannot encode '{}': {}", key, e)))?;
    kv.set(key, &raw).await?;
    Ok(())
}
