//! services/api/src/adapters/file_store.rs
//!
//! A directory-backed implementation of the `KeyValueStore` port. Each key is
//! stored as one JSON document; writes go through a temporary file and an
//! atomic rename so a crash never leaves a half-written snapshot behind.

use async_trait::async_trait;
use interview_core::ports::{KeyValueStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates the store, making sure the data directory exists.
    pub async fn open(root: impl AsRef<Path>) -> PortResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| PortError::Unexpected(format!("cannot create {}: {}", root.display(), e)))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::Unexpected(format!("invalid storage key '{}'", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("{}: {}", path.display(), e))
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        let tmp_path = self.root.join(format!(".{}.json.tmp", key));

        let mut tmp_file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| io_error(&tmp_path, e))?;
        tmp_file
            .write_all(value.as_bytes())
            .await
            .map_err(|e| io_error(&tmp_path, e))?;
        tmp_file.sync_all().await.map_err(|e| io_error(&tmp_path, e))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| io_error(&path, e))?;
        debug!("Persisted '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}
