use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::fs::operations::{read_locked, write_atomically};

/// Durable key-value storage holding serialized documents. Values are opaque strings, the
/// backend knows nothing about their shape.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Returns the value stored under `key`, `None` if nothing was ever written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the value stored under `key`.
    async fn set(&self, key: &str, value: String) -> Result<()>;
}

/// Stores every key as `<dir>/<key>.json`.
pub struct FileBackend {
    dir: PathBuf,
    lock_path: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        let lock_path = dir.join(".lock");

        Ok(Self { dir, lock_path })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl DocumentBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        debug!("Reading {path:?}");
        Ok(read_locked(&path, &self.lock_path).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.key_path(key);
        debug!("Writing {path:?}");
        write_atomically(&path, &self.lock_path, value.as_bytes()).await?;
        Ok(())
    }
}
