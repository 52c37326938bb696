//! Storage root: the single directory that holds user-generated files.
//!
//! Writes go through a temp file in the target directory followed by a
//! rename, serialized per relative path. Readers therefore see either the
//! previous or the new content, never a partial file.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const AVATARS_DIR: &str = "avatars";
pub const OUTBOX_DIR: &str = "outbox";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage root {path} is not usable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
}

impl StorageError {
    /// True when the underlying I/O error is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub struct StorageRoot {
    root: PathBuf,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for StorageRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageRoot").field("root", &self.root).finish()
    }
}

impl StorageRoot {
    /// Create the directory if needed and verify the process can write to it.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        common::env::ensure_writable_dir(&root)
            .await
            .map_err(|source| StorageError::Unavailable { path: root.clone(), source })?;
        info!(root = %root.display(), "storage root ready");
        Ok(Self { root, locks: DashMap::new() })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Re-run the writability probe (used by health checks).
    pub async fn check_writable(&self) -> Result<(), StorageError> {
        common::env::ensure_writable_dir(&self.root)
            .await
            .map_err(|source| StorageError::Unavailable { path: self.root.clone(), source })
    }

    /// Map a relative path onto the root, rejecting anything that could escape it.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(relative);
        if relative.is_empty() {
            return Err(StorageError::InvalidPath("empty path".into()));
        }
        let mut out = self.root.clone();
        for component in rel.components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(relative.to_string())),
            }
        }
        if out == self.root {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(out)
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the map entry once no other task holds or waits on it.
    fn release(&self, path: &Path, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(path, |_, l| Arc::strong_count(l) == 1);
    }

    /// Atomically replace the file at `relative` with `bytes`.
    pub async fn write(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let target = self.resolve(relative)?;
        let lock = self.lock_for(&target);
        let result = {
            let _guard = lock.lock().await;
            self.replace(relative, &target, bytes).await
        };
        self.release(&target, lock);
        result
    }

    async fn replace(&self, relative: &str, target: &Path, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let parent = target
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(relative.to_string()))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StorageError::Io { path: parent.to_path_buf(), source })?;

        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidPath(relative.to_string()))?;
        let tmp = parent.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4().simple()));

        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, target).await
        }
        .await;
        if let Err(source) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::Io { path: target.to_path_buf(), source });
        }
        debug!(path = %target.display(), bytes = bytes.len(), "storage write");
        Ok(target.to_path_buf())
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(relative)?;
        tokio::fs::read(&path).await.map_err(|source| StorageError::Io { path, source })
    }

    pub async fn exists(&self, relative: &str) -> Result<bool, StorageError> {
        let path = self.resolve(relative)?;
        tokio::fs::try_exists(&path).await.map_err(|source| StorageError::Io { path, source })
    }

    /// Remove a file; returns whether it existed.
    pub async fn remove(&self, relative: &str) -> Result<bool, StorageError> {
        let path = self.resolve(relative)?;
        let lock = self.lock_for(&path);
        let removed = {
            let _guard = lock.lock().await;
            tokio::fs::remove_file(&path).await
        };
        self.release(&path, lock);
        match removed {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    /// File names (not paths) directly under `relative_dir`, sorted. Missing dir → empty.
    pub async fn list(&self, relative_dir: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.resolve(relative_dir)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StorageError::Io { path: dir, source }),
        };
        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if !name.starts_with('.') {
                        names.push(name);
                    }
                }
                Ok(None) => break,
                Err(source) => return Err(StorageError::Io { path: dir, source }),
            }
        }
        names.sort();
        Ok(names)
    }
}
