//! JSON snapshot file on local disk.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use score_types::StoreState;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::SnapshotStore;
use crate::error::{PersistenceError, PersistenceResult};

/// Snapshot stored as a single JSON document.
///
/// Writes go to `<path>.tmp` in the same directory, are synced, then renamed
/// over `path`, and the directory is synced so the rename survives a crash.
/// A reader never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Use the snapshot file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("snapshot"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    #[cfg(unix)]
    async fn sync_dir(&self, dir: &Path) -> PersistenceResult<()> {
        let handle = fs::File::open(dir)
            .await
            .map_err(|e| self.io_error(dir, e))?;
        handle.sync_all().await.map_err(|e| self.io_error(dir, e))
    }

    // Directory handles cannot be synced here.
    #[cfg(not(unix))]
    async fn sync_dir(&self, _dir: &Path) -> PersistenceResult<()> {
        Ok(())
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    async fn write_temp(&self, tmp: &Path, bytes: &[u8]) -> PersistenceResult<()> {
        let mut file = fs::File::create(tmp)
            .await
            .map_err(|e| self.io_error(tmp, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| self.io_error(tmp, e))?;
        file.sync_all().await.map_err(|e| self.io_error(tmp, e))?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> PersistenceResult<Option<StoreState>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    async fn save(&self, state: &StoreState) -> PersistenceResult<()> {
        let bytes = serde_json::to_vec(state).map_err(PersistenceError::Encode)?;

        let parent = self.parent_dir();
        fs::create_dir_all(parent)
            .await
            .map_err(|e| self.io_error(parent, e))?;

        let tmp = self.temp_path();
        let written = match self.write_temp(&tmp, &bytes).await {
            Ok(()) => fs::rename(&tmp, &self.path)
                .await
                .map_err(|e| self.io_error(&self.path, e)),
            Err(e) => Err(e),
        };

        if written.is_err() {
            if let Err(e) = fs::remove_file(&tmp).await {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {}: {}", tmp.display(), e);
                }
            }
            return written;
        }
        self.sync_dir(parent).await
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
