//! JSON file session archive
//!
//! Writes each finished session to `<dir>/<session_id>.json`.

use async_trait::async_trait;
use panel_application::{SessionArchive, SessionSnapshot, StoreError};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonFileSessionArchive {
    dir: PathBuf,
}

impl JsonFileSessionArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Archive path for a session id.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are replaced so an id can never
    /// escape the archive directory.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        let safe: String = session_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    /// Load a previously archived snapshot.
    pub async fn load(&self, session_id: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        let path = self.path_for(session_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(format!("{}: {}", path.display(), e))),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl SessionArchive for JsonFileSessionArchive {
    async fn persist(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", self.dir.display(), e)))?;

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write then rename so readers never see a half-written file
        let path = self.path_for(snapshot.session.id());
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {}", path.display(), e)))?;

        debug!("Archived session {} to {}", snapshot.session.id(), path.display());
        Ok(())
    }
}
