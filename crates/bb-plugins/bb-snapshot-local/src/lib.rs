//! # bb-snapshot-local
//! Local filesystem implementation of `SnapshotStore`.
//! Keeps the last fetched board list as JSON so the next start can show it
//! before the backend answers.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bb_core::{BoardData, ClientError, Result, SnapshotStore};
use tokio::fs;
use tracing::{debug, warn};

pub const BOARDS_FILE: &str = "allBoardsData.json";

pub struct LocalSnapshotStore {
    /// Directory holding the snapshot files (e.g. "./data/snapshots")
    root_path: PathBuf,
}

impl LocalSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root_path: root.into() }
    }

    pub fn boards_path(&self) -> PathBuf {
        self.root_path.join(BOARDS_FILE)
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    /// A missing or unreadable snapshot is not an error: the list is simply
    /// fetched.
    async fn load_boards(&self) -> Result<Option<Vec<BoardData>>> {
        let path = self.boards_path();
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no board snapshot");
                return Ok(None);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "board snapshot unreadable");
                return Ok(None);
            }
        };
        match serde_json::from_slice(&data) {
            Ok(boards) => Ok(Some(boards)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "board snapshot is malformed, ignoring");
                Ok(None)
            }
        }
    }

    async fn save_boards(&self, boards: &[BoardData]) -> Result<()> {
        let path = self.boards_path();
        fs::create_dir_all(&self.root_path)
            .await
            .map_err(|err| snapshot_error(&self.root_path, err))?;
        let data = serde_json::to_vec(boards).map_err(|err| ClientError::Snapshot(err.to_string()))?;

        // Write next to the target and rename so readers never see half a file.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, &data)
            .await
            .map_err(|err| snapshot_error(&staging, err))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|err| snapshot_error(&path, err))?;
        debug!(path = %path.display(), count = boards.len(), "board snapshot saved");
        Ok(())
    }
}

fn snapshot_error(path: &Path, err: std::io::Error) -> ClientError {
    ClientError::Snapshot(format!("{}: {err}", path.display()))
}
