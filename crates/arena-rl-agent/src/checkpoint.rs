//! Checkpoint persistence
//!
//! One resume checkpoint (`last_train.json`) plus numbered snapshots
//! (`episode_<n>.json`), all JSON. Every write goes to a temporary file that is
//! renamed over the target, so an interrupted write leaves the previous file
//! intact.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use arena_rl_core::{PolicySnapshot, Result};

/// File name of the resume checkpoint
pub const RESUME_FILE: &str = "last_train.json";

/// Policy parameters plus the episode they were saved after
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Policy parameters
    pub policy: PolicySnapshot,
    /// Last completed episode
    pub episode: usize,
    /// Wall-clock save time
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Checkpoint stamped with the current time
    #[must_use]
    pub fn new(policy: PolicySnapshot, episode: usize) -> Self {
        Self {
            policy,
            episode,
            saved_at: Utc::now(),
        }
    }

    /// Read a checkpoint file
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, `Serialization` when it is not a
    /// checkpoint.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Directory of checkpoints for one task
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Store rooted at `dir`; the directory is created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the resume checkpoint
    #[must_use]
    pub fn resume_path(&self) -> PathBuf {
        self.dir.join(RESUME_FILE)
    }

    /// Path of the snapshot taken after `episode`
    #[must_use]
    pub fn snapshot_path(&self, episode: usize) -> PathBuf {
        self.dir.join(format!("episode_{episode}.json"))
    }

    /// Overwrite the resume checkpoint
    ///
    /// # Errors
    ///
    /// Propagates serialization and filesystem errors.
    pub async fn save_resume(&self, checkpoint: &Checkpoint) -> Result<PathBuf> {
        let path = self.resume_path();
        write_atomic(&path, checkpoint).await?;
        Ok(path)
    }

    /// Write a numbered snapshot
    ///
    /// # Errors
    ///
    /// Propagates serialization and filesystem errors.
    pub async fn save_snapshot(&self, checkpoint: &Checkpoint) -> Result<PathBuf> {
        let path = self.snapshot_path(checkpoint.episode);
        write_atomic(&path, checkpoint).await?;
        Ok(path)
    }

    /// Read the resume checkpoint
    ///
    /// # Errors
    ///
    /// `Io` when missing or unreadable, `Serialization` when corrupt.
    pub async fn load_resume(&self) -> Result<Checkpoint> {
        Checkpoint::load(&self.resume_path()).await
    }
}

async fn write_atomic(path: &Path, checkpoint: &Checkpoint) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string(checkpoint)?;
    let tmp = path.with_extension("json.tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(json.as_bytes()).await?;
    // contents must be durable before the rename publishes them
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), episode = checkpoint.episode, "checkpoint written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_rl_core::RLError;

    fn snapshot() -> PolicySnapshot {
        PolicySnapshot {
            kind: "mlp-vpg".into(),
            architecture: vec![2, 3],
            parameters: vec![0.5, -0.25, 1.0],
        }
    }

    #[tokio::test]
    async fn test_resume_round_trip_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("explore"));
        let checkpoint = Checkpoint::new(snapshot(), 37);
        let path = store.save_resume(&checkpoint).await.unwrap();
        assert_eq!(path, store.resume_path());

        let loaded = store.load_resume().await.unwrap();
        assert_eq!(loaded, checkpoint);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_previous_resume_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save_resume(&Checkpoint::new(snapshot(), 1)).await.unwrap();
        store.save_resume(&Checkpoint::new(snapshot(), 2)).await.unwrap();

        assert_eq!(store.load_resume().await.unwrap().episode, 2);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from(RESUME_FILE)]);
    }

    #[tokio::test]
    async fn test_snapshot_is_numbered() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let path = store
            .save_snapshot(&Checkpoint::new(snapshot(), 200))
            .await
            .unwrap();
        assert!(path.ends_with("episode_200.json"));
        assert_eq!(Checkpoint::load(&path).await.unwrap().episode, 200);
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_files_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(matches!(store.load_resume().await, Err(RLError::Io(_))));

        std::fs::write(store.resume_path(), "{not json").unwrap();
        assert!(matches!(
            store.load_resume().await,
            Err(RLError::Serialization(_))
        ));
    }
}
