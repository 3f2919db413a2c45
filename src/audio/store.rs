//! Persists stitched MP3 files to disk and sweeps old ones.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::{Result, TtsError};

pub struct AudioStore {
    storage_dir: PathBuf,
}

impl AudioStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    fn path_for(&self, job_id: &str) -> PathBuf {
        self.storage_dir.join(format!("{job_id}.mp3"))
    }

    pub async fn save(&self, job_id: &str, audio_bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.storage_dir).await?;
        let path = self.path_for(job_id);
        tokio::fs::write(&path, audio_bytes).await?;
        Ok(path)
    }

    pub fn get_path(&self, job_id: &str) -> Result<PathBuf> {
        let path = self.path_for(job_id);
        if !path.exists() {
            return Err(TtsError::JobNotFound(format!("no audio file for job {job_id}")));
        }
        Ok(path)
    }

    pub async fn delete(&self, job_id: &str) -> Result<()> {
        let path = self.path_for(job_id);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }

    /// Removes audio files whose last-modified time is older than
    /// `max_age_hours`. Runs independently of job garbage collection.
    pub async fn cleanup_older_than(&self, max_age_hours: i64) -> Result<usize> {
        if !self.storage_dir.exists() {
            return Ok(0);
        }
        let max_age = Duration::from_secs((max_age_hours.max(0) as u64) * 3600);
        let now = SystemTime::now();
        let mut removed = 0;

        let mut entries = tokio::fs::read_dir(&self.storage_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_mp3(&path) {
                continue;
            }
            let metadata = entry.metadata().await?;
            let modified = metadata.modified()?;
            if now.duration_since(modified).unwrap_or_default() > max_age {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn is_mp3(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("mp3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_get_path_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new(dir.path());
        store.save("job1", b"fake mp3 bytes").await.unwrap();
        let path = store.get_path("job1").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn get_path_errors_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new(dir.path());
        assert!(store.get_path("missing").is_err());
    }

    #[tokio::test]
    async fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new(dir.path());
        store.save("job1", b"data").await.unwrap();
        store.delete("job1").await.unwrap();
        assert!(store.get_path("job1").is_err());
    }

    #[tokio::test]
    async fn cleanup_older_than_removes_stale_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new(dir.path());
        store.save("old", b"data").await.unwrap();
        store.save("new", b"data").await.unwrap();

        let old_path = dir.path().join("old.mp3");
        let old_time = filetime::FileTime::from_system_time(
            SystemTime::now() - Duration::from_secs(48 * 3600),
        );
        filetime::set_file_mtime(&old_path, old_time).unwrap();

        let removed = store.cleanup_older_than(24).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_path("new").is_ok());
        assert!(store.get_path("old").is_err());
    }
}
