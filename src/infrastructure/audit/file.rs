//! Append-only JSON Lines audit log

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::audit::{AuditLog, AuditRecord};
use crate::domain::DomainError;

const BACKEND: &str = "file";

/// Writes one JSON object per line to a local file.
///
/// Appends are serialized through a mutex so concurrent requests never
/// interleave partial lines. Reads scan the whole file.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileAuditLog {
    /// Opens (creating parent directories if needed) the log at `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::store_unavailable(
                    BACKEND,
                    format!("Failed to create directory {}: {}", parent.display(), e),
                )
            })?;
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_for_append(&self) -> Result<fs::File, DomainError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                DomainError::store_unavailable(
                    BACKEND,
                    format!("Failed to open {}: {}", self.path.display(), e),
                )
            })
    }
}

#[async_trait]
impl AuditLog for FileAuditLog {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), DomainError> {
        let mut line = serde_json::to_string(record).map_err(|e| {
            DomainError::internal(format!("Failed to serialize audit record: {}", e))
        })?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = self.open_for_append().await?;

        file.write_all(line.as_bytes()).await.map_err(|e| {
            DomainError::store_unavailable(
                BACKEND,
                format!("Failed to append to {}: {}", self.path.display(), e),
            )
        })?;
        file.flush().await.map_err(|e| {
            DomainError::store_unavailable(BACKEND, format!("Failed to flush audit log: {}", e))
        })?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, DomainError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DomainError::store_unavailable(
                    BACKEND,
                    format!("Failed to read {}: {}", self.path.display(), e),
                ));
            }
        };

        let mut records = Vec::with_capacity(limit.min(1024));

        for (index, line) in contents.lines().rev().enumerate() {
            if records.len() >= limit {
                break;
            }

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<AuditRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line_from_end = index,
                    error = %e,
                    "Skipping malformed audit line"
                ),
            }
        }

        Ok(records)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        self.open_for_append().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::RequestHasher;
    use crate::domain::trip::TripRequest;
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(prediction: f64) -> AuditRecord {
        let request = TripRequest::builder()
            .pickup(40.75, -73.99)
            .dropoff(40.74, -73.98)
            .passenger_count(2)
            .trip_distance(1.2)
            .user_id("rider-7")
            .build()
            .unwrap();
        let key = RequestHasher::new().hash(&request);

        AuditRecord::new(request, prediction, true, key, "v1", Utc::now())
    }

    #[tokio::test]
    async fn test_append_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("predictions.jsonl");
        let log = FileAuditLog::open(&path).await.unwrap();

        log.append(&record(1.5)).await.unwrap();
        log.append(&record(2.5)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"user_id\":\"rider-7\""));
        assert!(lines[1].contains("\"cache_hit\":true"));
    }

    #[tokio::test]
    async fn test_recent_returns_newest_first() {
        let dir = TempDir::new().unwrap();
        let log = FileAuditLog::open(dir.path().join("log.jsonl")).await.unwrap();

        for p in [1.0, 2.0, 3.0] {
            log.append(&record(p)).await.unwrap();
        }

        let recent = log.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].prediction, 3.0);
        assert_eq!(recent[1].prediction, 2.0);
    }

    #[tokio::test]
    async fn test_recent_on_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = FileAuditLog::open(dir.path().join("absent.jsonl")).await.unwrap();

        assert!(log.recent(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        let log = FileAuditLog::open(&path).await.unwrap();

        log.append(&record(4.0)).await.unwrap();
        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("{not json\n");
        std::fs::write(&path, contents).unwrap();

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].prediction, 4.0);
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(FileAuditLog::open(dir.path().join("log.jsonl")).await.unwrap());

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.append(&record(i as f64)).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(log.recent(100).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_ping_creates_file() {
        let dir = TempDir::new().unwrap();
        let log = FileAuditLog::open(dir.path().join("log.jsonl")).await.unwrap();

        log.ping().await.unwrap();
        assert!(log.path().exists());
    }
}
