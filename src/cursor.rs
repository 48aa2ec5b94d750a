//! Persistence of the "last checked" timestamp between runs.

use std::{fs, path::PathBuf, sync::Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

/// Stores the exclusive lower bound for new activity.
///
/// Loading never fails: a store that cannot produce a usable value falls
/// back to a recent default instead.
pub trait CursorStore {
    fn load(&self) -> DateTime<Utc>;
    fn save(&self, timestamp: DateTime<Utc>) -> Result<()>;
}

/// Cursor kept in a single text file holding one RFC 3339 timestamp.
#[derive(Debug, Clone)]
pub struct FileCursor {
    path: PathBuf,
    interval: Duration,
}

impl FileCursor {
    /// `interval` is how far back to look when the file is missing or
    /// unreadable.
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }

    fn read(&self) -> Result<DateTime<Utc>> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let trimmed = contents.trim();
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| {
                format!("Invalid timestamp '{}' in {}", trimmed, self.path.display())
            })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CursorStore for FileCursor {
    fn load(&self) -> DateTime<Utc> {
        match self.read() {
            Ok(timestamp) => timestamp,
            Err(err) => {
                let fallback = Utc::now() - self.interval;
                if self.path.exists() {
                    warn!("{:#}; falling back to {}", err, fallback.to_rfc3339());
                } else {
                    debug!(
                        "No cursor at {}; falling back to {}",
                        self.path.display(),
                        fallback.to_rfc3339()
                    );
                }
                fallback
            }
        }
    }

    fn save(&self, timestamp: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Write-then-rename so a reader never sees a truncated file.
        let temp = self.temp_path();
        fs::write(&temp, timestamp.to_rfc3339())
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        fs::rename(&temp, &self.path).with_context(|| {
            format!(
                "Failed to move {} to {}",
                temp.display(),
                self.path.display()
            )
        })?;

        debug!("Saved cursor {} to {}", timestamp.to_rfc3339(), self.path.display());
        Ok(())
    }
}

/// In-process cursor, used for dry runs.
#[derive(Debug)]
pub struct MemoryCursor {
    value: Mutex<DateTime<Utc>>,
}

impl MemoryCursor {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

impl CursorStore for MemoryCursor {
    fn load(&self) -> DateTime<Utc> {
        *self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, timestamp: DateTime<Utc>) -> Result<()> {
        *self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = timestamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn assert_recent_fallback(loaded: DateTime<Utc>, interval: Duration) {
        let expected = Utc::now() - interval;
        let drift = (expected - loaded).num_seconds().abs();
        assert!(drift <= 5, "fallback {loaded} too far from {expected}");
    }

    #[test]
    fn test_missing_file_falls_back_to_interval() {
        let dir = tempfile::tempdir().unwrap();
        let cursor = FileCursor::new(dir.path().join("absent.txt"), Duration::minutes(30));
        assert_recent_fallback(cursor.load(), Duration::minutes(30));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_checked.txt");
        fs::write(&path, "not a timestamp").unwrap();

        let cursor = FileCursor::new(&path, Duration::minutes(45));
        assert_recent_fallback(cursor.load(), Duration::minutes(45));
    }

    #[test]
    fn test_empty_file_falls_back_to_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_checked.txt");
        fs::write(&path, "").unwrap();

        let cursor = FileCursor::new(&path, Duration::minutes(30));
        assert_recent_fallback(cursor.load(), Duration::minutes(30));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cursor = FileCursor::new(
            dir.path().join("state/last_checked.txt"),
            Duration::minutes(30),
        );
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        cursor.save(ts).unwrap();

        assert_eq!(cursor.load(), ts);
        assert!(!dir.path().join("state/last_checked.txt.tmp").exists());
    }

    #[test]
    fn test_load_accepts_offsets_and_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_checked.txt");
        fs::write(&path, "2024-03-01T14:30:00.250+02:00\n").unwrap();

        let cursor = FileCursor::new(&path, Duration::minutes(30));
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
            + Duration::milliseconds(250);
        assert_eq!(cursor.load(), expected);
    }

    #[test]
    fn test_save_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_checked.txt");
        let cursor = FileCursor::new(&path, Duration::minutes(30));
        let first = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        cursor.save(first).unwrap();
        cursor.save(second).unwrap();

        assert_eq!(cursor.load(), second);
    }

    #[test]
    fn test_memory_cursor() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let cursor = MemoryCursor::new(ts);
        assert_eq!(cursor.load(), ts);

        let later = ts + Duration::minutes(30);
        cursor.save(later).unwrap();
        assert_eq!(cursor.load(), later);
    }
}
