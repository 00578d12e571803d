//! Result Store: one JSON file per résumé in the result directory.
//!
//! Key: the résumé filename without its extension (`jane_doe.pdf` → `jane_doe.json`).
//! Saving overwrites by key. Files whose name starts with `_` are reserved for derived
//! artifacts (the aggregate) and are never read back as records.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::document::base_name;
use crate::models::score::ScoreRecord;

pub mod aggregate;

pub const RESERVED_PREFIX: char = '_';
const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    /// Opens the store, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, filename: &str) -> PathBuf {
        self.root
            .join(format!("{}.{RECORD_EXTENSION}", base_name(filename)))
    }

    /// True when a record is already stored for this résumé filename.
    pub async fn exists(&self, filename: &str) -> bool {
        tokio::fs::try_exists(self.record_path(filename))
            .await
            .unwrap_or(false)
    }

    /// Writes `record` under its source filename, replacing any previous record.
    pub async fn save(&self, record: &ScoreRecord) -> Result<PathBuf, AppError> {
        let path = self.record_path(&record.source_filename);
        let json = serde_json::to_vec_pretty(record)?;
        write_atomically(&path, &json).await?;
        debug!("Saved result for {} in {}", record.name, path.display());
        Ok(path)
    }

    /// Reads every stored record, ordered by file name.
    /// Unreadable or malformed files are logged and skipped.
    pub async fn load_all(&self) -> Result<Vec<ScoreRecord>, AppError> {
        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_record_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Could not read {}: {e}", path.display());
                    continue;
                }
            };
            match serde_json::from_slice::<ScoreRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Could not decode JSON in {}: {e}", path.display()),
            }
        }
        Ok(records)
    }
}

fn is_record_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .map(|ext| ext == RECORD_EXTENSION)
        .unwrap_or(false);
    let reserved = path
        .file_name()
        .map(|name| name.to_string_lossy().starts_with(RESERVED_PREFIX))
        .unwrap_or(true);
    has_extension && !reserved
}

/// Writes `contents` to a temp file beside `path`, then renames it into place, so readers
/// (including other processes) see either the old file or the complete new one.
pub async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), AppError> {
    let path = path.to_path_buf();
    let contents = contents.to_vec();
    tokio::task::spawn_blocking(move || -> Result<(), AppError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&contents)?;
        file.as_file().sync_all()?;
        file.persist(&path)
            .map_err(|e| AppError::store(&path, e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, score: f64, filename: &str) -> ScoreRecord {
        ScoreRecord::new(name.to_string(), score, "reason".to_string(), filename.to_string())
    }

    #[tokio::test]
    async fn test_save_then_exists_by_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path()).await.unwrap();

        assert!(!store.exists("jane_doe.pdf").await);
        let path = store.save(&record("Jane", 90.0, "jane_doe.pdf")).await.unwrap();
        assert_eq!(path, dir.path().join("jane_doe.json"));
        assert!(store.exists("jane_doe.pdf").await);
    }

    #[tokio::test]
    async fn test_save_overwrites_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path()).await.unwrap();

        store.save(&record("Jane", 50.0, "jane.pdf")).await.unwrap();
        store.save(&record("Jane", 75.0, "jane.pdf")).await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].score, 75.0);
    }

    #[tokio::test]
    async fn test_load_all_skips_corrupt_reserved_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path()).await.unwrap();
        store.save(&record("A", 80.0, "a.pdf")).await.unwrap();

        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("noscore.json"), r#"{"name":"x"}"#).unwrap();
        std::fs::write(dir.path().join("_final_results.json"), "[]").unwrap();
        std::fs::write(dir.path().join("a.pdf.txt"), "cached text").unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "A");
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("results/nested");
        let store = ResultStore::open(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_atomically_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.json");
        write_atomically(&target, b"first").await.unwrap();
        write_atomically(&target, b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
