//! File-based knowledge store: one plain-text file, one record per line.
//!
//! Storage location: `~/.threadsage/data/me.txt` unless configured.
//!
//! The file is human-editable; anything written to it by hand becomes part of
//! the corpus on the next retrieval.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use threadsage_core::error::StoreError;
use threadsage_core::knowledge::KnowledgeStore;
use tokio::sync::Mutex;
use tracing::debug;

/// A knowledge store backed by a single append-only text file.
///
/// Appends from this process are serialized; each one is a single write of a
/// complete newline-terminated line in append mode.
pub struct FileKnowledgeStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKnowledgeStore {
    /// Create a store at the given path. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl KnowledgeStore for FileKnowledgeStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<String, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                debug!(path = %self.path.display(), bytes = content.len(), "Knowledge loaded");
                Ok(content)
            }
            // Nothing learned yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StoreError::Read {
                path: self.display_path(),
                reason: e.to_string(),
            }),
        }
    }

    async fn append(&self, record: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                    path: self.display_path(),
                    reason: format!("Failed to create knowledge directory: {e}"),
                })?;
            }
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::Write {
                path: self.display_path(),
                reason: e.to_string(),
            })?;

        let line = format!("{record}\n");
        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::Write {
                path: self.display_path(),
                reason: e.to_string(),
            })?;

        debug!(path = %self.path.display(), bytes = line.len(), "Knowledge record appended");
        Ok(())
    }
}
