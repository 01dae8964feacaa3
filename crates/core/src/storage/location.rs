//! Sharded directory allocation for locally stored files.
//!
//! Layout: `{base_dir}/{year}/{month}/{day}/{hour}/{seq}` where `seq` is a
//! four digit, zero-padded folder number (`0001`, `0002`, ...). A new folder
//! is opened once the latest one holds `file_limit` regular files.
//!
//! Sequence folders must only ever be created by this generator. Rollover is
//! not coordinated across processes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Timelike, Utc};
use tokio::fs;
use tracing::debug;

use super::error::StorageError;
use crate::document::Document;

/// Name of the first sequence folder.
pub const FIRST_SEQUENCE: u32 = 1;

/// Highest sequence number that still fits in four digits.
pub const LAST_SEQUENCE: u32 = 9999;

/// Allocates writable folders under a base directory.
#[derive(Debug, Clone)]
pub struct LocationGenerator {
    base_dir: PathBuf,
    file_limit: usize,
}

impl LocationGenerator {
    /// Create a generator. A `file_limit` of zero is treated as one.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, file_limit: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            file_limit: file_limit.max(1),
        }
    }

    /// Base directory all locations live under.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Maximum files per sequence folder.
    #[must_use]
    pub fn file_limit(&self) -> usize {
        self.file_limit
    }

    /// Allocate a folder for `document`, stamping `created_at` with the
    /// current UTC time when it is unset.
    pub async fn generate(&self, document: &mut Document) -> Result<PathBuf, StorageError> {
        let created_at = *document.created_at.get_or_insert_with(Utc::now);
        self.generate_at(created_at).await
    }

    /// Allocate a folder for a file created at `at`.
    pub async fn generate_at(&self, at: DateTime<Utc>) -> Result<PathBuf, StorageError> {
        let hour_dir = self.hour_dir(at);
        fs::create_dir_all(&hour_dir).await?;
        self.sequence_folder(&hour_dir).await
    }

    /// `{base_dir}/{year}/{month}/{day}/{hour}` with unpadded components.
    #[must_use]
    pub fn hour_dir(&self, at: DateTime<Utc>) -> PathBuf {
        self.base_dir
            .join(at.year().to_string())
            .join(at.month().to_string())
            .join(at.day().to_string())
            .join(at.hour().to_string())
    }

    async fn sequence_folder(&self, parent: &Path) -> Result<PathBuf, StorageError> {
        let mut folders = subdirectories(parent).await?;
        folders.sort();

        let Some(last) = folders.pop() else {
            let first = parent.join(sequence_name(FIRST_SEQUENCE));
            fs::create_dir_all(&first).await?;
            debug!(path = %first.display(), "Created first sequence folder");
            return Ok(first);
        };

        let last_path = parent.join(&last);
        let file_count = count_files(&last_path).await?;
        if file_count < self.file_limit {
            return Ok(last_path);
        }

        let sequence: u32 = last
            .parse()
            .map_err(|_| StorageError::InvalidSequenceFolder(last.clone()))?;
        let next = sequence
            .checked_add(1)
            .filter(|next| *next <= LAST_SEQUENCE)
            .ok_or_else(|| StorageError::SequenceExhausted(parent.display().to_string()))?;
        let next = parent.join(sequence_name(next));
        fs::create_dir_all(&next).await?;
        debug!(
            full = %last_path.display(),
            file_count,
            next = %next.display(),
            "Sequence folder full, rolled over"
        );
        Ok(next)
    }
}

/// Zero-padded, four digit folder name for `sequence`.
#[must_use]
pub fn sequence_name(sequence: u32) -> String {
    format!("{sequence:04}")
}

async fn subdirectories(parent: &Path) -> Result<Vec<String>, StorageError> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(parent).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

async fn count_files(dir: &Path) -> Result<usize, StorageError> {
    let mut count = 0;
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            count += 1;
        }
    }
    Ok(count)
}
