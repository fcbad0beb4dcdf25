//! Per-file statistics.
//!
//! Files are keyed by the path recorded at change time. A rename starts a new
//! entry under the new path; history is not followed across renames.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::record::CommitRecord;

/// Cumulative statistics for one file path.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use codevis_history::files::FileStats;
///
/// let stats = FileStats {
///     changes: 3,
///     lines_added: 40,
///     lines_removed: 12,
///     authors: BTreeSet::from(["alice".to_string()]),
///     first_change: 1700000000.0,
///     last_change: 1700500000.0,
/// };
/// assert_eq!(stats.authors.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    /// Number of commits touching this path.
    pub changes: u64,
    /// Lines added across all changes.
    pub lines_added: u64,
    /// Lines removed across all changes.
    pub lines_removed: u64,
    /// Distinct contributor names that touched this path.
    pub authors: BTreeSet<String>,
    /// Earliest change timestamp.
    pub first_change: f64,
    /// Latest change timestamp.
    pub last_change: f64,
}

/// File path → statistics.
pub type FileMap = BTreeMap<String, FileStats>;

/// Fold every file change of a single commit into `files`.
///
/// Commits without file changes leave the map untouched.
pub fn accumulate_files(files: &mut FileMap, record: &CommitRecord) {
    for change in &record.file_changes {
        let stats = files
            .entry(change.filename.clone())
            .or_insert_with(|| FileStats {
                changes: 0,
                lines_added: 0,
                lines_removed: 0,
                authors: BTreeSet::new(),
                first_change: record.timestamp,
                last_change: record.timestamp,
            });

        stats.changes += 1;
        stats.lines_added += change.lines_added;
        stats.lines_removed += change.lines_removed;
        if !stats.authors.contains(&record.author_name) {
            stats.authors.insert(record.author_name.clone());
        }
        stats.first_change = stats.first_change.min(record.timestamp);
        stats.last_change = stats.last_change.max(record.timestamp);
    }
}

/// Aggregate file statistics over a commit sequence.
///
/// The result is the same for any ordering of `records`.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use codevis_core::ChangeType;
/// use codevis_history::files::aggregate_files;
/// use codevis_history::record::{CommitRecord, FileChange};
///
/// let when = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
/// let change = FileChange {
///     filename: "main.rs".into(),
///     old_path: None,
///     new_path: Some("main.rs".into()),
///     change_type: ChangeType::Add,
///     lines_added: 50,
///     lines_removed: 0,
///     complexity: 0,
/// };
/// let records = vec![CommitRecord::new(
///     "a".into(), "alice".into(), "a@x.org".into(), when, "init".into(), vec![change],
/// )];
/// let files = aggregate_files(&records);
/// assert_eq!(files["main.rs"].lines_added, 50);
/// ```
pub fn aggregate_files(records: &[CommitRecord]) -> FileMap {
    records.iter().fold(FileMap::new(), |mut files, record| {
        accumulate_files(&mut files, record);
        files
    })
}
