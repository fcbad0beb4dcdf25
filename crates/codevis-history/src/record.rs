//! Normalized commit records.
//!
//! A [`CommitRecord`] is created once per commit during traversal and never
//! modified afterwards. Its totals are derived from its file changes at
//! construction, so they cannot drift apart.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use codevis_core::ChangeType;
use serde::{Deserialize, Serialize};

/// One file's delta within a commit.
///
/// # Examples
///
/// ```
/// use codevis_core::ChangeType;
/// use codevis_history::record::FileChange;
///
/// let change = FileChange {
///     filename: "src/main.rs".into(),
///     old_path: Some("src/main.rs".into()),
///     new_path: Some("src/main.rs".into()),
///     change_type: ChangeType::Modify,
///     lines_added: 10,
///     lines_removed: 3,
///     complexity: 0,
/// };
/// assert_eq!(change.lines_added, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Display path at the time of the change (the new path for renames).
    pub filename: String,
    /// Path before the change; `None` for additions.
    pub old_path: Option<String>,
    /// Path after the change; `None` for deletions.
    pub new_path: Option<String>,
    /// Classification reported by the diff engine.
    pub change_type: ChangeType,
    /// Lines added in this file.
    pub lines_added: u64,
    /// Lines removed from this file.
    pub lines_removed: u64,
    /// Complexity metric, 0 when the reader does not supply one.
    pub complexity: u64,
}

/// One historical commit with its per-file changes.
///
/// Serialized field names follow the timeline document: `author`, `email`
/// and `files_changed`.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use codevis_history::record::CommitRecord;
///
/// let when = DateTime::parse_from_rfc3339("2024-03-01T09:30:00+01:00").unwrap();
/// let record = CommitRecord::new(
///     "abc123".into(),
///     "Alice".into(),
///     "alice@example.com".into(),
///     when,
///     "Initial commit".into(),
///     vec![],
/// );
/// assert_eq!(record.timestamp, 1709281800.0);
/// assert_eq!(record.datetime, "2024-03-01T09:30:00+01:00");
/// assert_eq!(record.total_files, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash.
    pub hash: String,
    /// Author display name.
    #[serde(rename = "author")]
    pub author_name: String,
    /// Author email.
    #[serde(rename = "email")]
    pub author_email: String,
    /// Author time as seconds since the Unix epoch.
    pub timestamp: f64,
    /// Author time in ISO-8601 form, with the author's UTC offset.
    pub datetime: String,
    /// Full commit message.
    pub message: String,
    /// Per-file changes in diff order.
    #[serde(rename = "files_changed")]
    pub file_changes: Vec<FileChange>,
    /// Sum of `lines_added` over `file_changes`.
    pub lines_added: u64,
    /// Sum of `lines_removed` over `file_changes`.
    pub lines_removed: u64,
    /// Number of entries in `file_changes`.
    pub total_files: usize,
}

impl CommitRecord {
    /// Build a record, deriving the timestamps and totals.
    ///
    /// `timestamp` and `datetime` both come from `author_time`, and the line
    /// and file totals are summed from `file_changes`.
    pub fn new(
        hash: String,
        author_name: String,
        author_email: String,
        author_time: DateTime<FixedOffset>,
        message: String,
        file_changes: Vec<FileChange>,
    ) -> Self {
        let lines_added = file_changes.iter().map(|f| f.lines_added).sum();
        let lines_removed = file_changes.iter().map(|f| f.lines_removed).sum();
        let total_files = file_changes.len();

        Self {
            hash,
            author_name,
            author_email,
            timestamp: epoch_seconds(&author_time),
            datetime: author_time.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            message,
            file_changes,
            lines_added,
            lines_removed,
            total_files,
        }
    }

    /// Lines added minus lines removed.
    pub fn net_lines(&self) -> i64 {
        self.lines_added as i64 - self.lines_removed as i64
    }
}

fn epoch_seconds(time: &DateTime<FixedOffset>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(path: &str, added: u64, removed: u64) -> FileChange {
        FileChange {
            filename: path.into(),
            old_path: Some(path.into()),
            new_path: Some(path.into()),
            change_type: ChangeType::Modify,
            lines_added: added,
            lines_removed: removed,
            complexity: 0,
        }
    }

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn totals_are_summed_from_file_changes() {
        let record = CommitRecord::new(
            "h1".into(),
            "alice".into(),
            "alice@example.com".into(),
            at("2024-01-01T00:00:00+00:00"),
            "work".into(),
            vec![change("a.rs", 5, 2), change("b.rs", 7, 0), change("c.rs", 0, 4)],
        );
        assert_eq!(record.lines_added, 12);
        assert_eq!(record.lines_removed, 6);
        assert_eq!(record.total_files, 3);
        assert_eq!(record.net_lines(), 6);
    }

    #[test]
    fn timestamp_and_datetime_describe_the_same_instant() {
        let record = CommitRecord::new(
            "h1".into(),
            "alice".into(),
            "alice@example.com".into(),
            at("2023-11-14T22:13:20-05:00"),
            String::new(),
            vec![],
        );
        let parsed = DateTime::parse_from_rfc3339(&record.datetime).unwrap();
        assert_eq!(parsed.timestamp() as f64, record.timestamp);
        assert_eq!(record.datetime, "2023-11-14T22:13:20-05:00");
    }

    #[test]
    fn fractional_seconds_are_kept() {
        let record = CommitRecord::new(
            "h1".into(),
            "alice".into(),
            "alice@example.com".into(),
            at("2024-01-01T00:00:00.5+00:00"),
            String::new(),
            vec![],
        );
        assert_eq!(record.timestamp, 1704067200.5);
        assert_eq!(record.datetime, "2024-01-01T00:00:00.500+00:00");
    }

    #[test]
    fn net_lines_can_be_negative() {
        let record = CommitRecord::new(
            "h1".into(),
            "alice".into(),
            "alice@example.com".into(),
            at("2024-01-01T00:00:00+00:00"),
            "cleanup".into(),
            vec![change("old.rs", 1, 40)],
        );
        assert_eq!(record.net_lines(), -39);
    }

    #[test]
    fn serializes_with_document_field_names() {
        let record = CommitRecord::new(
            "h1".into(),
            "alice".into(),
            "alice@example.com".into(),
            at("2024-01-01T00:00:00+00:00"),
            "msg".into(),
            vec![change("a.rs", 1, 0)],
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["author"], "alice");
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["files_changed"][0]["change_type"], "MODIFY");
        assert_eq!(json["total_files"], 1);
        assert!(json.get("author_name").is_none());
    }
}
