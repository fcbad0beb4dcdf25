//! Raw commit → [`CommitRecord`] normalization.

use crate::reader::{RawCommit, RawModification};
use crate::record::{CommitRecord, FileChange};

/// Convert one raw commit into a normalized record.
///
/// Every modification yields exactly one [`FileChange`], in reader order.
/// Counts the reader could not compute become 0, so binary or unreadable
/// files still appear in the record without contributing lines.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use codevis_core::ChangeType;
/// use codevis_history::extract::extract_commit;
/// use codevis_history::reader::{RawCommit, RawModification};
///
/// let raw = RawCommit {
///     hash: "abc".into(),
///     author_name: "alice".into(),
///     author_email: "alice@example.com".into(),
///     author_time: DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap(),
///     message: "init".into(),
///     modifications: vec![RawModification {
///         old_path: None,
///         new_path: Some("logo.png".into()),
///         change_type: ChangeType::Add,
///         added_lines: None,
///         removed_lines: None,
///         complexity: None,
///     }],
/// };
/// let record = extract_commit(&raw);
/// assert_eq!(record.total_files, 1);
/// assert_eq!(record.lines_added, 0);
/// ```
pub fn extract_commit(raw: &RawCommit) -> CommitRecord {
    let file_changes = raw.modifications.iter().map(extract_file_change).collect();

    CommitRecord::new(
        raw.hash.clone(),
        raw.author_name.clone(),
        raw.author_email.clone(),
        raw.author_time,
        raw.message.clone(),
        file_changes,
    )
}

fn extract_file_change(modification: &RawModification) -> FileChange {
    FileChange {
        filename: modification.path().to_string(),
        old_path: modification.old_path.clone(),
        new_path: modification.new_path.clone(),
        change_type: modification.change_type,
        lines_added: modification.added_lines.unwrap_or(0),
        lines_removed: modification.removed_lines.unwrap_or(0),
        complexity: modification.complexity.unwrap_or(0),
    }
}
