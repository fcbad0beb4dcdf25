//! Per-contributor statistics.
//!
//! Contributors are keyed by author display name, not email: every address
//! used under one name folds into the same entry, and two people sharing a
//! name are merged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::CommitRecord;

/// Cumulative statistics for one contributor.
///
/// # Examples
///
/// ```
/// use codevis_history::contributors::ContributorStats;
///
/// let stats = ContributorStats {
///     email: "alice@example.com".into(),
///     commits: 12,
///     lines_added: 900,
///     lines_removed: 150,
///     files_changed: 40,
///     first_commit: 1700000000.0,
///     last_commit: 1710000000.0,
/// };
/// assert!(stats.first_commit <= stats.last_commit);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorStats {
    /// Email of the contributor's most recent commit.
    pub email: String,
    /// Number of commits.
    pub commits: u64,
    /// Lines added across all commits.
    pub lines_added: u64,
    /// Lines removed across all commits.
    pub lines_removed: u64,
    /// Sum of files touched per commit.
    pub files_changed: u64,
    /// Earliest commit timestamp.
    pub first_commit: f64,
    /// Latest commit timestamp.
    pub last_commit: f64,
}

/// Contributor display name → statistics.
pub type ContributorMap = BTreeMap<String, ContributorStats>;

impl ContributorStats {
    fn from_commit(record: &CommitRecord) -> Self {
        Self {
            email: record.author_email.clone(),
            commits: 1,
            lines_added: record.lines_added,
            lines_removed: record.lines_removed,
            files_changed: record.total_files as u64,
            first_commit: record.timestamp,
            last_commit: record.timestamp,
        }
    }

    fn observe(&mut self, record: &CommitRecord) {
        // Latest commit wins the email; the greater address breaks ties so the
        // result does not depend on input order.
        let newer = record.timestamp > self.last_commit
            || (record.timestamp == self.last_commit && record.author_email > self.email);
        if newer {
            self.email.clone_from(&record.author_email);
        }

        self.commits += 1;
        self.lines_added += record.lines_added;
        self.lines_removed += record.lines_removed;
        self.files_changed += record.total_files as u64;
        self.first_commit = self.first_commit.min(record.timestamp);
        self.last_commit = self.last_commit.max(record.timestamp);
    }
}

/// Fold a single commit into `contributors`.
///
/// An entry is created from the commit's own values on first sighting of its
/// author name. Entries are never removed.
pub fn accumulate_contributor(contributors: &mut ContributorMap, record: &CommitRecord) {
    match contributors.get_mut(&record.author_name) {
        Some(stats) => stats.observe(record),
        None => {
            contributors.insert(
                record.author_name.clone(),
                ContributorStats::from_commit(record),
            );
        }
    }
}

/// Aggregate contributor statistics over a commit sequence.
///
/// The result is the same for any ordering of `records`.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use codevis_history::contributors::aggregate_contributors;
/// use codevis_history::record::CommitRecord;
///
/// let when = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
/// let records = vec![
///     CommitRecord::new("a".into(), "alice".into(), "a@x.org".into(), when, "one".into(), vec![]),
///     CommitRecord::new("b".into(), "alice".into(), "a@x.org".into(), when, "two".into(), vec![]),
/// ];
/// let contributors = aggregate_contributors(&records);
/// assert_eq!(contributors["alice"].commits, 2);
/// ```
pub fn aggregate_contributors(records: &[CommitRecord]) -> ContributorMap {
    records
        .iter()
        .fold(ContributorMap::new(), |mut contributors, record| {
            accumulate_contributor(&mut contributors, record);
            contributors
        })
}
