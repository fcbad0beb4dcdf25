//! Timeline construction.
//!
//! Each commit becomes a [`TimelineEvent`] carrying the running net line
//! count. `cumulative_files` is the final distinct file count repeated on
//! every event, not a point-in-time snapshot.

use std::path::Path;

use codevis_core::CodevisError;
use codevis_history::contributors::ContributorMap;
use codevis_history::files::FileMap;
use codevis_history::record::CommitRecord;
use serde::{Deserialize, Serialize};

/// One commit on the timeline with running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// The commit this event describes.
    #[serde(flatten)]
    pub commit: CommitRecord,
    /// Net lines (added minus removed) up to and including this commit.
    pub cumulative_lines: i64,
    /// Distinct files across the whole analyzed history.
    pub cumulative_files: usize,
}

/// First and last commit datetimes, `None` for an empty history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Datetime of the oldest commit.
    pub start: Option<String>,
    /// Datetime of the newest commit.
    pub end: Option<String>,
}

/// Summary counts for the artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineMetadata {
    /// Number of commits.
    pub total_commits: usize,
    /// Number of distinct contributor names.
    pub total_contributors: usize,
    /// Number of distinct file paths.
    pub total_files: usize,
    /// Span of the history.
    pub date_range: DateRange,
}

/// The complete timeline document.
///
/// # Examples
///
/// ```
/// use codevis_timeline::builder::build_timeline;
///
/// let artifact = build_timeline(Vec::new(), Default::default(), Default::default());
/// assert_eq!(artifact.metadata.total_commits, 0);
/// assert!(artifact.metadata.date_range.start.is_none());
/// assert!(artifact.timeline.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineArtifact {
    /// Summary counts and date range.
    pub metadata: TimelineMetadata,
    /// One event per commit, oldest first.
    pub timeline: Vec<TimelineEvent>,
    /// Contributor statistics by display name.
    pub contributors: ContributorMap,
    /// File statistics by path.
    pub files: FileMap,
}

impl TimelineArtifact {
    /// Commit records in timeline order.
    pub fn commits(&self) -> impl Iterator<Item = &CommitRecord> {
        self.timeline.iter().map(|event| &event.commit)
    }
}

/// Build the timeline artifact from chronologically sorted records.
///
/// Never fails: an empty history yields zero counts, empty collections and a
/// date range of `None`s.
pub fn build_timeline(
    records: Vec<CommitRecord>,
    contributors: ContributorMap,
    files: FileMap,
) -> TimelineArtifact {
    let cumulative_files = files.len();
    let date_range = DateRange {
        start: records.first().map(|r| r.datetime.clone()),
        end: records.last().map(|r| r.datetime.clone()),
    };
    let metadata = TimelineMetadata {
        total_commits: records.len(),
        total_contributors: contributors.len(),
        total_files: files.len(),
        date_range,
    };

    let mut cumulative_lines = 0i64;
    let timeline = records
        .into_iter()
        .map(|commit| {
            cumulative_lines += commit.net_lines();
            TimelineEvent {
                commit,
                cumulative_lines,
                cumulative_files,
            }
        })
        .collect();

    TimelineArtifact {
        metadata,
        timeline,
        contributors,
        files,
    }
}

/// Like [`build_timeline`], but optionally insists on at least one commit.
///
/// # Errors
///
/// Returns [`CodevisError::EmptyHistory`] naming `repo_path` when
/// `require_commits` is set and `records` is empty.
pub fn build_timeline_checked(
    repo_path: &Path,
    records: Vec<CommitRecord>,
    contributors: ContributorMap,
    files: FileMap,
    require_commits: bool,
) -> Result<TimelineArtifact, CodevisError> {
    if require_commits && records.is_empty() {
        return Err(CodevisError::EmptyHistory(repo_path.to_path_buf()));
    }
    Ok(build_timeline(records, contributors, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use codevis_core::ChangeType;
    use codevis_history::contributors::aggregate_contributors;
    use codevis_history::files::aggregate_files;
    use codevis_history::record::FileChange;

    fn make_commit(hash: &str, timestamp: i64, files: Vec<(&str, u64, u64)>) -> CommitRecord {
        let when = FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_opt(timestamp, 0)
            .unwrap();
        CommitRecord::new(
            hash.into(),
            "Test User".into(),
            "test@example.com".into(),
            when,
            format!("commit {hash}"),
            files
                .into_iter()
                .map(|(path, added, removed)| FileChange {
                    filename: path.into(),
                    old_path: Some(path.into()),
                    new_path: Some(path.into()),
                    change_type: ChangeType::Modify,
                    lines_added: added,
                    lines_removed: removed,
                    complexity: 0,
                })
                .collect(),
        )
    }

    fn build(records: Vec<CommitRecord>) -> TimelineArtifact {
        let contributors = aggregate_contributors(&records);
        let files = aggregate_files(&records);
        build_timeline(records, contributors, files)
    }

    #[test]
    fn cumulative_lines_is_a_running_net_total() {
        let artifact = build(vec![
            make_commit("a", 1000, vec![("README.md", 3, 0)]),
            make_commit("b", 2000, vec![("main.py", 1, 0)]),
            make_commit("c", 3000, vec![("main.py", 1, 0)]),
            make_commit("d", 4000, vec![("main.py", 0, 2)]),
        ]);
        let running: Vec<_> = artifact.timeline.iter().map(|e| e.cumulative_lines).collect();
        assert_eq!(running, vec![3, 4, 5, 3]);
    }

    #[test]
    fn cumulative_lines_can_go_negative() {
        let artifact = build(vec![make_commit("a", 1000, vec![("gen.rs", 0, 10)])]);
        assert_eq!(artifact.timeline[0].cumulative_lines, -10);
    }

    #[test]
    fn cumulative_files_is_the_final_total_on_every_event() {
        let artifact = build(vec![
            make_commit("a", 1000, vec![("a.rs", 1, 0)]),
            make_commit("b", 2000, vec![("b.rs", 1, 0)]),
            make_commit("c", 3000, vec![("c.rs", 1, 0)]),
        ]);
        assert!(artifact.timeline.iter().all(|e| e.cumulative_files == 3));
    }

    #[test]
    fn metadata_counts_and_date_range() {
        let artifact = build(vec![
            make_commit("a", 1_700_000_000, vec![("a.rs", 1, 0)]),
            make_commit("b", 1_700_086_400, vec![("a.rs", 1, 0), ("b.rs", 2, 0)]),
        ]);
        let meta = &artifact.metadata;
        assert_eq!(meta.total_commits, 2);
        assert_eq!(meta.total_contributors, 1);
        assert_eq!(meta.total_files, 2);
        assert_eq!(meta.date_range.start.as_deref(), Some("2023-11-14T22:13:20+00:00"));
        assert_eq!(meta.date_range.end.as_deref(), Some("2023-11-15T22:13:20+00:00"));
    }

    #[test]
    fn events_keep_input_order() {
        let artifact = build(vec![
            make_commit("a", 1000, vec![]),
            make_commit("b", 2000, vec![]),
            make_commit("c", 2000, vec![]),
        ]);
        let hashes: Vec<_> = artifact.commits().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_history_gives_empty_artifact() {
        let artifact = build(Vec::new());
        assert_eq!(artifact.metadata.total_commits, 0);
        assert_eq!(artifact.metadata.total_contributors, 0);
        assert_eq!(artifact.metadata.total_files, 0);
        assert_eq!(artifact.metadata.date_range, DateRange::default());
        assert!(artifact.timeline.is_empty());
        assert!(artifact.contributors.is_empty());
        assert!(artifact.files.is_empty());

        let json = serde_json::to_value(&artifact).unwrap();
        assert!(json["metadata"]["date_range"]["start"].is_null());
        assert!(json["metadata"]["date_range"]["end"].is_null());
    }

    #[test]
    fn checked_build_rejects_empty_history_only_when_required() {
        let path = Path::new("/repos/fresh");
        let err = build_timeline_checked(path, Vec::new(), Default::default(), Default::default(), true)
            .unwrap_err();
        assert!(matches!(err, CodevisError::EmptyHistory(_)));

        let ok = build_timeline_checked(path, Vec::new(), Default::default(), Default::default(), false);
        assert!(ok.is_ok());
    }

    #[test]
    fn event_serializes_commit_fields_inline() {
        let artifact = build(vec![make_commit("a", 1000, vec![("a.rs", 2, 1)])]);
        let json = serde_json::to_value(&artifact).unwrap();
        let event = &json["timeline"][0];
        for key in [
            "hash",
            "author",
            "email",
            "timestamp",
            "datetime",
            "message",
            "files_changed",
            "lines_added",
            "lines_removed",
            "total_files",
            "cumulative_lines",
            "cumulative_files",
        ] {
            assert!(event.get(key).is_some(), "missing {key}");
        }
        assert!(event.get("commit").is_none());
        assert_eq!(event["cumulative_lines"], 1);
    }
}
