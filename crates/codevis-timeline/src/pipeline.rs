//! End-to-end analysis: open, traverse, aggregate, build.

use std::path::Path;

use codevis_core::{AnalyzeConfig, CodevisError, ExtractionWarning, WarningKind};
use codevis_history::contributors::aggregate_contributors;
use codevis_history::files::aggregate_files;
use codevis_history::reader::{GitHistoryReader, HistoryReader, ReaderOptions};
use codevis_history::traverse::traverse;
use tracing::{debug, info, warn};

use crate::builder::{build_timeline_checked, TimelineArtifact};

/// Options controlling one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Passed through to the history reader.
    pub reader: ReaderOptions,
    /// Fail with [`CodevisError::EmptyHistory`] when there are no commits.
    pub require_commits: bool,
}

impl From<&AnalyzeConfig> for AnalyzeOptions {
    fn from(config: &AnalyzeConfig) -> Self {
        Self {
            reader: ReaderOptions {
                branch: config.branch.clone(),
                detect_renames: config.detect_renames,
            },
            require_commits: config.require_commits,
        }
    }
}

/// Result of a successful analysis.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The assembled timeline document.
    pub artifact: TimelineArtifact,
    /// Files whose line counts were zeroed.
    pub warnings: Vec<ExtractionWarning>,
}

/// Analyze the git repository rooted at `repo_path`.
///
/// # Errors
///
/// Returns [`CodevisError::RepositoryNotFound`] for an invalid location,
/// [`CodevisError::Git`] if the history cannot be walked, and
/// [`CodevisError::EmptyHistory`] if commits are required but absent.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use codevis_timeline::pipeline::{analyze_repository, AnalyzeOptions};
///
/// let analysis = analyze_repository(Path::new("."), &AnalyzeOptions::default()).unwrap();
/// println!("{} commits", analysis.artifact.metadata.total_commits);
/// ```
pub fn analyze_repository(
    repo_path: &Path,
    options: &AnalyzeOptions,
) -> Result<Analysis, CodevisError> {
    let reader = GitHistoryReader::open(repo_path, options.reader.clone())?;
    analyze_with_reader(repo_path, &reader, options.require_commits)
}

/// Run the analysis over any [`HistoryReader`].
///
/// `repo_path` is only used to label errors.
///
/// # Errors
///
/// Propagates reader failures and returns [`CodevisError::EmptyHistory`]
/// when `require_commits` is set and nothing was read.
pub fn analyze_with_reader<R>(
    repo_path: &Path,
    reader: &R,
    require_commits: bool,
) -> Result<Analysis, CodevisError>
where
    R: HistoryReader + ?Sized,
{
    let history = traverse(reader)?;

    for warning in &history.warnings {
        match warning.kind {
            WarningKind::Binary => debug!(%warning, "no line counts for binary file"),
            WarningKind::Unreadable => warn!(%warning, "could not diff file"),
        }
    }

    let contributors = aggregate_contributors(&history.records);
    let files = aggregate_files(&history.records);
    let artifact = build_timeline_checked(
        repo_path,
        history.records,
        contributors,
        files,
        require_commits,
    )?;

    info!(
        commits = artifact.metadata.total_commits,
        contributors = artifact.metadata.total_contributors,
        files = artifact.metadata.total_files,
        "analysis complete"
    );

    Ok(Analysis {
        artifact,
        warnings: history.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use codevis_core::ChangeType;
    use codevis_history::reader::{RawCommit, RawHistory, RawModification};

    struct FixedReader(RawHistory);

    impl HistoryReader for FixedReader {
        fn read_history(&self) -> Result<RawHistory, CodevisError> {
            Ok(self.0.clone())
        }
    }

    fn raw(hash: &str, seconds: i64, path: &str, added: u64) -> RawCommit {
        RawCommit {
            hash: hash.into(),
            author_name: "Test User".into(),
            author_email: "test@example.com".into(),
            author_time: FixedOffset::east_opt(0)
                .unwrap()
                .timestamp_opt(seconds, 0)
                .unwrap(),
            message: format!("commit {hash}"),
            modifications: vec![RawModification {
                old_path: None,
                new_path: Some(path.into()),
                change_type: ChangeType::Add,
                added_lines: Some(added),
                removed_lines: Some(0),
                complexity: None,
            }],
        }
    }

    #[test]
    fn options_follow_config() {
        let config = AnalyzeConfig {
            branch: Some("develop".into()),
            detect_renames: false,
            require_commits: true,
            ..AnalyzeConfig::default()
        };
        let options = AnalyzeOptions::from(&config);
        assert_eq!(options.reader.branch.as_deref(), Some("develop"));
        assert!(!options.reader.detect_renames);
        assert!(options.require_commits);
    }

    #[test]
    fn reader_order_does_not_matter() {
        let reader = FixedReader(RawHistory {
            commits: vec![
                raw("c", 3000, "main.py", 1),
                raw("a", 1000, "README.md", 3),
                raw("b", 2000, "main.py", 1),
            ],
            warnings: vec![],
        });
        let analysis = analyze_with_reader(Path::new("repo"), &reader, false).unwrap();
        let artifact = analysis.artifact;

        let hashes: Vec<_> = artifact.commits().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "b", "c"]);
        assert_eq!(artifact.metadata.total_commits, 3);
        assert_eq!(artifact.metadata.total_files, 2);
        assert_eq!(artifact.contributors["Test User"].commits, 3);
        assert_eq!(artifact.files["main.py"].changes, 2);
        assert_eq!(artifact.timeline.last().unwrap().cumulative_lines, 5);
    }

    #[test]
    fn warnings_are_passed_through() {
        let reader = FixedReader(RawHistory {
            commits: vec![raw("a", 1000, "logo.png", 0)],
            warnings: vec![ExtractionWarning {
                commit: "a".into(),
                path: "logo.png".into(),
                kind: WarningKind::Binary,
                reason: "binary file".into(),
            }],
        });
        let analysis = analyze_with_reader(Path::new("repo"), &reader, false).unwrap();
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(analysis.warnings[0].kind, WarningKind::Binary);
    }

    #[test]
    fn empty_history_is_allowed_unless_required() {
        let reader = FixedReader(RawHistory::default());
        let analysis = analyze_with_reader(Path::new("repo"), &reader, false).unwrap();
        assert_eq!(analysis.artifact.metadata.total_commits, 0);
        assert!(analysis.artifact.metadata.date_range.start.is_none());

        let err = analyze_with_reader(Path::new("repo"), &reader, true).unwrap_err();
        assert!(matches!(err, CodevisError::EmptyHistory(_)));
    }

    #[test]
    fn missing_repository_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = analyze_repository(&dir.path().join("nope"), &AnalyzeOptions::default())
            .unwrap_err();
        assert!(matches!(err, CodevisError::RepositoryNotFound { .. }));
    }
}
