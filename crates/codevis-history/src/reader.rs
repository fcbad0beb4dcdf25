//! The history reader seam and its git2-backed implementation.
//!
//! A [`HistoryReader`] supplies raw commits in whatever order is natural for
//! it; [`crate::traverse`] establishes chronological order afterwards. Any
//! source that can fill in [`RawCommit`] is substitutable.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use codevis_core::{ChangeType, CodevisError, ExtractionWarning, WarningKind};
use git2::{Delta, DiffFile, DiffFindOptions, DiffOptions, ErrorCode, Oid, Patch, Repository};
use tracing::debug;

/// A commit as supplied by a history reader.
#[derive(Debug, Clone)]
pub struct RawCommit {
    /// Full commit hash.
    pub hash: String,
    /// Author display name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Author time including the author's UTC offset.
    pub author_time: DateTime<FixedOffset>,
    /// Commit message.
    pub message: String,
    /// Changed files in diff order.
    pub modifications: Vec<RawModification>,
}

/// One changed file as supplied by a history reader.
///
/// Numeric fields are `None` when the reader could not compute them.
///
/// # Examples
///
/// ```
/// use codevis_core::ChangeType;
/// use codevis_history::reader::RawModification;
///
/// let m = RawModification {
///     old_path: Some("old.rs".into()),
///     new_path: Some("new.rs".into()),
///     change_type: ChangeType::Rename,
///     added_lines: Some(0),
///     removed_lines: Some(0),
///     complexity: None,
/// };
/// assert_eq!(m.path(), "new.rs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModification {
    /// Path before the change.
    pub old_path: Option<String>,
    /// Path after the change.
    pub new_path: Option<String>,
    /// Diff engine classification.
    pub change_type: ChangeType,
    /// Lines added, if known.
    pub added_lines: Option<u64>,
    /// Lines removed, if known.
    pub removed_lines: Option<u64>,
    /// Complexity metric, if the reader computes one.
    pub complexity: Option<u64>,
}

impl RawModification {
    /// The path that names this file: the new path, or the old one for deletions.
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or("")
    }
}

/// Everything a reader produced in one pass.
#[derive(Debug, Clone, Default)]
pub struct RawHistory {
    /// Commits in reader-native order.
    pub commits: Vec<RawCommit>,
    /// Files whose diff could not be read line by line.
    pub warnings: Vec<ExtractionWarning>,
}

/// A source of raw commit history.
pub trait HistoryReader {
    /// Read every commit reachable from the reader's starting point.
    ///
    /// # Errors
    ///
    /// Returns a [`CodevisError`] if the history cannot be walked. Per-file
    /// diff problems are reported as warnings instead.
    fn read_history(&self) -> Result<RawHistory, CodevisError>;
}

/// Options for [`GitHistoryReader`].
///
/// # Examples
///
/// ```
/// use codevis_history::reader::ReaderOptions;
///
/// let opts = ReaderOptions::default();
/// assert!(opts.branch.is_none());
/// assert!(opts.detect_renames);
/// ```
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
    /// Pair deletions with additions as renames (default: true).
    pub detect_renames: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            branch: None,
            detect_renames: true,
        }
    }
}

/// Reads history from a local git repository via libgit2.
pub struct GitHistoryReader {
    repo: Repository,
    path: PathBuf,
    options: ReaderOptions,
}

impl GitHistoryReader {
    /// Open the repository rooted at `path`.
    ///
    /// The location is validated before anything is read: it must exist and
    /// contain a `.git` metadata directory.
    ///
    /// # Errors
    ///
    /// Returns [`CodevisError::RepositoryNotFound`] if the path is missing,
    /// is not a repository root, or cannot be opened.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use codevis_history::reader::{GitHistoryReader, HistoryReader, ReaderOptions};
    ///
    /// let reader = GitHistoryReader::open(Path::new("."), ReaderOptions::default()).unwrap();
    /// let history = reader.read_history().unwrap();
    /// println!("{} commits", history.commits.len());
    /// ```
    pub fn open(path: &Path, options: ReaderOptions) -> Result<Self, CodevisError> {
        let not_found = |reason: String| CodevisError::RepositoryNotFound {
            path: path.to_path_buf(),
            reason,
        };

        if !path.exists() {
            return Err(not_found("path does not exist".into()));
        }
        if !path.join(".git").exists() {
            return Err(not_found("not a git repository (no .git found)".into()));
        }

        let repo = Repository::open(path).map_err(|e| not_found(e.message().to_string()))?;
        debug!(path = %path.display(), "opened repository");

        Ok(Self {
            repo,
            path: path.to_path_buf(),
            options,
        })
    }

    /// Repository root this reader was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the commit the walk starts from, or `None` for an unborn HEAD.
    fn resolve_tip(&self) -> Result<Option<Oid>, CodevisError> {
        if let Some(ref branch) = self.options.branch {
            let reference = self
                .repo
                .resolve_reference_from_short_name(branch)
                .map_err(|e| CodevisError::Git(format!("failed to resolve branch '{branch}': {e}")))?;
            let commit = reference
                .peel_to_commit()
                .map_err(|e| CodevisError::Git(format!("branch '{branch}' has no commit: {e}")))?;
            return Ok(Some(commit.id()));
        }

        match self.repo.head() {
            Ok(head) => {
                let commit = head
                    .peel_to_commit()
                    .map_err(|e| CodevisError::Git(format!("HEAD has no commit: {e}")))?;
                Ok(Some(commit.id()))
            }
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(CodevisError::Git(format!("failed to read HEAD: {e}"))),
        }
    }

    fn read_commit(
        &self,
        commit: &git2::Commit,
        warnings: &mut Vec<ExtractionWarning>,
    ) -> Result<RawCommit, CodevisError> {
        let hash = commit.id().to_string();
        let author = commit.author();
        let author_time = author_time(&author.when()).ok_or_else(|| {
            CodevisError::Git(format!("commit {hash} has an out-of-range author time"))
        })?;
        let message = String::from_utf8_lossy(commit.message_bytes())
            .trim_end_matches(|c: char| c == '\n' || c == '\r')
            .to_string();
        let modifications = self.read_modifications(commit, &hash, warnings)?;

        Ok(RawCommit {
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            hash,
            author_time,
            message,
            modifications,
        })
    }

    fn read_modifications(
        &self,
        commit: &git2::Commit,
        hash: &str,
        warnings: &mut Vec<ExtractionWarning>,
    ) -> Result<Vec<RawModification>, CodevisError> {
        // Merge commits report no file changes of their own.
        if commit.parent_count() > 1 {
            return Ok(Vec::new());
        }

        let commit_tree = commit
            .tree()
            .map_err(|e| CodevisError::Git(format!("failed to get commit tree: {e}")))?;

        let parent_tree = if commit.parent_count() == 1 {
            let parent = commit
                .parent(0)
                .map_err(|e| CodevisError::Git(format!("failed to get parent: {e}")))?;
            Some(
                parent
                    .tree()
                    .map_err(|e| CodevisError::Git(format!("failed to get parent tree: {e}")))?,
            )
        } else {
            None
        };

        let mut diff_opts = DiffOptions::new();
        let mut diff = self
            .repo
            .diff_tree_to_tree(
                parent_tree.as_ref(),
                Some(&commit_tree),
                Some(&mut diff_opts),
            )
            .map_err(|e| CodevisError::Git(format!("failed to compute diff: {e}")))?;

        if self.options.detect_renames {
            let mut find_opts = DiffFindOptions::new();
            find_opts.renames(true);
            diff.find_similar(Some(&mut find_opts))
                .map_err(|e| CodevisError::Git(format!("failed to find renames: {e}")))?;
        }

        let mut modifications = Vec::with_capacity(diff.deltas().len());
        for (idx, delta) in diff.deltas().enumerate() {
            let change_type = classify(delta.status());
            let old_path = match change_type {
                ChangeType::Add => None,
                _ => file_path(&delta.old_file()),
            };
            let new_path = match change_type {
                ChangeType::Delete => None,
                _ => file_path(&delta.new_file()),
            };

            let mut modification = RawModification {
                old_path,
                new_path,
                change_type,
                added_lines: None,
                removed_lines: None,
                complexity: None,
            };

            let path = modification.path().to_string();
            let warning = |kind: WarningKind, reason: String| ExtractionWarning {
                commit: hash.to_string(),
                path: path.clone(),
                kind,
                reason,
            };

            match Patch::from_diff(&diff, idx) {
                Ok(Some(patch)) if patch.delta().flags().is_binary() => {
                    warnings.push(warning(WarningKind::Binary, "binary content".into()));
                }
                Ok(Some(patch)) => match patch.line_stats() {
                    Ok((_, added, removed)) => {
                        modification.added_lines = Some(added as u64);
                        modification.removed_lines = Some(removed as u64);
                    }
                    Err(e) => warnings.push(warning(
                        WarningKind::Unreadable,
                        format!("failed to count lines: {e}"),
                    )),
                },
                Ok(None) => {
                    warnings.push(warning(WarningKind::Binary, "no textual patch".into()));
                }
                Err(e) => warnings.push(warning(
                    WarningKind::Unreadable,
                    format!("failed to build patch: {e}"),
                )),
            }

            modifications.push(modification);
        }

        Ok(modifications)
    }
}

impl HistoryReader for GitHistoryReader {
    fn read_history(&self) -> Result<RawHistory, CodevisError> {
        let mut history = RawHistory::default();

        let Some(tip) = self.resolve_tip()? else {
            debug!(path = %self.path.display(), "HEAD is unborn, history is empty");
            return Ok(history);
        };

        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| CodevisError::Git(format!("failed to create revwalk: {e}")))?;
        revwalk
            .push(tip)
            .map_err(|e| CodevisError::Git(format!("failed to push oid: {e}")))?;

        for oid_result in revwalk {
            let oid = oid_result.map_err(|e| CodevisError::Git(format!("revwalk error: {e}")))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| CodevisError::Git(format!("failed to find commit: {e}")))?;
            let raw = self.read_commit(&commit, &mut history.warnings)?;
            history.commits.push(raw);
        }

        debug!(
            commits = history.commits.len(),
            warnings = history.warnings.len(),
            "read repository history"
        );
        Ok(history)
    }
}

fn classify(status: Delta) -> ChangeType {
    match status {
        Delta::Added => ChangeType::Add,
        Delta::Deleted => ChangeType::Delete,
        Delta::Modified | Delta::Typechange => ChangeType::Modify,
        Delta::Renamed => ChangeType::Rename,
        Delta::Copied => ChangeType::Copy,
        _ => ChangeType::Unknown,
    }
}

fn file_path(file: &DiffFile<'_>) -> Option<String> {
    file.path().map(|p| p.to_string_lossy().into_owned())
}

fn author_time(time: &git2::Time) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0).map(|utc| utc.with_timezone(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_options_defaults_are_correct() {
        let opts = ReaderOptions::default();
        assert!(opts.branch.is_none());
        assert!(opts.detect_renames);
    }

    #[test]
    fn delta_status_maps_to_change_type() {
        assert_eq!(classify(Delta::Added), ChangeType::Add);
        assert_eq!(classify(Delta::Deleted), ChangeType::Delete);
        assert_eq!(classify(Delta::Modified), ChangeType::Modify);
        assert_eq!(classify(Delta::Typechange), ChangeType::Modify);
        assert_eq!(classify(Delta::Renamed), ChangeType::Rename);
        assert_eq!(classify(Delta::Copied), ChangeType::Copy);
        assert_eq!(classify(Delta::Conflicted), ChangeType::Unknown);
        assert_eq!(classify(Delta::Unreadable), ChangeType::Unknown);
    }

    #[test]
    fn author_time_keeps_offset() {
        let time = git2::Time::new(1_700_000_000, 120);
        let dt = author_time(&time).unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(dt.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn modification_path_falls_back_to_old_path() {
        let deleted = RawModification {
            old_path: Some("gone.rs".into()),
            new_path: None,
            change_type: ChangeType::Delete,
            added_lines: Some(0),
            removed_lines: Some(12),
            complexity: None,
        };
        assert_eq!(deleted.path(), "gone.rs");
    }

    #[test]
    fn missing_path_is_repository_not_found() {
        let err = GitHistoryReader::open(
            Path::new("/definitely/not/a/real/path/for/codevis"),
            ReaderOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, CodevisError::RepositoryNotFound { .. }));
    }
}
