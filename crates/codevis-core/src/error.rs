use std::fmt;
use std::path::PathBuf;

/// Errors that can occur across codevis.
///
/// Library crates return this type directly; the binary surfaces it as a
/// `miette` diagnostic at the boundary.
///
/// # Examples
///
/// ```
/// use codevis_core::CodevisError;
/// use std::path::PathBuf;
///
/// let err = CodevisError::RepositoryNotFound {
///     path: PathBuf::from("/tmp/nowhere"),
///     reason: "path does not exist".into(),
/// };
/// assert!(err.to_string().contains("/tmp/nowhere"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CodevisError {
    /// The location is missing or is not the root of a git repository.
    #[error("repository not found at {}: {reason}", path.display())]
    #[diagnostic(
        code(codevis::repository_not_found),
        help("point codevis at the root of a git repository (the directory containing .git)")
    )]
    RepositoryNotFound {
        /// Location that was requested.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// A non-empty timeline was required but the history has no commits.
    #[error("no commits found in {}", .0.display())]
    #[diagnostic(
        code(codevis::empty_history),
        help("drop --require-commits to write an empty timeline instead")
    )]
    EmptyHistory(PathBuf),

    /// Writing an output file failed.
    #[error("failed to write {}: {source}", path.display())]
    #[diagnostic(code(codevis::write))]
    Write {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(codevis::io))]
    Io(#[from] std::io::Error),

    /// Git operation failure after the repository was opened.
    #[error("git error: {0}")]
    #[diagnostic(code(codevis::git))]
    Git(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(codevis::config))]
    Config(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(codevis::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(codevis::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(codevis::file_not_found))]
    FileNotFound(PathBuf),
}

impl CodevisError {
    /// Wrap an I/O failure with the destination it was writing to.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// A single file whose diff could not be read.
///
/// Extraction recovers by zeroing the file's numeric fields; the warning is
/// reported so the caller can tell the user, but never aborts a run.
///
/// # Examples
///
/// ```
/// use codevis_core::{ExtractionWarning, WarningKind};
///
/// let warning = ExtractionWarning {
///     commit: "abc123".into(),
///     path: "assets/logo.png".into(),
///     kind: WarningKind::Binary,
///     reason: "binary content".into(),
/// };
/// assert_eq!(warning.to_string(), "abc123: assets/logo.png: binary content");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWarning {
    /// Commit hash the file belongs to.
    pub commit: String,
    /// Path of the file within the commit.
    pub path: String,
    /// Whether the diff was binary or could not be produced at all.
    pub kind: WarningKind,
    /// What went wrong.
    pub reason: String,
}

/// Why a file contributed zeroed line counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Binary content has no line-level diff.
    Binary,
    /// The diff engine failed to produce a patch.
    Unreadable,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.commit, self.path, self.reason)
    }
}
