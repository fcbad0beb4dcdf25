use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification of a file's modification within a commit.
///
/// Passed through unchanged from the diff engine and serialized as the
/// upper-case name (`"ADD"`, `"RENAME"`, ...).
///
/// # Examples
///
/// ```
/// use codevis_core::ChangeType;
///
/// let ct: ChangeType = serde_json::from_str("\"RENAME\"").unwrap();
/// assert_eq!(ct, ChangeType::Rename);
/// assert_eq!(ct.to_string(), "RENAME");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    /// New file.
    Add,
    /// File removed.
    Delete,
    /// Existing file modified in place.
    Modify,
    /// File moved to a new path.
    Rename,
    /// File copied from another path.
    Copy,
    /// Anything the diff engine could not classify.
    Unknown,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Add => write!(f, "ADD"),
            ChangeType::Delete => write!(f, "DELETE"),
            ChangeType::Modify => write!(f, "MODIFY"),
            ChangeType::Rename => write!(f, "RENAME"),
            ChangeType::Copy => write!(f, "COPY"),
            ChangeType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Output format for CLI summaries.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use codevis_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
