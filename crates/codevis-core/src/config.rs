use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CodevisError;

/// Top-level configuration loaded from `.codevis.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use codevis_core::CodevisConfig;
///
/// let config = CodevisConfig::default();
/// assert_eq!(config.serve.port, 3001);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodevisConfig {
    /// History analysis settings.
    #[serde(default)]
    pub analyze: AnalyzeConfig,
    /// Timeline server settings.
    #[serde(default)]
    pub serve: ServeConfig,
}

impl CodevisConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CodevisError::Io`] if the file cannot be read, or
    /// [`CodevisError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use codevis_core::CodevisConfig;
    /// use std::path::Path;
    ///
    /// let config = CodevisConfig::from_file(Path::new(".codevis.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CodevisError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CodevisError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use codevis_core::CodevisConfig;
    ///
    /// let toml = r#"
    /// [serve]
    /// port = 8080
    /// "#;
    /// let config = CodevisConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.serve.port, 8080);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CodevisError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Settings for the `analyze` command.
///
/// # Examples
///
/// ```
/// use codevis_core::AnalyzeConfig;
///
/// let config = AnalyzeConfig::default();
/// assert_eq!(config.output.to_str(), Some("timeline.json"));
/// assert!(config.detect_renames);
/// assert!(!config.require_commits);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    /// Destination of the structured timeline document (default: `timeline.json`).
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Optional destination for the per-commit CSV summary.
    pub csv_output: Option<PathBuf>,
    /// Branch to walk instead of HEAD.
    pub branch: Option<String>,
    /// Fail instead of writing an empty timeline when there are no commits.
    #[serde(default)]
    pub require_commits: bool,
    /// Let the diff engine pair deletions with additions as renames (default: true).
    #[serde(default = "default_detect_renames")]
    pub detect_renames: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("timeline.json")
}

fn default_detect_renames() -> bool {
    true
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            csv_output: None,
            branch: None,
            require_commits: false,
            detect_renames: default_detect_renames(),
        }
    }
}

/// Settings for the `serve` command.
///
/// # Examples
///
/// ```
/// use codevis_core::ServeConfig;
///
/// let config = ServeConfig::default();
/// assert_eq!(config.port, 3001);
/// assert_eq!(config.bind, "127.0.0.1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// TCP port to listen on (default: 3001).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Address to bind (default: `127.0.0.1`).
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Timeline document to serve (default: `timeline.json`).
    #[serde(default = "default_output")]
    pub data: PathBuf,
}

fn default_port() -> u16 {
    3001
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            data: default_output(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = CodevisConfig::default();
        assert_eq!(config.analyze.output, PathBuf::from("timeline.json"));
        assert!(config.analyze.csv_output.is_none());
        assert!(config.analyze.branch.is_none());
        assert!(!config.analyze.require_commits);
        assert!(config.analyze.detect_renames);
        assert_eq!(config.serve.port, 3001);
        assert_eq!(config.serve.bind, "127.0.0.1");
        assert_eq!(config.serve.data, PathBuf::from("timeline.json"));
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[analyze]
output = "out/history.json"
csv_output = "out/commits.csv"
branch = "develop"
require_commits = true
detect_renames = false

[serve]
port = 9000
bind = "0.0.0.0"
data = "out/history.json"
"#;
        let config = CodevisConfig::from_toml(toml).unwrap();
        assert_eq!(config.analyze.output, PathBuf::from("out/history.json"));
        assert_eq!(
            config.analyze.csv_output,
            Some(PathBuf::from("out/commits.csv"))
        );
        assert_eq!(config.analyze.branch.as_deref(), Some("develop"));
        assert!(config.analyze.require_commits);
        assert!(!config.analyze.detect_renames);
        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.serve.bind, "0.0.0.0");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = CodevisConfig::from_toml("").unwrap();
        assert_eq!(config.serve.port, 3001);
        assert!(config.analyze.detect_renames);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = CodevisConfig::from_toml("[analyze]\nbranch = \"main\"\n").unwrap();
        assert_eq!(config.analyze.branch.as_deref(), Some("main"));
        assert_eq!(config.analyze.output, PathBuf::from("timeline.json"));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = CodevisConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
