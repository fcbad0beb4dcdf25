//! Core types, configuration, and error handling for codevis.
//!
//! This crate provides the shared foundation used by all other codevis crates:
//! - [`CodevisError`]: unified error type using `thiserror` and `miette`
//! - [`ExtractionWarning`]: a recoverable per-file extraction anomaly
//! - [`CodevisConfig`]: configuration loaded from `.codevis.toml`
//! - Shared types: [`ChangeType`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{AnalyzeConfig, CodevisConfig, ServeConfig};
pub use error::{CodevisError, ExtractionWarning, WarningKind};
pub use types::{ChangeType, OutputFormat};

/// A convenience `Result` type for codevis operations.
pub type Result<T> = std::result::Result<T, CodevisError>;
