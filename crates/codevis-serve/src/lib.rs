//! HTTP boundary serving an exported timeline document.
//!
//! The server never recomputes anything: each request reads the document
//! from disk and returns it as-is.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), codevis_core::CodevisError> {
//! codevis_serve::server::run_server("127.0.0.1", 3001, PathBuf::from("timeline.json")).await?;
//! # Ok(())
//! # }
//! ```

pub mod server;
