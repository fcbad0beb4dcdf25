//! Git history traversal and aggregation.
//!
//! Reads the full commit ancestry of a repository through a pluggable
//! [`reader::HistoryReader`], normalizes every commit into a
//! [`record::CommitRecord`], orders the records chronologically, and folds
//! them into per-contributor and per-file statistics.

pub mod contributors;
pub mod extract;
pub mod files;
pub mod reader;
pub mod record;
pub mod traverse;
