//! Timeline assembly and export.
//!
//! Merges chronologically ordered commit records with running totals into a
//! [`builder::TimelineArtifact`], persists it as JSON or a flat CSV summary,
//! and wires the whole analysis together in [`pipeline`].

pub mod builder;
pub mod export;
pub mod pipeline;
