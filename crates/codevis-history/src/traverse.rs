//! Chronological history traversal.
//!
//! Drives a [`HistoryReader`] over the full ancestry, extracts one record per
//! commit and sorts the result oldest-first, independent of the order the
//! reader produced.

use codevis_core::{CodevisError, ExtractionWarning};
use tracing::debug;

use crate::extract::extract_commit;
use crate::reader::HistoryReader;
use crate::record::CommitRecord;

/// Extracted history, ready for aggregation.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Commit records sorted by ascending timestamp.
    pub records: Vec<CommitRecord>,
    /// Files whose line counts were zeroed during extraction.
    pub warnings: Vec<ExtractionWarning>,
}

/// Read, extract and order the full history exposed by `reader`.
///
/// Either the whole history is returned or an error is; there is no partial
/// result.
///
/// # Errors
///
/// Propagates any [`CodevisError`] raised by the reader.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use codevis_history::reader::{GitHistoryReader, ReaderOptions};
/// use codevis_history::traverse::traverse;
///
/// let reader = GitHistoryReader::open(Path::new("."), ReaderOptions::default()).unwrap();
/// let history = traverse(&reader).unwrap();
/// for r in &history.records {
///     println!("{} {} {}", r.datetime, &r.hash[..7], r.author_name);
/// }
/// ```
pub fn traverse<R>(reader: &R) -> Result<History, CodevisError>
where
    R: HistoryReader + ?Sized,
{
    let raw = reader.read_history()?;
    let mut records: Vec<CommitRecord> = raw.commits.iter().map(extract_commit).collect();
    sort_chronologically(&mut records);
    debug!(commits = records.len(), "extracted commit records");

    Ok(History {
        records,
        warnings: raw.warnings,
    })
}

/// Sort records by ascending timestamp.
///
/// The sort is stable, so commits sharing a timestamp keep reader order.
pub fn sort_chronologically(records: &mut [CommitRecord]) {
    records.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}
