//! Persisting timeline artifacts.
//!
//! Both writers create missing parent directories and write through a
//! sibling temporary file that is renamed into place, so a failed export
//! never leaves a truncated document at the destination.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use codevis_core::CodevisError;
use codevis_history::record::CommitRecord;
use serde::Serialize;
use tracing::info;

use crate::builder::TimelineArtifact;

/// Column order of the tabular export.
pub const CSV_COLUMNS: [&str; 9] = [
    "hash",
    "author",
    "email",
    "timestamp",
    "datetime",
    "message",
    "lines_added",
    "lines_removed",
    "total_files",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    hash: &'a str,
    author: &'a str,
    email: &'a str,
    timestamp: f64,
    datetime: &'a str,
    message: &'a str,
    lines_added: u64,
    lines_removed: u64,
    total_files: usize,
}

impl<'a> From<&'a CommitRecord> for CsvRow<'a> {
    fn from(record: &'a CommitRecord) -> Self {
        Self {
            hash: &record.hash,
            author: &record.author_name,
            email: &record.author_email,
            timestamp: record.timestamp,
            datetime: &record.datetime,
            message: &record.message,
            lines_added: record.lines_added,
            lines_removed: record.lines_removed,
            total_files: record.total_files,
        }
    }
}

/// Write `artifact` as pretty-printed JSON to `path`.
///
/// The output is deterministic: exporting the same artifact twice produces
/// identical bytes.
///
/// # Errors
///
/// Returns [`CodevisError::Write`] with the destination path if any
/// directory creation, write or rename fails.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use codevis_timeline::builder::build_timeline;
/// use codevis_timeline::export::export_json;
///
/// let artifact = build_timeline(Vec::new(), Default::default(), Default::default());
/// export_json(&artifact, Path::new("out/timeline.json")).unwrap();
/// ```
pub fn export_json(artifact: &TimelineArtifact, path: &Path) -> Result<(), CodevisError> {
    write_atomically(path, |out| {
        serde_json::to_writer_pretty(&mut *out, artifact)?;
        out.write_all(b"\n")
    })?;
    info!(path = %path.display(), commits = artifact.metadata.total_commits, "exported timeline");
    Ok(())
}

/// Write one CSV row per commit to `path`, preceded by [`CSV_COLUMNS`].
///
/// File-level detail is not part of the tabular form. The header is written
/// even when there are no commits.
///
/// # Errors
///
/// Returns [`CodevisError::Write`] with the destination path on failure.
pub fn export_csv<'a, I>(commits: I, path: &Path) -> Result<(), CodevisError>
where
    I: IntoIterator<Item = &'a CommitRecord>,
{
    let mut rows = 0usize;
    write_atomically(path, |out| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut *out);
        writer.write_record(CSV_COLUMNS)?;
        for record in commits {
            writer.serialize(CsvRow::from(record))?;
            rows += 1;
        }
        writer.flush()
    })?;
    info!(path = %path.display(), rows, "exported commit table");
    Ok(())
}

/// Read a previously exported timeline document.
///
/// # Errors
///
/// Returns [`CodevisError::FileNotFound`] if `path` does not exist,
/// [`CodevisError::Io`] if it cannot be read, or
/// [`CodevisError::Serialization`] if it is not a timeline document.
pub fn load_artifact(path: &Path) -> Result<TimelineArtifact, CodevisError> {
    if !path.exists() {
        return Err(CodevisError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let artifact = serde_json::from_str(&content)?;
    Ok(artifact)
}

fn write_atomically<F>(path: &Path, write: F) -> Result<(), CodevisError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CodevisError::write(path, e))?;
    }

    let tmp = temp_path(path);
    let result = File::create(&tmp).and_then(|file| {
        let mut out = BufWriter::new(file);
        write(&mut out)?;
        out.flush()?;
        drop(out);
        fs::rename(&tmp, path)
    });

    result.map_err(|e| {
        let _ = fs::remove_file(&tmp);
        CodevisError::write(path, e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}
