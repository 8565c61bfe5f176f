//! Credit score file reader
//!
//! Opens the delimited file, parses the header and data rows, and classifies
//! failures into the two outcomes the endpoint reports.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use hyper::StatusCode;
use thiserror::Error;

use super::record::{ColumnLayout, Record};
use crate::config::RaggedRowPolicy;

pub const NOT_FOUND_MESSAGE: &str = "CSV file not found";
pub const READ_FAILED_MESSAGE: &str = "Error reading CSV file";

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("malformed CSV: {0}")]
    Parse(#[from] csv::Error),
    #[error("failed to open CSV file: {0}")]
    Io(#[from] io::Error),
}

impl ReadError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Parse(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed message returned to the client
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => NOT_FOUND_MESSAGE,
            Self::Parse(_) | Self::Io(_) => READ_FAILED_MESSAGE,
        }
    }
}

/// Open, parse and close the file at `path`
pub fn read_records(path: &Path, policy: RaggedRowPolicy) -> Result<Vec<Record>, ReadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ReadError::NotFound(path.to_path_buf()),
        _ => ReadError::Io(e),
    })?;

    parse_records(file, policy)
}

/// Parse a header row followed by data rows.
///
/// Blank lines are skipped. Rows whose field count differs from the header
/// fail under `Reject`; under `Pad` they are padded with `""` or truncated.
pub fn parse_records<R: Read>(source: R, policy: RaggedRowPolicy) -> Result<Vec<Record>, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(policy == RaggedRowPolicy::Pad)
        .from_reader(source);

    let layout = ColumnLayout::from_headers(reader.headers()?.iter());

    reader
        .records()
        .map(|row| {
            let row = row?;
            Ok(layout.record(|i| row.get(i)))
        })
        .collect()
}
