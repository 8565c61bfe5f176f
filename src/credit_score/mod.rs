//! Credit score reader
//!
//! Serves the rows of the configured delimited file as a JSON array.

pub mod reader;
pub mod record;
pub mod service;

pub use reader::{parse_records, read_records, ReadError};
pub use record::{ColumnLayout, Record};
pub use service::{serve_credit_scores, CREDIT_SCORE_PATH};
