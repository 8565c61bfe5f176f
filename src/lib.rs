//! Read-only HTTP service that serves the rows of a local CSV file as JSON.
//!
//! `GET /api/credit-score` re-reads the configured file on every request and
//! answers with a JSON array of row objects keyed by the header columns.

pub mod config;
pub mod credit_score;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
