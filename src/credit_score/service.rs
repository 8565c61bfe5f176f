//! `GET /api/credit-score` handler
//!
//! Reads the file fresh on every request and maps the outcome to a response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::sync::Arc;

use super::reader::{read_records, ReadError, READ_FAILED_MESSAGE};
use crate::config::AppState;
use crate::http;
use crate::logger;

pub const CREDIT_SCORE_PATH: &str = "/api/credit-score";

pub async fn serve_credit_scores(state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let path = state.csv_path.clone();
    let policy = state.config.data.ragged_rows;
    let debug = state.config.app.debug;

    // csv parsing is synchronous; keep it off the connection task
    let outcome = tokio::task::spawn_blocking(move || read_records(&path, policy)).await;

    match outcome {
        Ok(Ok(records)) => {
            logger::log_debug(&format!(
                "Loaded {} records from {}",
                records.len(),
                state.csv_path.display()
            ));
            http::json_response(StatusCode::OK, &records, debug)
        }
        Ok(Err(err)) => {
            log_read_error(&err, debug);
            http::json_error(err.status(), err.message(), debug)
        }
        Err(e) => {
            logger::log_error(&format!("CSV read task failed: {e}"));
            http::json_error(StatusCode::INTERNAL_SERVER_ERROR, READ_FAILED_MESSAGE, debug)
        }
    }
}

fn log_read_error(err: &ReadError, debug: bool) {
    let message = if debug {
        err.to_string()
    } else {
        err.message().to_string()
    };

    match err {
        ReadError::NotFound(_) => logger::log_warning(&message),
        ReadError::Parse(_) | ReadError::Io(_) => logger::log_error(&message),
    }
}
