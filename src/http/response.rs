//! HTTP response building module
//!
//! Builders for the JSON and status responses served by the router.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::HttpConfig;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Build JSON response, pretty-printed when `pretty` is set
#[must_use]
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
    pretty: bool,
) -> Response<Full<Bytes>> {
    let serialized = if pretty {
        serde_json::to_vec_pretty(body)
    } else {
        serde_json::to_vec(body)
    };

    let json = match serialized {
        Ok(j) => j,
        Err(e) => {
            log_build_error("JSON", &e);
            return build_500_response();
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", JSON_CONTENT_TYPE)
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            build_500_response()
        })
}

/// JSON error body `{"error": message}`
#[must_use]
pub fn json_error(status: StatusCode, message: &str, pretty: bool) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }), pretty)
}

/// Build 404 Not Found response for unknown paths
#[must_use]
pub fn build_404_response(pretty: bool) -> Response<Full<Bytes>> {
    json_error(StatusCode::NOT_FOUND, "Not Found", pretty)
}

/// Build 405 Method Not Allowed response
#[must_use]
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response (preflight request)
#[must_use]
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", "GET, HEAD, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build health probe response `{"status": ...}`
#[must_use]
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({ "status": status }), false)
}

/// Plain 500 used when a response cannot be built or serialized
fn build_500_response() -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(
        r#"{"error":"Internal server error"}"#,
    )));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp.headers_mut()
        .insert("Content-Type", HeaderValue::from_static(JSON_CONTENT_TYPE));
    resp
}

/// Apply headers common to every response; HEAD keeps `Content-Length` but drops the body
#[must_use]
pub fn finalize(
    resp: Response<Full<Bytes>>,
    http_config: &HttpConfig,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let (mut parts, body) = resp.into_parts();

    if let Ok(name) = HeaderValue::from_str(&http_config.server_name) {
        parts.headers.insert(SERVER, name);
    }
    if http_config.enable_cors {
        parts
            .headers
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }

    if !is_head {
        return Response::from_parts(parts, body);
    }

    let len = hyper::body::Body::size_hint(&body).exact().unwrap_or(0);
    parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    Response::from_parts(parts, Full::new(Bytes::new()))
}

/// Log response build error
fn log_build_error(status: &str, error: &impl std::fmt::Display) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
