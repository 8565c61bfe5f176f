//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route matching,
//! dispatch and access logging.

use crate::config::AppState;
use crate::credit_score::{self, CREDIT_SCORE_PATH};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let is_head = method == Method::HEAD;

    let response = route_request(&method, &path, &state).await;
    let response = http::finalize(response, &state.config.http, is_head);

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path);
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = format_version(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .or_else(|| hyper::body::Body::size_hint(response.body()).exact())
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0);
        entry.user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
pub async fn route_request(
    method: &Method,
    path: &str,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    let pretty = state.config.app.debug;

    // 1. Check HTTP method
    match *method {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => return http::build_options_response(state.config.http.enable_cors),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            return http::build_405_response();
        }
    }

    // 2. Health check endpoints
    let health = &state.config.routes.health;
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return http::build_health_response("ok");
    }

    // 3. Credit score data
    if path == CREDIT_SCORE_PATH {
        return credit_score::serve_credit_scores(state).await;
    }

    logger::log_debug(&format!("No route for {path}"));
    http::build_404_response(pretty)
}

const fn format_version(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn test_state(csv_path: &std::path::Path) -> Arc<AppState> {
        let mut cfg = Config::load_from("/nonexistent/credit-score-config").unwrap();
        cfg.data.csv_path = csv_path.to_string_lossy().into_owned();
        cfg.logging.access_log = false;
        cfg.app.debug = false;
        Arc::new(AppState::new(&cfg))
    }

    fn request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn body(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_get_credit_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credit_scores.csv");
        std::fs::write(&path, "name,score\nAlice,700\n").unwrap();

        let resp = handle_request(request(Method::GET, "/api/credit-score"), test_state(&path), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["server"], "credit-score-api/0.1");
        assert_eq!(body(resp).await, Bytes::from_static(br#"[{"name":"Alice","score":"700"}]"#));
    }

    #[tokio::test]
    async fn test_query_string_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credit_scores.csv");
        std::fs::write(&path, "name,score\nAlice,700\n").unwrap();

        let resp = handle_request(
            request(Method::GET, "/api/credit-score?limit=0"),
            test_state(&path),
            peer(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, Bytes::from_static(br#"[{"name":"Alice","score":"700"}]"#));
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credit_scores.csv");
        std::fs::write(&path, "name,score\nAlice,700\n").unwrap();

        let resp = handle_request(request(Method::HEAD, "/api/credit-score"), test_state(&path), peer())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "32");
        assert!(body(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_post_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let resp = handle_request(
            request(Method::POST, "/api/credit-score"),
            test_state(&dir.path().join("credit_scores.csv")),
            peer(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let resp = handle_request(
            request(Method::OPTIONS, "/api/credit-score"),
            test_state(&dir.path().join("credit_scores.csv")),
            peer(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, OPTIONS");
    }

    #[tokio::test]
    async fn test_health_probes() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir.path().join("credit_scores.csv"));
        for path in ["/healthz", "/readyz"] {
            let resp = route_request(&Method::GET, path, &state).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(body(resp).await, Bytes::from_static(br#"{"status":"ok"}"#));
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir.path().join("credit_scores.csv"));
        let resp = route_request(&Method::GET, "/api/credit-scores", &state).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(resp).await, Bytes::from_static(br#"{"error":"Not Found"}"#));
    }
}
