//! HTTP response building module
//!
//! Provides builders for the responses the edge server renders itself.
//! Delegated API responses never pass through here.

use super::cache::CachePolicy;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Content type of the SPA entry document when served as a fallback
pub const FALLBACK_CONTENT_TYPE: &str = "text/html";

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::BAD_REQUEST, "Bad Request")
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Build 408 Request Timeout response
pub fn build_408_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::REQUEST_TIMEOUT, "Request Timeout")
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Build 500 Internal Server Error response carrying the failure message
pub fn build_500_response(message: &str) -> Response<Full<Bytes>> {
    build_plain_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!("Internal Error: {message}"),
    )
}

fn build_plain_response(status: StatusCode, text: &str) -> Response<Full<Bytes>> {
    let body = Bytes::from(text.to_owned());
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Content-Length", body.len())
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            bare_response(status, body)
        })
}

/// Build 200 JSON response
pub fn build_json_response(body: Bytes, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = body.len();
    let body = if is_head { Bytes::new() } else { body };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Content-Length", content_length)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            bare_response(StatusCode::OK, body)
        })
}

/// Build 200 response for a static file or the fallback document
pub fn build_static_response(
    data: Bytes,
    content_type: &str,
    cache: CachePolicy,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Cache-Control", cache.to_header_value())
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            bare_response(StatusCode::OK, body)
        })
}

fn bare_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = status;
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body()
            .collect()
            .await
            .map(http_body_util::Collected::to_bytes)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_404_is_plain_text() {
        let resp = build_404_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(body_of(resp).await, "Not Found");
    }

    #[tokio::test]
    async fn test_500_carries_message() {
        let resp = build_500_response("disk on fire");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(resp).await, "Internal Error: disk on fire");
    }

    #[tokio::test]
    async fn test_head_keeps_length_but_drops_body() {
        let resp = build_static_response(
            Bytes::from_static(b"console.log(1)"),
            "application/javascript",
            CachePolicy::LongLived,
            true,
        );
        assert_eq!(resp.headers()["content-length"], "14");
        assert_eq!(
            resp.headers()["cache-control"],
            "public, max-age=31536000"
        );
        assert!(body_of(resp).await.is_empty());
    }
}
