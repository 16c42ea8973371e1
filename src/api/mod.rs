//! API layer module
//!
//! Requests under the reserved `/api/v1` prefix are handed to an [`ApiHandler`]
//! and its response is returned to the client unmodified. The handler is a
//! plain value injected into the dispatcher, so tests can substitute a stub.

mod upstream;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use std::future::Future;

use crate::config::ApiConfig;

pub use upstream::UpstreamApi;

/// Response type produced by API handlers
pub type ApiResponse = Response<Full<Bytes>>;

/// Failure inside the delegation path itself (not an error status from the API)
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid upstream address '{0}'")]
    InvalidUpstream(String),
    #[error("failed to build upstream request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read upstream response body: {0}")]
    Body(#[from] hyper::Error),
}

/// Opaque request-to-response function the `/api/v1` prefix is delegated to
pub trait ApiHandler: Send + Sync {
    fn handle(
        &self,
        req: Request<Bytes>,
    ) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send;
}

/// Stand-in API layer used when no upstream is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredApi;

impl ApiHandler for UnconfiguredApi {
    async fn handle(&self, _req: Request<Bytes>) -> Result<ApiResponse, ApiError> {
        let body = serde_json::json!({ "error": "API upstream not configured" }).to_string();
        Ok(Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))?)
    }
}

/// API layer selected from configuration at startup
pub enum ApiBackend {
    Upstream(UpstreamApi),
    Unconfigured(UnconfiguredApi),
}

impl ApiBackend {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        match config.upstream.as_deref() {
            Some(base) => Ok(Self::Upstream(UpstreamApi::new(base)?)),
            None => Ok(Self::Unconfigured(UnconfiguredApi)),
        }
    }
}

impl ApiHandler for ApiBackend {
    async fn handle(&self, req: Request<Bytes>) -> Result<ApiResponse, ApiError> {
        match self {
            Self::Upstream(api) => api.handle(req).await,
            Self::Unconfigured(api) => api.handle(req).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_answers_503() {
        let req = Request::builder()
            .uri("/api/v1/users")
            .body(Bytes::new())
            .unwrap();
        let resp = UnconfiguredApi.handle(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.headers()["content-type"], "application/json");
    }

    #[test]
    fn test_backend_from_config() {
        let backend = ApiBackend::from_config(&ApiConfig::default()).unwrap();
        assert!(matches!(backend, ApiBackend::Unconfigured(_)));

        let backend = ApiBackend::from_config(&ApiConfig {
            upstream: Some("http://127.0.0.1:3000".to_string()),
        })
        .unwrap();
        assert!(matches!(backend, ApiBackend::Upstream(_)));

        let err = ApiBackend::from_config(&ApiConfig {
            upstream: Some("not a url".to_string()),
        });
        assert!(matches!(err, Err(ApiError::InvalidUpstream(_))));
    }
}
