//! Request dispatcher
//!
//! Classifies each request into exactly one [`RouteOutcome`] using the rule
//! table, then renders that outcome into a response. Faults on the
//! dispatcher's own path become a 500 response; they never escape `dispatch`.

use super::rules::{self, Action, OnMiss, RequestClass};
use super::static_files::{FallbackDocument, StaticRoot};
use crate::api::{ApiError, ApiHandler, ApiResponse};
use crate::http::{self, CachePolicy, FALLBACK_CONTENT_TYPE};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

/// Payload of the informational `/api` endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub message: String,
    pub version: String,
}

/// Failure on the dispatcher's own code path
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to encode informational payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of classifying one request
#[derive(Debug)]
pub enum RouteOutcome {
    Informational,
    /// Response produced by the API layer, returned as is
    Delegated(ApiResponse),
    StaticFile {
        path: PathBuf,
        content_type: &'static str,
        cache: CachePolicy,
    },
    FallbackDocument,
    NotFound,
    InternalError {
        message: String,
    },
}

impl From<DispatchError> for RouteOutcome {
    fn from(err: DispatchError) -> Self {
        Self::InternalError {
            message: err.to_string(),
        }
    }
}

/// Edge request dispatcher
///
/// Holds only read-only state, so one instance is shared by every connection.
pub struct Dispatcher<A> {
    static_root: StaticRoot,
    fallback: FallbackDocument,
    info: ServerInfo,
    api: A,
}

impl<A: ApiHandler> Dispatcher<A> {
    pub const fn new(
        static_root: StaticRoot,
        fallback: FallbackDocument,
        info: ServerInfo,
        api: A,
    ) -> Self {
        Self {
            static_root,
            fallback,
            info,
            api,
        }
    }

    /// Produce the response for a request; never fails
    pub async fn dispatch(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
        let is_head = req.method() == Method::HEAD;
        let outcome = self.route(req).await.unwrap_or_else(RouteOutcome::from);

        match self.render(outcome, is_head).await {
            Ok(resp) => resp,
            Err(err) => {
                logger::log_error(&format!("Dispatch failed: {err}"));
                http::build_500_response(&err.to_string())
            }
        }
    }

    /// Classify a request; delegation to the API layer happens here
    pub async fn route(&self, req: Request<Bytes>) -> Result<RouteOutcome, DispatchError> {
        let class = RequestClass::of(req.method());
        let pathname = req.uri().path().to_owned();
        let url = req.uri().to_string();

        let Some(rule) = rules::match_rule(class, &pathname, &url) else {
            return Ok(RouteOutcome::NotFound);
        };

        match rule.action {
            Action::Informational => Ok(RouteOutcome::Informational),
            Action::Delegate => {
                let resp = self.api.handle(req).await.map_err(|err| {
                    logger::log_error(&format!(
                        "Delegation via rule '{}' failed: {err}",
                        rule.name
                    ));
                    err
                })?;
                Ok(RouteOutcome::Delegated(resp))
            }
            Action::Reject => Ok(RouteOutcome::NotFound),
            Action::Static { on_miss } => match self.static_root.resolve(&pathname).await {
                Some(path) => Ok(RouteOutcome::StaticFile {
                    content_type: http::mime_type_of(&path),
                    cache: CachePolicy::for_path(&pathname),
                    path,
                }),
                None => Ok(match on_miss {
                    OnMiss::Fallback => RouteOutcome::FallbackDocument,
                    OnMiss::NotFound => RouteOutcome::NotFound,
                }),
            },
        }
    }

    /// Turn an outcome into a response; static files are read here
    async fn render(
        &self,
        outcome: RouteOutcome,
        is_head: bool,
    ) -> Result<Response<Full<Bytes>>, DispatchError> {
        match outcome {
            RouteOutcome::Informational => {
                let body = serde_json::to_vec(&self.info)?;
                Ok(http::build_json_response(Bytes::from(body), is_head))
            }
            RouteOutcome::Delegated(resp) => Ok(resp),
            RouteOutcome::StaticFile {
                path,
                content_type,
                cache,
            } => {
                let data = match tokio::fs::read(&path).await {
                    Ok(data) => data,
                    Err(source) => return Err(DispatchError::Read { path, source }),
                };
                Ok(http::build_static_response(
                    Bytes::from(data),
                    content_type,
                    cache,
                    is_head,
                ))
            }
            RouteOutcome::FallbackDocument => Ok(http::build_static_response(
                self.fallback.body(),
                FALLBACK_CONTENT_TYPE,
                CachePolicy::NoCache,
                is_head,
            )),
            RouteOutcome::NotFound => Ok(http::build_404_response()),
            RouteOutcome::InternalError { message } => Ok(http::build_500_response(&message)),
        }
    }
}
