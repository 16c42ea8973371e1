// Upstream API forwarding
// Relays delegated requests to a single HTTP upstream and buffers its reply

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HOST};
use hyper::{Request, Response, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use super::{ApiError, ApiHandler, ApiResponse};

/// Connection-scoped headers that must not be relayed (RFC 9110 section 7.6.1)
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// API layer backed by an HTTP upstream server
pub struct UpstreamApi {
    client: Client<HttpConnector, Full<Bytes>>,
    base: Uri,
}

impl UpstreamApi {
    /// Create a client for `base`, e.g. `http://127.0.0.1:3000`
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let uri: Uri = base
            .parse()
            .map_err(|_| ApiError::InvalidUpstream(base.to_string()))?;
        if uri.scheme_str() != Some("http") || uri.authority().is_none() {
            return Err(ApiError::InvalidUpstream(base.to_string()));
        }

        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            base: uri,
        })
    }

    /// Join the upstream base with the request's path and query
    fn target_uri(&self, uri: &Uri) -> Result<Uri, ApiError> {
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
        let base_path = self.base.path().trim_end_matches('/');

        let mut builder = Uri::builder().path_and_query(format!("{base_path}{path_and_query}"));
        if let Some(scheme) = self.base.scheme() {
            builder = builder.scheme(scheme.clone());
        }
        if let Some(authority) = self.base.authority() {
            builder = builder.authority(authority.clone());
        }
        Ok(builder.build()?)
    }
}

impl ApiHandler for UpstreamApi {
    async fn handle(&self, req: Request<Bytes>) -> Result<ApiResponse, ApiError> {
        let (mut parts, body) = req.into_parts();
        parts.uri = self.target_uri(&parts.uri)?;
        strip_hop_by_hop(&mut parts.headers);
        // Let the client derive Host from the upstream authority
        parts.headers.remove(HOST);

        let resp = self
            .client
            .request(Request::from_parts(parts, Full::new(body)))
            .await?;

        let (mut parts, body) = resp.into_parts();
        let body = body.collect().await?.to_bytes();
        strip_hop_by_hop(&mut parts.headers);

        Ok(Response::from_parts(parts, Full::new(body)))
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all("connection")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::StatusCode;
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Spawn an upstream that echoes the request line and selected headers
    async fn spawn_echo_upstream() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let service = service_fn(|req: Request<hyper::body::Incoming>| async move {
                        let summary = format!(
                            "{} {} host={} x-custom={} keep-alive={}",
                            req.method(),
                            req.uri(),
                            header_or_dash(req.headers(), "host"),
                            header_or_dash(req.headers(), "x-custom"),
                            header_or_dash(req.headers(), "keep-alive"),
                        );
                        let body = req.into_body().collect().await.unwrap().to_bytes();
                        let resp = Response::builder()
                            .status(StatusCode::CREATED)
                            .header("x-upstream", "yes")
                            .header("x-summary", summary)
                            .body(Full::new(body))
                            .unwrap();
                        Ok::<_, Infallible>(resp)
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        addr
    }

    fn header_or_dash(headers: &HeaderMap, name: &str) -> String {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(UpstreamApi::new("ftp://example.com").is_err());
        assert!(UpstreamApi::new("/relative").is_err());
    }

    #[test]
    fn test_target_uri_keeps_base_path_and_query() {
        let api = UpstreamApi::new("http://127.0.0.1:3000/backend/").unwrap();
        let uri: Uri = "/api/v1/users?page=2".parse().unwrap();
        assert_eq!(
            api.target_uri(&uri).unwrap().to_string(),
            "http://127.0.0.1:3000/backend/api/v1/users?page=2"
        );
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", "close, x-session-hint".parse().unwrap());
        headers.insert("x-session-hint", "1".parse().unwrap());
        headers.insert("transfer-encoding", "chunked".parse().unwrap());
        headers.insert("content-type", "application/json".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("content-type"));
    }

    #[tokio::test]
    async fn test_forwards_request_and_relays_response() {
        let addr = spawn_echo_upstream().await;
        let api = UpstreamApi::new(&format!("http://{addr}")).unwrap();

        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/items?draft=true")
            .header("host", "app.example.com")
            .header("x-custom", "kept")
            .header("keep-alive", "timeout=5")
            .body(Bytes::from_static(b"{\"name\":\"widget\"}"))
            .unwrap();

        let resp = api.handle(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()["x-upstream"], "yes");
        assert_eq!(
            resp.headers()["x-summary"],
            format!("POST /api/v1/items?draft=true host={addr} x-custom=kept keep-alive=-").as_str()
        );

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "{\"name\":\"widget\"}");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_an_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = UpstreamApi::new(&format!("http://{addr}")).unwrap();
        let req = Request::builder()
            .uri("/api/v1/ping")
            .body(Bytes::new())
            .unwrap();
        assert!(matches!(
            api.handle(req).await,
            Err(ApiError::Upstream(_))
        ));
    }
}
