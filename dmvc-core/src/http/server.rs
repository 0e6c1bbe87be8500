//! Async HTTP server using hyper
//!
//! Converts hyper requests into [`ApiRequest`]s, resolves the actor, runs the
//! [`Router`] and writes JSON responses back.

use super::utils::{body_from, json_error_response, parse_query, Req, Resp};
use super::{ApiRequest, ApiResponse, Router};
use crate::auth::ActorResolver;
use anyhow::Context;
use http_body_util::{BodyExt, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// Serves a [`Router`] over HTTP/1.1
#[derive(Clone)]
pub struct HttpServer {
    router: Arc<Router>,
    resolver: Option<Arc<dyn ActorResolver>>,
    max_body_size: usize,
}

impl HttpServer {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router, resolver: None, max_body_size: 1024 * 1024 }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ActorResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Bind `addr` and serve until the process exits
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await.with_context(|| format!("Failed to bind to {}", addr))?;
        log::info!("✅ Server listening on http://{}", listener.local_addr()?);
        self.serve_listener(listener).await
    }

    /// Accept connections on an already bound listener
    pub async fn serve_listener(self, listener: TcpListener) -> anyhow::Result<()> {
        let server = Arc::new(self);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let server = server.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    log::error!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }
    }

    async fn handle_request(&self, req: Req, remote_addr: SocketAddr) -> Result<Resp, Infallible> {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let resp = match self.convert_request(req).await {
            Ok(api_req) => into_hyper(self.router.handle(api_req).await),
            Err(resp) => resp,
        };

        log::info!(
            "{} {} {} {} {:.1}ms",
            remote_addr.ip(),
            method,
            path,
            resp.status().as_u16(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(resp)
    }

    async fn convert_request(&self, req: Req) -> Result<ApiRequest, Resp> {
        let (parts, body) = req.into_parts();

        let body = match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                return Err(if err.is::<http_body_util::LengthLimitError>() {
                    json_error_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "payload_too_large",
                        &format!("Request body exceeds {} bytes", self.max_body_size),
                    )
                } else {
                    json_error_response(StatusCode::BAD_REQUEST, "bad_request", &err.to_string())
                });
            }
        };

        let actor = match &self.resolver {
            Some(resolver) => resolver.resolve(&parts.headers).await,
            None => None,
        };

        Ok(ApiRequest {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(parse_query).unwrap_or_default(),
            params: Default::default(),
            headers: parts.headers,
            body,
            actor,
        })
    }
}

/// Convert an [`ApiResponse`] into a hyper response
pub fn into_hyper(resp: ApiResponse) -> Resp {
    let has_body = resp.body.is_some();
    let mut out = Response::new(body_from(resp.body_bytes()));
    *out.status_mut() = resp.status;
    *out.headers_mut() = resp.headers;
    if has_body {
        out.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Actor, AuthGuard, BearerTokenResolver};
    use crate::http::{handler, RouteTable};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn roundtrip(addr: SocketAddr, raw: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    async fn start() -> SocketAddr {
        let mut router = Router::new();
        router.post(
            "/echo/:id",
            AuthGuard::new(["admin"]),
            handler(|req: ApiRequest| async move {
                ApiResponse::ok(&json!({
                    "id": req.param("id"),
                    "q": req.query.get("q"),
                    "len": req.body.len(),
                    "by": req.actor.and_then(|a| a.created_by()),
                }))
            }),
        );
        let resolver = BearerTokenResolver::new().with_token("tok", Actor::with_role("u1", "admin"));
        let server = HttpServer::new(Arc::new(router)).with_resolver(Arc::new(resolver)).with_max_body_size(16);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve_listener(listener));
        addr
    }

    #[tokio::test]
    async fn test_serves_routed_json() {
        let addr = start().await;
        let resp = roundtrip(
            addr,
            "POST /echo/7?q=x+y HTTP/1.1\r\nHost: t\r\nAuthorization: Bearer tok\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        )
        .await;
        assert!(resp.starts_with("HTTP/1.1 200"), "{resp}");
        assert!(resp.contains("application/json"));
        assert!(resp.contains("\"id\":\"7\""));
        assert!(resp.contains("\"q\":\"x y\""));
        assert!(resp.contains("\"by\":\"u1\""));
    }

    #[tokio::test]
    async fn test_rejects_without_actor_and_oversized_body() {
        let addr = start().await;
        let resp = roundtrip(addr, "POST /echo/7 HTTP/1.1\r\nHost: t\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        assert!(resp.starts_with("HTTP/1.1 401"), "{resp}");
        assert!(resp.contains("{\"error\":\"Unauthorized\"}"));

        let body = "x".repeat(64);
        let raw = format!(
            "POST /echo/7 HTTP/1.1\r\nHost: t\r\nAuthorization: Bearer tok\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let resp = roundtrip(addr, &raw).await;
        assert!(resp.starts_with("HTTP/1.1 413"), "{resp}");
    }
}
