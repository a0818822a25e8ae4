//! API-key authentication layer.
//!
//! Mutating routes require an `X-Api-Key` header when `api_key` is
//! configured; the comparison runs in constant time via `subtle` and
//! the provided key is never logged, not even on mismatch (§6.1).
//! Health and metrics routes are exempt so a load balancer or scraper
//! never needs a credential.

use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};

const EXEMPT_PREFIXES: &[&str] = &["/health", "/ready", "/metrics"];

#[derive(Clone)]
pub struct AuthLayer {
    api_key: Option<String>,
}

impl AuthLayer {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            api_key: self.api_key.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    api_key: Option<String>,
}

fn keys_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

impl<S, ReqBody> Service<Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let api_key = self.api_key.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let path = req.uri().path().to_string();
            let is_mutating = req.method() != axum::http::Method::GET;
            if api_key.is_none()
                || !is_mutating
                || EXEMPT_PREFIXES.iter().any(|p| path.starts_with(p))
            {
                return inner.call(req).await;
            }
            let expected = api_key.expect("checked above");

            let authorized = req
                .headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .map(|provided| keys_match(&expected, provided))
                .unwrap_or(false);

            if authorized {
                inner.call(req).await
            } else {
                tracing::warn!(path = %path, "rejected request: missing or invalid API key");
                Ok(Response::builder()
                    .status(StatusCode::UNAUTHORIZED)
                    .body(Body::from(
                        r#"{"error":{"code":"validation","message":"missing or invalid API key"}}"#,
                    ))
                    .expect("static response is well-formed"))
            }
        })
    }
}

/// Logs method, path, status, and duration for every request. Never
/// logs query parameters or headers, which may carry the API key or
/// other caller-supplied secrets.
#[derive(Clone, Default)]
pub struct RequestLogger;

impl RequestLogger {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLogger {
    type Service = RequestLoggerMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggerMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct RequestLoggerMiddleware<S> {
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for RequestLoggerMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let start = std::time::Instant::now();
            let response = inner.call(req).await?;
            let duration = start.elapsed();

            tracing::info!(
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                duration_ms = duration.as_millis() as u64,
                "request completed"
            );

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match_equal() {
        assert!(keys_match("secret", "secret"));
    }

    #[test]
    fn test_keys_match_different_lengths() {
        assert!(!keys_match("secret", "s"));
    }

    #[test]
    fn test_keys_match_same_length_different_content() {
        assert!(!keys_match("secret1", "secret2"));
    }
}
