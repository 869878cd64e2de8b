//! Request identity middleware.
//!
//! # Responsibilities
//! - Assign a unique request id as early as possible, so every log line and
//!   trace span for one request can be correlated
//! - Preserve an id supplied by the caller; upstream proxies own the value
//!   when they send one

use std::task::{Context, Poll};

use axum::http::{HeaderName, HeaderValue, Request};
use tower::{Layer, Service};
use uuid::Uuid;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Assigns a UUID v4 request id to requests that do not already carry one.
#[derive(Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let header = HeaderName::from_static(X_REQUEST_ID);
        if !request.headers().contains_key(&header) {
            if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
                request.headers_mut().insert(header, value);
            }
        }
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    /// Echoes back the request id header it received.
    #[derive(Clone)]
    struct CaptureService;

    impl Service<Request<Body>> for CaptureService {
        type Response = Option<String>;
        type Error = std::convert::Infallible;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: Request<Body>) -> Self::Future {
            let id = request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            std::future::ready(Ok(id))
        }
    }

    #[tokio::test]
    async fn assigns_an_id_when_missing() {
        let mut service = RequestIdLayer.layer(CaptureService);
        let request = Request::builder().body(Body::empty()).unwrap();

        let id = service.call(request).await.unwrap().unwrap();
        assert_eq!(id.len(), 36, "uuid v4 in canonical form");
    }

    #[tokio::test]
    async fn keeps_a_caller_supplied_id() {
        let mut service = RequestIdLayer.layer(CaptureService);
        let request = Request::builder()
            .header(X_REQUEST_ID, "caller-chosen")
            .body(Body::empty())
            .unwrap();

        let id = service.call(request).await.unwrap().unwrap();
        assert_eq!(id, "caller-chosen");
    }
}
