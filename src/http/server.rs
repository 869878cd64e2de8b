//! HTTP server setup and handlers.
//!
//! # Responsibilities
//! - Build the Axum router for the gateway's three routes
//! - Wire up middleware (timeout, request id, tracing)
//! - Map gateway errors onto response statuses
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::request::RequestIdLayer;
use crate::observability::metrics;
use crate::service::{DocumentGateway, GatewayError};
use crate::store::couch::CouchStore;
use crate::store::instrument::Instrumented;

/// The store type behind the production wiring.
pub type LiveStore = Instrumented<CouchStore>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<DocumentGateway<LiveStore>>,
}

/// HTTP server for the document gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &GatewayConfig, gateway: Arc<DocumentGateway<LiveStore>>) -> Self {
        let router = Self::build_router(config, AppState { gateway });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The healthcheck stays outside the versioned prefix and is not
    /// instrumented; only the document routes report request metrics.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let base = format!("/{}/{}", config.api.base_path, config.api.version);
        Router::new()
            .route("/healthcheck", get(healthcheck))
            .route(&format!("{base}/getDocument"), get(get_document))
            .route(&format!("{base}/putDocument"), post(put_document))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn healthcheck(State(state): State<AppState>) -> Json<bool> {
    Json(state.gateway.check())
}

#[derive(Debug, Deserialize)]
struct GetDocumentParams {
    #[serde(default)]
    id: String,
}

async fn get_document(
    State(state): State<AppState>,
    Query(params): Query<GetDocumentParams>,
) -> Response {
    let start = Instant::now();
    let response = if params.id.is_empty() {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "bad request" })),
        )
            .into_response()
    } else {
        match state.gateway.get_document(&params.id).await {
            Ok(document) => Json(document).into_response(),
            Err(error) => encode_error(error),
        }
    };
    metrics::record_http_request(
        "GET",
        "getDocument",
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}

async fn put_document(State(state): State<AppState>) -> Response {
    let start = Instant::now();
    let response = match state.gateway.put_document().await {
        Ok(created) => Json(created).into_response(),
        Err(error) => encode_error(error),
    };
    metrics::record_http_request(
        "POST",
        "putDocument",
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}

/// An empty pool is a degraded-but-retryable condition; everything else from
/// the backend is a plain server error.
fn encode_error(error: GatewayError) -> Response {
    let status = match &error {
        GatewayError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
        GatewayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(error = %error, status = %status, "request failed");
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
