use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, RawQuery, State, rejection::BytesRejection},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware,
    response::Response,
    routing::any,
};
use std::sync::Arc;

use blobbox_core::{Envelope, OperationResult};
use blobbox_storage::BlobStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{Result, RpcError};
use crate::methods::{SAVE_CAPACITY_EXCEEDED, handle_request};
use crate::protocol::RpcRequest;

/// Headers set on every response, whatever its status
const RESPONSE_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST"),
    ("access-control-allow-headers", "Content-Type"),
    ("content-type", "application/json; charset=utf-8"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("content-security-policy", "script-src 'self'"),
    ("strict-transport-security", "max-age=31536000;"),
    ("cache-control", "no-store, no-cache, must-revalidate, max-age=0"),
    ("expires", "Thu, 01 Jan 1970 00:00:00 GMT"),
];

/// Extra room on top of the store capacity for the request wrapper
const BODY_LIMIT_SLACK: usize = 64 * 1024;

pub struct RpcServer {
    pub store: BlobStore,
}

#[derive(Clone)]
struct AppState {
    server: Arc<RpcServer>,
    body_limit: usize,
}

impl RpcServer {
    pub fn new(store: BlobStore) -> Self {
        Self { store }
    }

    /// The endpoint answers at `/` and at `/api/v1/`
    pub fn router(self) -> Router {
        let body_limit = usize::try_from(self.store.limits().capacity_bytes)
            .unwrap_or(usize::MAX)
            .saturating_add(BODY_LIMIT_SLACK);

        let app_state = AppState {
            server: Arc::new(self),
            body_limit,
        };

        Router::new()
            .route("/", any(handle_rpc))
            .route("/api/v1", any(handle_rpc))
            .route("/api/v1/", any(handle_rpc))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(middleware::map_response(apply_response_headers))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    pub async fn serve(store: BlobStore, host: &str, port: u16) -> anyhow::Result<()> {
        let app = Self::new(store).router();

        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr).await?;

        info!("blobbox listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server stopped");
        Ok(())
    }
}

/// GET|POST / - single RPC endpoint
async fn handle_rpc(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<Envelope>> {
    if method != Method::GET && method != Method::POST {
        return Err(RpcError::MethodNotAllowed(method.to_string()));
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(limit = state.body_limit, "request body over limit");
            return Ok(Json(Envelope::new(OperationResult::failed(
                SAVE_CAPACITY_EXCEEDED,
            ))));
        }
        Err(rejection) => return Err(RpcError::UnreadableBody(rejection.body_text())),
    };

    let form = if is_form(&headers) {
        std::str::from_utf8(&body).ok()
    } else {
        None
    };

    let req = RpcRequest::from_sources(query.as_deref(), form, &body);
    let envelope = handle_request(&state.server, req).await?;

    Ok(Json(envelope))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

async fn apply_response_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    for &(name, value) in RESPONSE_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
