use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, Method},
    routing::{get, post},
    Json, Router,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use parley_authz::{AuthScope, AuthzRequest, Claims, Clock, Engine, RequestContext};
use parley_shared::constants::{DEFAULT_REQUEST_TIMEOUT_MS, REQUEST_ID_HEADER};

use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<ServerConfig>,
    /// Fired on shutdown; in-flight decisions observe it as cancellation.
    pub shutdown: CancellationToken,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/v1/authorize", post(authorize))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    request_timeout_ms: u128,
}

/// Raw scope fields; at most one may be set.
#[derive(Debug, Default, Deserialize)]
struct ScopeBody {
    #[serde(default)]
    server_id: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorizeBody {
    /// Claims of a token already verified upstream.
    #[serde(default)]
    claims: Option<Claims>,
    #[serde(flatten)]
    request: AuthzRequest,
    #[serde(default)]
    scope: Option<ScopeBody>,
}

#[derive(Serialize)]
struct AuthorizeResponse {
    allowed: bool,
    request_id: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        request_timeout_ms: state.config.request_timeout.as_millis(),
    })
}

async fn authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AuthorizeBody>, JsonRejection>,
) -> Result<Json<AuthorizeResponse>, ServerError> {
    let header_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ctx = RequestContext::new(header_id);
    let request_id = ctx.request_id().to_string();

    let Json(body) = body.map_err(|e| ServerError::bad_request(e.body_text(), &request_id))?;

    let scope = body.scope.unwrap_or_default();
    let scope = AuthScope::from_parts(scope.server_id.as_deref(), scope.channel_id.as_deref())
        .map_err(|e| ServerError::from_authz(&e, &request_id))?;

    let timeout = Duration::from_std(state.config.request_timeout)
        .unwrap_or_else(|_| Duration::milliseconds(DEFAULT_REQUEST_TIMEOUT_MS as i64));
    let mut ctx = ctx
        .with_scope(scope)
        .with_deadline(state.clock.now() + timeout)
        .with_cancellation(state.shutdown.child_token());
    if let Some(claims) = body.claims {
        ctx = ctx.with_claims(claims);
    }

    state
        .engine
        .authorize(&ctx, &body.request)
        .await
        .map_err(|e| ServerError::from_authz(&e, &request_id))?;

    Ok(Json(AuthorizeResponse {
        allowed: true,
        request_id,
    }))
}

/// Serve until the state's shutdown token fires, then drain open
/// connections. Decisions still running observe the same token and answer
/// `cancelled`.
pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("HTTP API server stopped");
    Ok(())
}
