//! # HTTP API
//!
//! A small demo surface whose handlers take the current user as a parameter.
//!
//! | Route | Handler input |
//! |---|---|
//! | `GET /` | [`LoginUser`] |
//! | `GET /health` | state only |
//! | `GET /api/v1/me` | [`LoginUser`] |
//! | `GET /api/v1/profile` | [`RequireLogin`] |
//! | `POST /api/v1/logout` | state and headers |
//!
//! Logout sits outside identity resolution: a client holding a stale
//! credential must still be able to clear it under `FailurePolicy::Reject`.

mod error;

pub use error::{ApiError, ErrorBody};

use crate::auth::{
    AuthState, LoginUser, RequireLogin, clear_session_cookie, credential_from_headers,
    resolve_identity,
};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use loginuser_core::{SessionId, SessionUser, Timestamp};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub started_at: Timestamp,
}

impl AppState {
    pub fn new(auth: AuthState) -> Self {
        Self {
            auth,
            started_at: crate::auth::now(),
        }
    }
}

/// Build the application router.
///
/// Tracing wraps identity resolution, so a rejected credential is still
/// logged with its request span.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/v1/me", get(me))
        .route("/api/v1/profile", get(profile))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            resolve_identity,
        ))
        // Routes added after the identity layer are not wrapped by it.
        .route("/api/v1/logout", post(logout))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// `None` when the store cannot be read.
    pub sessions: Option<usize>,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub authenticated: bool,
    pub user: Option<SessionUser>,
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn index(login: LoginUser) -> String {
    format!("Hello, {}", login.display_name())
}

/// `200` with the session count, or `503` and `"degraded"` when the store
/// fails.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime_secs = state.started_at.secs_until(crate::auth::now());
    match state.auth.resolver().store().len() {
        Ok(sessions) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_owned(),
                sessions: Some(sessions),
                uptime_secs,
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "health check could not read the session store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_owned(),
                    sessions: None,
                    uptime_secs,
                }),
            )
        }
    }
}

async fn me(LoginUser(user): LoginUser) -> Json<MeResponse> {
    Json(MeResponse {
        authenticated: user.is_some(),
        user,
    })
}

async fn profile(RequireLogin(user): RequireLogin) -> Json<SessionUser> {
    Json(user)
}

/// Revoke the presented session and clear the cookie.
///
/// Idempotent: unknown or malformed credentials still get `204`.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let cookie_name = state.auth.cookie_name();
    let credential = credential_from_headers(&headers, cookie_name);

    if let Some(id) = credential
        .as_ref()
        .and_then(|c| SessionId::parse(c.raw()).ok())
    {
        let existed = state.auth.resolver().revoke(&id)?;
        tracing::info!(revoked = existed, "logout");
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie(cookie_name))],
    )
        .into_response())
}
