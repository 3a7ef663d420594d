//! HTTP handlers: registration, login, and the version check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use playgate_store::{AuthOutcome, StoreError, UserRepository, VersionRepository};

use crate::dto::{
    ErrorResponse, FailResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    VersionResponse,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub versions: VersionRepository,
}

pub async fn index() -> &'static str {
    "API is running"
}

/// POST /register
///
/// The existence check gives the common case a friendly error; the
/// schema's UNIQUE constraint catches the check-then-insert race, and
/// the loser gets the same answer.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    match state.users.get_by_username(&req.username).await {
        Ok(Some(_)) => return error_response(StatusCode::BAD_REQUEST, "User exists"),
        Ok(None) => {}
        Err(e) => return storage_error(e),
    }

    let password_hash = match bcrypt::hash(&req.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "password hashing failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "hashing failed");
        }
    };

    match state
        .users
        .create(&req.username, &password_hash, req.is_subscription, req.crystal)
        .await
    {
        Ok(user) => Json(RegisterResponse {
            status: "ok",
            user_id: user.id,
        })
        .into_response(),
        Err(e) if e.is_constraint_violation() => {
            error_response(StatusCode::BAD_REQUEST, "User exists")
        }
        Err(e) => storage_error(e),
    }
}

/// POST /login
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    let verify = |hash: &str, password: &str| bcrypt::verify(password, hash).unwrap_or(false);

    match state
        .users
        .authenticate(&req.username, verify, &req.password)
        .await
    {
        Ok(AuthOutcome::Authenticated(user)) => Json(LoginResponse {
            status: "ok",
            user_id: user.id,
            is_subscription: user.is_subscription,
            crystal: user.crystal,
        })
        .into_response(),
        Ok(outcome) => (
            StatusCode::UNAUTHORIZED,
            Json(FailResponse {
                status: "fail",
                message: outcome.message(),
            }),
        )
            .into_response(),
        Err(e) => storage_error(e),
    }
}

/// GET /version
pub async fn version(State(state): State<AppState>) -> Response {
    match state.versions.get_latest_active().await {
        Ok(Some(version)) => Json(VersionResponse {
            status: "ok",
            version,
        })
        .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No active version found"),
        Err(e) => storage_error(e),
    }
}

fn error_response(code: StatusCode, message: &str) -> Response {
    (
        code,
        Json(ErrorResponse {
            status: "error",
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn storage_error(e: StoreError) -> Response {
    tracing::error!(error = %e, "storage error");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
}
