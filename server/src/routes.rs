//! Route table.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{index, login, register, version, AppState};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/version", get(version))
        .with_state(state)
}
