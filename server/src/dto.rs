//! Request and response payloads.

use playgate_store::GameVersion;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_subscription: bool,
    #[serde(default)]
    pub crystal: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: &'static str,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub user_id: i64,
    pub is_subscription: bool,
    pub crystal: i64,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub status: &'static str,
    pub version: GameVersion,
}

/// Authentication failures: `{"status": "fail", "message": ...}`.
#[derive(Debug, Serialize)]
pub struct FailResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Everything else that goes wrong: `{"status": "error", "message": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}
