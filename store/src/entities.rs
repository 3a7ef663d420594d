//! Entity definitions: player accounts and game release records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A player account.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Opaque hash produced by the caller; never compared directly.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_subscription: bool,
    /// In-game currency balance. Non-negative.
    pub crystal: i64,
    pub created_at: DateTime<Utc>,
}

/// A game release. At most one row is active at any time.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct GameVersion {
    pub id: i64,
    /// Semantic-version-like, free form: `"1.0.0"`, `"1.1.0 beta.1"`.
    pub version_number: String,
    /// Human-readable label: `"Initial Release"`, `"closed beta v.1"`.
    pub version_name: String,
    pub release_date: DateTime<Utc>,
    pub is_active: bool,
}

/// Whitelisted update for a [`User`].
///
/// Only the fields listed here can be changed; `username` is immutable
/// and `id`/`created_at` are storage-assigned. Unknown keys in incoming
/// JSON deserialize to nothing, so they are ignored rather than applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub password_hash: Option<String>,
    pub is_subscription: Option<bool>,
    pub crystal: Option<i64>,
}

/// Whitelisted update for a [`GameVersion`].
///
/// `is_active` is deliberately absent: activation only flows through
/// [`crate::VersionRepository::create`] and
/// [`crate::VersionRepository::set_active`], which keep the
/// single-active-version invariant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionChanges {
    pub version_number: Option<String>,
    pub version_name: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
}
