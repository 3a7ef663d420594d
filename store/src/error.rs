//! Error type for the storage layer.

/// Errors from the storage layer.
///
/// Transient connectivity failures (a stale pooled connection, an
/// acquisition timeout) are split from general database errors because
/// only the transient kind is eligible for the single read retry
/// applied by [`crate::Database::with_read_retry`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transient connectivity failure. Retried once on read paths;
    /// a second consecutive failure propagates as-is.
    #[error("storage unavailable: {0}")]
    Connection(#[source] sqlx::Error),
    /// Any other driver error, including constraint violations.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::Connection(e)
            }
            other => Self::Database(other),
        }
    }
}

impl StoreError {
    /// True for the connectivity failures that the read paths retry once.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// True when the underlying error is a UNIQUE constraint violation,
    /// e.g. the loser of a duplicate-username race.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(db)) if db.is_unique_violation())
    }
}
