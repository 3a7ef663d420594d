//! SQLite connection pool, schema setup, and session/transaction scoping.
//!
//! [`Database`] is the single process-wide manager: it owns the pool,
//! runs the embedded migrations and the bootstrap seed on first
//! [`Database::init`], and exposes the two scoped-acquisition
//! primitives every repository goes through:
//!
//! - [`Database::session`]: read scope. Never commits; on error it
//!   rolls back, logs, and propagates. Writes issued through a read
//!   scope are discarded when the scope ends.
//! - [`Database::transaction`]: write scope. Commits on success;
//!   on error it rolls back, logs, and propagates. Exactly one commit
//!   or one rollback happens per invocation.
//!
//! Cleanup is guaranteed on every exit path: both scopes are backed by
//! an `sqlx::Transaction`, which rolls back when dropped uncommitted.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::StoreError;

const DEFAULT_VERSION_NUMBER: &str = "1.0.0";
const DEFAULT_VERSION_NAME: &str = "Initial Release";

/// Pool configuration.
///
/// `recycle_after` and `acquire_timeout` are the two pass-through
/// tunables: pooled connections older than `recycle_after` are
/// replaced rather than reused, and acquisition gives up after
/// `acquire_timeout`. The defaults match the original deployment
/// (299 s recycle, 20 s timeout).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub recycle_after: Duration,
    pub acquire_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/playgate.db"),
            max_connections: 5,
            recycle_after: Duration::from_secs(299),
            acquire_timeout: Duration::from_secs(20),
        }
    }
}

/// Holds the connection pool and the one-shot initialization latch.
///
/// Cheap to clone; clones share the pool and the latch.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    initialized: Arc<AtomicBool>,
}

impl Database {
    /// Open (or create) the database described by `config`.
    ///
    /// The returned handle is not ready for use until [`Database::init`]
    /// has run once.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .max_lifetime(config.recycle_after)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            initialized: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Single-connection in-memory database for tests and ephemeral use.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        // One connection only: each in-memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            initialized: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create the schema and seed the default game version.
    ///
    /// Idempotent: the first successful call does the work, later calls
    /// only log. Failure propagates and leaves the latch unset; the
    /// process must not serve requests over a partially initialized
    /// store.
    pub async fn init(&self) -> Result<(), StoreError> {
        if self.initialized.load(Ordering::Acquire) {
            tracing::info!("database already initialized");
            return Ok(());
        }

        self.run_migrations().await?;
        self.seed_default_version().await?;
        self.initialized.store(true, Ordering::Release);
        tracing::info!("database initialized");
        Ok(())
    }

    /// Release all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run embedded migrations from `store/migrations/`.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Insert the default active version if the catalog is empty.
    async fn seed_default_version(&self) -> Result<(), StoreError> {
        self.transaction(|conn| {
            Box::pin(async move {
                let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM game_versions")
                    .fetch_one(&mut *conn)
                    .await?;
                if count == 0 {
                    sqlx::query(
                        "INSERT INTO game_versions (version_number, version_name, release_date, is_active) \
                         VALUES (?, ?, ?, 1)",
                    )
                    .bind(DEFAULT_VERSION_NUMBER)
                    .bind(DEFAULT_VERSION_NAME)
                    .bind(Utc::now())
                    .execute(&mut *conn)
                    .await?;
                    tracing::info!(version = DEFAULT_VERSION_NUMBER, "seeded default game version");
                }
                Ok(())
            })
        })
        .await
    }

    /// Read scope: a unit of work that is never committed.
    ///
    /// The closure gets the connection for the duration of the scope.
    /// On error the scope rolls back, logs, and re-raises; on success
    /// it simply ends, discarding anything uncommitted. Mutations
    /// belong in [`Database::transaction`].
    pub async fn session<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, StoreError>>,
    {
        let mut tx = self.pool.begin().await?;
        match f(&mut tx).await {
            Ok(value) => Ok(value),
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::warn!(error = %rb, "session rollback failed");
                }
                tracing::error!(error = %e, "session error, rolled back");
                Err(e)
            }
        }
    }

    /// Write scope: commit on success, roll back on error.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, StoreError>>,
    {
        let mut tx = self.pool.begin().await?;
        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::warn!(error = %rb, "transaction rollback failed");
                }
                tracing::error!(error = %e, "transaction error, rolled back");
                Err(e)
            }
        }
    }

    /// Run a read operation, retrying exactly once on a transient
    /// connectivity failure.
    ///
    /// The retried attempt opens a fresh scope of its own; the failed
    /// scope has already rolled back by the time the retry starts. A
    /// second transient failure, and any non-transient error, propagate
    /// unchanged. Pooled connections can go stale after idle periods;
    /// this is not a generic retry policy and write scopes never use it.
    pub(crate) async fn with_read_retry<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        match op().await {
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "transient connectivity failure, retrying read once");
                op().await
            }
            result => result,
        }
    }
}
