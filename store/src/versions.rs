//! Repository for game release records.
//!
//! Owns the global invariant that at most one `game_versions` row is
//! active. Both activation paths (creating an active version and
//! re-activating an existing one) deactivate every other row inside
//! the same write scope, so no reader outside the transaction observes
//! zero or two active versions.

use chrono::Utc;

use crate::database::Database;
use crate::entities::{GameVersion, VersionChanges};
use crate::error::StoreError;

const VERSION_COLUMNS: &str = "id, version_number, version_name, release_date, is_active";

/// Repository for [`GameVersion`] rows.
#[derive(Clone)]
pub struct VersionRepository {
    db: Database,
}

impl VersionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new release. `release_date` defaults to now.
    ///
    /// When `is_active` is set, every existing row is deactivated in
    /// the same transaction as the insert.
    pub async fn create(
        &self,
        version_number: &str,
        version_name: &str,
        is_active: bool,
    ) -> Result<GameVersion, StoreError> {
        let version_number = version_number.to_owned();
        let version_name = version_name.to_owned();
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    if is_active {
                        sqlx::query("UPDATE game_versions SET is_active = 0 WHERE is_active = 1")
                            .execute(&mut *conn)
                            .await?;
                    }

                    let result = sqlx::query(
                        "INSERT INTO game_versions (version_number, version_name, release_date, is_active) \
                         VALUES (?, ?, ?, ?)",
                    )
                    .bind(&version_number)
                    .bind(&version_name)
                    .bind(Utc::now())
                    .bind(is_active)
                    .execute(&mut *conn)
                    .await?;

                    let version: GameVersion = sqlx::query_as(&format!(
                        "SELECT {VERSION_COLUMNS} FROM game_versions WHERE id = ?"
                    ))
                    .bind(result.last_insert_rowid())
                    .fetch_one(&mut *conn)
                    .await?;

                    tracing::info!(
                        version = %version.version_number,
                        name = %version.version_name,
                        "created game version"
                    );
                    Ok(version)
                })
            })
            .await
    }

    /// The currently active release, newest `release_date` first in
    /// case more than one row is ever flagged active. Uses the single
    /// transient-failure retry.
    pub async fn get_latest_active(&self) -> Result<Option<GameVersion>, StoreError> {
        self.db.with_read_retry(|| self.fetch_latest_active()).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<GameVersion>, StoreError> {
        self.db
            .session(|conn| {
                Box::pin(async move {
                    Ok(sqlx::query_as::<_, GameVersion>(&format!(
                        "SELECT {VERSION_COLUMNS} FROM game_versions WHERE id = ?"
                    ))
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?)
                })
            })
            .await
    }

    /// All releases, newest first.
    pub async fn list_all(&self) -> Result<Vec<GameVersion>, StoreError> {
        self.db
            .session(|conn| {
                Box::pin(async move {
                    Ok(sqlx::query_as::<_, GameVersion>(&format!(
                        "SELECT {VERSION_COLUMNS} FROM game_versions ORDER BY release_date DESC"
                    ))
                    .fetch_all(&mut *conn)
                    .await?)
                })
            })
            .await
    }

    /// Make `id` the single active release.
    ///
    /// One write scope: verify the target exists, deactivate every row,
    /// activate the target, commit as one unit. A missing target
    /// returns `None` and mutates nothing; the previously active
    /// release stays active. The existence check runs inside the
    /// transaction so a concurrent delete cannot strand the catalog
    /// with zero active rows.
    pub async fn set_active(&self, id: i64) -> Result<Option<GameVersion>, StoreError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let exists: Option<(i64,)> =
                        sqlx::query_as("SELECT id FROM game_versions WHERE id = ?")
                            .bind(id)
                            .fetch_optional(&mut *conn)
                            .await?;
                    if exists.is_none() {
                        return Ok(None);
                    }

                    sqlx::query("UPDATE game_versions SET is_active = 0 WHERE is_active = 1")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("UPDATE game_versions SET is_active = 1 WHERE id = ?")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;

                    let version: GameVersion = sqlx::query_as(&format!(
                        "SELECT {VERSION_COLUMNS} FROM game_versions WHERE id = ?"
                    ))
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await?;

                    tracing::info!(version = %version.version_number, "set active game version");
                    Ok(Some(version))
                })
            })
            .await
    }

    /// Apply the present fields of `changes`; absent id returns `None`.
    pub async fn update(
        &self,
        id: i64,
        changes: VersionChanges,
    ) -> Result<Option<GameVersion>, StoreError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query(
                        "UPDATE game_versions SET \
                            version_number = COALESCE(?, version_number), \
                            version_name = COALESCE(?, version_name), \
                            release_date = COALESCE(?, release_date) \
                         WHERE id = ?",
                    )
                    .bind(&changes.version_number)
                    .bind(&changes.version_name)
                    .bind(changes.release_date)
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Ok(None);
                    }

                    let version: GameVersion = sqlx::query_as(&format!(
                        "SELECT {VERSION_COLUMNS} FROM game_versions WHERE id = ?"
                    ))
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await?;

                    tracing::info!(version = %version.version_number, "updated game version");
                    Ok(Some(version))
                })
            })
            .await
    }

    /// Remove a release. Returns true iff a row was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query("DELETE FROM game_versions WHERE id = ?")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    let deleted = result.rows_affected() > 0;
                    if deleted {
                        tracing::info!(id, "deleted game version");
                    }
                    Ok(deleted)
                })
            })
            .await
    }

    async fn fetch_latest_active(&self) -> Result<Option<GameVersion>, StoreError> {
        self.db
            .session(|conn| {
                Box::pin(async move {
                    Ok(sqlx::query_as::<_, GameVersion>(&format!(
                        "SELECT {VERSION_COLUMNS} FROM game_versions \
                         WHERE is_active = 1 ORDER BY release_date DESC LIMIT 1"
                    ))
                    .fetch_optional(&mut *conn)
                    .await?)
                })
            })
            .await
    }
}
