//! Repository for player accounts.

use chrono::Utc;

use crate::database::Database;
use crate::entities::{User, UserChanges};
use crate::error::StoreError;

const USER_COLUMNS: &str = "id, username, password_hash, is_subscription, crystal, created_at";

/// Outcome of an authentication attempt.
///
/// Lookup misses and bad passwords are ordinary outcomes, not errors;
/// only storage failures surface as [`StoreError`].
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Credentials verified.
    Authenticated(User),
    /// No account with that username.
    UnknownUser,
    /// Account exists, password did not verify.
    WrongPassword,
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Stable user-facing message for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Authenticated(_) => "authentication successful",
            Self::UnknownUser => "user not found",
            Self::WrongPassword => "wrong password",
        }
    }
}

/// Repository for [`User`] rows.
#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new account and return the stored row.
    ///
    /// Uniqueness of `username` is enforced by the schema's UNIQUE
    /// constraint; a violation surfaces as [`StoreError::Database`]
    /// (see [`StoreError::is_constraint_violation`]).
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        is_subscription: bool,
        crystal: i64,
    ) -> Result<User, StoreError> {
        let username = username.to_owned();
        let password_hash = password_hash.to_owned();
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query(
                        "INSERT INTO users (username, password_hash, is_subscription, crystal, created_at) \
                         VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(&username)
                    .bind(&password_hash)
                    .bind(is_subscription)
                    .bind(crystal)
                    .bind(Utc::now())
                    .execute(&mut *conn)
                    .await?;

                    let user: User = sqlx::query_as(&format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
                    ))
                    .bind(result.last_insert_rowid())
                    .fetch_one(&mut *conn)
                    .await?;

                    tracing::info!(username = %user.username, id = user.id, "created user");
                    Ok(user)
                })
            })
            .await
    }

    /// Point lookup by id, with the single transient-failure retry.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.db.with_read_retry(|| self.fetch_by_id(id)).await
    }

    /// Point lookup by username, with the single transient-failure retry.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.db
            .with_read_retry(|| self.fetch_by_username(username))
            .await
    }

    /// Look up `username` and verify the password through the injected
    /// `verify` capability. Hashing and comparison both live with the
    /// caller; this repository only hands over the stored hash.
    pub async fn authenticate<F>(
        &self,
        username: &str,
        verify: F,
        password: &str,
    ) -> Result<AuthOutcome, StoreError>
    where
        F: FnOnce(&str, &str) -> bool,
    {
        let Some(user) = self.fetch_by_username(username).await? else {
            return Ok(AuthOutcome::UnknownUser);
        };
        if !verify(&user.password_hash, password) {
            return Ok(AuthOutcome::WrongPassword);
        }
        Ok(AuthOutcome::Authenticated(user))
    }

    pub async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        self.db
            .session(|conn| {
                Box::pin(async move {
                    Ok(sqlx::query_as::<_, User>(&format!(
                        "SELECT {USER_COLUMNS} FROM users"
                    ))
                    .fetch_all(&mut *conn)
                    .await?)
                })
            })
            .await
    }

    /// Apply the present fields of `changes`; absent id returns `None`.
    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query(
                        "UPDATE users SET \
                            password_hash = COALESCE(?, password_hash), \
                            is_subscription = COALESCE(?, is_subscription), \
                            crystal = COALESCE(?, crystal) \
                         WHERE id = ?",
                    )
                    .bind(&changes.password_hash)
                    .bind(changes.is_subscription)
                    .bind(changes.crystal)
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Ok(None);
                    }

                    let user: User = sqlx::query_as(&format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
                    ))
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await?;

                    tracing::info!(username = %user.username, id = user.id, "updated user");
                    Ok(Some(user))
                })
            })
            .await
    }

    /// Remove an account. Returns true iff a row was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query("DELETE FROM users WHERE id = ?")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    let deleted = result.rows_affected() > 0;
                    if deleted {
                        tracing::info!(id, "deleted user");
                    }
                    Ok(deleted)
                })
            })
            .await
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.db
            .session(|conn| {
                Box::pin(async move {
                    Ok(sqlx::query_as::<_, User>(&format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
                    ))
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?)
                })
            })
            .await
    }

    async fn fetch_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let username = username.to_owned();
        self.db
            .session(move |conn| {
                Box::pin(async move {
                    Ok(sqlx::query_as::<_, User>(&format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
                    ))
                    .bind(username)
                    .fetch_optional(&mut *conn)
                    .await?)
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> UserRepository {
        let db = Database::open_in_memory().await.unwrap();
        db.init().await.unwrap();
        UserRepository::new(db)
    }

    /// Stand-in for a real hash verifier: "hashes" are `hashed:<pw>`.
    fn fake_verify(hash: &str, password: &str) -> bool {
        hash == format!("hashed:{password}")
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let repo = test_repo().await;
        let created = repo.create("bob", "hashed:pw", false, 0).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.username, "bob");
        assert!(!created.is_subscription);
        assert_eq!(created.crystal, 0);

        let loaded = repo.get_by_username("bob").await.unwrap();
        assert_eq!(loaded, Some(created.clone()));
        let by_id = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(by_id, Some(created));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let repo = test_repo().await;
        assert_eq!(repo.get_by_id(999).await.unwrap(), None);
        assert_eq!(repo.get_by_username("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_constraint_violation() {
        let repo = test_repo().await;
        repo.create("bob", "hashed:pw", false, 0).await.unwrap();
        let err = repo.create("bob", "hashed:other", true, 5).await.unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let repo = test_repo().await;
        let created = repo.create("bob", "hashed:pw", true, 7).await.unwrap();
        let outcome = repo.authenticate("bob", fake_verify, "pw").await.unwrap();
        assert_eq!(outcome, AuthOutcome::Authenticated(created));
        assert!(outcome.is_authenticated());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let repo = test_repo().await;
        repo.create("bob", "hashed:pw", false, 0).await.unwrap();
        let outcome = repo
            .authenticate("bob", fake_verify, "wrongpw")
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::WrongPassword);
        assert_eq!(outcome.message(), "wrong password");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let repo = test_repo().await;
        let outcome = repo
            .authenticate("nobody", fake_verify, "pw")
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::UnknownUser);
        assert_eq!(outcome.message(), "user not found");
    }

    #[tokio::test]
    async fn test_list_all() {
        let repo = test_repo().await;
        assert!(repo.list_all().await.unwrap().is_empty());
        repo.create("bob", "h", false, 0).await.unwrap();
        repo.create("alice", "h", true, 3).await.unwrap();
        let users = repo.list_all().await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_update_applies_present_fields() {
        let repo = test_repo().await;
        let created = repo.create("bob", "hashed:pw", false, 0).await.unwrap();

        let changes = UserChanges {
            crystal: Some(50),
            is_subscription: Some(true),
            ..UserChanges::default()
        };
        let updated = repo.update(created.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.crystal, 50);
        assert!(updated.is_subscription);
        // Untouched fields survive.
        assert_eq!(updated.username, "bob");
        assert_eq!(updated.password_hash, "hashed:pw");
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_with_unknown_json_field_is_a_no_op() {
        let repo = test_repo().await;
        let created = repo.create("bob", "hashed:pw", false, 9).await.unwrap();

        let changes: UserChanges =
            serde_json::from_str(r#"{"nonexistent_field": 1}"#).unwrap();
        let updated = repo.update(created.id, changes).await.unwrap();
        assert_eq!(updated, Some(created));
    }

    #[tokio::test]
    async fn test_update_missing_id_returns_none() {
        let repo = test_repo().await;
        let changes = UserChanges {
            crystal: Some(1),
            ..UserChanges::default()
        };
        assert_eq!(repo.update(999, changes).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = test_repo().await;
        let created = repo.create("bob", "h", false, 0).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert_eq!(repo.get_by_id(created.id).await.unwrap(), None);
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
