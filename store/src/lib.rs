//! Persistence layer for the Playgate game backend.
//!
//! Player accounts and the game release catalog live in SQLite behind
//! a single [`Database`] manager. Repositories borrow the manager's
//! two scoped-acquisition primitives (read session, write transaction)
//! and never hold state of their own beyond the handle.
//!
//! ```no_run
//! use playgate_store::{Database, StoreConfig, UserRepository, VersionRepository};
//!
//! # async fn run() -> Result<(), playgate_store::StoreError> {
//! let db = Database::open(&StoreConfig::default()).await?;
//! db.init().await?;
//!
//! let users = UserRepository::new(db.clone());
//! let versions = VersionRepository::new(db.clone());
//!
//! let latest = versions.get_latest_active().await?;
//! # let _ = (users, latest);
//! # Ok(())
//! # }
//! ```

mod database;
mod entities;
mod error;
mod users;
mod versions;

pub use database::{Database, StoreConfig};
pub use entities::{GameVersion, User, UserChanges, VersionChanges};
pub use error::StoreError;
pub use users::{AuthOutcome, UserRepository};
pub use versions::VersionRepository;
