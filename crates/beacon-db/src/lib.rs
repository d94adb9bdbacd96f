//! # beacon-db
//!
//! libSQL storage for Beacon.
//!
//! Holds all relational state: companies, admin users, customers, feedback,
//! themes, strategy versions, initiatives, objectives, surveys, the customer
//! health cache, and the audit trail. Repository methods live on
//! [`service::BeaconService`] and are scoped to the caller's company.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod retry;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

pub use error::DatabaseError;
pub use service::{BeaconService, ServiceSettings};

use libsql::Builder;
use retry::RetryConfig;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Central database handle.
///
/// Wraps a libSQL database and a single shared connection.
///
/// Every statement issued through [`Self::execute_with`], [`Self::query_with`]
/// or [`Self::generate_id`] holds a shared guard; a transaction holds the
/// exclusive guard from `BEGIN` to `COMMIT`. Statements from other requests
/// therefore never land inside someone else's transaction. Code holding the
/// exclusive guard must issue statements through the transaction handle only.
pub struct BeaconDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    retry: RetryConfig,
    tx_lock: RwLock<()>,
}

impl BeaconDb {
    /// Open a local database at the given path, or `:memory:`.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        Self::open_local_with_retry(path, RetryConfig::default()).await
    }

    /// Open with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// Same as [`Self::open_local`].
    pub async fn open_local_with_retry(path: &str, retry: RetryConfig) -> Result<Self, DatabaseError> {
        if path != ":memory:"
            && let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::Migration(format!("create {}: {e}", parent.display())))?;
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Foreign keys are per-connection in SQLite
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let beacon_db = Self {
            db,
            conn,
            retry,
            tx_lock: RwLock::new(()),
        };
        beacon_db.run_migrations().await?;
        debug!(path, "database opened");
        Ok(beacon_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Exclusive access to the shared connection for one transaction.
    pub async fn lock_transaction(&self) -> RwLockWriteGuard<'_, ()> {
        self.tx_lock.write().await
    }

    /// Shared access for a single statement outside any transaction.
    pub(crate) async fn lock_statement(&self) -> RwLockReadGuard<'_, ()> {
        self.tx_lock.read().await
    }

    /// Generate a prefixed ID via libSQL. Returns e.g. `"thm-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let _guard = self.lock_statement().await;
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
