//! Retry logic for transient lock contention.
//!
//! A local libSQL file can report `database is locked` or `SQLITE_BUSY`
//! while another writer holds the lock. These clear up on their own, so
//! `execute_with` and `query_with` retry them with capped exponential backoff.

use std::time::Duration;

use tracing::warn;

use crate::BeaconDb;
use crate::error::DatabaseError;

/// Configuration for retry behavior on transient errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Detect lock contention errors.
///
/// Kept narrow so constraint violations and SQL errors fail immediately.
pub fn is_transient_error(e: &libsql::Error) -> bool {
    let msg = e.to_string().to_lowercase();
    msg.contains("database is locked") || msg.contains("database is busy") || msg.contains("sqlite_busy")
}

impl BeaconDb {
    /// Execute a statement, retrying transient lock errors.
    ///
    /// `params` is called once per attempt because libSQL consumes parameters.
    ///
    /// # Errors
    ///
    /// Returns the last `libsql::Error` once attempts are exhausted, or
    /// immediately for non-transient errors.
    pub async fn execute_with<P, F>(&self, sql: &str, params: F) -> Result<u64, DatabaseError>
    where
        P: libsql::params::IntoParams,
        F: Fn() -> P,
    {
        let _guard = self.lock_statement().await;
        let mut attempt = 1;
        loop {
            match self.conn.execute(sql, params()).await {
                Ok(n) => return Ok(n),
                Err(e) if attempt < self.retry.max_attempts && is_transient_error(&e) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(attempt, ?delay, error = %e, "transient database error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Run a query, retrying transient lock errors.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute_with`].
    pub async fn query_with<P, F>(&self, sql: &str, params: F) -> Result<libsql::Rows, DatabaseError>
    where
        P: libsql::params::IntoParams,
        F: Fn() -> P,
    {
        let _guard = self.lock_statement().await;
        let mut attempt = 1;
        loop {
            match self.conn.query(sql, params()).await {
                Ok(rows) => return Ok(rows),
                Err(e) if attempt < self.retry.max_attempts && is_transient_error(&e) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(attempt, ?delay, error = %e, "transient database error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
