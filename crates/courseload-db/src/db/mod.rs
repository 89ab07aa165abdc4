//! Database module for course catalog and user account data

mod courses;
mod query;
mod schema;
mod types;
mod users;

pub use query::{queryable_keys, QueryKey};
pub use schema::initialize_schema;
pub use types::{Course, Instructor, Meeting, User};

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};

/// How many times to try opening the database, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// The wait after failed attempt `i` (0-based) is `base_delay * i`
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Returns the delay to sleep after the given failed attempt (0-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Calls `opener` until it succeeds or `policy.max_attempts` is exhausted.
///
/// Backoff is linear and starts at zero, so the first retry happens right away.
/// On exhaustion the error from the final attempt is returned.
pub fn open_with_retry<F>(policy: &RetryPolicy, mut opener: F) -> DbResult<Connection>
where
    F: FnMut() -> rusqlite::Result<Connection>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match opener() {
            Ok(conn) => {
                if attempt > 0 {
                    info!(attempt = attempt + 1, "Opened database after retrying");
                }
                return Ok(conn);
            }
            Err(source) if attempt + 1 >= attempts => {
                error!(attempts, error = %source, "Giving up opening database");
                return Err(DbError::ConnectionFailure { attempts, source });
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Failed to open database, retrying"
                );
                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

/// Owns the connection shared by every course, query and user operation.
pub struct CourseDbManager {
    db: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl CourseDbManager {
    /// Opens the database file named in `config`, retrying per its policy,
    /// and creates any missing tables.
    ///
    /// Either failure leaves the caller without a usable store and should be
    /// treated as fatal at startup.
    pub fn open(config: &DbConfig) -> DbResult<Self> {
        let conn = open_with_retry(&config.retry_policy(), || Connection::open(&config.path))?;
        info!(path = %config.path.display(), "Opened course database");

        Self::init(conn, Some(config.path.clone()))
    }

    /// Opens a fresh in-memory database with the schema applied
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    /// Adopts an already open connection, creating any missing tables
    pub fn from_connection(conn: Connection) -> DbResult<Self> {
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> DbResult<Self> {
        initialize_schema(&conn)?;

        Ok(Self {
            db: Mutex::new(conn),
            path,
        })
    }

    /// Location of the database file, if it was opened from one
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A panic while holding the lock does not invalidate the connection,
    /// so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
