//! Error types for the course catalog store.

use rusqlite::ffi;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur while opening or querying the store.
#[derive(Debug, Error)]
pub enum DbError {
    /// Every attempt to open the database file failed
    #[error("Failed to open database after {attempts} attempts: {source}")]
    ConnectionFailure {
        attempts: u32,
        #[source]
        source: rusqlite::Error,
    },

    /// A schema setup step (pragma or `CREATE TABLE`) failed during startup
    #[error("Schema setup failed at `{step}`: {source}")]
    SchemaInit {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// No row exists for the given key
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Insert collided with an existing primary or unique key
    #[error("Uniqueness violation: {source}")]
    UniquenessViolation {
        #[source]
        source: rusqlite::Error,
    },

    /// The caller asked to query a field that is not whitelisted
    #[error("Key {key} is not queryable")]
    UnsupportedQueryKey { key: String },

    /// The query key needs more values than were supplied
    #[error("Query key `{key}` expects {expected} value(s), got {got}")]
    MissingQueryValue {
        key: &'static str,
        expected: usize,
        got: usize,
    },

    /// Any other SQLite failure, passed through unchanged
    #[error("Database error: {0}")]
    Store(rusqlite::Error),
}

impl DbError {
    /// Returns true if the process cannot continue without this resolved.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailure { .. } | DbError::SchemaInit { .. }
        )
    }

    /// Returns true if this error means the requested row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        let duplicate_key = matches!(
            &err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        );

        if duplicate_key {
            DbError::UniquenessViolation { source: err }
        } else {
            DbError::Store(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_constraint_is_classified() {
        let err = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: users.username".to_string()),
        );
        assert!(matches!(
            DbError::from(err),
            DbError::UniquenessViolation { .. }
        ));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = DbError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(
            err,
            DbError::Store(rusqlite::Error::QueryReturnedNoRows)
        ));
        assert!(!err.is_fatal());
        assert!(!err.is_not_found());
    }
}
