//! User account storage.

use rusqlite::OptionalExtension;
use tracing::debug;

use super::types::User;
use super::CourseDbManager;
use crate::error::{DbError, DbResult};

impl CourseDbManager {
    /// Inserts a user account and returns its id. Usernames must be unique.
    ///
    /// `password` and `classes` are stored verbatim; hashing and encoding are up to the caller.
    pub fn insert_user(&self, username: &str, password: &str, classes: &str) -> DbResult<i64> {
        let db = self.lock();
        db.execute(
            "INSERT INTO users (username, password, classes) VALUES (?1, ?2, ?3)",
            (username, password, classes),
        )?;

        let id = db.last_insert_rowid();
        debug!(username, id, "Inserted user");
        Ok(id)
    }

    /// Gets a user account by username
    pub fn get_user(&self, username: &str) -> DbResult<User> {
        let db = self.lock();
        db.query_row(
            "SELECT id, username, password, classes FROM users WHERE username = ?",
            [username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password: row.get(2)?,
                    classes: row.get(3)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| DbError::NotFound {
            entity: "User",
            key: username.to_string(),
        })
    }
}
