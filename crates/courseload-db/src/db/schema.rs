//! Table definitions and startup schema creation.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Table creation statements, in the order they are run.
const TABLES: [(&str, &str); 4] = [
    ("users", include_str!("../../sql/users.sql")),
    ("courses", include_str!("../../sql/courses.sql")),
    ("instructors", include_str!("../../sql/instructors.sql")),
    ("meetings", include_str!("../../sql/meetings.sql")),
];

/// Creates any missing tables. Safe to run against an already initialized database.
///
/// Also turns on foreign key enforcement for this connection, so `instructors`
/// and `meetings` rows must name an existing course.
pub fn initialize_schema(conn: &Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|source| DbError::SchemaInit {
            step: "foreign_keys",
            source,
        })?;

    for (table, sql) in TABLES {
        debug!(table, "Creating table if not exists");
        conn.execute_batch(sql)
            .map_err(|source| DbError::SchemaInit { step: table, source })?;
    }

    info!("Database schema initialized");
    Ok(())
}
