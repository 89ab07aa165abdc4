//! SQLite persistence for a course catalog: courses with their instructors and
//! meeting times, user accounts, and lookups over a fixed set of course fields.

pub mod config;
pub mod db;
pub mod error;

pub use config::{Config, DbConfig, LoggingConfig};
pub use db::{
    initialize_schema, open_with_retry, queryable_keys, Course, CourseDbManager, Instructor,
    Meeting, QueryKey, RetryPolicy, User,
};
pub use error::{DbError, DbResult};
