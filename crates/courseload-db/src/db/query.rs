//! Lookup of courses by a whitelisted field.
//!
//! Callers pick the field by name, but the name only ever selects one of the
//! fixed statements below. Field names never reach SQL text, and compared
//! values are always bound parameters.

use std::fmt;
use std::str::FromStr;

use rusqlite::ToSql;
use tracing::debug;

use super::courses::load_course;
use super::types::Course;
use super::CourseDbManager;
use crate::error::{DbError, DbResult};

/// A course field that may be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Exact match on the term+CRN key
    TermCrn,
    /// Substring match on the title
    Title,
    /// Exact match on the subject code
    SubjectCode,
    /// Exact match on the course number
    CourseNumber,
    /// Exact subject code and substring course number
    SubjectNumber,
}

impl QueryKey {
    /// Every queryable key, in listing order.
    pub const ALL: [QueryKey; 5] = [
        QueryKey::TermCrn,
        QueryKey::Title,
        QueryKey::SubjectCode,
        QueryKey::CourseNumber,
        QueryKey::SubjectNumber,
    ];

    /// The name callers use for this key.
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKey::TermCrn => "term_crn",
            QueryKey::Title => "title",
            QueryKey::SubjectCode => "subject_code",
            QueryKey::CourseNumber => "course_number",
            QueryKey::SubjectNumber => "subject-number",
        }
    }

    /// Human-readable label for listings.
    pub fn label(self) -> &'static str {
        match self {
            QueryKey::TermCrn => "CRN",
            QueryKey::Title => "Title",
            QueryKey::SubjectCode => "Subject",
            QueryKey::CourseNumber => "Number",
            QueryKey::SubjectNumber => "Subject & Number",
        }
    }

    /// How many values a query on this key consumes.
    pub fn arity(self) -> usize {
        match self {
            QueryKey::SubjectNumber => 2,
            _ => 1,
        }
    }

    fn statement(self) -> &'static str {
        match self {
            QueryKey::TermCrn => "SELECT term_crn FROM courses WHERE term_crn = ?1",
            QueryKey::Title => "SELECT term_crn FROM courses WHERE title LIKE ?1 ESCAPE '\\'",
            QueryKey::SubjectCode => "SELECT term_crn FROM courses WHERE subject_code = ?1",
            QueryKey::CourseNumber => "SELECT term_crn FROM courses WHERE course_number = ?1",
            QueryKey::SubjectNumber => {
                "SELECT term_crn FROM courses WHERE subject_code = ?1 AND course_number LIKE ?2 ESCAPE '\\'"
            }
        }
    }

    /// Builds the bound parameters for `statement()`. `values` has at least `arity()` items.
    fn params(self, values: &[&str]) -> Vec<String> {
        match self {
            QueryKey::Title => vec![contains_pattern(values[0])],
            QueryKey::SubjectNumber => vec![values[0].to_string(), contains_pattern(values[1])],
            _ => vec![values[0].to_string()],
        }
    }
}

impl FromStr for QueryKey {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| DbError::UnsupportedQueryKey { key: s.to_string() })
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lists every queryable key with its label, e.g. `("subject-number", "Subject & Number")`.
pub fn queryable_keys() -> impl Iterator<Item = (&'static str, &'static str)> {
    QueryKey::ALL.into_iter().map(|key| (key.as_str(), key.label()))
}

/// Wraps `value` in `%` wildcards, escaping any LIKE metacharacters it contains.
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl CourseDbManager {
    /// Finds courses by a caller-named field
    ///
    /// # Arguments
    /// * `key` - One of the names listed by [`queryable_keys`]
    /// * `values` - One value, or subject code then number for `subject-number`
    ///
    /// # Returns
    /// * `Ok(Vec<Course>)` - Every matching course, fully assembled
    /// * `Err(DbError::UnsupportedQueryKey)` - `key` is not queryable; the store was not touched
    /// * `Err` - The lookup or the expansion of any match failed
    pub fn query_courses(&self, key: &str, values: &[&str]) -> DbResult<Vec<Course>> {
        let key: QueryKey = key.parse()?;
        self.query_courses_by(key, values)
    }

    /// Finds courses by an already validated key
    pub fn query_courses_by(&self, key: QueryKey, values: &[&str]) -> DbResult<Vec<Course>> {
        if values.len() < key.arity() {
            return Err(DbError::MissingQueryValue {
                key: key.as_str(),
                expected: key.arity(),
                got: values.len(),
            });
        }

        let params = key.params(values);
        let params: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();

        let db = self.lock();
        let mut stmt = db.prepare(key.statement())?;
        let crns = stmt
            .query_map(params.as_slice(), |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(%key, matches = crns.len(), "Expanding course query matches");

        crns.iter().map(|crn| load_course(&db, crn)).collect()
    }
}
