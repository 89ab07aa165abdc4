//! Course catalog types as stored and returned by the database
use serde::{Deserialize, Serialize};

/// A course offering together with its instructors and meeting times.
///
/// `crn` is the term+CRN composite key (e.g. `202410-12345`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub crn: String,
    pub title: String,
    pub subject: String,
    pub number: String,
    pub description: String,
    #[serde(default)]
    pub instructors: Vec<Instructor>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub days: String,     // e.g. "MWF"
    pub building: String,
    pub room: String,
    pub time: String,     // e.g. "10:00-10:50"
}

/// A user account row. `password` and `classes` are stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub classes: String,
}
