//! Course aggregate storage: one `courses` row plus its `instructors` and `meetings` rows.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use super::types::{Course, Instructor, Meeting};
use super::CourseDbManager;
use crate::error::{DbError, DbResult};

const INSERT_COURSE: &str = "INSERT INTO courses (term_crn, title, subject_code, course_number, description)
     VALUES (?1, ?2, ?3, ?4, ?5)";
const INSERT_INSTRUCTOR: &str =
    "INSERT INTO instructors (last_name, first_name, email, term_crn) VALUES (?1, ?2, ?3, ?4)";
const INSERT_MEETING: &str =
    "INSERT INTO meetings (days, building, room, time, term_crn) VALUES (?1, ?2, ?3, ?4, ?5)";

const SELECT_COURSE: &str = "SELECT term_crn, title, subject_code, course_number, description
     FROM courses WHERE term_crn = ?";
const SELECT_INSTRUCTORS: &str =
    "SELECT last_name, first_name, email FROM instructors WHERE term_crn = ? ORDER BY id";
const SELECT_MEETINGS: &str =
    "SELECT days, building, room, time FROM meetings WHERE term_crn = ? ORDER BY id";

impl CourseDbManager {
    /// Inserts a course with all of its instructors and meetings
    ///
    /// The course row is written first, then instructors, then meetings, all in
    /// one transaction. If any statement fails nothing is kept.
    ///
    /// # Returns
    /// * `Ok(())` - The whole aggregate was written
    /// * `Err(DbError::UniquenessViolation)` - A course with this CRN already exists
    /// * `Err` - Any other write failure
    pub fn insert_course(&self, course: &Course) -> DbResult<()> {
        let mut db = self.lock();
        let tx = db.transaction()?;

        tx.execute(
            INSERT_COURSE,
            (
                &course.crn,
                &course.title,
                &course.subject,
                &course.number,
                &course.description,
            ),
        )?;

        {
            let mut stmt = tx.prepare(INSERT_INSTRUCTOR)?;
            for instructor in &course.instructors {
                stmt.execute((
                    &instructor.last_name,
                    &instructor.first_name,
                    &instructor.email,
                    &course.crn,
                ))?;
            }

            let mut stmt = tx.prepare(INSERT_MEETING)?;
            for meeting in &course.meetings {
                stmt.execute((
                    &meeting.days,
                    &meeting.building,
                    &meeting.room,
                    &meeting.time,
                    &course.crn,
                ))?;
            }
        }

        tx.commit()?;

        debug!(
            crn = %course.crn,
            instructors = course.instructors.len(),
            meetings = course.meetings.len(),
            "Inserted course"
        );
        Ok(())
    }

    /// Deletes a course and every instructor and meeting row attached to it
    ///
    /// Runs as one transaction; the first failing statement rolls everything back.
    /// Child rows go first so the foreign keys hold at every statement.
    /// Deleting a CRN that has no course row is a `NotFound` error and changes nothing.
    pub fn delete_course(&self, crn: &str) -> DbResult<()> {
        let mut db = self.lock();
        let tx = db.transaction()?;

        let instructors = tx.execute("DELETE FROM instructors WHERE term_crn = ?", [crn])?;
        let meetings = tx.execute("DELETE FROM meetings WHERE term_crn = ?", [crn])?;

        let deleted = tx.execute("DELETE FROM courses WHERE term_crn = ?", [crn])?;
        if deleted == 0 {
            return Err(DbError::NotFound {
                entity: "Course",
                key: crn.to_string(),
            });
        }
        tx.commit()?;

        info!(crn, instructors, meetings, "Deleted course");
        Ok(())
    }

    /// Gets a course with its instructors and meetings
    ///
    /// # Returns
    /// * `Ok(Course)` - The assembled course
    /// * `Err(DbError::NotFound)` - No course has this CRN
    /// * `Err` - Reading the course or any of its child rows failed
    pub fn get_course(&self, crn: &str) -> DbResult<Course> {
        let db = self.lock();
        load_course(&db, crn)
    }

    /// Lists the CRN of every stored course, in table scan order
    pub fn course_keys(&self) -> DbResult<Vec<String>> {
        let db = self.lock();
        let mut stmt = db.prepare("SELECT term_crn FROM courses")?;

        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(keys)
    }
}

/// Reads one course aggregate using an already locked connection.
pub(super) fn load_course(db: &Connection, crn: &str) -> DbResult<Course> {
    let mut course = db
        .query_row(SELECT_COURSE, [crn], |row| {
            Ok(Course {
                crn: row.get(0)?,
                title: row.get(1)?,
                subject: row.get(2)?,
                number: row.get(3)?,
                description: row.get(4)?,
                instructors: Vec::new(),
                meetings: Vec::new(),
            })
        })
        .optional()?
        .ok_or_else(|| DbError::NotFound {
            entity: "Course",
            key: crn.to_string(),
        })?;

    let mut stmt = db.prepare(SELECT_INSTRUCTORS)?;
    course.instructors = stmt
        .query_map([crn], |row| {
            Ok(Instructor {
                last_name: row.get(0)?,
                first_name: row.get(1)?,
                email: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = db.prepare(SELECT_MEETINGS)?;
    course.meetings = stmt
        .query_map([crn], |row| {
            Ok(Meeting {
                days: row.get(0)?,
                building: row.get(1)?,
                room: row.get(2)?,
                time: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(course)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intro_course() -> Course {
        Course {
            crn: "202410-12345".to_string(),
            title: "Intro to Systems".to_string(),
            subject: "CS".to_string(),
            number: "101".to_string(),
            description: "Processes, memory and files.".to_string(),
            instructors: vec![Instructor {
                last_name: "Doe".to_string(),
                first_name: "Jane".to_string(),
                email: "jdoe@x.edu".to_string(),
            }],
            meetings: vec![Meeting {
                days: "MWF".to_string(),
                building: "Hall".to_string(),
                room: "101".to_string(),
                time: "10:00-10:50".to_string(),
            }],
        }
    }

    fn count(db: &CourseDbManager, table: &str, crn: &str) -> i64 {
        db.lock()
            .query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE term_crn = ?"),
                [crn],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_insert_then_get_round_trips() {
        let db = CourseDbManager::open_in_memory().unwrap();
        let course = intro_course();

        db.insert_course(&course).unwrap();
        assert_eq!(db.get_course(&course.crn).unwrap(), course);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let db = CourseDbManager::open_in_memory().unwrap();
        let mut course = intro_course();
        course.instructors.push(Instructor {
            last_name: "Roe".to_string(),
            first_name: "Rich".to_string(),
            email: "rroe@x.edu".to_string(),
        });
        course.meetings.push(Meeting {
            days: "R".to_string(),
            building: "Lab".to_string(),
            room: "B12".to_string(),
            time: "14:00-15:50".to_string(),
        });

        db.insert_course(&course).unwrap();
        let fetched = db.get_course(&course.crn).unwrap();
        assert_eq!(fetched.instructors, course.instructors);
        assert_eq!(fetched.meetings, course.meetings);
    }

    #[test]
    fn test_course_without_children() {
        let db = CourseDbManager::open_in_memory().unwrap();
        let mut course = intro_course();
        course.instructors.clear();
        course.meetings.clear();

        db.insert_course(&course).unwrap();
        let fetched = db.get_course(&course.crn).unwrap();
        assert!(fetched.instructors.is_empty());
        assert!(fetched.meetings.is_empty());
    }

    #[test]
    fn test_duplicate_insert_keeps_original() {
        let db = CourseDbManager::open_in_memory().unwrap();
        let original = intro_course();
        db.insert_course(&original).unwrap();

        let mut duplicate = intro_course();
        duplicate.title = "Something Else".to_string();
        duplicate.instructors[0].last_name = "Other".to_string();

        let err = db.insert_course(&duplicate).unwrap_err();
        assert!(matches!(err, DbError::UniquenessViolation { .. }));
        assert_eq!(db.get_course(&original.crn).unwrap(), original);
        assert_eq!(count(&db, "instructors", &original.crn), 1);
    }

    #[test]
    fn test_failed_child_insert_rolls_back_course() {
        let db = CourseDbManager::open_in_memory().unwrap();
        db.lock().execute_batch("DROP TABLE meetings").unwrap();

        let course = intro_course();
        let err = db.insert_course(&course).unwrap_err();
        assert!(matches!(err, DbError::Store(_)));

        assert!(db.get_course(&course.crn).unwrap_err().is_not_found());
        assert_eq!(count(&db, "instructors", &course.crn), 0);
    }

    #[test]
    fn test_delete_removes_children() {
        let db = CourseDbManager::open_in_memory().unwrap();
        let course = intro_course();
        db.insert_course(&course).unwrap();

        db.delete_course(&course.crn).unwrap();

        assert!(db.get_course(&course.crn).unwrap_err().is_not_found());
        assert_eq!(count(&db, "instructors", &course.crn), 0);
        assert_eq!(count(&db, "meetings", &course.crn), 0);
    }

    #[test]
    fn test_delete_missing_course_is_not_found() {
        let db = CourseDbManager::open_in_memory().unwrap();

        let err = db.delete_course("202410-00000").unwrap_err();
        assert!(matches!(
            err,
            DbError::NotFound { entity: "Course", ref key } if key == "202410-00000"
        ));
    }

    #[test]
    fn test_delete_missing_course_keeps_orphans() {
        let db = CourseDbManager::open_in_memory().unwrap();
        db.lock()
            .execute_batch(
                "PRAGMA foreign_keys = OFF;
                 INSERT INTO instructors (last_name, first_name, email, term_crn)
                     VALUES ('Doe', 'Jane', 'jdoe@x.edu', 'ghost');
                 PRAGMA foreign_keys = ON;",
            )
            .unwrap();

        let err = db.delete_course("ghost").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(count(&db, "instructors", "ghost"), 1);
    }

    #[test]
    fn test_failed_child_delete_rolls_back() {
        let db = CourseDbManager::open_in_memory().unwrap();
        let course = intro_course();
        db.insert_course(&course).unwrap();
        db.lock().execute_batch("DROP TABLE meetings").unwrap();

        let err = db.delete_course(&course.crn).unwrap_err();
        assert!(matches!(err, DbError::Store(_)));

        assert_eq!(db.course_keys().unwrap(), vec![course.crn.clone()]);
        assert_eq!(count(&db, "instructors", &course.crn), 1);
    }

    #[test]
    fn test_get_missing_course_is_not_found() {
        let db = CourseDbManager::open_in_memory().unwrap();
        assert!(db.get_course("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_course_keys() {
        let db = CourseDbManager::open_in_memory().unwrap();
        assert_eq!(db.course_keys().unwrap(), Vec::<String>::new());

        let mut second = intro_course();
        second.crn = "202410-22222".to_string();
        db.insert_course(&intro_course()).unwrap();
        db.insert_course(&second).unwrap();

        let mut keys = db.course_keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["202410-12345", "202410-22222"]);
    }
}
