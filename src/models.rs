//! Typed views of the six tables. The table access layer itself works on
//! untyped [`Record`]s; these structs are for callers that want named fields,
//! and for the one-line summaries the records browser shows.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{Record, Table};
use crate::error::{AccessError, Result};

/// A struct that mirrors one table row.
pub trait Entity: Serialize + DeserializeOwned {
    const TABLE: Table;

    /// Decode a record fetched from the entity's table.
    fn from_record(record: Record) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    /// Encode into a record ready for `insert_into_table`, columns in
    /// declared order.
    fn to_record(&self) -> Result<Record> {
        match serde_json::to_value(self)? {
            Value::Object(record) => Ok(record),
            other => Err(AccessError::Decode(serde::ser::Error::custom(format!(
                "expected an object, serialized {other}"
            )))),
        }
    }
}

/// A registered student (`user_reg`).
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Primary key.
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
    /// ISO `YYYY-MM-DD` date.
    pub date_of_birth: String,
    /// Stored as supplied; nothing in this crate hashes or checks it.
    pub password: String,
}

impl fmt::Debug for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Student")
            .field("student_id", &self.student_id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("address", &self.address)
            .field("phone_number", &self.phone_number)
            .field("email", &self.email)
            .field("date_of_birth", &self.date_of_birth)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} <{}>", self.first_name, self.last_name, self.email)
    }
}

/// A course offering with its weekly time slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Primary key.
    pub course_id: i64,
    pub course_name: String,
    pub instructor_name: String,
    /// `HH:MM` time of day.
    pub start_time: String,
    /// `HH:MM` time of day.
    pub end_time: String,
    pub course_description: String,
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}-{})",
            self.course_name, self.instructor_name, self.start_time, self.end_time
        )
    }
}

/// A student taking a course, with the grade earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Primary key.
    pub enrollment_id: i64,
    /// References `user_reg.student_id`.
    pub student_id: i64,
    /// References `courses.course_id`.
    pub course_id: i64,
    /// Letter grade, at most two characters.
    pub grade: String,
}

impl fmt::Display for Enrollment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "student {} in course {}: {}",
            self.student_id, self.course_id, self.grade
        )
    }
}

/// A timetable entry placing a student in a room for a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Primary key.
    pub schedule_id: i64,
    /// References `user_reg.student_id`.
    pub student_id: i64,
    /// References `courses.course_id`.
    pub course_id: i64,
    pub start_time: String,
    pub end_time: String,
    pub room_number: String,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "student {} / course {} in {} ({}-{})",
            self.student_id, self.course_id, self.room_number, self.start_time, self.end_time
        )
    }
}

/// An academic department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    /// Primary key.
    pub department_id: i64,
    pub department_name: String,
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.department_name)
    }
}

/// A member of the teaching staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professor {
    /// Primary key.
    pub professor_id: i64,
    pub professor_name: String,
    pub address: String,
    pub phone_number: String,
    pub email_address: String,
}

impl fmt::Display for Professor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.professor_name, self.email_address)
    }
}

impl Entity for Student {
    const TABLE: Table = Table::Student;
}

impl Entity for Course {
    const TABLE: Table = Table::Course;
}

impl Entity for Enrollment {
    const TABLE: Table = Table::Enrollment;
}

impl Entity for Schedule {
    const TABLE: Table = Table::Schedule;
}

impl Entity for Department {
    const TABLE: Table = Table::Department;
}

impl Entity for Professor {
    const TABLE: Table = Table::Professor;
}

fn describe<T: Entity + fmt::Display>(record: &Record) -> Option<String> {
    T::from_record(record.clone()).ok().map(|entity| entity.to_string())
}

/// One-line description of a row of `table`. Rows that do not decode (for
/// example a hand-edited database with NULLs) fall back to their primary key.
pub fn summarize(table: Table, record: &Record) -> String {
    let described = match table {
        Table::Student => describe::<Student>(record),
        Table::Course => describe::<Course>(record),
        Table::Enrollment => describe::<Enrollment>(record),
        Table::Schedule => describe::<Schedule>(record),
        Table::Department => describe::<Department>(record),
        Table::Professor => describe::<Professor>(record),
    };

    described.unwrap_or_else(|| {
        let key = record
            .get(table.primary_key())
            .map(crate::db::value::display_value)
            .unwrap_or_else(|| "?".to_string());
        format!("{} #{key}", table.name())
    })
}
