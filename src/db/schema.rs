//! The fixed relational schema. Table identity is a closed enum so every
//! statement the layer builds starts from a known table and a known column
//! list; string names are only accepted at the boundary through `FromStr`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// Storage class declared for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Date,
    Time,
}

/// One column of a table as declared in the bootstrap DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnType,
    /// Declared SQL type, e.g. `VARCHAR(50)`.
    pub sql_type: &'static str,
    /// `(table, column)` this column references, if any.
    pub references: Option<(&'static str, &'static str)>,
}

const fn int(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnType::Integer,
        sql_type: "INTEGER",
        references: None,
    }
}

const fn text(name: &'static str, sql_type: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnType::Text,
        sql_type,
        references: None,
    }
}

const fn date(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnType::Date,
        sql_type: "DATE",
        references: None,
    }
}

const fn time(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnType::Time,
        sql_type: "TIME",
        references: None,
    }
}

const fn foreign(name: &'static str, table: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnType::Integer,
        sql_type: "INTEGER",
        references: Some((table, name)),
    }
}

const STUDENT_COLUMNS: &[ColumnDef] = &[
    int("student_id"),
    text("first_name", "VARCHAR(50)"),
    text("last_name", "VARCHAR(50)"),
    text("address", "VARCHAR(100)"),
    text("phone_number", "VARCHAR(20)"),
    text("email", "VARCHAR(100)"),
    date("date_of_birth"),
    text("password", "VARCHAR(100)"),
];

const COURSE_COLUMNS: &[ColumnDef] = &[
    int("course_id"),
    text("course_name", "VARCHAR(50)"),
    text("instructor_name", "VARCHAR(50)"),
    time("start_time"),
    time("end_time"),
    text("course_description", "VARCHAR(200)"),
];

const ENROLLMENT_COLUMNS: &[ColumnDef] = &[
    int("enrollment_id"),
    foreign("student_id", "user_reg"),
    foreign("course_id", "courses"),
    text("grade", "VARCHAR(2)"),
];

const SCHEDULE_COLUMNS: &[ColumnDef] = &[
    int("schedule_id"),
    foreign("student_id", "user_reg"),
    foreign("course_id", "courses"),
    time("start_time"),
    time("end_time"),
    text("room_number", "VARCHAR(20)"),
];

const DEPARTMENT_COLUMNS: &[ColumnDef] = &[
    int("department_id"),
    text("department_name", "VARCHAR(50)"),
];

const PROFESSOR_COLUMNS: &[ColumnDef] = &[
    int("professor_id"),
    text("professor_name", "VARCHAR(50)"),
    text("address", "VARCHAR(100)"),
    text("phone_number", "VARCHAR(20)"),
    text("email_address", "VARCHAR(100)"),
];

/// The six tables of the records database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Table {
    Student,
    Course,
    Enrollment,
    Schedule,
    Department,
    Professor,
}

impl Table {
    /// Every table, in bootstrap order (referenced tables first).
    pub const ALL: [Table; 6] = [
        Table::Student,
        Table::Course,
        Table::Enrollment,
        Table::Schedule,
        Table::Department,
        Table::Professor,
    ];

    /// Name of the table in the database file.
    pub const fn name(self) -> &'static str {
        match self {
            Table::Student => "user_reg",
            Table::Course => "courses",
            Table::Enrollment => "enrollment",
            Table::Schedule => "schedule",
            Table::Department => "department",
            Table::Professor => "professor",
        }
    }

    /// Short label for the records browser tabs.
    pub const fn title(self) -> &'static str {
        match self {
            Table::Student => "Students",
            Table::Course => "Courses",
            Table::Enrollment => "Enrollments",
            Table::Schedule => "Schedules",
            Table::Department => "Departments",
            Table::Professor => "Professors",
        }
    }

    /// Declared columns in table order; this is the identifier whitelist.
    pub const fn columns(self) -> &'static [ColumnDef] {
        match self {
            Table::Student => STUDENT_COLUMNS,
            Table::Course => COURSE_COLUMNS,
            Table::Enrollment => ENROLLMENT_COLUMNS,
            Table::Schedule => SCHEDULE_COLUMNS,
            Table::Department => DEPARTMENT_COLUMNS,
            Table::Professor => PROFESSOR_COLUMNS,
        }
    }

    /// The primary key is always the first declared column.
    pub const fn primary_key(self) -> &'static str {
        self.columns()[0].name
    }

    /// `SELECT *` over the whole table.
    pub const fn select_all_sql(self) -> &'static str {
        match self {
            Table::Student => "SELECT * FROM user_reg",
            Table::Course => "SELECT * FROM courses",
            Table::Enrollment => "SELECT * FROM enrollment",
            Table::Schedule => "SELECT * FROM schedule",
            Table::Department => "SELECT * FROM department",
            Table::Professor => "SELECT * FROM professor",
        }
    }

    /// `SELECT *` filtered on the primary key, bound as `?1`.
    pub const fn select_one_sql(self) -> &'static str {
        match self {
            Table::Student => "SELECT * FROM user_reg WHERE student_id = ?1",
            Table::Course => "SELECT * FROM courses WHERE course_id = ?1",
            Table::Enrollment => "SELECT * FROM enrollment WHERE enrollment_id = ?1",
            Table::Schedule => "SELECT * FROM schedule WHERE schedule_id = ?1",
            Table::Department => "SELECT * FROM department WHERE department_id = ?1",
            Table::Professor => "SELECT * FROM professor WHERE professor_id = ?1",
        }
    }

    /// Look up a declared column by name.
    pub fn column(self, name: &str) -> Option<&'static ColumnDef> {
        self.columns().iter().find(|column| column.name == name)
    }

    /// Resolve a caller-supplied column name against the whitelist. The
    /// returned `&'static str` is what ends up spliced into SQL text.
    pub fn checked_column(self, name: &str) -> Result<&'static str, AccessError> {
        self.column(name)
            .map(|column| column.name)
            .ok_or_else(|| AccessError::UnknownColumn {
                table: self.name().to_string(),
                column: name.to_string(),
            })
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for the table.
    pub fn create_sql(self) -> String {
        let key = self.primary_key();
        let mut lines: Vec<String> = self
            .columns()
            .iter()
            .map(|column| {
                if column.name == key {
                    format!("{} INTEGER NOT NULL PRIMARY KEY", column.name)
                } else {
                    format!("{} {} NOT NULL", column.name, column.sql_type)
                }
            })
            .collect();

        lines.extend(self.columns().iter().filter_map(|column| {
            column.references.map(|(table, target)| {
                format!(
                    "FOREIGN KEY ({}) REFERENCES {}({})",
                    column.name, table, target
                )
            })
        }));

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name(),
            lines.join(",\n    ")
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = AccessError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|table| table.name() == name)
            .ok_or_else(|| AccessError::InvalidTable(name.to_string()))
    }
}

impl TryFrom<String> for Table {
    type Error = AccessError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Table> for &'static str {
    fn from(table: Table) -> Self {
        table.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_table_name() {
        for table in Table::ALL {
            assert_eq!(table.name().parse::<Table>().unwrap(), table);
        }
    }

    #[test]
    fn rejects_unknown_table_name() {
        let err = "students".parse::<Table>().unwrap_err();
        assert!(matches!(err, AccessError::InvalidTable(name) if name == "students"));
    }

    #[test]
    fn primary_keys_match_tables() {
        assert_eq!(Table::Student.primary_key(), "student_id");
        assert_eq!(Table::Course.primary_key(), "course_id");
        assert_eq!(Table::Enrollment.primary_key(), "enrollment_id");
        assert_eq!(Table::Schedule.primary_key(), "schedule_id");
        assert_eq!(Table::Department.primary_key(), "department_id");
        assert_eq!(Table::Professor.primary_key(), "professor_id");
    }

    #[test]
    fn checked_column_uses_whitelist() {
        assert_eq!(Table::Course.checked_column("course_name").unwrap(), "course_name");
        let err = Table::Course
            .checked_column("course_name; DROP TABLE courses")
            .unwrap_err();
        assert!(matches!(err, AccessError::UnknownColumn { .. }));
    }

    #[test]
    fn create_sql_declares_foreign_keys() {
        let sql = Table::Enrollment.create_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS enrollment"));
        assert!(sql.contains("enrollment_id INTEGER NOT NULL PRIMARY KEY"));
        assert!(sql.contains("FOREIGN KEY (student_id) REFERENCES user_reg(student_id)"));
        assert!(sql.contains("FOREIGN KEY (course_id) REFERENCES courses(course_id)"));
    }

    #[test]
    fn serde_uses_table_names() {
        let json = serde_json::to_string(&Table::Professor).unwrap();
        assert_eq!(json, "\"professor\"");
        let table: Table = serde_json::from_str("\"schedule\"").unwrap();
        assert_eq!(table, Table::Schedule);
        assert!(serde_json::from_str::<Table>("\"nope\"").is_err());
    }
}
