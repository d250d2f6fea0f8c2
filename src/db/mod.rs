//! Database module for classroom analytics
//!
//! Handles SQLite storage for the term's schedule including:
//! - Schema creation
//! - Classroom, instructor and course storage
//! - Day, time-range and building queries over course meetings

mod schema;

use anyhow::Result;
use chrono::NaiveTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;

use crate::types::{
    format_time, BuildingCode, BuildingFilter, Classroom, Course, DaySet, DayToken, Instructor,
    StoreStats, TimeBlock,
};

/// A course meeting joined with its classroom and instructor
#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub course_name: String,
    /// Instructor name, empty when the course has none
    pub instructor: String,
    pub classroom: String,
    /// Seats in the classroom
    pub occupancy: f64,
    pub enrolled: i64,
}

/// Selects course meetings on one day.
///
/// Only courses with a classroom and both a start and an end time are ever
/// matched.
#[derive(Debug, Clone)]
pub struct MeetingQuery<'q> {
    pub day: DayToken,
    pub buildings: &'q BuildingFilter,
    pub excluded: &'q [BuildingCode],
    pub classroom: Option<&'q str>,
    pub covering: Option<TimeBlock>,
}

impl<'q> MeetingQuery<'q> {
    pub fn on(day: DayToken, buildings: &'q BuildingFilter) -> Self {
        Self {
            day,
            buildings,
            excluded: &[],
            classroom: None,
            covering: None,
        }
    }

    pub fn excluding(mut self, excluded: &'q [BuildingCode]) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn in_classroom(mut self, classroom: &'q str) -> Self {
        self.classroom = Some(classroom);
        self
    }

    /// Keep only meetings with `start <= block.start` and `end >= block.end`
    pub fn covering(mut self, block: TimeBlock) -> Self {
        self.covering = Some(block);
        self
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = vec![
            "(c.day_mask & ?) != 0".to_string(),
            "c.start_time IS NOT NULL".to_string(),
            "c.end_time IS NOT NULL".to_string(),
        ];
        let mut values = vec![Value::Integer(self.day.bit() as i64)];

        if let Some(name) = self.classroom {
            clauses.push("c.classroom = ?".to_string());
            values.push(Value::Text(name.to_string()));
        }

        match self.buildings {
            BuildingFilter::AllBuildings => {}
            BuildingFilter::NoBuildings => clauses.push("0".to_string()),
            BuildingFilter::Subset(set) => {
                clauses.push(format!("cl.building IN ({})", placeholders(set.len())));
                values.extend(set.iter().map(|b| Value::Text(b.as_str().to_string())));
            }
        }

        if !self.excluded.is_empty() {
            clauses.push(format!(
                "cl.building NOT IN ({})",
                placeholders(self.excluded.len())
            ));
            values.extend(
                self.excluded
                    .iter()
                    .map(|b| Value::Text(b.as_str().to_string())),
            );
        }

        if let Some(block) = self.covering {
            clauses.push("c.start_time <= ?".to_string());
            clauses.push("c.end_time >= ?".to_string());
            values.push(Value::Text(format_time(block.start)));
            values.push(Value::Text(format_time(block.end)));
        }

        (clauses.join(" AND "), values)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Database handle for the schedule store
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    // =========================================================================
    // Classroom Operations
    // =========================================================================

    /// Insert or update a classroom, keyed by name
    pub fn upsert_classroom(&self, classroom: &Classroom) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO classrooms (name, building, room_num, occupancy, width, length, projector_num, features, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(name) DO UPDATE SET
                building = excluded.building,
                room_num = excluded.room_num,
                occupancy = excluded.occupancy,
                width = excluded.width,
                length = excluded.length,
                projector_num = excluded.projector_num,
                features = excluded.features,
                notes = excluded.notes
            "#,
            params![
                classroom.name,
                classroom.building.as_str(),
                classroom.room_num,
                classroom.occupancy,
                classroom.width,
                classroom.length,
                classroom.projector_num,
                classroom.features,
                classroom.notes,
            ],
        )?;
        Ok(())
    }

    /// Make sure a classroom row exists, leaving an existing one untouched.
    /// Returns the classroom name.
    pub fn get_or_create_classroom(
        &self,
        building: BuildingCode,
        room_num: &str,
    ) -> Result<String> {
        let name = Classroom::compose_name(building.as_str(), room_num);
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO classrooms (name, building, room_num)
            VALUES (?1, ?2, ?3)
            "#,
            params![name, building.as_str(), room_num.trim()],
        )?;
        Ok(name)
    }

    /// Get a classroom by name
    pub fn get_classroom(&self, name: &str) -> Result<Option<Classroom>> {
        let result = self
            .conn
            .query_row(
                r#"
                SELECT name, building, room_num, occupancy, width, length, projector_num, features, notes
                FROM classrooms WHERE name = ?1
                "#,
                params![name],
                |row| {
                    Ok(Classroom {
                        name: row.get(0)?,
                        building: parse_building(&row.get::<_, String>(1)?),
                        room_num: row.get(2)?,
                        occupancy: row.get(3)?,
                        width: row.get(4)?,
                        length: row.get(5)?,
                        projector_num: row.get(6)?,
                        features: row.get(7)?,
                        notes: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    // =========================================================================
    // Instructor Operations
    // =========================================================================

    /// Get an instructor's ID by name, creating the row if needed
    pub fn get_or_create_instructor(&self, name: &str) -> Result<i64> {
        let name = name.trim();
        self.conn.execute(
            "INSERT OR IGNORE INTO instructors (name) VALUES (?1)",
            params![name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM instructors WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Get an instructor by ID
    pub fn get_instructor(&self, id: i64) -> Result<Option<Instructor>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name FROM instructors WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Instructor {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    // =========================================================================
    // Course Operations
    // =========================================================================

    /// Insert a course and return its ID
    pub fn insert_course(&self, course: &Course) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO courses (
                section_id, course_num, section_num, term, start_date, end_date,
                name, subject, min_credits, status, start_time, end_time,
                days, day_mask, classroom, instruction_method, instructor_id,
                enrolled, capacity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                course.section_id,
                course.course_num,
                course.section_num,
                course.term,
                course.start_date,
                course.end_date,
                course.name,
                course.subject,
                course.min_credits,
                course.status,
                course.start_time.map(format_time),
                course.end_time.map(format_time),
                course.days.to_string(),
                course.days.bits() as i64,
                course.classroom,
                course.instruction_method,
                course.instructor_id,
                course.enrolled,
                course.capacity,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get all courses, optionally restricted to one term
    pub fn get_courses(&self, term: Option<&str>) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, section_id, course_num, section_num, term, start_date, end_date,
                   name, subject, min_credits, status, start_time, end_time, day_mask,
                   classroom, instruction_method, instructor_id, enrolled, capacity
            FROM courses
            WHERE ?1 IS NULL OR term = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![term], |row| Self::row_to_course(row))?;

        let mut courses = Vec::new();
        for row in rows {
            courses.push(row?);
        }
        Ok(courses)
    }

    /// Delete the courses of one term, or every course when `term` is `None`.
    /// Returns the number of rows removed.
    pub fn delete_courses(&self, term: Option<&str>) -> Result<usize> {
        let deleted = match term {
            Some(term) => self
                .conn
                .execute("DELETE FROM courses WHERE term = ?1", params![term])?,
            None => self.conn.execute("DELETE FROM courses", [])?,
        };
        Ok(deleted)
    }

    fn row_to_course(row: &rusqlite::Row) -> rusqlite::Result<Course> {
        Ok(Course {
            id: row.get(0)?,
            section_id: row.get(1)?,
            course_num: row.get(2)?,
            section_num: row.get(3)?,
            term: row.get(4)?,
            start_date: row.get(5)?,
            end_date: row.get(6)?,
            name: row.get(7)?,
            subject: row.get(8)?,
            min_credits: row.get(9)?,
            status: row.get(10)?,
            start_time: row.get(11)?,
            end_time: row.get(12)?,
            days: DaySet::from_bits(row.get::<_, i64>(13)? as u8),
            classroom: row.get(14)?,
            instruction_method: row.get(15)?,
            instructor_id: row.get(16)?,
            enrolled: row.get(17)?,
            capacity: row.get(18)?,
        })
    }

    // =========================================================================
    // Meeting Queries
    // =========================================================================

    /// Distinct start and end times of the selected meetings, earliest first
    pub fn distinct_boundaries(&self, query: &MeetingQuery) -> Result<Vec<NaiveTime>> {
        let (where_sql, values) = query.where_clause();
        let sql = format!(
            r#"
            SELECT t FROM (
                SELECT c.start_time AS t FROM courses c
                INNER JOIN classrooms cl ON cl.name = c.classroom
                WHERE {where_sql}
                UNION
                SELECT c.end_time AS t FROM courses c
                INNER JOIN classrooms cl ON cl.name = c.classroom
                WHERE {where_sql}
            )
            ORDER BY t
            "#
        );
        let params: Vec<Value> = values.iter().chain(values.iter()).cloned().collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| row.get::<_, NaiveTime>(0))?;

        let mut times = Vec::new();
        for row in rows {
            times.push(row?);
        }
        Ok(times)
    }

    /// Selected meetings, ordered by building and room
    pub fn find_meetings(&self, query: &MeetingQuery) -> Result<Vec<Meeting>> {
        let (where_sql, values) = query.where_clause();
        let sql = format!(
            r#"
            SELECT c.name, COALESCE(i.name, ''), cl.name, cl.occupancy, c.enrolled
            FROM courses c
            INNER JOIN classrooms cl ON cl.name = c.classroom
            LEFT JOIN instructors i ON i.id = c.instructor_id
            WHERE {where_sql}
            ORDER BY cl.building, LENGTH(cl.room_num), cl.room_num, c.start_time, c.id
            "#
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(Meeting {
                course_name: row.get(0)?,
                instructor: row.get(1)?,
                classroom: row.get(2)?,
                occupancy: row.get(3)?,
                enrolled: row.get(4)?,
            })
        })?;

        let mut meetings = Vec::new();
        for row in rows {
            meetings.push(row?);
        }
        Ok(meetings)
    }

    /// Number of distinct classrooms among the selected meetings
    pub fn count_distinct_rooms(&self, query: &MeetingQuery) -> Result<u32> {
        let (where_sql, values) = query.where_clause();
        let sql = format!(
            r#"
            SELECT COUNT(DISTINCT cl.name) FROM courses c
            INNER JOIN classrooms cl ON cl.name = c.classroom
            WHERE {where_sql}
            "#
        );
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values), |row| row.get(0))?;
        Ok(count as u32)
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Get store statistics
    pub fn get_stats(&self) -> Result<StoreStats> {
        let classrooms: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM classrooms", [], |row| row.get(0))?;
        let instructors: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM instructors", [], |row| row.get(0))?;
        let courses: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;

        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT term FROM courses ORDER BY term")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut terms = Vec::new();
        for row in rows {
            terms.push(row?);
        }

        Ok(StoreStats {
            classrooms: classrooms as u64,
            instructors: instructors as u64,
            courses: courses as u64,
            terms,
        })
    }

    /// Begin a transaction
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }
}

fn parse_building(code: &str) -> BuildingCode {
    BuildingCode::from_str(code).unwrap_or(BuildingCode::Unassigned)
}
