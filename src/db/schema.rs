//! Database schema definition

pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- Classrooms table: one row per physical room, keyed by BUILDING-ROOM
CREATE TABLE IF NOT EXISTS classrooms (
    name TEXT PRIMARY KEY,
    building TEXT NOT NULL,
    room_num TEXT NOT NULL,
    occupancy REAL NOT NULL DEFAULT 0,
    width INTEGER,
    length INTEGER,
    projector_num INTEGER,
    features TEXT,
    notes TEXT
);

-- Instructors table: deduplicated by name
CREATE TABLE IF NOT EXISTS instructors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Courses table: one weekly meeting pattern of a section
-- Times are zero-padded HH:MM:SS text so comparisons are chronological.
-- day_mask holds one bit per day token (M=1, T=2, W=4, th=8, F=16).
CREATE TABLE IF NOT EXISTS courses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    section_id INTEGER,
    course_num TEXT NOT NULL DEFAULT '',
    section_num TEXT NOT NULL DEFAULT '',
    term TEXT NOT NULL DEFAULT '',
    start_date TEXT,
    end_date TEXT,
    name TEXT NOT NULL,
    subject TEXT NOT NULL DEFAULT '',
    min_credits REAL,
    status TEXT NOT NULL DEFAULT '',
    start_time TEXT,
    end_time TEXT,
    days TEXT NOT NULL DEFAULT '',
    day_mask INTEGER NOT NULL DEFAULT 0,
    classroom TEXT,
    instruction_method TEXT NOT NULL DEFAULT '',
    instructor_id INTEGER,
    enrolled INTEGER NOT NULL DEFAULT 0,
    capacity INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (classroom) REFERENCES classrooms(name) ON DELETE CASCADE,
    FOREIGN KEY (instructor_id) REFERENCES instructors(id) ON DELETE SET NULL
);

-- Indexes for the block and occupancy queries
CREATE INDEX IF NOT EXISTS idx_courses_day_mask ON courses(day_mask);
CREATE INDEX IF NOT EXISTS idx_courses_classroom ON courses(classroom);
CREATE INDEX IF NOT EXISTS idx_courses_term ON courses(term);
CREATE INDEX IF NOT EXISTS idx_courses_times ON courses(start_time, end_time);
CREATE INDEX IF NOT EXISTS idx_classrooms_building ON classrooms(building);
"#;
