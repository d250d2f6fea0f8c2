//! classroom-analytics: Campus classroom utilization engine
//!
//! Imports course schedules and classroom inventories exported from the
//! registrar, stores them in SQLite, and answers questions about how
//! rooms are used across the teaching week.
//!
//! ## Features
//!
//! - Time blocks: partition each weekday by every course start/end time
//! - Occupancy: count distinct rooms in use per block
//! - Used rooms: list rooms and courses active for a whole time window
//! - Room schedules: per-block course listing for a single room
//! - Navigation: step to the adjacent block boundary
//!
//! ## Commands
//!
//! - `import-schedule` / `import-classrooms` - Load CSV exports
//! - `blocks` / `occupancy` - Weekly block partition and counts
//! - `used` - Rooms in use for a window
//! - `room` - A room's weekly schedule
//! - `prev` / `next` - Adjacent block boundaries
//! - `status` - Store statistics

pub mod analytics;
pub mod cli;
pub mod config;
pub mod db;
pub mod ingest;
pub mod types;

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use config::ReplaceScope;
use db::Database;
use ingest::{IngestError, ScheduleRow, UploadOutcome};
use types::{Classroom, Course};

/// Configuration for imports
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Which stored courses a schedule import replaces
    pub replace_scope: ReplaceScope,
}

/// Statistics from an import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub scope: ReplaceScope,
    /// Terms present in the imported file
    pub terms: Vec<String>,
    pub courses_deleted: u64,
    pub courses: u64,
    pub classrooms: u64,
    pub instructors: u64,
}

/// Import a schedule export, replacing previously stored courses.
///
/// A non-CSV file or one missing required columns is reported through the
/// outcome; malformed rows and store failures are errors. Nothing is
/// written unless the whole file imports.
pub fn import_schedule(
    db: &mut Database,
    path: &Path,
    config: &ImportConfig,
) -> Result<UploadOutcome> {
    let rows = match read_export(path, ingest::read_schedule) {
        Ok(rows) => rows,
        Err(err) => return rejection(path, err),
    };
    info!("Importing {} schedule rows from {}", rows.len(), path.display());

    let stats = in_transaction(db, |db| write_schedule(db, &rows, config))?;

    info!(
        "Imported {} courses ({} replaced, {} classrooms, {} instructors)",
        stats.courses, stats.courses_deleted, stats.classrooms, stats.instructors
    );
    Ok(UploadOutcome::accepted(stats))
}

/// Import a classroom inventory export. Rooms are upserted by name.
pub fn import_classrooms(db: &mut Database, path: &Path) -> Result<UploadOutcome> {
    let classrooms = match read_export(path, ingest::read_classrooms) {
        Ok(classrooms) => classrooms,
        Err(err) => return rejection(path, err),
    };
    info!("Importing {} classrooms from {}", classrooms.len(), path.display());

    let stats = in_transaction(db, |db| write_classrooms(db, &classrooms))?;

    info!("Imported {} classrooms", stats.classrooms);
    Ok(UploadOutcome::accepted(stats))
}

fn read_export<T, F>(path: &Path, read: F) -> std::result::Result<T, IngestError>
where
    F: FnOnce(File) -> std::result::Result<T, IngestError>,
{
    ingest::check_file_type(path)?;
    read(File::open(path)?)
}

fn rejection(path: &Path, err: IngestError) -> Result<UploadOutcome> {
    match err {
        IngestError::MissingColumns(missing) => {
            warn!("{} is missing columns: {}", path.display(), missing.join(", "));
            Ok(UploadOutcome::rejected(missing))
        }
        IngestError::UnsupportedFileType(_) => {
            warn!("Rejected {}: not a CSV file", path.display());
            Ok(UploadOutcome::rejected(Vec::new()))
        }
        err => Err(err).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Run `write` inside a transaction, rolling back if it fails
fn in_transaction<T, F>(db: &mut Database, write: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T>,
{
    db.begin_transaction()?;
    match write(&*db) {
        Ok(value) => {
            db.commit()?;
            Ok(value)
        }
        Err(err) => {
            db.rollback()?;
            Err(err)
        }
    }
}

fn write_schedule(
    db: &Database,
    rows: &[ScheduleRow],
    config: &ImportConfig,
) -> Result<ImportStats> {
    let terms: BTreeSet<&str> = rows.iter().map(|r| r.term.as_str()).collect();
    let mut stats = ImportStats {
        scope: config.replace_scope,
        terms: terms.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    };

    match config.replace_scope {
        ReplaceScope::Term => {
            for &term in &terms {
                stats.courses_deleted += db.delete_courses(Some(term))? as u64;
            }
        }
        ReplaceScope::All => {
            stats.courses_deleted = db.delete_courses(None)? as u64;
            warn!("Replaced every stored course ({} removed)", stats.courses_deleted);
        }
    }

    let mut classrooms = BTreeSet::new();
    let mut instructors = BTreeSet::new();
    for row in rows {
        let classroom = match &row.room {
            Some((building, room_num)) => {
                let name = db.get_or_create_classroom(*building, room_num)?;
                classrooms.insert(name.clone());
                Some(name)
            }
            None => None,
        };
        let instructor_id = match &row.instructor {
            Some(name) => {
                let id = db.get_or_create_instructor(name)?;
                instructors.insert(id);
                Some(id)
            }
            None => None,
        };

        let course = Course {
            section_id: row.section_id,
            course_num: row.course_num.clone(),
            section_num: row.section_num.clone(),
            term: row.term.clone(),
            start_date: row.start_date,
            end_date: row.end_date,
            name: row.title.clone(),
            subject: row.subject.clone(),
            min_credits: row.min_credits,
            status: row.status.clone(),
            start_time: row.start_time,
            end_time: row.end_time,
            days: row.days,
            classroom,
            instruction_method: row.instruction_method.clone(),
            instructor_id,
            enrolled: row.enrolled,
            capacity: row.capacity,
            ..Default::default()
        };
        let id = db.insert_course(&course)?;
        debug!("Stored course {} ({}) as {}", course.name, course.days, id);
        stats.courses += 1;
    }

    stats.classrooms = classrooms.len() as u64;
    stats.instructors = instructors.len() as u64;
    Ok(stats)
}

fn write_classrooms(db: &Database, classrooms: &[Classroom]) -> Result<ImportStats> {
    for classroom in classrooms {
        db.upsert_classroom(classroom)?;
    }
    Ok(ImportStats {
        classrooms: classrooms.len() as u64,
        ..Default::default()
    })
}
