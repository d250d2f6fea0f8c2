//! Command implementations for CLI operations
//!
//! Query commands print JSON on stdout; logs go to stderr.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::analytics::{get_all_buildings, Analytics};
use crate::config::Config;
use crate::ingest::UploadOutcome;
use crate::types::BuildingFilter;
use crate::{import_classrooms, import_schedule};

use super::db_utils::open_database;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_upload(outcome: &UploadOutcome) -> Result<()> {
    print_json(outcome)?;
    if !outcome.success {
        if outcome.missing_columns.is_empty() {
            eprintln!("Upload rejected: expected a .csv file");
        } else {
            eprintln!("Upload rejected, missing columns:");
            for column in &outcome.missing_columns {
                eprintln!("  {}", column);
            }
        }
    }
    Ok(())
}

/// Import a schedule export
pub fn import_schedule_command(config: &Config, path: &str) -> Result<()> {
    let mut db = open_database(config)?;
    let outcome = import_schedule(&mut db, Path::new(path), &config.import_config())?;
    report_upload(&outcome)
}

/// Import a classroom inventory export
pub fn import_classrooms_command(config: &Config, path: &str) -> Result<()> {
    let mut db = open_database(config)?;
    let outcome = import_classrooms(&mut db, Path::new(path))?;
    report_upload(&outcome)
}

/// List the building codes a filter may name
pub fn buildings_command() -> Result<()> {
    print_json(&get_all_buildings())
}

/// Print the weekly block partition
pub fn blocks_command(config: &Config, buildings: &BuildingFilter) -> Result<()> {
    let db = open_database(config)?;
    print_json(&Analytics::new(&db).calculate_time_blocks(buildings)?)
}

/// Print the blocks with their room counts
pub fn occupancy_command(config: &Config, buildings: &BuildingFilter) -> Result<()> {
    let db = open_database(config)?;
    print_json(&Analytics::new(&db).calculate_number_classes(buildings)?)
}

/// Print the rooms in use for a window
pub fn used_command(
    config: &Config,
    day: &str,
    start: &str,
    end: &str,
    buildings: &BuildingFilter,
) -> Result<()> {
    let db = open_database(config)?;
    print_json(&Analytics::new(&db).get_used_classrooms(day, start, end, buildings)?)
}

/// Print one room's weekly schedule
pub fn room_command(config: &Config, classroom: &str) -> Result<()> {
    let db = open_database(config)?;
    print_json(&Analytics::new(&db).get_classroom_courses(classroom)?)
}

/// Print the start of the block ending at `time`
pub fn prev_command(
    config: &Config,
    day: &str,
    time: &str,
    buildings: &BuildingFilter,
) -> Result<()> {
    let db = open_database(config)?;
    print_json(&Analytics::new(&db).get_past_time(day, time, buildings)?)
}

/// Print the end of the block starting at `time`
pub fn next_command(
    config: &Config,
    day: &str,
    time: &str,
    buildings: &BuildingFilter,
) -> Result<()> {
    let db = open_database(config)?;
    print_json(&Analytics::new(&db).get_next_time(day, time, buildings)?)
}

/// Show store statistics
pub fn status_command(config: &Config) -> Result<()> {
    if !config.in_memory && !config.db_path.exists() {
        println!("No store found at {}", config.db_path.display());
        println!("Run 'classroom-analytics import-schedule <file.csv>' first.");
        return Ok(());
    }

    let db = open_database(config)?;
    let stats = db.get_stats()?;

    println!("Classroom Analytics Status");
    println!("==========================");
    if config.in_memory {
        println!("Database: (in memory)");
    } else {
        println!("Database: {}", config.db_path.display());
    }
    println!("Classrooms: {}", stats.classrooms);
    println!("Instructors: {}", stats.instructors);
    println!("Courses: {}", stats.courses);

    if !stats.terms.is_empty() {
        println!("\nTerms:");
        for term in &stats.terms {
            println!("  {}", term);
        }
    }

    Ok(())
}
