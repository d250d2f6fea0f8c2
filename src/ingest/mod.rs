//! Spreadsheet ingestion
//!
//! Translates exported schedule and classroom sheets (CSV) into store
//! records:
//! - Required-column validation, reported as missing column names
//! - Registrar times ("08:00AM") to times of day
//! - Y/N weekday flags to day sets

use std::collections::HashMap;
use std::io;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use csv::StringRecord;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{BuildingCode, Classroom, DaySet};

/// Columns a schedule export must carry
pub const SCHEDULE_COLUMNS: &[&str] = &[
    "COURSE_SECTIONS_ID",
    "SEC_COURSE_NO",
    "SEC_NO",
    "SEC_TERM",
    "SEC_START_DATE",
    "SEC_END_DATE",
    "SEC_SHORT_TITLE",
    "SEC_SUBJECT",
    "SEC_MIN_CRED",
    "SEC_STATUS",
    "CSM_START_TIME",
    "CSM_END_TIME",
    "CSM_MONDAY",
    "CSM_TUESDAY",
    "CSM_WEDNESDAY",
    "CSM_THURSDAY",
    "CSM_FRIDAY",
    "CSM_BLDG",
    "CSM_ROOM",
    "CSM_INSTR_METHOD",
    "SEC_FACULTY_INFO",
    "STUDENTS_AND_RESERVED_SEATS",
    "SEC_CAPACITY",
];

/// Columns a classroom inventory export must carry
pub const CLASSROOM_COLUMNS: &[&str] = &[
    "Building Information",
    "Room Number",
    "Number of Student Seats in Room",
    "Width of Room",
    "Length of Room",
    "Number of Projectors in Room",
    "Does room have any of the following?",
    "Any other things of note in Room (TV or Periodic Table poster)",
    "Notes",
];

const WEEKDAY_COLUMNS: [&str; 5] = [
    "CSM_MONDAY",
    "CSM_TUESDAY",
    "CSM_WEDNESDAY",
    "CSM_THURSDAY",
    "CSM_FRIDAY",
];

/// Errors that can occur while reading an export
#[derive(Debug, Error)]
pub enum IngestError {
    /// Only CSV exports are read
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Header row lacks required columns
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Row {row}: invalid time {value:?} in {column}")]
    InvalidTime {
        row: u64,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: invalid number {value:?} in {column}")]
    InvalidNumber {
        row: u64,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: invalid date {value:?} in {column}")]
    InvalidDate {
        row: u64,
        column: &'static str,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl IngestError {
    /// Returns true if the caller should get an upload failure report
    /// rather than an error.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            IngestError::UnsupportedFileType(_) | IngestError::MissingColumns(_)
        )
    }
}

/// Result reported to the uploader
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub success: bool,
    pub missing_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported: Option<crate::ImportStats>,
}

impl UploadOutcome {
    pub fn accepted(stats: crate::ImportStats) -> Self {
        Self {
            success: true,
            missing_columns: Vec::new(),
            imported: Some(stats),
        }
    }

    pub fn rejected(missing_columns: Vec<String>) -> Self {
        Self {
            success: false,
            missing_columns,
            imported: None,
        }
    }
}

/// One row of a schedule export
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    pub section_id: Option<i64>,
    pub course_num: String,
    pub section_num: String,
    pub term: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub title: String,
    pub subject: String,
    pub min_credits: Option<f64>,
    pub status: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub days: DaySet,
    /// Building and room, `None` when the section has no room number.
    /// A blank building is kept as unassigned.
    pub room: Option<(BuildingCode, String)>,
    pub instruction_method: String,
    pub instructor: Option<String>,
    pub enrolled: i64,
    pub capacity: i64,
}

/// Reject anything that is not a CSV export
pub fn check_file_type(path: &Path) -> Result<(), IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext == "csv" {
        Ok(())
    } else {
        Err(IngestError::UnsupportedFileType(path.display().to_string()))
    }
}

/// Day set from Monday..Friday "Y" flags, in weekday order
pub fn calculate_day_string(flags: [&str; 5]) -> DaySet {
    DaySet::from_flags(flags.map(|f| f.trim().eq_ignore_ascii_case("Y")))
}

/// Parse a meeting time such as "08:00AM", "8:00 PM", "14:30" or "14:30:00"
pub fn parse_meeting_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    let compact = value.replace(' ', "").to_uppercase();
    NaiveTime::parse_from_str(&compact, "%I:%M%p")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%y"))
        .ok()
}

/// Column lookup over a header row
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord, required: &[&str]) -> Result<Self, IngestError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();

        let missing: Vec<String> = required
            .iter()
            .filter(|c| !index.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingColumns(missing));
        }
        Ok(Self { index })
    }

    fn row<'r>(&'r self, record: &'r StringRecord, line: u64) -> Row<'r> {
        Row {
            columns: self,
            record,
            line,
        }
    }
}

struct Row<'r> {
    columns: &'r Columns,
    record: &'r StringRecord,
    line: u64,
}

impl<'r> Row<'r> {
    fn text(&self, column: &str) -> &'r str {
        self.columns
            .index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    fn optional_text(&self, column: &str) -> Option<String> {
        let value = self.text(column);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn time(&self, column: &'static str) -> Result<Option<NaiveTime>, IngestError> {
        let value = self.text(column);
        if value.is_empty() {
            return Ok(None);
        }
        parse_meeting_time(value)
            .map(Some)
            .ok_or_else(|| IngestError::InvalidTime {
                row: self.line,
                column,
                value: value.to_string(),
            })
    }

    fn date(&self, column: &'static str) -> Result<Option<NaiveDate>, IngestError> {
        let value = self.text(column);
        if value.is_empty() {
            return Ok(None);
        }
        parse_date(value)
            .map(Some)
            .ok_or_else(|| IngestError::InvalidDate {
                row: self.line,
                column,
                value: value.to_string(),
            })
    }

    fn float(&self, column: &'static str) -> Result<Option<f64>, IngestError> {
        let value = self.text(column);
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| IngestError::InvalidNumber {
                row: self.line,
                column,
                value: value.to_string(),
            })
    }

    /// Integers may be exported as "12" or "12.0"
    fn integer(&self, column: &'static str) -> Result<Option<i64>, IngestError> {
        let value = self.text(column);
        if value.is_empty() {
            return Ok(None);
        }
        if let Ok(n) = value.parse::<i64>() {
            return Ok(Some(n));
        }
        match value.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(Some(v as i64)),
            _ => Err(IngestError::InvalidNumber {
                row: self.line,
                column,
                value: value.to_string(),
            }),
        }
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Read a schedule export
pub fn read_schedule<R: io::Read>(reader: R) -> Result<Vec<ScheduleRow>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::new(csv_reader.headers()?, SCHEDULE_COLUMNS)?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row = columns.row(&record, line_of(&record));

        let room = match (row.text("CSM_BLDG"), row.text("CSM_ROOM")) {
            (_, "") => None,
            (building, room) => {
                let code = BuildingCode::from_str(building).unwrap_or_else(|| {
                    warn!("Row {}: unknown building {:?}, marking unassigned", row.line, building);
                    BuildingCode::Unassigned
                });
                Some((code, room.to_string()))
            }
        };

        rows.push(ScheduleRow {
            section_id: row.integer("COURSE_SECTIONS_ID")?,
            course_num: row.text("SEC_COURSE_NO").to_string(),
            section_num: row.text("SEC_NO").to_string(),
            term: row.text("SEC_TERM").to_string(),
            start_date: row.date("SEC_START_DATE")?,
            end_date: row.date("SEC_END_DATE")?,
            title: row.text("SEC_SHORT_TITLE").to_string(),
            subject: row.text("SEC_SUBJECT").to_string(),
            min_credits: row.float("SEC_MIN_CRED")?,
            status: row.text("SEC_STATUS").to_string(),
            start_time: row.time("CSM_START_TIME")?,
            end_time: row.time("CSM_END_TIME")?,
            days: calculate_day_string(WEEKDAY_COLUMNS.map(|c| row.text(c))),
            room,
            instruction_method: row.text("CSM_INSTR_METHOD").to_string(),
            instructor: row.optional_text("SEC_FACULTY_INFO"),
            enrolled: row.integer("STUDENTS_AND_RESERVED_SEATS")?.unwrap_or(0),
            capacity: row.integer("SEC_CAPACITY")?.unwrap_or(0),
        });
    }

    debug!("Read {} schedule rows", rows.len());
    Ok(rows)
}

/// Read a classroom inventory export
pub fn read_classrooms<R: io::Read>(reader: R) -> Result<Vec<Classroom>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::new(csv_reader.headers()?, CLASSROOM_COLUMNS)?;

    let mut classrooms = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row = columns.row(&record, line_of(&record));

        let building_text = row.text("Building Information");
        let room_num = row.text("Room Number");
        if room_num.is_empty() {
            debug!("Row {}: no room number, skipping", row.line);
            continue;
        }
        let building = BuildingCode::from_str(building_text).unwrap_or_else(|| {
            warn!("Row {}: unknown building {:?}, marking unassigned", row.line, building_text);
            BuildingCode::Unassigned
        });

        let features = format!(
            "{}{}",
            row.text("Does room have any of the following?"),
            row.text("Any other things of note in Room (TV or Periodic Table poster)")
        );

        classrooms.push(Classroom {
            name: Classroom::compose_name(building.as_str(), room_num),
            building,
            room_num: room_num.to_string(),
            occupancy: row.float("Number of Student Seats in Room")?.unwrap_or(0.0),
            width: row.integer("Width of Room")?,
            length: row.integer("Length of Room")?,
            projector_num: row.integer("Number of Projectors in Room")?,
            features: (!features.is_empty()).then_some(features),
            notes: row.optional_text("Notes"),
        });
    }

    debug!("Read {} classroom rows", classrooms.len());
    Ok(classrooms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_header() -> String {
        SCHEDULE_COLUMNS.join(",")
    }

    #[test]
    fn test_day_string_single_days() {
        assert_eq!(calculate_day_string(["Y", "", "", "", ""]).to_string(), "M");
        assert_eq!(calculate_day_string(["", "Y", "", "", ""]).to_string(), "T");
        assert_eq!(calculate_day_string(["", "", "Y", "", ""]).to_string(), "W");
        assert_eq!(calculate_day_string(["", "", "", "Y", ""]).to_string(), "th");
        assert_eq!(calculate_day_string(["", "", "", "", "Y"]).to_string(), "F");
    }

    #[test]
    fn test_day_string_combinations() {
        assert_eq!(calculate_day_string(["Y", "", "Y", "", "Y"]).to_string(), "MWF");
        assert_eq!(calculate_day_string(["", "Y", "", "Y", ""]).to_string(), "Tth");
        assert_eq!(calculate_day_string(["Y", "", "", "Y", ""]).to_string(), "Mth");
        assert_eq!(calculate_day_string(["", "", "", "Y", "Y"]).to_string(), "thF");
        assert_eq!(calculate_day_string(["Y", "Y", "", "Y", "Y"]).to_string(), "MTthF");
        assert_eq!(calculate_day_string(["Y", "Y", "Y", "Y", "Y"]).to_string(), "MTWthF");
        assert_eq!(calculate_day_string(["N", "N", "", "n", ""]).to_string(), "");
    }

    #[test]
    fn test_parse_meeting_time_formats() {
        let eight = NaiveTime::from_hms_opt(8, 0, 0);
        assert_eq!(parse_meeting_time("08:00AM"), eight);
        assert_eq!(parse_meeting_time("8:00 am"), eight);
        assert_eq!(parse_meeting_time("08:00:00"), eight);
        assert_eq!(parse_meeting_time("02:30PM"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_meeting_time("12:15PM"), NaiveTime::from_hms_opt(12, 15, 0));
        assert_eq!(parse_meeting_time("noon"), None);
    }

    #[test]
    fn test_check_file_type() {
        assert!(check_file_type(Path::new("Spring2024.csv")).is_ok());
        assert!(check_file_type(Path::new("Spring2024.CSV")).is_ok());
        let err = check_file_type(Path::new("Spring2024.xlsx")).unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_read_schedule_reports_missing_columns() {
        let data = "COURSE_SECTIONS_ID,SEC_TERM\n1,2024SP\n";
        let err = read_schedule(data.as_bytes()).unwrap_err();
        match err {
            IngestError::MissingColumns(missing) => {
                assert!(missing.contains(&"CSM_START_TIME".to_string()));
                assert!(missing.contains(&"SEC_CAPACITY".to_string()));
                assert!(!missing.contains(&"SEC_TERM".to_string()));
                assert_eq!(missing.len(), SCHEDULE_COLUMNS.len() - 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_schedule_row() {
        let data = format!(
            "{}\n{}\n",
            schedule_header(),
            "42,321,A,2024SP,2024-01-10,2024-05-01,Advanced Software Engineering,CS,3,A,\
             08:00AM,08:50AM,Y,,Y,,Y,SIMP,120,LEC,Nathan Williams,18,25"
        );
        let rows = read_schedule(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.section_id, Some(42));
        assert_eq!(row.term, "2024SP");
        assert_eq!(row.title, "Advanced Software Engineering");
        assert_eq!(row.start_time, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(row.end_time, NaiveTime::from_hms_opt(8, 50, 0));
        assert_eq!(row.days.to_string(), "MWF");
        assert_eq!(row.room, Some((BuildingCode::Simp, "120".to_string())));
        assert_eq!(row.instructor.as_deref(), Some("Nathan Williams"));
        assert_eq!(row.enrolled, 18);
        assert_eq!(row.capacity, 25);
        assert_eq!(row.start_date, NaiveDate::from_ymd_opt(2024, 1, 10));
    }

    #[test]
    fn test_read_schedule_row_without_room_or_time() {
        let data = format!(
            "{}\n{}\n",
            schedule_header(),
            "7,499,IS,2024SP,,,Independent Study,CS,1,A,,,,,,,,,,IND,,0,5"
        );
        let rows = read_schedule(data.as_bytes()).unwrap();
        assert_eq!(rows[0].room, None);
        assert_eq!(rows[0].start_time, None);
        assert!(rows[0].days.is_empty());
        assert_eq!(rows[0].instructor, None);
    }

    #[test]
    fn test_read_schedule_blank_building_is_unassigned() {
        let data = format!(
            "{}\n{}\n",
            schedule_header(),
            "8,101,A,2024SP,,,Seminar,CS,1,A,08:00AM,08:50AM,Y,,,,,,120,LEC,,5,10"
        );
        let rows = read_schedule(data.as_bytes()).unwrap();
        assert_eq!(rows[0].room, Some((BuildingCode::Unassigned, "120".to_string())));
    }

    #[test]
    fn test_read_schedule_rejects_fractional_counts() {
        let data = format!(
            "{}\n{}\n",
            schedule_header(),
            "8,101,A,2024SP,,,Seminar,CS,1,A,08:00AM,08:50AM,Y,,,,,SIMP,120,LEC,,12.7,10"
        );
        let err = read_schedule(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidNumber { column: "STUDENTS_AND_RESERVED_SEATS", .. }
        ));

        let data = format!(
            "{}\n{}\n",
            schedule_header(),
            "8.0,101,A,2024SP,,,Seminar,CS,1,A,08:00AM,08:50AM,Y,,,,,SIMP,120,LEC,,12.0,1e300"
        );
        let err = read_schedule(data.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidNumber { column: "SEC_CAPACITY", .. }));
    }

    #[test]
    fn test_read_schedule_bad_time_is_error() {
        let data = format!(
            "{}\n{}\n",
            schedule_header(),
            "1,1,A,2024SP,,,Bad,CS,1,A,soon,08:50AM,Y,,,,,SIMP,120,LEC,X,1,1"
        );
        let err = read_schedule(data.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidTime { column: "CSM_START_TIME", .. }));
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_read_classrooms() {
        let data = format!(
            "{}\n{}\n{}\n",
            CLASSROOM_COLUMNS
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(","),
            "SIMP,120,30,20,25,1,Whiteboard,; TV,Near stairs",
            "ZZZZ,5,10,,,,,,"
        );
        let classrooms = read_classrooms(data.as_bytes()).unwrap();
        assert_eq!(classrooms.len(), 2);

        let simp = &classrooms[0];
        assert_eq!(simp.name, "SIMP-120");
        assert_eq!(simp.building, BuildingCode::Simp);
        assert_eq!(simp.occupancy, 30.0);
        assert_eq!(simp.width, Some(20));
        assert_eq!(simp.projector_num, Some(1));
        assert_eq!(simp.features.as_deref(), Some("Whiteboard; TV"));
        assert_eq!(simp.notes.as_deref(), Some("Near stairs"));

        let unknown = &classrooms[1];
        assert_eq!(unknown.building, BuildingCode::Unassigned);
        assert_eq!(unknown.name, "Unknown-5");
        assert_eq!(unknown.features, None);
    }
}
