//! Core type definitions for classroom analytics
//!
//! Defines the fundamental types for representing a term's schedule:
//! - Day tokens and day sets: the weekly meeting pattern of a course
//! - Building codes and filters: which part of campus a query looks at
//! - Records: classrooms, instructors, courses
//! - Time blocks: intervals of constant occupancy

use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

/// Storage and block-boundary format for times of day
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Format a time of day as zero-padded "HH:MM:SS"
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// One weekday of the teaching week
///
/// Thursday's token is the two-character `th`, so a day string such as
/// `"Tth"` has to be tokenized rather than searched with `contains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayToken {
    #[serde(rename = "M")]
    Monday,
    #[serde(rename = "T")]
    Tuesday,
    #[serde(rename = "W")]
    Wednesday,
    #[serde(rename = "th")]
    Thursday,
    #[serde(rename = "F")]
    Friday,
}

impl DayToken {
    /// All days in weekday order
    pub const ALL: [DayToken; 5] = [
        DayToken::Monday,
        DayToken::Tuesday,
        DayToken::Wednesday,
        DayToken::Thursday,
        DayToken::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayToken::Monday => "M",
            DayToken::Tuesday => "T",
            DayToken::Wednesday => "W",
            DayToken::Thursday => "th",
            DayToken::Friday => "F",
        }
    }

    /// Parse a single day token. Only the exact tokens are accepted.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "M" => Some(DayToken::Monday),
            "T" => Some(DayToken::Tuesday),
            "W" => Some(DayToken::Wednesday),
            "th" => Some(DayToken::Thursday),
            "F" => Some(DayToken::Friday),
            _ => None,
        }
    }

    /// Bit used for this day in a `DaySet` and in the `day_mask` column
    pub fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl fmt::Display for DayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of weekdays a course meets on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DaySet(u8);

impl DaySet {
    pub fn empty() -> Self {
        DaySet(0)
    }

    /// Build a day set from Monday..Friday flags.
    ///
    /// Rendering always follows weekday order, so Tuesday + Thursday is
    /// `"Tth"` and Monday + Wednesday + Friday is `"MWF"`.
    pub fn from_flags(flags: [bool; 5]) -> Self {
        let mut set = DaySet::empty();
        for (day, flag) in DayToken::ALL.iter().zip(flags) {
            if flag {
                set.insert(*day);
            }
        }
        set
    }

    /// Tokenize a day string such as `"MWF"` or `"Tth"`.
    ///
    /// Returns `None` if the string contains anything other than the five
    /// day tokens. An empty string is a valid, empty set.
    pub fn parse(s: &str) -> Option<Self> {
        let mut set = DaySet::empty();
        let mut rest = s.trim();
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("th") {
                set.insert(DayToken::Thursday);
                rest = tail;
                continue;
            }
            let (head, tail) = rest.split_at(rest.chars().next()?.len_utf8());
            let day = DayToken::from_str(head)?;
            set.insert(day);
            rest = tail;
        }
        Some(set)
    }

    pub fn from_bits(bits: u8) -> Self {
        DaySet(bits & 0b1_1111)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn insert(&mut self, day: DayToken) {
        self.0 |= day.bit();
    }

    pub fn contains(&self, day: DayToken) -> bool {
        self.0 & day.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = DayToken> + '_ {
        DayToken::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for day in self.iter() {
            f.write_str(day.as_str())?;
        }
        Ok(())
    }
}

impl Serialize for DaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Campus building codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildingCode {
    Ceng,
    Chpl,
    Cube,
    Eqct,
    Fsct,
    Guad,
    Hac,
    Ocon,
    Ofcp,
    Pccc,
    Pect,
    Simp,
    Stch,
    Wbar,
    /// Room with no known building
    #[serde(rename = "Unknown")]
    Unassigned,
}

impl BuildingCode {
    /// Every real building, in reference-table order
    pub const LISTED: [BuildingCode; 14] = [
        BuildingCode::Ceng,
        BuildingCode::Chpl,
        BuildingCode::Cube,
        BuildingCode::Eqct,
        BuildingCode::Fsct,
        BuildingCode::Guad,
        BuildingCode::Hac,
        BuildingCode::Ocon,
        BuildingCode::Ofcp,
        BuildingCode::Pccc,
        BuildingCode::Pect,
        BuildingCode::Simp,
        BuildingCode::Stch,
        BuildingCode::Wbar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildingCode::Ceng => "CENG",
            BuildingCode::Chpl => "CHPL",
            BuildingCode::Cube => "CUBE",
            BuildingCode::Eqct => "EQCT",
            BuildingCode::Fsct => "FSCT",
            BuildingCode::Guad => "GUAD",
            BuildingCode::Hac => "HAC",
            BuildingCode::Ocon => "OCON",
            BuildingCode::Ofcp => "OFCP",
            BuildingCode::Pccc => "PCCC",
            BuildingCode::Pect => "PECT",
            BuildingCode::Simp => "SIMP",
            BuildingCode::Stch => "STCH",
            BuildingCode::Wbar => "WBAR",
            BuildingCode::Unassigned => "Unknown",
        }
    }

    /// Parse a building code. The empty string and `"Unknown"` are the
    /// unassigned building; anything else unrecognized is `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "CENG" => Some(BuildingCode::Ceng),
            "CHPL" => Some(BuildingCode::Chpl),
            "CUBE" => Some(BuildingCode::Cube),
            "EQCT" => Some(BuildingCode::Eqct),
            "FSCT" => Some(BuildingCode::Fsct),
            "GUAD" => Some(BuildingCode::Guad),
            "HAC" => Some(BuildingCode::Hac),
            "OCON" => Some(BuildingCode::Ocon),
            "OFCP" => Some(BuildingCode::Ofcp),
            "PCCC" => Some(BuildingCode::Pccc),
            "PECT" => Some(BuildingCode::Pect),
            "SIMP" => Some(BuildingCode::Simp),
            "STCH" => Some(BuildingCode::Stch),
            "WBAR" => Some(BuildingCode::Wbar),
            "" | "Unknown" => Some(BuildingCode::Unassigned),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuildingCode::Ceng => "Civil Engineering",
            BuildingCode::Chpl => "All Saints Chapel",
            BuildingCode::Cube => "Cube",
            BuildingCode::Eqct => "Equine Center",
            BuildingCode::Fsct => "Fortin Science Center Labs",
            BuildingCode::Guad => "Guadalupe Hall",
            BuildingCode::Hac => "Hunthausen Activity Center",
            BuildingCode::Ocon => "O'Connell Hall",
            BuildingCode::Ofcp => "Off-Campus",
            BuildingCode::Pccc => "Perkins Call Canine Center",
            BuildingCode::Pect => "PE Center",
            BuildingCode::Simp => "Simperman Hall",
            BuildingCode::Stch => "St. Charles Hall",
            BuildingCode::Wbar => "Waterbarn",
            BuildingCode::Unassigned => "Unassigned",
        }
    }
}

/// Which buildings a query covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuildingFilter {
    /// Every building, minus the per-query permanent exclusions
    #[default]
    AllBuildings,
    /// Only these buildings
    Subset(BTreeSet<BuildingCode>),
    /// No buildings at all; queries short-circuit without touching the store
    NoBuildings,
}

impl BuildingFilter {
    /// Build a filter from caller-supplied codes.
    ///
    /// An empty list selects no buildings. Unrecognized codes are dropped,
    /// so a list of only unknown codes also selects no buildings.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for code in codes {
            let code = code.as_ref();
            match BuildingCode::from_str(code) {
                Some(building) => {
                    set.insert(building);
                }
                None => debug!("Ignoring unknown building code {:?}", code),
            }
        }
        if set.is_empty() {
            BuildingFilter::NoBuildings
        } else {
            BuildingFilter::Subset(set)
        }
    }
}

impl fmt::Display for BuildingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildingFilter::AllBuildings => f.write_str("all buildings"),
            BuildingFilter::NoBuildings => f.write_str("no buildings"),
            BuildingFilter::Subset(set) => {
                let codes: Vec<&str> = set.iter().map(|b| b.as_str()).collect();
                f.write_str(&codes.join(", "))
            }
        }
    }
}

/// A physical room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classroom {
    /// `BUILDING-ROOM`, the join key for courses
    pub name: String,
    pub building: BuildingCode,
    pub room_num: String,
    /// Number of student seats
    pub occupancy: f64,
    pub width: Option<i64>,
    pub length: Option<i64>,
    pub projector_num: Option<i64>,
    pub features: Option<String>,
    pub notes: Option<String>,
}

impl Classroom {
    pub fn compose_name(building: &str, room_num: &str) -> String {
        format!("{}-{}", building.trim(), room_num.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instructor {
    pub id: i64,
    pub name: String,
}

/// One weekly meeting pattern of a course section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: i64,
    pub section_id: Option<i64>,
    pub course_num: String,
    pub section_num: String,
    pub term: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub name: String,
    pub subject: String,
    pub min_credits: Option<f64>,
    pub status: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub days: DaySet,
    /// Classroom name, `None` for courses without a fixed room
    pub classroom: Option<String>,
    pub instruction_method: String,
    pub instructor_id: Option<i64>,
    pub enrolled: i64,
    pub capacity: i64,
}

impl Default for Course {
    fn default() -> Self {
        Self {
            id: 0,
            section_id: None,
            course_num: String::new(),
            section_num: String::new(),
            term: String::new(),
            start_date: None,
            end_date: None,
            name: String::new(),
            subject: String::new(),
            min_credits: None,
            status: String::new(),
            start_time: None,
            end_time: None,
            days: DaySet::empty(),
            classroom: None,
            instruction_method: String::new(),
            instructor_id: None,
            enrolled: 0,
            capacity: 0,
        }
    }
}

/// A half-open interval of a day during which occupancy is constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeBlock {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeBlock {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn start_key(&self) -> String {
        format_time(self.start)
    }

    pub fn as_pair(&self) -> [String; 2] {
        [format_time(self.start), format_time(self.end)]
    }
}

impl Serialize for TimeBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_pair().serialize(serializer)
    }
}

/// Row counts for the store
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub classrooms: u64,
    pub instructors: u64,
    pub courses: u64,
    pub terms: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_token_from_str() {
        assert_eq!(DayToken::from_str("M"), Some(DayToken::Monday));
        assert_eq!(DayToken::from_str("th"), Some(DayToken::Thursday));
        assert_eq!(DayToken::from_str("Th"), None);
        assert_eq!(DayToken::from_str("t"), None);
        assert_eq!(DayToken::from_str("test"), None);
        assert_eq!(DayToken::from_str(""), None);
    }

    #[test]
    fn test_day_token_roundtrip() {
        for day in DayToken::ALL {
            assert_eq!(DayToken::from_str(day.as_str()), Some(day));
        }
    }

    #[test]
    fn test_day_set_parse_common_patterns() {
        let mwf = DaySet::parse("MWF").unwrap();
        assert!(mwf.contains(DayToken::Monday));
        assert!(mwf.contains(DayToken::Wednesday));
        assert!(mwf.contains(DayToken::Friday));
        assert!(!mwf.contains(DayToken::Tuesday));

        let tth = DaySet::parse("Tth").unwrap();
        assert!(tth.contains(DayToken::Tuesday));
        assert!(tth.contains(DayToken::Thursday));
        assert_eq!(tth.iter().count(), 2);
    }

    #[test]
    fn test_day_set_t_and_th_do_not_cross_match() {
        let thursday = DaySet::parse("th").unwrap();
        assert!(thursday.contains(DayToken::Thursday));
        assert!(!thursday.contains(DayToken::Tuesday));

        let tuesday = DaySet::parse("T").unwrap();
        assert!(tuesday.contains(DayToken::Tuesday));
        assert!(!tuesday.contains(DayToken::Thursday));
    }

    #[test]
    fn test_day_set_parse_rejects_garbage() {
        assert_eq!(DaySet::parse("MX"), None);
        assert_eq!(DaySet::parse("t"), None);
        assert_eq!(DaySet::parse(""), Some(DaySet::empty()));
    }

    #[test]
    fn test_day_set_from_flags() {
        assert_eq!(DaySet::from_flags([true, false, true, false, true]).to_string(), "MWF");
        assert_eq!(DaySet::from_flags([false, true, false, true, false]).to_string(), "Tth");
        assert_eq!(DaySet::from_flags([false, false, false, true, true]).to_string(), "thF");
        assert_eq!(DaySet::from_flags([true, true, true, true, true]).to_string(), "MTWthF");
        assert_eq!(DaySet::from_flags([false; 5]).to_string(), "");
    }

    #[test]
    fn test_day_set_display_is_weekday_ordered() {
        let mut set = DaySet::empty();
        set.insert(DayToken::Friday);
        set.insert(DayToken::Thursday);
        set.insert(DayToken::Monday);
        assert_eq!(set.to_string(), "MthF");
        assert_eq!(DaySet::parse(&set.to_string()), Some(set));
    }

    #[test]
    fn test_building_code_from_str() {
        assert_eq!(BuildingCode::from_str("SIMP"), Some(BuildingCode::Simp));
        assert_eq!(BuildingCode::from_str("HAC"), Some(BuildingCode::Hac));
        assert_eq!(BuildingCode::from_str(""), Some(BuildingCode::Unassigned));
        assert_eq!(BuildingCode::from_str("Unknown"), Some(BuildingCode::Unassigned));
        assert_eq!(BuildingCode::from_str("test"), None);
    }

    #[test]
    fn test_building_code_roundtrip() {
        for code in BuildingCode::LISTED {
            assert_eq!(BuildingCode::from_str(code.as_str()), Some(code));
        }
    }

    #[test]
    fn test_building_filter_from_codes() {
        let empty: Vec<&str> = Vec::new();
        assert_eq!(BuildingFilter::from_codes(empty), BuildingFilter::NoBuildings);
        assert_eq!(BuildingFilter::from_codes(["test"]), BuildingFilter::NoBuildings);

        let filter = BuildingFilter::from_codes(["SIMP", "STCH", "bogus"]);
        assert_eq!(
            filter,
            BuildingFilter::Subset(BTreeSet::from([BuildingCode::Simp, BuildingCode::Stch]))
        );
    }

    #[test]
    fn test_time_block_serialization() {
        let block = TimeBlock::new(
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        );
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"["06:00:00","08:00:00"]"#);
    }

    #[test]
    fn test_day_token_serialization() {
        let json = serde_json::to_string(&DayToken::Thursday).unwrap();
        assert_eq!(json, "\"th\"");
        let parsed: DayToken = serde_json::from_str("\"T\"").unwrap();
        assert_eq!(parsed, DayToken::Tuesday);
    }
}
