//! Time-block and occupancy queries
//!
//! Provides the query operations over a term's schedule:
//! - Time blocks: intervals of a day during which room usage is constant
//! - Occupancy: number of rooms in use per block
//! - Used rooms: which rooms are in use during a window, and by what
//! - Room schedule: one room's blocks and the courses occupying them
//! - Block navigation: previous/next block boundary
//!
//! Every call re-derives its blocks from the current store contents.
//! Malformed input (unknown day, badly formatted time) never raises; it
//! yields the empty result for the operation.

mod blocks;
mod navigator;
mod occupancy;
mod room_schedule;
mod used_rooms;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;
use tracing::debug;

use crate::db::Database;
use crate::types::{BuildingCode, DayToken, TimeBlock};

pub use blocks::build_blocks;
pub use occupancy::Occupancy;
pub use room_schedule::{RoomSchedule, RoomSlot, ScheduledCourse};
pub use used_rooms::{RoomUse, UsedRooms};

/// Time blocks for each day token, in weekday order
pub type DayBlocks = BTreeMap<DayToken, Vec<TimeBlock>>;

/// Buildings whose courses never contribute block boundaries
pub const BLOCK_EXCLUDED: &[BuildingCode] = &[BuildingCode::Ofcp];

/// Buildings whose rooms are never counted as occupied
pub const OCCUPANCY_EXCLUDED: &[BuildingCode] = &[BuildingCode::Unassigned, BuildingCode::Ofcp];

/// Buildings whose rooms are never listed as used
pub const USED_ROOM_EXCLUDED: &[BuildingCode] = &[BuildingCode::Ofcp];

static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("clock time pattern"));

static BOUNDARY_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("boundary time pattern"));

/// First boundary of every day
pub fn day_open() -> NaiveTime {
    NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default()
}

/// Last boundary of every day
pub fn day_close() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()
}

/// The reference table of building codes and their names
pub fn get_all_buildings() -> BTreeMap<&'static str, &'static str> {
    BuildingCode::LISTED
        .iter()
        .map(|b| (b.as_str(), b.display_name()))
        .collect()
}

/// Parse a strict, zero-padded "HH:MM" time
pub(crate) fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    if !CLOCK_TIME.is_match(s) {
        debug!("Rejecting malformed time {:?}", s);
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// Parse a block boundary given as "HH:MM" or "HH:MM:SS"
pub(crate) fn parse_boundary_time(s: &str) -> Option<NaiveTime> {
    let normalized = if CLOCK_TIME.is_match(s) {
        format!("{}:00", s)
    } else {
        s.to_string()
    };
    if !BOUNDARY_TIME.is_match(&normalized) {
        debug!("Rejecting malformed boundary {:?}", s);
        return None;
    }
    NaiveTime::parse_from_str(&normalized, crate::types::TIME_FORMAT).ok()
}

pub(crate) fn parse_day(s: &str) -> Option<DayToken> {
    let day = DayToken::from_str(s);
    if day.is_none() {
        debug!("Rejecting unknown day token {:?}", s);
    }
    day
}

/// Query operations on the schedule store
pub struct Analytics<'a> {
    db: &'a Database,
}

impl<'a> Analytics<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}
