//! Rooms in use during an explicit time window

use anyhow::Result;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use super::{parse_clock_time, parse_day, Analytics, USED_ROOM_EXCLUDED};
use crate::db::MeetingQuery;
use crate::types::{BuildingFilter, TimeBlock};

/// One course held in a room.
///
/// Serializes as `[course, instructor, capacity, enrolled]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomUse {
    pub course: String,
    pub instructor: String,
    /// Seats in the room
    pub capacity: f64,
    pub enrolled: i64,
}

impl Serialize for RoomUse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.course, &self.instructor, self.capacity, self.enrolled).serialize(serializer)
    }
}

/// Rooms in use, ordered by building and room number.
///
/// Every concurrent course in a room is kept. Serializes as a map from
/// room name to its course list, preserving room order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsedRooms {
    rooms: Vec<(String, Vec<RoomUse>)>,
}

impl UsedRooms {
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn get(&self, room: &str) -> Option<&[RoomUse]> {
        self.rooms
            .iter()
            .find(|(name, _)| name == room)
            .map(|(_, uses)| uses.as_slice())
    }

    pub fn room_names(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RoomUse])> {
        self.rooms
            .iter()
            .map(|(name, uses)| (name.as_str(), uses.as_slice()))
    }

    fn push(&mut self, room: String, entry: RoomUse) {
        match self.rooms.last_mut() {
            Some((last, uses)) if *last == room => uses.push(entry),
            _ => self.rooms.push((room, vec![entry])),
        }
    }
}

impl Serialize for UsedRooms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rooms.len()))?;
        for (room, uses) in &self.rooms {
            map.serialize_entry(room, uses)?;
        }
        map.end()
    }
}

impl<'a> Analytics<'a> {
    /// List the classrooms in use for the whole of `start`..`end` on `day`.
    ///
    /// `day` must be one of the five day tokens and both times must be
    /// zero-padded "HH:MM"; anything else yields an empty result. Off-campus
    /// rooms are never listed.
    pub fn get_used_classrooms(
        &self,
        day: &str,
        start: &str,
        end: &str,
        buildings: &BuildingFilter,
    ) -> Result<UsedRooms> {
        let (Some(day), Some(start), Some(end)) =
            (parse_day(day), parse_clock_time(start), parse_clock_time(end))
        else {
            return Ok(UsedRooms::default());
        };
        if matches!(buildings, BuildingFilter::NoBuildings) {
            return Ok(UsedRooms::default());
        }

        let query = MeetingQuery::on(day, buildings)
            .excluding(USED_ROOM_EXCLUDED)
            .covering(TimeBlock::new(start, end));

        let mut used = UsedRooms::default();
        for meeting in self.db.find_meetings(&query)? {
            used.push(
                meeting.classroom,
                RoomUse {
                    course: meeting.course_name,
                    instructor: meeting.instructor,
                    capacity: meeting.occupancy,
                    enrolled: meeting.enrolled,
                },
            );
        }

        debug!(
            "{} rooms in use on {} {}-{} for {}",
            used.len(),
            day,
            start,
            end,
            buildings
        );
        Ok(used)
    }
}
