//! Weekly schedule of a single room

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Serialize, Serializer};
use tracing::debug;

use super::{Analytics, DayBlocks};
use crate::db::MeetingQuery;
use crate::types::{BuildingFilter, DayToken};

/// A course occupying the room. Serializes as `[course, instructor, enrolled]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCourse {
    pub course: String,
    pub instructor: String,
    pub enrolled: i64,
}

impl Serialize for ScheduledCourse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.course, &self.instructor, self.enrolled).serialize(serializer)
    }
}

/// What a room holds during one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomSlot {
    /// Serializes as the fixed placeholder `["", "", 0]`
    Vacant,
    Occupied(Vec<ScheduledCourse>),
}

impl Serialize for RoomSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RoomSlot::Vacant => ("", "", 0).serialize(serializer),
            RoomSlot::Occupied(courses) => courses.serialize(serializer),
        }
    }
}

/// A room's time blocks and the courses held during each.
///
/// Serializes as the pair `[time_blocks, courses]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomSchedule {
    pub time_blocks: DayBlocks,
    /// Day -> block start ("HH:MM:SS") -> slot
    pub courses: BTreeMap<DayToken, BTreeMap<String, RoomSlot>>,
}

impl RoomSchedule {
    pub fn slot(&self, day: DayToken, start: &str) -> Option<&RoomSlot> {
        self.courses.get(&day).and_then(|d| d.get(start))
    }
}

impl Serialize for RoomSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.time_blocks, &self.courses).serialize(serializer)
    }
}

impl<'a> Analytics<'a> {
    /// Build the weekly schedule of one classroom.
    ///
    /// An unknown classroom yields the empty-day skeleton with every block
    /// vacant.
    pub fn get_classroom_courses(&self, classroom: &str) -> Result<RoomSchedule> {
        let time_blocks = self.calculate_classroom_time_blocks(classroom)?;
        let all = BuildingFilter::AllBuildings;

        let mut courses = BTreeMap::new();
        for (day, blocks) in &time_blocks {
            let mut day_courses = BTreeMap::new();
            for block in blocks {
                let query = MeetingQuery::on(*day, &all)
                    .in_classroom(classroom)
                    .covering(*block);
                let meetings = self.db.find_meetings(&query)?;

                let slot = if meetings.is_empty() {
                    RoomSlot::Vacant
                } else {
                    RoomSlot::Occupied(
                        meetings
                            .into_iter()
                            .map(|m| ScheduledCourse {
                                course: m.course_name,
                                instructor: m.instructor,
                                enrolled: m.enrolled,
                            })
                            .collect(),
                    )
                };
                day_courses.insert(block.start_key(), slot);
            }
            courses.insert(*day, day_courses);
        }

        debug!("Schedule for classroom {}: {:?}", classroom, courses);
        Ok(RoomSchedule {
            time_blocks,
            courses,
        })
    }
}
