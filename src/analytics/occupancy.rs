//! Occupancy counting per time block

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Serialize, Serializer};
use tracing::debug;

use super::{Analytics, DayBlocks, OCCUPANCY_EXCLUDED};
use crate::db::MeetingQuery;
use crate::types::{BuildingFilter, DayToken};

/// Time blocks together with the number of rooms in use during each block.
///
/// Serializes as the pair `[time_blocks, counts]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occupancy {
    pub time_blocks: DayBlocks,
    /// Day -> block start ("HH:MM:SS") -> distinct rooms in use
    pub counts: BTreeMap<DayToken, BTreeMap<String, u32>>,
}

impl Occupancy {
    /// Count for the block starting at `start` ("HH:MM:SS") on `day`
    pub fn count(&self, day: DayToken, start: &str) -> Option<u32> {
        self.counts.get(&day).and_then(|d| d.get(start)).copied()
    }
}

impl Serialize for Occupancy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.time_blocks, &self.counts).serialize(serializer)
    }
}

impl<'a> Analytics<'a> {
    /// Count the distinct classrooms in use during every time block.
    ///
    /// Two sections sharing a room at the same time count once. Rooms in
    /// unassigned or off-campus buildings are never counted.
    pub fn calculate_number_classes(&self, buildings: &BuildingFilter) -> Result<Occupancy> {
        let time_blocks = self.calculate_time_blocks(buildings)?;
        if time_blocks.values().all(|blocks| blocks.is_empty()) {
            debug!("No time blocks found for {}", buildings);
            return Ok(Occupancy::default());
        }

        let mut counts = BTreeMap::new();
        for (day, blocks) in &time_blocks {
            let mut day_counts = BTreeMap::new();
            for block in blocks {
                let count = match buildings {
                    BuildingFilter::NoBuildings => 0,
                    _ => {
                        let query = MeetingQuery::on(*day, buildings)
                            .excluding(OCCUPANCY_EXCLUDED)
                            .covering(*block);
                        self.db.count_distinct_rooms(&query)?
                    }
                };
                day_counts.insert(block.start_key(), count);
            }
            debug!("Rooms in use on {} for {}: {:?}", day, buildings, day_counts);
            counts.insert(*day, day_counts);
        }

        Ok(Occupancy {
            time_blocks,
            counts,
        })
    }
}
