//! Paging between adjacent time blocks

use anyhow::Result;

use super::{parse_boundary_time, parse_day, Analytics};
use crate::types::BuildingFilter;

#[derive(Debug, Clone, Copy)]
enum Direction {
    Past,
    Next,
}

impl<'a> Analytics<'a> {
    /// Given the end of a block, return its start as "HH:MM".
    ///
    /// Returns an empty string for an unknown day, a malformed time, or a
    /// time that does not end any block.
    pub fn get_past_time(
        &self,
        day: &str,
        time: &str,
        buildings: &BuildingFilter,
    ) -> Result<String> {
        self.adjacent_boundary(day, time, buildings, Direction::Past)
    }

    /// Given the start of a block, return its end as "HH:MM".
    ///
    /// Returns an empty string for an unknown day, a malformed time, or a
    /// time that does not start any block.
    pub fn get_next_time(
        &self,
        day: &str,
        time: &str,
        buildings: &BuildingFilter,
    ) -> Result<String> {
        self.adjacent_boundary(day, time, buildings, Direction::Next)
    }

    fn adjacent_boundary(
        &self,
        day: &str,
        time: &str,
        buildings: &BuildingFilter,
        direction: Direction,
    ) -> Result<String> {
        let (Some(day), Some(time)) = (parse_day(day), parse_boundary_time(time)) else {
            return Ok(String::new());
        };

        let blocks = self.day_time_blocks(day, buildings)?;
        let found = blocks.iter().find_map(|block| match direction {
            Direction::Past if block.end == time => Some(block.start),
            Direction::Next if block.start == time => Some(block.end),
            _ => None,
        });

        Ok(found
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default())
    }
}
