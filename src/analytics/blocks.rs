//! Time-block derivation

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::NaiveTime;
use tracing::debug;

use super::{day_close, day_open, Analytics, DayBlocks, BLOCK_EXCLUDED};
use crate::db::MeetingQuery;
use crate::types::{BuildingFilter, DayToken, TimeBlock};

/// Turn a day's boundary times into consecutive blocks.
///
/// The day-open and day-close anchors are always added and duplicates
/// collapse, so `n` distinct boundaries yield `n - 1` blocks and a day
/// without courses is the single block `[06:00:00, 23:59:00]`.
pub fn build_blocks<I>(times: I) -> Vec<TimeBlock>
where
    I: IntoIterator<Item = NaiveTime>,
{
    let mut boundaries: BTreeSet<NaiveTime> = times.into_iter().collect();
    boundaries.insert(day_open());
    boundaries.insert(day_close());

    let boundaries: Vec<NaiveTime> = boundaries.into_iter().collect();
    boundaries
        .windows(2)
        .map(|pair| TimeBlock::new(pair[0], pair[1]))
        .collect()
}

impl<'a> Analytics<'a> {
    /// Calculate the time blocks of every day for the given buildings
    pub fn calculate_time_blocks(&self, buildings: &BuildingFilter) -> Result<DayBlocks> {
        let mut all_blocks = DayBlocks::new();
        for day in DayToken::ALL {
            all_blocks.insert(day, self.day_time_blocks(day, buildings)?);
        }
        debug!("Time blocks for {}: {:?}", buildings, all_blocks);
        Ok(all_blocks)
    }

    /// Calculate one day's time blocks for the given buildings
    pub fn day_time_blocks(
        &self,
        day: DayToken,
        buildings: &BuildingFilter,
    ) -> Result<Vec<TimeBlock>> {
        if matches!(buildings, BuildingFilter::NoBuildings) {
            return Ok(build_blocks(std::iter::empty()));
        }

        let query = MeetingQuery::on(day, buildings).excluding(BLOCK_EXCLUDED);
        let times = self.db.distinct_boundaries(&query)?;
        debug!("Boundaries on {} for {}: {:?}", day, buildings, times);
        Ok(build_blocks(times))
    }

    /// Calculate the time blocks of every day for a single classroom.
    ///
    /// An unknown classroom gets the empty-day skeleton for each day.
    pub fn calculate_classroom_time_blocks(&self, classroom: &str) -> Result<DayBlocks> {
        let all = BuildingFilter::AllBuildings;
        let mut all_blocks = DayBlocks::new();
        for day in DayToken::ALL {
            let query = MeetingQuery::on(day, &all).in_classroom(classroom);
            let times = self.db.distinct_boundaries(&query)?;
            all_blocks.insert(day, build_blocks(times));
        }
        debug!("Time blocks for classroom {}: {:?}", classroom, all_blocks);
        Ok(all_blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn pairs(blocks: &[TimeBlock]) -> Vec<[String; 2]> {
        blocks.iter().map(|b| b.as_pair()).collect()
    }

    #[test]
    fn test_no_times_gives_skeleton() {
        let blocks = build_blocks(std::iter::empty::<NaiveTime>());
        assert_eq!(pairs(&blocks), vec![["06:00:00".to_string(), "23:59:00".to_string()]]);
    }

    #[test]
    fn test_single_course_splits_day() {
        let blocks = build_blocks([t(8, 0), t(8, 50)]);
        assert_eq!(
            pairs(&blocks),
            vec![
                ["06:00:00".to_string(), "08:00:00".to_string()],
                ["08:00:00".to_string(), "08:50:00".to_string()],
                ["08:50:00".to_string(), "23:59:00".to_string()],
            ]
        );
    }

    #[test]
    fn test_duplicate_boundaries_collapse() {
        let blocks = build_blocks([t(8, 0), t(8, 50), t(8, 0), t(8, 50), t(6, 0)]);
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let blocks = build_blocks([t(9, 50), t(9, 0), t(8, 50), t(8, 0)]);
        assert_eq!(blocks.len(), 5);
        assert!(blocks.iter().all(|b| b.start < b.end));
        assert!(blocks.windows(2).all(|w| w[0].end == w[1].start));
        assert_eq!(blocks[0].start, day_open());
        assert_eq!(blocks[4].end, day_close());
    }

    #[test]
    fn test_block_count_is_boundaries_minus_one() {
        let times = [t(7, 30), t(10, 0), t(12, 15), t(13, 5), t(10, 0)];
        let distinct: BTreeSet<NaiveTime> = times
            .iter()
            .copied()
            .chain([day_open(), day_close()])
            .collect();
        assert_eq!(build_blocks(times).len(), distinct.len() - 1);
    }
}
