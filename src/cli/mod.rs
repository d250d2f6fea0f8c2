//! CLI command implementations
//!
//! Handles all command-line interface operations:
//! - import-schedule / import-classrooms: Load CSV exports
//! - blocks / occupancy / used / room: Utilization queries
//! - prev / next: Block navigation
//! - status: Store statistics

mod commands;
mod db_utils;

pub use commands::*;
pub use db_utils::*;
