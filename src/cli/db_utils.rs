//! Database path and initialization utilities

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::db::Database;
use crate::types::BuildingFilter;

/// Ensure the directory holding the database file exists
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Open or initialize the configured store
pub fn open_database(config: &Config) -> Result<Database> {
    if config.in_memory {
        return Database::in_memory();
    }
    ensure_database_directory(&config.db_path)?;
    Database::open(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))
}

/// Parse a `--buildings` argument.
///
/// `None` means every building, an empty list means none, and unknown codes
/// are dropped.
pub fn parse_buildings_arg(arg: Option<&str>) -> BuildingFilter {
    match arg {
        None => BuildingFilter::AllBuildings,
        Some(list) => BuildingFilter::from_codes(
            list.split(',').map(str::trim).filter(|c| !c.is_empty()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuildingCode;

    #[test]
    fn test_parse_buildings_arg() {
        assert_eq!(parse_buildings_arg(None), BuildingFilter::AllBuildings);
        assert_eq!(parse_buildings_arg(Some("")), BuildingFilter::NoBuildings);
        assert_eq!(parse_buildings_arg(Some("NOPE")), BuildingFilter::NoBuildings);

        match parse_buildings_arg(Some("SIMP, STCH,")) {
            BuildingFilter::Subset(set) => {
                assert!(set.contains(&BuildingCode::Simp));
                assert!(set.contains(&BuildingCode::Stch));
                assert_eq!(set.len(), 2);
            }
            other => panic!("unexpected filter: {other:?}"),
        }
    }

    #[test]
    fn test_ensure_database_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("analytics.db");
        ensure_database_directory(&db_path).unwrap();
        assert!(db_path.parent().unwrap().is_dir());
    }
}
