//! Runtime configuration, loaded from environment variables.
//!
//! Keeps every `env::var` lookup in one place so the CLI and the import
//! path agree on defaults.

use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Serialize;

/// Default on-disk store, relative to the working directory
pub const DEFAULT_DB_PATH: &str = ".classroom-analytics/analytics.db";

/// Parse a boolean flag environment variable with a default value.
macro_rules! parse_env_flag {
    ($var_name:expr, $default:expr) => {
        match env::var($var_name) {
            Err(_) => $default,
            Ok(v) => match v.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => return Err(anyhow!("Invalid {}: {:?}", $var_name, other)),
            },
        }
    };
}

/// Which stored courses a schedule import replaces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceScope {
    /// Only courses in the terms present in the imported file
    #[default]
    Term,
    /// Every stored course
    All,
}

impl ReplaceScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplaceScope::Term => "term",
            ReplaceScope::All => "all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "term" => Some(ReplaceScope::Term),
            "all" => Some(ReplaceScope::All),
            _ => None,
        }
    }
}

impl fmt::Display for ReplaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application configuration snapshot.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file backing the store
    pub db_path: PathBuf,

    /// Use a throwaway in-memory store instead of `db_path`
    pub in_memory: bool,

    /// Replacement policy for schedule imports
    pub replace_scope: ReplaceScope,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            in_memory: false,
            replace_scope: ReplaceScope::Term,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `CLASSROOM_DB` – store path (default: `.classroom-analytics/analytics.db`)
/// - `CLASSROOM_IN_MEMORY` – `1` to keep the store in memory (default: off)
/// - `CLASSROOM_REPLACE_SCOPE` – `term` or `all` (default: `term`)
///
/// Returns an error if a variable is set to an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = env::var("CLASSROOM_DB")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

    let in_memory = parse_env_flag!("CLASSROOM_IN_MEMORY", false);

    let replace_scope = match env::var("CLASSROOM_REPLACE_SCOPE") {
        Err(_) => ReplaceScope::Term,
        Ok(v) => ReplaceScope::from_str(&v).ok_or_else(|| {
            anyhow!("Invalid CLASSROOM_REPLACE_SCOPE: {:?} (expected term or all)", v)
        })?,
    };

    Ok(Config {
        db_path,
        in_memory,
        replace_scope,
    })
}

impl Config {
    pub fn import_config(&self) -> crate::ImportConfig {
        crate::ImportConfig {
            replace_scope: self.replace_scope,
        }
    }

    /// Log the loaded configuration
    pub fn log_config(&self) {
        tracing::debug!("Configuration loaded:");
        if self.in_memory {
            tracing::debug!("  CLASSROOM_DB            : (in memory)");
        } else {
            tracing::debug!("  CLASSROOM_DB            : {}", self.db_path.display());
        }
        tracing::debug!("  CLASSROOM_REPLACE_SCOPE : {}", self.replace_scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_scope_parsing() {
        assert_eq!(ReplaceScope::from_str("term"), Some(ReplaceScope::Term));
        assert_eq!(ReplaceScope::from_str(" ALL "), Some(ReplaceScope::All));
        assert_eq!(ReplaceScope::from_str("semester"), None);
        assert_eq!(ReplaceScope::default(), ReplaceScope::Term);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert!(!config.in_memory);
        assert_eq!(config.import_config().replace_scope, ReplaceScope::Term);
    }
}
