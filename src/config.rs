//! Engine configuration
//!
//! Settings come from `ENGAGE_*` environment variables with defaults for
//! every value. Command-line flags override what is read here.

use std::env::VarError;
use std::path::PathBuf;

use crate::aggregate::{DEFAULT_DISPLAY_ROWS, DEFAULT_TOP_THEMES};
use crate::error::ConfigError;
use crate::generator::{SyntheticGenerator, DEFAULT_RECORD_COUNT, DEFAULT_SEED};
use crate::pipeline::ViewOptions;
use crate::source::LoadOptions;

/// Default location of the engagement table
pub const DEFAULT_DATA_PATH: &str = "brut_social_media_data.csv";

/// Default `tracing` filter directive
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Resolved engine settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path of the engagement table (`ENGAGE_DATA_PATH`)
    pub data_path: PathBuf,
    /// Themes kept in the top-N rollup (`ENGAGE_TOP_THEMES`)
    pub top_themes: usize,
    /// Rows kept in the display projection (`ENGAGE_DISPLAY_ROWS`)
    pub display_rows: usize,
    /// Records synthesized for a missing table (`ENGAGE_SYNTHETIC_RECORDS`)
    pub synthetic_records: usize,
    /// Seed for synthesized tables (`ENGAGE_SYNTHETIC_SEED`)
    pub synthetic_seed: u64,
    /// `tracing` filter directive (`ENGAGE_LOG`)
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            top_themes: DEFAULT_TOP_THEMES,
            display_rows: DEFAULT_DISPLAY_ROWS,
            synthetic_records: DEFAULT_RECORD_COUNT,
            synthetic_seed: DEFAULT_SEED,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let defaults = EngineConfig::default();

        let parse_usize = |var: &str, default: usize| -> Result<usize, ConfigError> {
            match lookup(var) {
                Ok(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidEnvVar {
                        var: var.to_string(),
                        reason: e.to_string(),
                    }
                }),
                Err(_) => Ok(default),
            }
        };

        let synthetic_seed = match lookup("ENGAGE_SYNTHETIC_SEED") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: "ENGAGE_SYNTHETIC_SEED".to_string(),
                    reason: e.to_string(),
                })?,
            Err(_) => defaults.synthetic_seed,
        };

        Ok(EngineConfig {
            data_path: lookup("ENGAGE_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            top_themes: parse_usize("ENGAGE_TOP_THEMES", defaults.top_themes)?,
            display_rows: parse_usize("ENGAGE_DISPLAY_ROWS", defaults.display_rows)?,
            synthetic_records: parse_usize("ENGAGE_SYNTHETIC_RECORDS", defaults.synthetic_records)?,
            synthetic_seed,
            log_filter: lookup("ENGAGE_LOG").unwrap_or(defaults.log_filter),
        })
    }

    /// Aggregation settings for [`crate::pipeline::DashboardEngine`]
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            top_themes: self.top_themes,
            display_rows: self.display_rows,
        }
    }

    /// Load settings for [`crate::source::DatasetCache`]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            generate_missing: true,
            generator: SyntheticGenerator::new()
                .with_records(self.synthetic_records)
                .with_seed(self.synthetic_seed),
        }
    }
}
