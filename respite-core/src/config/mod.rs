pub mod constants;
pub mod profiles;
pub mod types;

pub use profiles::PresetName;
pub use types::*;

use crate::core::ConfigError;
use anyhow::{Context, Result};
use config::{Config as ConfigLoader, Environment, File};
use constants::{MAX_MINUTES, MIN_MINUTES};
use std::path::Path;

impl BreakConfig {
    /// Load configuration from file with optional environment variable overrides
    ///
    /// Environment variables use the `RESPITE__SECTION__FIELD` form, e.g.
    /// `RESPITE__TIMING__MAX_BREAK_MINUTES=20`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();

        let config = ConfigLoader::builder()
            .set_default("monitoring.log_level", "info")?
            .set_default("monitoring.json_logs", false)?
            // Load from TOML file
            .add_source(File::from(config_path))
            // Override with environment variables (RESPITE__)
            .add_source(
                Environment::with_prefix("RESPITE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let cfg: BreakConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        cfg.validate()
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        for (field, value) in [
            ("min_playtime_minutes", t.min_playtime_minutes),
            ("max_playtime_minutes", t.max_playtime_minutes),
            ("min_break_minutes", t.min_break_minutes),
            ("max_break_minutes", t.max_break_minutes),
        ] {
            if !(MIN_MINUTES..=MAX_MINUTES).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: MIN_MINUTES,
                    max: MAX_MINUTES,
                });
            }
        }

        if t.min_playtime_minutes > t.max_playtime_minutes {
            return Err(ConfigError::InvertedRange {
                min_field: "min_playtime_minutes",
                min: t.min_playtime_minutes,
                max_field: "max_playtime_minutes",
                max: t.max_playtime_minutes,
            });
        }

        if t.min_break_minutes > t.max_break_minutes {
            return Err(ConfigError::InvertedRange {
                min_field: "min_break_minutes",
                min: t.min_break_minutes,
                max_field: "max_break_minutes",
                max: t.max_break_minutes,
            });
        }

        // Builds (and discards) the window so bad times surface at load
        self.schedule.window()?;

        Ok(())
    }
}
