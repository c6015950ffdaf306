//! Session settings
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (`PLACEMENT_MAX_ITERATIONS=500`)
//! 2. A TOML file passed to [`SessionSettings::load`]
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! max_iterations = 1000
//! include_non_physics = true
//! step_visualized = false
//! seed = 42
//!
//! [force]
//! min = 0.0
//! max = 2.5
//! # angle = 1.57  # radians; omit for a random heading per body
//! ```

use crate::force::LaunchForce;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Everything a placement run needs besides the participant set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Upper bound on ticks per run
    pub max_iterations: u32,
    /// Launch impulse applied to every simulated body
    pub force: LaunchForce,
    /// Track objects without a physics body by synthesizing one per run
    pub include_non_physics: bool,
    /// Advance one tick per host frame instead of blocking
    pub step_visualized: bool,
    /// Seed for launch impulses; entropy when unset
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            force: LaunchForce::none(),
            include_non_physics: false,
            step_visualized: false,
            seed: None,
        }
    }
}

impl SessionSettings {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content)?;
        log::info!("Loaded session settings from {}", path.display());
        Ok(settings)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Override fields from `PLACEMENT_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields from a key lookup; unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("PLACEMENT_MAX_ITERATIONS") {
            match value.trim().parse() {
                Ok(n) => self.max_iterations = n,
                Err(_) => log::warn!("Ignoring PLACEMENT_MAX_ITERATIONS={:?}", value),
            }
        }
        if let Some(value) = lookup("PLACEMENT_FORCE_MIN") {
            match value.trim().parse() {
                Ok(v) => self.force.min = v,
                Err(_) => log::warn!("Ignoring PLACEMENT_FORCE_MIN={:?}", value),
            }
        }
        if let Some(value) = lookup("PLACEMENT_FORCE_MAX") {
            match value.trim().parse() {
                Ok(v) => self.force.max = v,
                Err(_) => log::warn!("Ignoring PLACEMENT_FORCE_MAX={:?}", value),
            }
        }
        if let Some(value) = lookup("PLACEMENT_FORCE_ANGLE") {
            match value.trim() {
                "" | "random" => self.force.angle = None,
                v => match v.parse() {
                    Ok(angle) => self.force.angle = Some(angle),
                    Err(_) => log::warn!("Ignoring PLACEMENT_FORCE_ANGLE={:?}", value),
                },
            }
        }
        if let Some(value) = lookup("PLACEMENT_INCLUDE_NON_PHYSICS") {
            self.include_non_physics = parse_flag(&value);
        }
        if let Some(value) = lookup("PLACEMENT_STEP_VISUALIZED") {
            self.step_visualized = parse_flag(&value);
        }
        if let Some(value) = lookup("PLACEMENT_SEED") {
            match value.trim().parse() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => log::warn!("Ignoring PLACEMENT_SEED={:?}", value),
            }
        }
    }

    /// Reject values a run cannot use
    pub fn validate(&self) -> Result<(), SettingsError> {
        let LaunchForce { min, max, angle } = self.force;
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || max < 0.0 {
            return Err(SettingsError::Invalid(format!(
                "force bounds must be finite and non-negative, got [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(SettingsError::Invalid(format!(
                "force.min ({min}) exceeds force.max ({max})"
            )));
        }
        if angle.is_some_and(|a| !a.is_finite()) {
            return Err(SettingsError::Invalid("force.angle must be finite".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
