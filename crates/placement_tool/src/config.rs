//! Tool configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (`PLACEMENT_*`, see [`SessionSettings::apply_env`])
//! 2. Command line: `rigid-placement [config.toml] [scene.toml]`
//! 3. Config file: the first argument, else `placement.toml` if present
//! 4. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! scene = "scenes/shelf.toml"
//! select = ["Book 1", "Book 2"]
//! output = "scenes/shelf.settled.toml"
//!
//! [session]
//! max_iterations = 1500
//! include_non_physics = true
//!
//! [session.force]
//! min = 0.0
//! max = 1.0
//!
//! [physics]
//! timestep = 0.02
//! sleep_linear_threshold = 0.05
//! ```

use placement_physics::PhysicsConfig;
use placement_session::{SessionSettings, SettingsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "placement.toml";

/// Complete tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Session settings
    pub session: SessionSettings,
    /// Physics world settings
    pub physics: PhysicsConfig,
    /// Scene file to load; the built-in demo scene when unset
    pub scene: Option<PathBuf>,
    /// Names of the objects to place; every non-static object when empty
    pub select: Vec<String>,
    /// Where to save the settled scene before rolling back
    pub output: Option<PathBuf>,
    /// Config file path
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl ToolConfig {
    /// Load configuration from all sources
    pub fn load(args: &[String]) -> Result<Self, SettingsError> {
        let mut positional = args.iter().skip(1).filter(|a| !a.starts_with("--"));
        let config_arg = positional.next().map(PathBuf::from);
        let scene_arg = positional.next().map(PathBuf::from);

        let mut config = match config_arg {
            Some(path) => Self::load_from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load_from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        if let Some(scene) = scene_arg {
            log::info!("Scene from args: {}", scene.display());
            config.scene = Some(scene);
        }

        config.session.apply_env();
        if let Ok(output) = std::env::var("PLACEMENT_OUTPUT") {
            if !output.is_empty() {
                config.output = Some(PathBuf::from(output));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        log::info!("Loaded tool config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.session.validate()?;
        self.physics
            .validate()
            .map_err(|err| SettingsError::Invalid(err.to_string()))
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("Rigid placement configuration:");
        if let Some(path) = &self.config_path {
            println!("  Config file:      {}", path.display());
        }
        match &self.scene {
            Some(path) => println!("  Scene:            {}", path.display()),
            None => println!("  Scene:            built-in demo"),
        }
        println!("  Max iterations:   {}", self.session.max_iterations);
        println!(
            "  Launch force:     {} .. {}{}",
            self.session.force.min,
            self.session.force.max,
            self.session
                .force
                .angle
                .map(|a| format!(" at {a:.2} rad"))
                .unwrap_or_default()
        );
        println!("  Non-physics:      {}", self.session.include_non_physics);
        println!("  Step visualized:  {}", self.session.step_visualized);
        println!("  Timestep:         {:.4}s", self.physics.timestep);
        println!();
    }
}
