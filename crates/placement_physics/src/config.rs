//! Physics configuration

use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};

/// Physics world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity vector (default: -9.81 in Y)
    pub gravity: [f32; 3],

    /// Fixed timestep for physics simulation
    pub timestep: f32,

    /// Maximum number of substeps per frame
    pub max_substeps: u32,

    /// Enable continuous collision detection
    pub ccd_enabled: bool,

    /// Default friction coefficient
    pub default_friction: f32,

    /// Default restitution (bounciness)
    pub default_restitution: f32,

    /// Solver iterations for velocity
    pub velocity_iterations: usize,

    /// Enable sleeping for inactive bodies
    pub sleeping_enabled: bool,

    /// Linear velocity threshold for sleeping
    pub sleep_linear_threshold: f32,

    /// Angular velocity threshold for sleeping
    pub sleep_angular_threshold: f32,

    /// Seconds a body must stay under both thresholds before it sleeps
    pub time_until_sleep: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            timestep: 1.0 / 50.0,
            max_substeps: 4,
            ccd_enabled: false,
            default_friction: 0.6,
            default_restitution: 0.0,
            velocity_iterations: 4,
            sleeping_enabled: true,
            sleep_linear_threshold: 0.1,
            sleep_angular_threshold: 0.1,
            time_until_sleep: 0.5,
        }
    }
}

impl PhysicsConfig {
    /// Create a configuration for high-precision simulation
    pub fn high_precision() -> Self {
        Self {
            velocity_iterations: 8,
            max_substeps: 8,
            ..Default::default()
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.gravity = [x, y, z];
        self
    }

    /// Set timestep
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Reject values Rapier cannot integrate with.
    pub fn validate(&self) -> Result<()> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        if self.velocity_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "velocity_iterations must be at least 1".to_string(),
            ));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        Ok(())
    }
}
