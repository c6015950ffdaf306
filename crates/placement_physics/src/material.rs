//! Surface materials for placement colliders

use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Friction, bounciness and density of a collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsMaterial {
    /// Friction coefficient (0 = frictionless)
    pub friction: f32,
    /// Restitution/bounciness (0 = no bounce, 1 = perfect bounce)
    pub restitution: f32,
    /// Density for mass calculation (kg/m³)
    pub density: f32,
    /// How friction is combined between two colliders
    pub friction_combine: CombineRule,
    /// How restitution is combined between two colliders
    pub restitution_combine: CombineRule,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.6,
            restitution: 0.0,
            density: 1.0,
            friction_combine: CombineRule::Average,
            restitution_combine: CombineRule::Average,
        }
    }
}

impl PhysicsMaterial {
    /// Grippy, dead material used for temporary placement volumes.
    ///
    /// High friction and zero bounce make dropped props come to rest quickly.
    pub fn placement() -> Self {
        Self {
            friction: 0.9,
            restitution: 0.0,
            density: 1.0,
            friction_combine: CombineRule::Max,
            restitution_combine: CombineRule::Min,
        }
    }
}

/// Rule for combining material properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineRule {
    /// Use the average of both values
    #[default]
    Average,
    /// Use the minimum value
    Min,
    /// Use the maximum value
    Max,
    /// Multiply the values
    Multiply,
}

impl From<CombineRule> for rapier::CoefficientCombineRule {
    fn from(rule: CombineRule) -> Self {
        match rule {
            CombineRule::Average => rapier::CoefficientCombineRule::Average,
            CombineRule::Min => rapier::CoefficientCombineRule::Min,
            CombineRule::Max => rapier::CoefficientCombineRule::Max,
            CombineRule::Multiply => rapier::CoefficientCombineRule::Multiply,
        }
    }
}
