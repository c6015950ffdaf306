//! Global stepping switches of a physics world

use serde::{Deserialize, Serialize};

/// Who advances the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    /// The host's frame loop advances the world through `PhysicsWorld::step`
    #[default]
    Automatic,
    /// Only explicit `PhysicsWorld::simulate` calls advance the world
    Script,
}

impl SimulationMode {
    /// Whether the frame-driven accumulator is allowed to advance the world.
    pub fn is_automatic(self) -> bool {
        self == Self::Automatic
    }
}

impl std::fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Script => write!(f, "script"),
        }
    }
}
