//! Rigid body types and descriptions

use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyHandle(pub(crate) rapier::RigidBodyHandle);

impl RigidBodyHandle {
    /// Get the raw Rapier handle
    pub fn raw(&self) -> rapier::RigidBodyHandle {
        self.0
    }
}

/// Type of rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigidBodyType {
    /// Static body - never moves, infinite mass
    Static,
    /// Dynamic body - fully simulated
    #[default]
    Dynamic,
    /// Kinematic position-based - moved by user, affects dynamic bodies
    KinematicPositionBased,
    /// Kinematic velocity-based - velocity set by user
    KinematicVelocityBased,
}

impl From<RigidBodyType> for rapier::RigidBodyType {
    fn from(t: RigidBodyType) -> Self {
        match t {
            RigidBodyType::Static => rapier::RigidBodyType::Fixed,
            RigidBodyType::Dynamic => rapier::RigidBodyType::Dynamic,
            RigidBodyType::KinematicPositionBased => rapier::RigidBodyType::KinematicPositionBased,
            RigidBodyType::KinematicVelocityBased => rapier::RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Description for creating a rigid body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyDesc {
    /// Type of rigid body
    pub body_type: RigidBodyType,
    /// Initial position
    pub position: [f32; 3],
    /// Initial rotation (quaternion: x, y, z, w)
    pub rotation: [f32; 4],
    /// Initial linear velocity
    pub linear_velocity: [f32; 3],
    /// Gravity scale (0 = no gravity, 1 = normal, 2 = double)
    pub gravity_scale: f32,
    /// Linear damping (air resistance)
    pub linear_damping: f32,
    /// Angular damping (rotational resistance)
    pub angular_damping: f32,
    /// Enable continuous collision detection
    pub ccd_enabled: bool,
    /// Can this body sleep when inactive
    pub can_sleep: bool,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            linear_velocity: [0.0, 0.0, 0.0],
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.05,
            ccd_enabled: false,
            can_sleep: true,
        }
    }
}

impl RigidBodyDesc {
    /// Create a static body description
    pub fn fixed() -> Self {
        Self {
            body_type: RigidBodyType::Static,
            ..Default::default()
        }
    }

    /// Create a dynamic body description
    pub fn dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            ..Default::default()
        }
    }

    /// Set position
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    /// Set rotation quaternion (x, y, z, w)
    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Enable CCD
    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd_enabled = enabled;
        self
    }

    /// Build a Rapier rigid body builder
    pub(crate) fn to_rapier_builder(&self) -> rapier::RigidBodyBuilder {
        rapier::RigidBodyBuilder::new(self.body_type.into())
            .position(to_isometry(self.position, self.rotation))
            .linvel(rapier::Vector::new(
                self.linear_velocity[0],
                self.linear_velocity[1],
                self.linear_velocity[2],
            ))
            .gravity_scale(self.gravity_scale)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .ccd_enabled(self.ccd_enabled)
            .can_sleep(self.can_sleep)
    }
}

/// Largest deviation of `|q|²` from one that is stored without renormalizing.
const UNIT_TOLERANCE: f32 = 1e-5;

/// Build a Rapier isometry from a position and an (x, y, z, w) quaternion.
///
/// Rotations that are already unit are stored bit for bit, so a pose read
/// back with [`from_isometry`] and written again does not drift.
pub(crate) fn to_isometry(position: [f32; 3], rotation: [f32; 4]) -> rapier::Isometry<f32> {
    let q = Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]);
    let rotation = if (q.norm_squared() - 1.0).abs() <= UNIT_TOLERANCE {
        UnitQuaternion::new_unchecked(q)
    } else {
        UnitQuaternion::from_quaternion(q)
    };
    rapier::Isometry::from_parts(
        rapier::Translation::new(position[0], position[1], position[2]),
        rotation,
    )
}

/// Split a Rapier isometry into a position and an (x, y, z, w) quaternion.
pub(crate) fn from_isometry(iso: &rapier::Isometry<f32>) -> ([f32; 3], [f32; 4]) {
    let t = iso.translation.vector;
    let r = iso.rotation;
    ([t.x, t.y, t.z], [r.i, r.j, r.k, r.w])
}

/// Convert euler angles to quaternion
pub fn euler_to_quat(x: f32, y: f32, z: f32) -> [f32; 4] {
    let (sx, cx) = (x * 0.5).sin_cos();
    let (sy, cy) = (y * 0.5).sin_cos();
    let (sz, cz) = (z * 0.5).sin_cos();

    [
        sx * cy * cz - cx * sy * sz,
        cx * sy * cz + sx * cy * sz,
        cx * cy * sz - sx * sy * cz,
        cx * cy * cz + sx * sy * sz,
    ]
}
