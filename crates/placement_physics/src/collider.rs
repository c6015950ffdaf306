//! Collider types and descriptions

use crate::body::to_isometry;
use crate::error::{PhysicsError, Result};
use crate::material::PhysicsMaterial;
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub(crate) rapier::ColliderHandle);

impl ColliderHandle {
    /// Get the raw Rapier handle
    pub fn raw(&self) -> rapier::ColliderHandle {
        self.0
    }
}

/// Collision shape type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColliderShape {
    /// Sphere with radius
    Sphere { radius: f32 },
    /// Box with half-extents
    Box { half_extents: [f32; 3] },
    /// Capsule aligned along Y axis
    CapsuleY { half_height: f32, radius: f32 },
    /// Cylinder aligned along Y axis
    CylinderY { half_height: f32, radius: f32 },
    /// Convex hull from points
    ConvexHull { points: Vec<[f32; 3]> },
    /// Triangle mesh (static only)
    TriMesh {
        vertices: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
    },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Box {
            half_extents: [0.5, 0.5, 0.5],
        }
    }
}

impl ColliderShape {
    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from half-extents
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Box {
            half_extents: [hx, hy, hz],
        }
    }

    /// Create a capsule shape (Y-aligned)
    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::CapsuleY { half_height, radius }
    }

    /// Create a convex hull over the eight corners of a box.
    pub fn convex_box(hx: f32, hy: f32, hz: f32) -> Self {
        let mut points = Vec::with_capacity(8);
        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                for sz in [-1.0, 1.0] {
                    points.push([sx * hx, sy * hy, sz * hz]);
                }
            }
        }
        Self::ConvexHull { points }
    }

    /// Whether Rapier can give this shape a mass (dynamic bodies need one).
    pub fn is_convex(&self) -> bool {
        !matches!(self, Self::TriMesh { .. })
    }

    /// Build a Rapier shared shape
    pub(crate) fn to_rapier(&self) -> Result<rapier::SharedShape> {
        let shape = match self {
            Self::Sphere { radius } => rapier::SharedShape::ball(*radius),
            Self::Box { half_extents } => {
                rapier::SharedShape::cuboid(half_extents[0], half_extents[1], half_extents[2])
            }
            Self::CapsuleY { half_height, radius } => {
                rapier::SharedShape::capsule_y(*half_height, *radius)
            }
            Self::CylinderY { half_height, radius } => {
                rapier::SharedShape::cylinder(*half_height, *radius)
            }
            Self::ConvexHull { points } => {
                let rapier_points: Vec<_> = points
                    .iter()
                    .map(|p| rapier::Point::new(p[0], p[1], p[2]))
                    .collect();
                rapier::SharedShape::convex_hull(&rapier_points).ok_or_else(|| {
                    PhysicsError::ShapeCreationFailed(format!(
                        "degenerate convex hull over {} points",
                        points.len()
                    ))
                })?
            }
            Self::TriMesh { vertices, indices } => {
                let rapier_verts: Vec<_> = vertices
                    .iter()
                    .map(|v| rapier::Point::new(v[0], v[1], v[2]))
                    .collect();
                rapier::SharedShape::trimesh(rapier_verts, indices.clone())
            }
        };
        Ok(shape)
    }
}

/// Description for creating a collider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderDesc {
    /// Collision shape
    pub shape: ColliderShape,
    /// Position offset from parent body
    pub position_offset: [f32; 3],
    /// Rotation offset (quaternion)
    pub rotation_offset: [f32; 4],
    /// Is this a sensor/trigger (no physical response)
    pub is_sensor: bool,
    /// Physics material
    pub material: PhysicsMaterial,
    /// User data (entity ID, etc.)
    pub user_data: u128,
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            shape: ColliderShape::default(),
            position_offset: [0.0, 0.0, 0.0],
            rotation_offset: [0.0, 0.0, 0.0, 1.0],
            is_sensor: false,
            material: PhysicsMaterial::default(),
            user_data: 0,
        }
    }
}

impl ColliderDesc {
    /// Create a new collider description with a shape
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Set position offset (or world position for a parentless collider)
    pub fn with_offset(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position_offset = [x, y, z];
        self
    }

    /// Set rotation offset (or world rotation for a parentless collider)
    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation_offset = rotation;
        self
    }

    /// Set material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Build a Rapier collider builder
    pub(crate) fn to_rapier_builder(&self) -> Result<rapier::ColliderBuilder> {
        Ok(rapier::ColliderBuilder::new(self.shape.to_rapier()?)
            .position(to_isometry(self.position_offset, self.rotation_offset))
            .sensor(self.is_sensor)
            .friction(self.material.friction)
            .restitution(self.material.restitution)
            .density(self.material.density)
            .friction_combine_rule(self.material.friction_combine.into())
            .restitution_combine_rule(self.material.restitution_combine.into())
            .user_data(self.user_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_box_has_eight_corners() {
        match ColliderShape::convex_box(0.5, 1.0, 2.0) {
            ColliderShape::ConvexHull { points } => {
                assert_eq!(points.len(), 8);
                assert!(points.contains(&[0.5, 1.0, 2.0]));
                assert!(points.contains(&[-0.5, -1.0, -2.0]));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_hull_is_an_error() {
        let shape = ColliderShape::ConvexHull {
            points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        };
        assert!(matches!(
            shape.to_rapier(),
            Err(PhysicsError::ShapeCreationFailed(_))
        ));
    }

    #[test]
    fn test_trimesh_is_not_convex() {
        let mesh = ColliderShape::TriMesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            indices: vec![[0, 1, 2]],
        };
        assert!(!mesh.is_convex());
        assert!(ColliderShape::sphere(1.0).is_convex());
    }
}
