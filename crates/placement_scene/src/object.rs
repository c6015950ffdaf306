//! Scene objects and the collision shapes derived from them

use placement_physics::{ColliderShape, RigidBodyType};
use placement_session::Pose;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primitive mesh of an object; a unit shape scaled by the object's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshShape {
    #[default]
    Cube,
    Sphere,
    Capsule,
    Cylinder,
}

impl MeshShape {
    pub fn name(&self) -> &'static str {
        match self {
            MeshShape::Cube => "cube",
            MeshShape::Sphere => "sphere",
            MeshShape::Capsule => "capsule",
            MeshShape::Cylinder => "cylinder",
        }
    }
}

impl fmt::Display for MeshShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MeshShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cube" | "box" => Ok(MeshShape::Cube),
            "sphere" | "ball" => Ok(MeshShape::Sphere),
            "capsule" => Ok(MeshShape::Capsule),
            "cylinder" => Ok(MeshShape::Cylinder),
            other => Err(other.to_string()),
        }
    }
}

/// An object in the editor scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Display name
    pub name: String,
    /// World transform
    pub pose: Pose,
    /// Per-axis scale of the unit mesh
    pub scale: [f32; 3],
    pub shape: MeshShape,
    /// Rigid body authored on the object, if any
    pub body: Option<RigidBodyType>,
    /// Whether the object carries a collider of its own
    pub collider: bool,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, shape: MeshShape) -> Self {
        Self {
            name: name.into(),
            pose: Pose::IDENTITY,
            scale: [1.0, 1.0, 1.0],
            shape,
            body: None,
            collider: false,
        }
    }

    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.pose.position = [x, y, z];
        self
    }

    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.pose.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = [x, y, z];
        self
    }

    /// Give the object a rigid body; bodies always come with a collider
    pub fn with_body(mut self, body: RigidBodyType) -> Self {
        self.body = Some(body);
        self.collider = true;
        self
    }

    /// Give the object a collider without a body (static scenery)
    pub fn with_collider(mut self) -> Self {
        self.collider = true;
        self
    }

    /// Dynamic object that physics moves
    pub fn is_dynamic(&self) -> bool {
        self.body == Some(RigidBodyType::Dynamic)
    }

    /// Half extents of the scaled unit bounds
    pub fn half_extents(&self) -> [f32; 3] {
        [
            0.5 * self.scale[0].abs(),
            0.5 * self.scale[1].abs(),
            0.5 * self.scale[2].abs(),
        ]
    }

    fn radial(&self) -> (f32, f32) {
        let [hx, hy, hz] = self.half_extents();
        (hy, hx.max(hz))
    }

    /// Exact collider for the authored mesh
    pub fn collider_shape(&self) -> ColliderShape {
        let [hx, hy, hz] = self.half_extents();
        match self.shape {
            MeshShape::Cube => ColliderShape::cuboid(hx, hy, hz),
            MeshShape::Sphere => ColliderShape::sphere(hx.max(hy).max(hz)),
            MeshShape::Capsule => self.capsule_shape(),
            MeshShape::Cylinder => {
                let (half_height, radius) = self.radial();
                ColliderShape::CylinderY { half_height, radius }
            }
        }
    }

    /// Convex stand-in used when physics is synthesized for the object.
    ///
    /// Spheres and capsules keep their primitive; everything else becomes
    /// the convex hull of its scaled bounds.
    pub fn convex_shape(&self) -> ColliderShape {
        let [hx, hy, hz] = self.half_extents();
        match self.shape {
            MeshShape::Sphere => ColliderShape::sphere(hx.max(hy).max(hz)),
            MeshShape::Capsule => self.capsule_shape(),
            MeshShape::Cube | MeshShape::Cylinder => ColliderShape::convex_box(hx, hy, hz),
        }
    }

    fn capsule_shape(&self) -> ColliderShape {
        let (half_height, radius) = self.radial();
        ColliderShape::capsule((half_height - radius).max(0.0), radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shape_names() {
        assert_eq!("Cube".parse::<MeshShape>(), Ok(MeshShape::Cube));
        assert_eq!("ball".parse::<MeshShape>(), Ok(MeshShape::Sphere));
        assert_eq!("torus".parse::<MeshShape>(), Err("torus".to_string()));
    }

    #[test]
    fn test_convex_shape_follows_scaled_bounds() {
        let crate_box = SceneObject::new("crate", MeshShape::Cube).with_scale(2.0, 1.0, 4.0);
        match crate_box.convex_shape() {
            ColliderShape::ConvexHull { points } => {
                assert_eq!(points.len(), 8);
                assert!(points.contains(&[1.0, 0.5, 2.0]));
                assert!(points.contains(&[-1.0, -0.5, -2.0]));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_capsule_keeps_primitive() {
        let pill = SceneObject::new("pill", MeshShape::Capsule).with_scale(1.0, 3.0, 1.0);
        assert_eq!(pill.convex_shape(), ColliderShape::capsule(1.0, 0.5));
    }

    #[test]
    fn test_body_implies_collider() {
        let object = SceneObject::new("box", MeshShape::Cube).with_body(RigidBodyType::Dynamic);
        assert!(object.collider);
        assert!(object.is_dynamic());
    }
}
