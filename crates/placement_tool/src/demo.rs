//! Built-in demo scene
//!
//! A ground slab, a leaning stack of three boxes, a crate that has a
//! collider but no body, and a box floating off to the side. The stack and
//! the crate are placed; the floating box is a bystander and must not move.

use placement_physics::body::euler_to_quat;
use placement_physics::RigidBodyType;
use placement_scene::{MeshShape, Scene, SceneObject};

/// Objects placed when the demo scene runs without an explicit selection
pub const DEMO_SELECTION: &[&str] = &["Box A", "Box B", "Box C", "Crate"];

pub fn demo_scene() -> Scene {
    let mut scene = Scene::new("Placement Demo");

    scene.spawn(
        SceneObject::new("Ground", MeshShape::Cube)
            .with_position(0.0, -0.5, 0.0)
            .with_scale(30.0, 1.0, 30.0)
            .with_body(RigidBodyType::Static),
    );

    for (i, name) in ["Box A", "Box B", "Box C"].into_iter().enumerate() {
        let i = i as f32;
        scene.spawn(
            SceneObject::new(name, MeshShape::Cube)
                .with_position(0.3 * i, 0.75 + 1.1 * i, 0.0)
                .with_body(RigidBodyType::Dynamic),
        );
    }

    scene.spawn(
        SceneObject::new("Crate", MeshShape::Cube)
            .with_position(3.0, 2.0, 0.0)
            .with_rotation(euler_to_quat(0.0, 0.6, 0.2))
            .with_scale(1.2, 0.8, 1.2)
            .with_collider(),
    );

    scene.spawn(
        SceneObject::new("Lantern", MeshShape::Capsule)
            .with_position(-3.0, 4.0, 1.0)
            .with_rotation(euler_to_quat(0.4, 0.0, -0.3))
            .with_scale(0.5, 1.5, 0.5)
            .with_body(RigidBodyType::Dynamic),
    );

    scene
}
