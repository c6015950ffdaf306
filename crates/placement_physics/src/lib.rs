//! Placement Physics - Rapier 3D world for editor-side relaxation
//!
//! This crate wraps Rapier 3D in the small surface the rigid placement
//! session needs: bodies and colliders keyed by scene object, impulses,
//! sleep state, and two process-wide switches that an editor tool flips
//! while it drives the world by hand.
//!
//! # Features
//!
//! - Rigid body dynamics (static, dynamic, kinematic)
//! - Convex, primitive and mesh collision shapes
//! - Physics materials (friction, restitution, density)
//! - Script-driven stepping (`SimulationMode::Script`)
//! - Deferred transform synchronization
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 PhysicsWorld                    │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────┐  │
//! │  │ RigidBodySet│  │ ColliderSet │  │ Entity  │  │
//! │  └─────────────┘  └─────────────┘  │  maps   │  │
//! │                                    └─────────┘  │
//! │  ┌─────────────────────────────────────────────┐│
//! │  │  SimulationMode + auto_sync_transforms      ││
//! │  └─────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use placement_physics::prelude::*;
//!
//! let mut physics = PhysicsWorld::new(PhysicsConfig::default());
//! let body = physics.create_rigid_body_for_entity(
//!     7,
//!     RigidBodyDesc::dynamic().with_position(0.0, 10.0, 0.0),
//! );
//! physics.create_collider_for_entity(7, ColliderDesc::new(ColliderShape::cuboid(0.5, 0.5, 0.5)), Some(body));
//!
//! physics.set_simulation_mode(SimulationMode::Script);
//! physics.simulate(physics.config().timestep);
//! ```

pub mod body;
pub mod collider;
pub mod config;
pub mod error;
pub mod material;
pub mod mode;
pub mod world;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{RigidBodyDesc, RigidBodyHandle, RigidBodyType};
    pub use crate::collider::{ColliderDesc, ColliderHandle, ColliderShape};
    pub use crate::config::PhysicsConfig;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::material::PhysicsMaterial;
    pub use crate::mode::SimulationMode;
    pub use crate::world::PhysicsWorld;
}

pub use prelude::*;
