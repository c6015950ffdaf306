//! Placement Scene - the editor side of a placement session
//!
//! Provides:
//! - A flat scene of named objects addressed by generational handles
//! - Multi-select with Replace/Add/Remove/Toggle modes
//! - TOML scene files
//! - [`EditorWorld`], which exposes the scene and a Rapier world through
//!   the session's adapter traits

pub mod object;
pub mod scene;
pub mod selection;
pub mod serializer;
pub mod world;

pub use object::{MeshShape, SceneObject};
pub use scene::Scene;
pub use selection::{SelectionManager, SelectionMode};
pub use serializer::{SceneData, SceneError, SceneSerializer};
pub use world::EditorWorld;
