//! Scene serialization to/from TOML format.
//!
//! ```toml
//! [scene]
//! name = "Shelf"
//!
//! [[objects]]
//! name = "Ground"
//! mesh = "cube"
//! body = "static"
//! transform = { position = [0.0, -0.5, 0.0], scale = [20.0, 1.0, 20.0] }
//!
//! [[objects]]
//! name = "Crate"
//! mesh = "cube"
//! collider = true
//! transform = { position = [2.0, 1.5, 0.0], scale = 1.0 }
//! ```

use crate::object::{MeshShape, SceneObject};
use crate::scene::Scene;
use placement_physics::RigidBodyType;
use placement_session::Pose;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Scene file data structure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneData {
    pub scene: SceneMetadata,
    #[serde(default)]
    pub objects: Vec<ObjectData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Object data for serialization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectData {
    pub name: String,
    #[serde(default = "default_mesh")]
    pub mesh: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RigidBodyType>,
    #[serde(default)]
    pub collider: bool,
    #[serde(default)]
    pub transform: TransformData,
}

fn default_mesh() -> String {
    MeshShape::Cube.name().to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransformData {
    #[serde(default)]
    pub position: [f32; 3],
    /// Quaternion (x, y, z, w)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(default = "default_scale")]
    pub scale: ScaleData,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: None,
            scale: default_scale(),
        }
    }
}

fn default_scale() -> ScaleData {
    ScaleData::Uniform(1.0)
}

/// Scale can be uniform or per-axis.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleData {
    Uniform(f32),
    PerAxis([f32; 3]),
}

impl ScaleData {
    pub fn to_array(&self) -> [f32; 3] {
        match self {
            ScaleData::Uniform(s) => [*s, *s, *s],
            ScaleData::PerAxis(arr) => *arr,
        }
    }

    fn from_array(scale: [f32; 3]) -> Self {
        if scale[0] == scale[1] && scale[1] == scale[2] {
            ScaleData::Uniform(scale[0])
        } else {
            ScaleData::PerAxis(scale)
        }
    }
}

/// Scene serialization errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown mesh '{mesh}' on object '{object}'")]
    UnknownShape { object: String, mesh: String },
}

/// Scene serializer for save/load operations.
pub struct SceneSerializer;

impl SceneSerializer {
    /// Load a TOML scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Scene, SceneError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::from_toml_str(&content)?;
        log::info!("Loaded scene '{}' ({} objects) from {}", scene.name, scene.len(), path.display());
        Ok(scene)
    }

    /// Save a scene to a TOML file.
    pub fn save(scene: &Scene, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let path = path.as_ref();
        let content = Self::to_toml_string(scene)?;
        std::fs::write(path, content).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Scene, SceneError> {
        let data: SceneData = toml::from_str(content)?;
        Self::scene_from_data(&data)
    }

    pub fn to_toml_string(scene: &Scene) -> Result<String, SceneError> {
        Ok(toml::to_string_pretty(&Self::scene_to_data(scene))?)
    }

    /// Convert a scene to its file representation.
    pub fn scene_to_data(scene: &Scene) -> SceneData {
        let objects = scene
            .iter()
            .map(|(_, object)| ObjectData {
                name: object.name.clone(),
                mesh: object.shape.name().to_string(),
                body: object.body,
                collider: object.collider,
                transform: TransformData {
                    position: object.pose.position,
                    rotation: Some(object.pose.rotation),
                    scale: ScaleData::from_array(object.scale),
                },
            })
            .collect();

        SceneData {
            scene: SceneMetadata {
                name: scene.name.clone(),
                description: String::new(),
                version: default_version(),
            },
            objects,
        }
    }

    /// Build a scene from its file representation.
    pub fn scene_from_data(data: &SceneData) -> Result<Scene, SceneError> {
        let mut scene = Scene::new(data.scene.name.clone());
        for object in &data.objects {
            let shape: MeshShape = object.mesh.parse().map_err(|mesh| SceneError::UnknownShape {
                object: object.name.clone(),
                mesh,
            })?;
            let pose = Pose::new(
                object.transform.position,
                object.transform.rotation.unwrap_or(Pose::IDENTITY.rotation),
            );
            scene.spawn(SceneObject {
                name: object.name.clone(),
                pose,
                scale: object.transform.scale.to_array(),
                shape,
                body: object.body,
                collider: object.collider || object.body.is_some(),
            });
        }
        Ok(scene)
    }
}
