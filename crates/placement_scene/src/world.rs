//! Bridge between the editor scene and the Rapier world
//!
//! Every object with an authored body or collider owns matching Rapier
//! objects tagged with its [`ObjectHandle::entity_key`]. Scene transforms
//! follow body poses whenever transform sync is on; while it is off the
//! mirror is deferred until sync is re-enabled.

use crate::object::SceneObject;
use crate::scene::Scene;
use crate::selection::SelectionManager;
use placement_physics::{
    ColliderDesc, ColliderHandle, PhysicsConfig, PhysicsMaterial, PhysicsWorld, RigidBodyDesc, RigidBodyHandle,
    SimulationMode,
};
use placement_session::{ObjectHandle, PhysicsAdapter, Pose, SceneAdapter, StepMode};
use std::collections::HashMap;

/// Physics synthesized for a non-physics object during a run.
#[derive(Debug, Clone, Copy)]
struct EphemeralPhysics {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    /// The object's own collider, disabled while the ephemeral one exists
    suspended: Option<ColliderHandle>,
}

/// Editor scene, selection and physics world behind the session adapters.
pub struct EditorWorld {
    scene: Scene,
    selection: SelectionManager,
    physics: PhysicsWorld,
    ephemeral: HashMap<ObjectHandle, EphemeralPhysics>,
}

impl EditorWorld {
    /// Build physics for every object of `scene`
    pub fn new(scene: Scene, config: PhysicsConfig) -> Self {
        let mut world = Self {
            scene,
            selection: SelectionManager::new(),
            physics: PhysicsWorld::new(config),
            ephemeral: HashMap::new(),
        };
        let handles = world.scene.handles();
        for handle in handles {
            world.build_physics(handle);
        }
        log::info!(
            "Editor world ready: {} objects, {} bodies, {} colliders",
            world.scene.len(),
            world.physics.body_count(),
            world.physics.collider_count()
        );
        world
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionManager {
        &mut self.selection
    }

    /// Add an object and its authored physics
    pub fn spawn(&mut self, object: SceneObject) -> ObjectHandle {
        let handle = self.scene.spawn(object);
        self.build_physics(handle);
        handle
    }

    /// Delete an object with everything attached to it
    pub fn despawn(&mut self, handle: ObjectHandle) -> Option<SceneObject> {
        let object = self.scene.despawn(handle)?;
        self.ephemeral.remove(&handle);
        self.physics.remove_entity(handle.entity_key());
        self.selection.deselect(handle);
        log::debug!("Despawned '{}' ({})", object.name, handle);
        Some(object)
    }

    /// Rapier body currently driving the object, native or synthesized
    pub fn body_of(&self, handle: ObjectHandle) -> Option<RigidBodyHandle> {
        self.physics.get_body_for_entity(handle.entity_key())
    }

    /// Every collider tagged with the object
    pub fn colliders_of(&self, handle: ObjectHandle) -> &[ColliderHandle] {
        self.physics.get_colliders_for_entity(handle.entity_key())
    }

    pub fn linear_velocity(&self, handle: ObjectHandle) -> Option<[f32; 3]> {
        let body = self.body_of(handle)?;
        self.physics.get_body_linear_velocity(body).ok()
    }

    /// Host frame: advance physics by wall time in automatic mode
    pub fn update(&mut self, delta_time: f32) {
        let before = self.physics.tick_count();
        self.physics.step(delta_time);
        if self.physics.tick_count() != before && self.physics.auto_sync_transforms() {
            self.mirror_bodies();
        }
    }

    fn build_physics(&mut self, handle: ObjectHandle) {
        let Some(object) = self.scene.get(handle) else {
            return;
        };
        let key = handle.entity_key();
        let pose = object.pose;

        let body = object.body.map(|body_type| {
            let desc = RigidBodyDesc {
                body_type,
                ..Default::default()
            }
            .with_position(pose.position[0], pose.position[1], pose.position[2])
            .with_rotation(pose.rotation);
            self.physics.create_rigid_body_for_entity(key, desc)
        });

        if !object.collider {
            return;
        }
        let mut desc = ColliderDesc::new(object.collider_shape());
        if body.is_none() {
            let [x, y, z] = pose.position;
            desc = desc.with_offset(x, y, z).with_rotation(pose.rotation);
        }
        if let Err(err) = self.physics.create_collider_for_entity(key, desc, body) {
            log::warn!("No collider for '{}': {}", object.name, err);
        }
    }

    /// Copy body poses into scene transforms
    fn mirror_bodies(&mut self) {
        for handle in self.scene.handles() {
            let Some(body) = self.body_of(handle) else {
                continue;
            };
            if let (Ok((position, rotation)), Some(object)) =
                (self.physics.get_body_pose(body), self.scene.get_mut(handle))
            {
                object.pose = Pose::new(position, rotation);
            }
        }
    }

    /// Collider that belongs to the object itself rather than to a run
    fn authored_collider(&self, handle: ObjectHandle) -> Option<ColliderHandle> {
        let ephemeral = self.ephemeral.get(&handle).map(|e| e.collider);
        self.colliders_of(handle)
            .iter()
            .copied()
            .find(|c| Some(*c) != ephemeral && self.physics.collider_parent(*c).is_none())
    }
}

impl SceneAdapter for EditorWorld {
    fn current_selection(&self) -> Vec<ObjectHandle> {
        self.selection
            .selected()
            .iter()
            .copied()
            .filter(|h| self.scene.contains(*h))
            .collect()
    }

    fn all_objects(&self) -> Vec<ObjectHandle> {
        self.scene.handles()
    }

    fn has_physics_body(&self, handle: ObjectHandle) -> bool {
        self.scene.contains(handle) && self.body_of(handle).is_some()
    }

    fn transform_of(&self, handle: ObjectHandle) -> Option<Pose> {
        let object = self.scene.get(handle)?;
        let live = self
            .body_of(handle)
            .and_then(|body| self.physics.get_body_pose(body).ok())
            .map(|(position, rotation)| Pose::new(position, rotation));
        Some(live.unwrap_or(object.pose))
    }

    fn set_transform(&mut self, handle: ObjectHandle, pose: Pose) {
        let Some(object) = self.scene.get_mut(handle) else {
            return;
        };
        object.pose = pose;
        if let Some(body) = self.body_of(handle) {
            // A pose write marks the body modified even when nothing moved.
            if self.physics.get_body_pose(body).ok() == Some((pose.position, pose.rotation)) {
                return;
            }
            if let Err(err) = self.physics.set_body_pose(body, pose.position, pose.rotation, false) {
                log::warn!("Could not move body of {}: {}", handle, err);
            }
        } else if let Some(collider) = self.authored_collider(handle) {
            if let Err(err) = self.physics.set_collider_pose(collider, pose.position, pose.rotation) {
                log::warn!("Could not move collider of {}: {}", handle, err);
            }
        }
    }

    fn is_live(&self, handle: ObjectHandle) -> bool {
        self.scene.contains(handle)
    }
}

impl PhysicsAdapter for EditorWorld {
    fn step_mode(&self) -> StepMode {
        match self.physics.simulation_mode() {
            SimulationMode::Automatic => StepMode::Automatic,
            SimulationMode::Script => StepMode::Manual,
        }
    }

    fn set_step_mode(&mut self, mode: StepMode) {
        self.physics.set_simulation_mode(match mode {
            StepMode::Automatic => SimulationMode::Automatic,
            StepMode::Manual => SimulationMode::Script,
        });
    }

    fn auto_sync(&self) -> bool {
        self.physics.auto_sync_transforms()
    }

    fn set_auto_sync(&mut self, enabled: bool) {
        let flush = enabled && self.physics.has_pending_sync();
        self.physics.set_auto_sync_transforms(enabled);
        if flush {
            self.mirror_bodies();
        }
    }

    fn fixed_timestep(&self) -> f32 {
        self.physics.config().timestep
    }

    fn step(&mut self, dt: f32) {
        self.physics.simulate(dt);
        if self.physics.auto_sync_transforms() {
            self.mirror_bodies();
        }
    }

    fn is_at_rest(&self, handle: ObjectHandle) -> bool {
        let Some(body) = self.body_of(handle) else {
            return true;
        };
        match self.physics.is_body_dynamic(body) {
            Ok(true) => self.physics.is_body_sleeping(body).unwrap_or(true),
            _ => true,
        }
    }

    fn apply_impulse(&mut self, handle: ObjectHandle, impulse: [f32; 3]) {
        if let Some(body) = self.body_of(handle) {
            if let Err(err) = self.physics.apply_impulse(body, impulse) {
                log::warn!("Impulse on {} failed: {}", handle, err);
            }
        }
    }

    fn zero_velocity(&mut self, handle: ObjectHandle) {
        if let Some(body) = self.body_of(handle) {
            if let Err(err) = self.physics.zero_body_velocity(body) {
                log::warn!("Could not stop {}: {}", handle, err);
            }
        }
    }

    fn attach_collider_and_body(&mut self, handle: ObjectHandle) -> bool {
        if self.ephemeral.contains_key(&handle) || self.body_of(handle).is_some() {
            return false;
        }
        let Some(object) = self.scene.get(handle) else {
            return false;
        };
        let key = handle.entity_key();
        let pose = object.pose;
        let collider_desc = ColliderDesc::new(object.convex_shape()).with_material(PhysicsMaterial::placement());

        let suspended = self.authored_collider(handle);
        let body_desc = RigidBodyDesc::dynamic()
            .with_position(pose.position[0], pose.position[1], pose.position[2])
            .with_rotation(pose.rotation)
            .with_ccd(true);
        let body = self.physics.create_rigid_body_for_entity(key, body_desc);

        let collider = match self.physics.create_collider_for_entity(key, collider_desc, Some(body)) {
            Ok(collider) => collider,
            Err(err) => {
                log::warn!("Could not build a convex collider for {}: {}", handle, err);
                self.physics.remove_rigid_body(body);
                return false;
            }
        };

        if let Some(own) = suspended {
            if let Err(err) = self.physics.set_collider_enabled(own, false) {
                log::warn!("Could not suspend collider of {}: {}", handle, err);
            }
        }

        self.ephemeral.insert(
            handle,
            EphemeralPhysics {
                body,
                collider,
                suspended,
            },
        );
        true
    }

    fn detach_collider_and_body(&mut self, handle: ObjectHandle) {
        let Some(ephemeral) = self.ephemeral.remove(&handle) else {
            return;
        };

        let settled = self
            .physics
            .get_body_pose(ephemeral.body)
            .ok()
            .map(|(position, rotation)| Pose::new(position, rotation));
        if let (Some(pose), Some(object)) = (settled, self.scene.get_mut(handle)) {
            object.pose = pose;
        }

        // Removing the body also removes the collider attached to it.
        self.physics.remove_rigid_body(ephemeral.body);

        if let Some(own) = ephemeral.suspended.filter(|c| self.physics.contains_collider(*c)) {
            if let Some(pose) = settled {
                let _ = self.physics.set_collider_pose(own, pose.position, pose.rotation);
            }
            let _ = self.physics.set_collider_enabled(own, true);
        }
    }
}

impl std::fmt::Debug for EditorWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorWorld")
            .field("scene", &self.scene.name)
            .field("objects", &self.scene.len())
            .field("selected", &self.selection.count())
            .field("bodies", &self.physics.body_count())
            .field("ephemeral", &self.ephemeral.len())
            .finish()
    }
}
