//! Physics world - main simulation container

use crate::body::{from_isometry, to_isometry, RigidBodyDesc, RigidBodyHandle};
use crate::collider::{ColliderDesc, ColliderHandle};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use crate::mode::SimulationMode;
use rapier3d::prelude as rapier;
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// The main physics world containing all simulation state
pub struct PhysicsWorld {
    /// Configuration
    config: PhysicsConfig,

    /// Rapier physics pipeline
    pipeline: rapier::PhysicsPipeline,

    /// Gravity
    gravity: rapier::Vector<f32>,

    /// Integration parameters
    integration_params: rapier::IntegrationParameters,

    /// Island manager
    islands: rapier::IslandManager,

    /// Broad phase
    broad_phase: rapier::DefaultBroadPhase,

    /// Narrow phase
    narrow_phase: rapier::NarrowPhase,

    /// Impulse joint set
    impulse_joints: rapier::ImpulseJointSet,

    /// Multibody joint set
    multibody_joints: rapier::MultibodyJointSet,

    /// CCD solver
    ccd_solver: rapier::CCDSolver,

    /// Query pipeline
    query_pipeline: rapier::QueryPipeline,

    /// Rigid body set
    bodies: rapier::RigidBodySet,

    /// Collider set
    colliders: rapier::ColliderSet,

    /// Mapping from entity user_data to body handles
    entity_to_body: HashMap<u128, RigidBodyHandle>,

    /// Mapping from entity user_data to collider handles
    entity_to_collider: HashMap<u128, Vec<ColliderHandle>>,

    /// Accumulated time for fixed timestep
    accumulated_time: f32,

    /// Who is allowed to advance the world
    simulation_mode: SimulationMode,

    /// Refresh derived state after every tick
    auto_sync_transforms: bool,

    /// A tick ran while auto sync was off
    sync_pending: bool,

    /// Ticks run since creation
    ticks: u64,
}

impl PhysicsWorld {
    /// Create a new physics world
    pub fn new(config: PhysicsConfig) -> Self {
        let gravity = rapier::Vector::new(config.gravity[0], config.gravity[1], config.gravity[2]);

        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.dt = config.timestep;
        integration_params.num_solver_iterations =
            NonZeroUsize::new(config.velocity_iterations).unwrap_or(NonZeroUsize::MIN);

        Self {
            config,
            pipeline: rapier::PhysicsPipeline::new(),
            gravity,
            integration_params,
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            entity_to_body: HashMap::new(),
            entity_to_collider: HashMap::new(),
            accumulated_time: 0.0,
            simulation_mode: SimulationMode::Automatic,
            auto_sync_transforms: true,
            sync_pending: false,
            ticks: 0,
        }
    }

    /// Create a world after validating the configuration
    pub fn try_new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Set gravity
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) {
        self.gravity = rapier::Vector::new(x, y, z);
    }

    /// Get gravity
    pub fn gravity(&self) -> [f32; 3] {
        [self.gravity.x, self.gravity.y, self.gravity.z]
    }

    // ==================== Rigid Bodies ====================

    /// Create a rigid body
    pub fn create_rigid_body(&mut self, desc: RigidBodyDesc) -> RigidBodyHandle {
        let mut builder = desc.to_rapier_builder();
        if !self.config.sleeping_enabled {
            builder = builder.can_sleep(false);
        }
        let handle = self.bodies.insert(builder);

        if let Some(body) = self.bodies.get_mut(handle) {
            let activation = body.activation_mut();
            activation.normalized_linear_threshold = self.config.sleep_linear_threshold;
            activation.angular_threshold = self.config.sleep_angular_threshold;
            activation.time_until_sleep = self.config.time_until_sleep;
        }

        RigidBodyHandle(handle)
    }

    /// Create a rigid body associated with an entity
    pub fn create_rigid_body_for_entity(&mut self, entity_id: u128, desc: RigidBodyDesc) -> RigidBodyHandle {
        let handle = self.create_rigid_body(desc);
        self.entity_to_body.insert(entity_id, handle);
        handle
    }

    /// Remove a rigid body together with the colliders attached to it
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle.0,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true, // Remove attached colliders
        );

        // Clean up entity mappings
        self.entity_to_body.retain(|_, h| *h != handle);
        let colliders = &self.colliders;
        self.entity_to_collider.retain(|_, handles| {
            handles.retain(|h| colliders.contains(h.0));
            !handles.is_empty()
        });
    }

    /// Whether the handle still refers to a body
    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    /// Get rigid body position
    pub fn get_body_position(&self, handle: RigidBodyHandle) -> Result<[f32; 3]> {
        self.get_body_pose(handle).map(|(position, _)| position)
    }

    /// Get rigid body rotation (quaternion x, y, z, w)
    pub fn get_body_rotation(&self, handle: RigidBodyHandle) -> Result<[f32; 4]> {
        self.get_body_pose(handle).map(|(_, rotation)| rotation)
    }

    /// Get rigid body position and rotation
    pub fn get_body_pose(&self, handle: RigidBodyHandle) -> Result<([f32; 3], [f32; 4])> {
        self.bodies
            .get(handle.0)
            .map(|b| from_isometry(b.position()))
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Teleport a rigid body, outside of the integration step
    pub fn set_body_pose(
        &mut self,
        handle: RigidBodyHandle,
        position: [f32; 3],
        rotation: [f32; 4],
        wake_up: bool,
    ) -> Result<()> {
        let iso = to_isometry(position, rotation);
        self.bodies
            .get_mut(handle.0)
            .map(|b| {
                if b.body_type() == rapier::RigidBodyType::KinematicPositionBased {
                    b.set_next_kinematic_position(iso);
                }
                b.set_position(iso, wake_up);
            })
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Get rigid body linear velocity
    pub fn get_body_linear_velocity(&self, handle: RigidBodyHandle) -> Result<[f32; 3]> {
        self.bodies
            .get(handle.0)
            .map(|b| {
                let vel = b.linvel();
                [vel.x, vel.y, vel.z]
            })
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Get rigid body angular velocity
    pub fn get_body_angular_velocity(&self, handle: RigidBodyHandle) -> Result<[f32; 3]> {
        self.bodies
            .get(handle.0)
            .map(|b| {
                let vel = b.angvel();
                [vel.x, vel.y, vel.z]
            })
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Set rigid body linear velocity
    pub fn set_body_linear_velocity(&mut self, handle: RigidBodyHandle, x: f32, y: f32, z: f32) -> Result<()> {
        self.bodies
            .get_mut(handle.0)
            .map(|b| {
                b.set_linvel(rapier::Vector::new(x, y, z), true);
            })
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Clear linear and angular velocity without waking the body
    pub fn zero_body_velocity(&mut self, handle: RigidBodyHandle) -> Result<()> {
        self.bodies
            .get_mut(handle.0)
            .map(|b| {
                b.set_linvel(rapier::Vector::zeros(), false);
                b.set_angvel(rapier::Vector::zeros(), false);
            })
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Apply an impulse to a rigid body
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: [f32; 3]) -> Result<()> {
        self.bodies
            .get_mut(handle.0)
            .map(|b| {
                b.apply_impulse(rapier::Vector::new(impulse[0], impulse[1], impulse[2]), true);
            })
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Whether Rapier has put the body to sleep
    pub fn is_body_sleeping(&self, handle: RigidBodyHandle) -> Result<bool> {
        self.bodies
            .get(handle.0)
            .map(|b| b.is_sleeping())
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Whether the body is moved by the solver
    pub fn is_body_dynamic(&self, handle: RigidBodyHandle) -> Result<bool> {
        self.bodies
            .get(handle.0)
            .map(|b| b.is_dynamic())
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    // ==================== Colliders ====================

    /// Create a collider, attached to a rigid body when `parent` is set
    pub fn create_collider(&mut self, desc: ColliderDesc, parent: Option<RigidBodyHandle>) -> Result<ColliderHandle> {
        let builder = desc.to_rapier_builder()?;
        let handle = match parent {
            Some(body) => {
                if !self.bodies.contains(body.0) {
                    return Err(PhysicsError::BodyNotFound(body));
                }
                self.colliders.insert_with_parent(builder, body.0, &mut self.bodies)
            }
            None => self.colliders.insert(builder),
        };
        Ok(ColliderHandle(handle))
    }

    /// Create a collider for an entity
    pub fn create_collider_for_entity(
        &mut self,
        entity_id: u128,
        mut desc: ColliderDesc,
        parent: Option<RigidBodyHandle>,
    ) -> Result<ColliderHandle> {
        desc.user_data = entity_id;
        let handle = self.create_collider(desc, parent)?;

        self.entity_to_collider
            .entry(entity_id)
            .or_default()
            .push(handle);

        Ok(handle)
    }

    /// Remove a collider
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.colliders.remove(handle.0, &mut self.islands, &mut self.bodies, true);

        // Clean up entity mapping
        self.entity_to_collider.retain(|_, colliders| {
            colliders.retain(|h| *h != handle);
            !colliders.is_empty()
        });
    }

    /// Whether the handle still refers to a collider
    pub fn contains_collider(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains(handle.0)
    }

    /// Enable or disable a collider without removing it
    pub fn set_collider_enabled(&mut self, handle: ColliderHandle, enabled: bool) -> Result<()> {
        self.colliders
            .get_mut(handle.0)
            .map(|c| c.set_enabled(enabled))
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// Whether a collider takes part in collision detection
    pub fn is_collider_enabled(&self, handle: ColliderHandle) -> Result<bool> {
        self.colliders
            .get(handle.0)
            .map(|c| c.is_enabled())
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// Move a parentless collider
    pub fn set_collider_pose(&mut self, handle: ColliderHandle, position: [f32; 3], rotation: [f32; 4]) -> Result<()> {
        self.colliders
            .get_mut(handle.0)
            .map(|c| c.set_position(to_isometry(position, rotation)))
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// World pose of a collider
    pub fn get_collider_pose(&self, handle: ColliderHandle) -> Result<([f32; 3], [f32; 4])> {
        self.colliders
            .get(handle.0)
            .map(|c| from_isometry(c.position()))
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// Body a collider is attached to, if any
    pub fn collider_parent(&self, handle: ColliderHandle) -> Option<RigidBodyHandle> {
        self.colliders
            .get(handle.0)
            .and_then(|c| c.parent())
            .map(RigidBodyHandle)
    }

    // ==================== Entity Helpers ====================

    /// Get the rigid body handle for an entity
    pub fn get_body_for_entity(&self, entity_id: u128) -> Option<RigidBodyHandle> {
        self.entity_to_body.get(&entity_id).copied()
    }

    /// Get collider handles for an entity
    pub fn get_colliders_for_entity(&self, entity_id: u128) -> &[ColliderHandle] {
        self.entity_to_collider
            .get(&entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Body of an entity, or an error naming the entity
    pub fn require_body_for_entity(&self, entity_id: u128) -> Result<RigidBodyHandle> {
        self.get_body_for_entity(entity_id)
            .ok_or(PhysicsError::EntityNotInPhysics(entity_id))
    }

    /// Remove all physics objects for an entity
    pub fn remove_entity(&mut self, entity_id: u128) {
        // Remove colliders first
        if let Some(colliders) = self.entity_to_collider.remove(&entity_id) {
            for handle in colliders {
                self.colliders.remove(handle.0, &mut self.islands, &mut self.bodies, true);
            }
        }

        // Remove body
        if let Some(handle) = self.entity_to_body.remove(&entity_id) {
            self.bodies.remove(
                handle.0,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
    }

    // ==================== Stepping Mode ====================

    /// Current stepping mode
    pub fn simulation_mode(&self) -> SimulationMode {
        self.simulation_mode
    }

    /// Switch between frame-driven and script-driven stepping
    pub fn set_simulation_mode(&mut self, mode: SimulationMode) {
        if mode != self.simulation_mode {
            log::debug!("Physics simulation mode: {} -> {}", self.simulation_mode, mode);
            self.simulation_mode = mode;
            self.accumulated_time = 0.0;
        }
    }

    /// Whether derived state is refreshed after every tick
    pub fn auto_sync_transforms(&self) -> bool {
        self.auto_sync_transforms
    }

    /// Toggle per-tick synchronization; re-enabling flushes a deferred sync
    pub fn set_auto_sync_transforms(&mut self, enabled: bool) {
        self.auto_sync_transforms = enabled;
        if enabled && self.sync_pending {
            self.sync_transforms();
        }
    }

    /// Whether a tick ran since the last synchronization
    pub fn has_pending_sync(&self) -> bool {
        self.sync_pending
    }

    /// Bring the query pipeline in line with the current collider poses
    pub fn sync_transforms(&mut self) {
        self.query_pipeline.update(&self.colliders);
        self.sync_pending = false;
    }

    // ==================== Simulation ====================

    /// Frame-driven stepping with a fixed timestep accumulator.
    ///
    /// Does nothing while the world is in [`SimulationMode::Script`].
    pub fn step(&mut self, delta_time: f32) {
        if !self.simulation_mode.is_automatic() {
            return;
        }

        self.accumulated_time += delta_time;

        let mut steps = 0;
        while self.accumulated_time >= self.config.timestep && steps < self.config.max_substeps {
            self.step_internal();
            self.accumulated_time -= self.config.timestep;
            steps += 1;
        }

        if steps > 0 {
            self.after_tick();
        }
    }

    /// Advance the world by exactly one tick of `dt` seconds, regardless of mode
    pub fn simulate(&mut self, dt: f32) {
        let configured = self.integration_params.dt;
        self.integration_params.dt = dt;
        self.step_internal();
        self.integration_params.dt = configured;
        self.after_tick();
    }

    fn after_tick(&mut self) {
        if self.auto_sync_transforms {
            self.sync_transforms();
        } else {
            self.sync_pending = true;
        }
    }

    /// Internal fixed timestep
    fn step_internal(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.ticks += 1;
    }

    // ==================== Debug ====================

    /// Ticks run since the world was created
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Get number of rigid bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Get number of colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Get number of active (awake) bodies
    pub fn active_body_count(&self) -> usize {
        self.islands.active_dynamic_bodies().len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::ColliderShape;
    use approx::assert_relative_eq;

    fn world_with_ground() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        world
            .create_collider(
                ColliderDesc::new(ColliderShape::cuboid(20.0, 0.5, 20.0)).with_offset(0.0, -0.5, 0.0),
                None,
            )
            .unwrap();
        world
    }

    #[test]
    fn test_create_world() {
        let world = PhysicsWorld::new(PhysicsConfig::default());
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 0);
        assert_eq!(world.simulation_mode(), SimulationMode::Automatic);
        assert!(world.auto_sync_transforms());
    }

    #[test]
    fn test_create_body_and_collider() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());

        let body = world.create_rigid_body(RigidBodyDesc::dynamic().with_position(0.0, 10.0, 0.0));
        let collider = world
            .create_collider(ColliderDesc::new(ColliderShape::sphere(1.0)), Some(body))
            .unwrap();

        assert_eq!(world.body_count(), 1);
        assert_eq!(world.collider_count(), 1);
        assert_eq!(world.collider_parent(collider), Some(body));
    }

    #[test]
    fn test_gravity_fall() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());

        let body = world.create_rigid_body(RigidBodyDesc::dynamic().with_position(0.0, 10.0, 0.0));
        world
            .create_collider(ColliderDesc::new(ColliderShape::sphere(1.0)), Some(body))
            .unwrap();

        let initial_y = world.get_body_position(body).unwrap()[1];

        for _ in 0..60 {
            world.simulate(1.0 / 60.0);
        }

        let final_y = world.get_body_position(body).unwrap()[1];
        assert!(final_y < initial_y, "Body should fall due to gravity");
        assert_eq!(world.tick_count(), 60);
    }

    #[test]
    fn test_script_mode_blocks_frame_stepping() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let body = world.create_rigid_body(RigidBodyDesc::dynamic().with_position(0.0, 10.0, 0.0));
        world
            .create_collider(ColliderDesc::new(ColliderShape::sphere(0.5)), Some(body))
            .unwrap();

        world.set_simulation_mode(SimulationMode::Script);
        world.step(1.0);
        assert_eq!(world.tick_count(), 0);
        assert_relative_eq!(world.get_body_position(body).unwrap()[1], 10.0);

        world.simulate(world.config().timestep);
        assert_eq!(world.tick_count(), 1);
        assert!(world.get_body_position(body).unwrap()[1] < 10.0);
    }

    #[test]
    fn test_deferred_sync_flushes_on_enable() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        world.set_auto_sync_transforms(false);
        world.simulate(0.02);
        assert!(world.has_pending_sync());

        world.set_auto_sync_transforms(true);
        assert!(!world.has_pending_sync());
    }

    #[test]
    fn test_resting_body_falls_asleep() {
        let mut world = world_with_ground();
        let body = world.create_rigid_body(RigidBodyDesc::dynamic().with_position(0.0, 0.5, 0.0));
        world
            .create_collider(ColliderDesc::new(ColliderShape::cuboid(0.5, 0.5, 0.5)), Some(body))
            .unwrap();

        let mut slept = false;
        for _ in 0..500 {
            world.simulate(world.config().timestep);
            if world.is_body_sleeping(body).unwrap() {
                slept = true;
                break;
            }
        }
        assert!(slept, "A box resting on the ground should fall asleep");
    }

    #[test]
    fn test_set_pose_and_zero_velocity() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let body = world.create_rigid_body(RigidBodyDesc {
            linear_velocity: [1.0, 2.0, 3.0],
            ..RigidBodyDesc::dynamic()
        });

        world
            .set_body_pose(body, [4.0, 5.0, 6.0], [0.0, 0.0, 0.0, 1.0], false)
            .unwrap();
        world.zero_body_velocity(body).unwrap();

        assert_eq!(world.get_body_position(body).unwrap(), [4.0, 5.0, 6.0]);
        assert_eq!(world.get_body_linear_velocity(body).unwrap(), [0.0, 0.0, 0.0]);
        assert_eq!(world.get_body_angular_velocity(body).unwrap(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_remove_body_cleans_entity_maps() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let body = world.create_rigid_body_for_entity(42, RigidBodyDesc::dynamic());
        world
            .create_collider_for_entity(42, ColliderDesc::new(ColliderShape::sphere(0.5)), Some(body))
            .unwrap();

        world.remove_rigid_body(body);

        assert!(world.get_body_for_entity(42).is_none());
        assert!(world.get_colliders_for_entity(42).is_empty());
        assert_eq!(world.collider_count(), 0);
        assert!(matches!(
            world.require_body_for_entity(42),
            Err(PhysicsError::EntityNotInPhysics(42))
        ));
    }

    #[test]
    fn test_collider_on_missing_parent_is_rejected() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default());
        let body = world.create_rigid_body(RigidBodyDesc::dynamic());
        world.remove_rigid_body(body);

        let result = world.create_collider(ColliderDesc::new(ColliderShape::sphere(0.5)), Some(body));
        assert!(matches!(result, Err(PhysicsError::BodyNotFound(_))));
    }
}
