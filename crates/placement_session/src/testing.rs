//! In-memory host world for unit tests

use crate::adapter::{PhysicsAdapter, PhysicsMode, SceneAdapter, StepMode};
use crate::handle::ObjectHandle;
use crate::snapshot::Pose;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct FakeObject {
    handle: ObjectHandle,
    pose: Pose,
    spawn_pose: Pose,
    velocity: [f32; 3],
    native_body: bool,
    ephemeral_body: bool,
    rest_after: Option<u64>,
    max_drift: f32,
}

impl FakeObject {
    fn has_body(&self) -> bool {
        self.native_body || self.ephemeral_body
    }
}

/// A scene whose "physics" moves every awake body down by a fixed amount
/// per step. Bodies fall asleep after a configurable number of steps.
#[derive(Debug)]
pub struct FakeWorld {
    slots: Vec<Option<FakeObject>>,
    selection: Vec<ObjectHandle>,
    step_mode: StepMode,
    auto_sync: bool,
    steps: u64,
    modes_seen: Vec<PhysicsMode>,
    impulses: Vec<(ObjectHandle, [f32; 3])>,
    attach_calls: usize,
    detach_calls: usize,
    failing: HashSet<ObjectHandle>,
}

impl FakeWorld {
    pub const DRIFT_PER_STEP: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            selection: Vec::new(),
            step_mode: StepMode::Automatic,
            auto_sync: true,
            steps: 0,
            modes_seen: Vec::new(),
            impulses: Vec::new(),
            attach_calls: 0,
            detach_calls: 0,
            failing: HashSet::new(),
        }
    }

    fn spawn(&mut self, pose: Pose, native_body: bool) -> ObjectHandle {
        let index = self.slots.len() as u32;
        let handle = ObjectHandle::new(index, 0);
        self.slots.push(Some(FakeObject {
            handle,
            pose,
            spawn_pose: pose,
            velocity: [0.0; 3],
            native_body,
            ephemeral_body: false,
            rest_after: None,
            max_drift: 0.0,
        }));
        handle
    }

    /// Object with a rigid body
    pub fn spawn_body(&mut self, pose: Pose) -> ObjectHandle {
        self.spawn(pose, true)
    }

    /// Object without physics
    pub fn spawn_prop(&mut self, pose: Pose) -> ObjectHandle {
        self.spawn(pose, false)
    }

    pub fn destroy(&mut self, handle: ObjectHandle) {
        if self.get(handle).is_some() {
            self.slots[handle.index() as usize] = None;
        }
    }

    pub fn select(&mut self, handles: &[ObjectHandle]) {
        self.selection = handles.to_vec();
    }

    /// The body reports rest once the world has run `steps` steps.
    pub fn rest_after(&mut self, handle: ObjectHandle, steps: u64) {
        if let Some(object) = self.get_mut(handle) {
            object.rest_after = Some(steps);
        }
    }

    /// Make the next attach on `handle` fail
    pub fn fail_attach(&mut self, handle: ObjectHandle) {
        self.failing.insert(handle);
    }

    pub fn set_velocity(&mut self, handle: ObjectHandle, velocity: [f32; 3]) {
        if let Some(object) = self.get_mut(handle) {
            object.velocity = velocity;
        }
    }

    pub fn velocity(&self, handle: ObjectHandle) -> [f32; 3] {
        self.get(handle).map(|o| o.velocity).unwrap_or([0.0; 3])
    }

    /// Largest distance from the spawn position seen right after a step
    pub fn max_drift(&self, handle: ObjectHandle) -> f32 {
        self.get(handle).map(|o| o.max_drift).unwrap_or(0.0)
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn modes_seen_while_stepping(&self) -> &[PhysicsMode] {
        &self.modes_seen
    }

    pub fn impulses(&self) -> &[(ObjectHandle, [f32; 3])] {
        &self.impulses
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls
    }

    pub fn detach_calls(&self) -> usize {
        self.detach_calls
    }

    fn get(&self, handle: ObjectHandle) -> Option<&FakeObject> {
        self.slots
            .get(handle.index() as usize)?
            .as_ref()
            .filter(|o| o.handle == handle)
    }

    fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut FakeObject> {
        self.slots
            .get_mut(handle.index() as usize)?
            .as_mut()
            .filter(|o| o.handle == handle)
    }

    fn object_at_rest(&self, object: &FakeObject) -> bool {
        object.rest_after.is_some_and(|n| self.steps >= n)
    }
}

impl SceneAdapter for FakeWorld {
    fn current_selection(&self) -> Vec<ObjectHandle> {
        self.selection.iter().copied().filter(|h| self.is_live(*h)).collect()
    }

    fn all_objects(&self) -> Vec<ObjectHandle> {
        self.slots.iter().flatten().map(|o| o.handle).collect()
    }

    fn has_physics_body(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some_and(FakeObject::has_body)
    }

    fn transform_of(&self, handle: ObjectHandle) -> Option<Pose> {
        self.get(handle).map(|o| o.pose)
    }

    fn set_transform(&mut self, handle: ObjectHandle, pose: Pose) {
        if let Some(object) = self.get_mut(handle) {
            object.pose = pose;
        }
    }

    fn is_live(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }
}

impl PhysicsAdapter for FakeWorld {
    fn step_mode(&self) -> StepMode {
        self.step_mode
    }

    fn set_step_mode(&mut self, mode: StepMode) {
        self.step_mode = mode;
    }

    fn auto_sync(&self) -> bool {
        self.auto_sync
    }

    fn set_auto_sync(&mut self, enabled: bool) {
        self.auto_sync = enabled;
    }

    fn fixed_timestep(&self) -> f32 {
        0.02
    }

    fn step(&mut self, _dt: f32) {
        self.modes_seen.push(PhysicsMode::capture(&*self));
        let awake: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|o| (i, o)))
            .filter(|(_, o)| o.has_body() && !self.object_at_rest(o))
            .map(|(i, _)| i)
            .collect();
        self.steps += 1;

        for index in awake {
            if let Some(object) = self.slots[index].as_mut() {
                object.pose.position[1] -= Self::DRIFT_PER_STEP;
                object.velocity[1] -= 1.0;
                let drift = (object.pose.position[1] - object.spawn_pose.position[1]).abs();
                object.max_drift = object.max_drift.max(drift);
            }
        }
    }

    fn is_at_rest(&self, handle: ObjectHandle) -> bool {
        match self.get(handle) {
            Some(object) => self.object_at_rest(object),
            None => true,
        }
    }

    fn apply_impulse(&mut self, handle: ObjectHandle, impulse: [f32; 3]) {
        self.impulses.push((handle, impulse));
        if let Some(object) = self.get_mut(handle) {
            for (v, i) in object.velocity.iter_mut().zip(impulse) {
                *v += i;
            }
        }
    }

    fn zero_velocity(&mut self, handle: ObjectHandle) {
        if let Some(object) = self.get_mut(handle) {
            if object.has_body() {
                object.velocity = [0.0; 3];
            }
        }
    }

    fn attach_collider_and_body(&mut self, handle: ObjectHandle) -> bool {
        if self.failing.remove(&handle) {
            return false;
        }
        match self.get_mut(handle) {
            Some(object) if !object.has_body() => {
                object.ephemeral_body = true;
            }
            _ => return false,
        }
        self.attach_calls += 1;
        true
    }

    fn detach_collider_and_body(&mut self, handle: ObjectHandle) {
        self.detach_calls += 1;
        if let Some(object) = self.get_mut(handle) {
            object.ephemeral_body = false;
        }
    }
}
