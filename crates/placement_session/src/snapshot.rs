//! Transform snapshots of participants and bystanders

use crate::adapter::{PhysicsAdapter, SceneAdapter};
use crate::handle::ObjectHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Position and orientation of an object (quaternion x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

impl Pose {
    /// Pose at the origin with no rotation
    pub const IDENTITY: Self = Self {
        position: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };

    pub const fn new(position: [f32; 3], rotation: [f32; 4]) -> Self {
        Self { position, rotation }
    }

    pub const fn at(x: f32, y: f32, z: f32) -> Self {
        Self::new([x, y, z], [0.0, 0.0, 0.0, 1.0])
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An object's transform at the moment it was captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    handle: ObjectHandle,
    pose: Pose,
}

impl Snapshot {
    pub fn new(handle: ObjectHandle, pose: Pose) -> Self {
        Self { handle, pose }
    }

    /// Capture the current transform, `None` if the object is gone.
    pub fn capture<S: SceneAdapter + ?Sized>(world: &S, handle: ObjectHandle) -> Option<Self> {
        if !world.is_live(handle) {
            return None;
        }
        world.transform_of(handle).map(|pose| Self { handle, pose })
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Put the object back where it was, with no residual motion.
    ///
    /// A handle that no longer resolves is skipped.
    pub fn restore<W: SceneAdapter + PhysicsAdapter + ?Sized>(&self, world: &mut W) {
        if !world.is_live(self.handle) {
            return;
        }
        world.zero_velocity(self.handle);
        world.set_transform(self.handle, self.pose);
    }
}

/// Snapshots of every physics body outside the participant set.
///
/// Captured fresh at the start of a run and restored after every tick, so
/// bodies that are not being placed look frozen to everyone else.
#[derive(Debug, Clone, Default)]
pub struct BystanderSet {
    snapshots: Vec<Snapshot>,
}

impl BystanderSet {
    /// Capture every live physics body whose handle is not in `participants`.
    pub fn capture<S: SceneAdapter + ?Sized>(world: &S, participants: &HashSet<ObjectHandle>) -> Self {
        let snapshots = world
            .all_objects()
            .into_iter()
            .filter(|h| !participants.contains(h) && world.has_physics_body(*h))
            .filter_map(|h| Snapshot::capture(world, h))
            .collect();
        Self { snapshots }
    }

    pub fn restore_all<W: SceneAdapter + PhysicsAdapter + ?Sized>(&self, world: &mut W) {
        for snapshot in &self.snapshots {
            snapshot.restore(world);
        }
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.snapshots.iter().any(|s| s.handle == handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.snapshots.iter().map(|s| s.handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWorld;

    #[test]
    fn test_capture_skips_dead_objects() {
        let mut world = FakeWorld::new();
        let h = world.spawn_body(Pose::at(0.0, 1.0, 0.0));
        world.destroy(h);

        assert!(Snapshot::capture(&world, h).is_none());
    }

    #[test]
    fn test_restore_zeroes_velocity() {
        let mut world = FakeWorld::new();
        let h = world.spawn_body(Pose::at(0.0, 1.0, 0.0));
        let snapshot = Snapshot::capture(&world, h).unwrap();

        world.set_velocity(h, [3.0, 0.0, 0.0]);
        world.set_transform(h, Pose::at(5.0, 5.0, 5.0));
        snapshot.restore(&mut world);

        assert_eq!(world.transform_of(h), Some(Pose::at(0.0, 1.0, 0.0)));
        assert_eq!(world.velocity(h), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bystanders_exclude_participants_and_plain_objects() {
        let mut world = FakeWorld::new();
        let participant = world.spawn_body(Pose::at(0.0, 1.0, 0.0));
        let bystander = world.spawn_body(Pose::at(2.0, 1.0, 0.0));
        let prop = world.spawn_prop(Pose::at(4.0, 1.0, 0.0));

        let participants: HashSet<_> = [participant].into_iter().collect();
        let set = BystanderSet::capture(&world, &participants);

        assert_eq!(set.len(), 1);
        assert!(set.contains(bystander));
        assert!(!set.contains(participant));
        assert!(!set.contains(prop));
    }
}
