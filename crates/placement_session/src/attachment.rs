//! Temporary physics bodies for objects that have none

use crate::adapter::PhysicsAdapter;
use crate::handle::ObjectHandle;
use crate::registry::{Participant, ParticipantKind};
use std::collections::HashMap;

/// Record that a collider and body were synthesized on `owner` for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EphemeralAttachment {
    owner: ObjectHandle,
}

impl EphemeralAttachment {
    /// The non-physics participant the components were added to
    pub fn owner(&self) -> ObjectHandle {
        self.owner
    }
}

/// Live ephemeral attachments, at most one per owner.
#[derive(Debug, Default)]
pub struct AttachmentSet {
    by_owner: HashMap<ObjectHandle, EphemeralAttachment>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize physics for a non-physics participant.
    ///
    /// Returns the existing attachment if the participant already has one.
    /// Native participants and engine failures yield `None`.
    pub fn attach<P: PhysicsAdapter + ?Sized>(
        &mut self,
        physics: &mut P,
        participant: &Participant,
    ) -> Option<EphemeralAttachment> {
        if participant.kind() != ParticipantKind::Synthetic {
            return None;
        }

        let owner = participant.handle();
        if let Some(existing) = self.by_owner.get(&owner) {
            return Some(*existing);
        }

        if !physics.attach_collider_and_body(owner) {
            log::warn!("Could not synthesize physics for {}", owner);
            return None;
        }

        let attachment = EphemeralAttachment { owner };
        self.by_owner.insert(owner, attachment);
        log::debug!("Attached ephemeral body to {}", owner);
        Some(attachment)
    }

    /// Remove the components synthesized on `owner`, if any.
    pub fn detach<P: PhysicsAdapter + ?Sized>(&mut self, physics: &mut P, owner: ObjectHandle) -> bool {
        match self.by_owner.remove(&owner) {
            Some(attachment) => {
                physics.detach_collider_and_body(attachment.owner);
                log::debug!("Detached ephemeral body from {}", owner);
                true
            }
            None => false,
        }
    }

    /// Detach everything; returns how many attachments were released.
    pub fn detach_all<P: PhysicsAdapter + ?Sized>(&mut self, physics: &mut P) -> usize {
        let count = self.by_owner.len();
        for (_, attachment) in self.by_owner.drain() {
            physics.detach_collider_and_body(attachment.owner);
        }
        if count > 0 {
            log::debug!("Detached {} ephemeral bodies", count);
        }
        count
    }

    pub fn is_attached(&self, owner: ObjectHandle) -> bool {
        self.by_owner.contains_key(&owner)
    }

    pub fn get(&self, owner: ObjectHandle) -> Option<EphemeralAttachment> {
        self.by_owner.get(&owner).copied()
    }

    pub fn owners(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.by_owner.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }
}

impl Drop for AttachmentSet {
    fn drop(&mut self) {
        if !self.by_owner.is_empty() {
            log::warn!(
                "{} ephemeral attachments dropped without being detached",
                self.by_owner.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SceneAdapter;
    use crate::snapshot::{Pose, Snapshot};
    use crate::testing::FakeWorld;

    fn synthetic(world: &FakeWorld, handle: ObjectHandle) -> Participant {
        Participant::new(Snapshot::capture(world, handle).unwrap(), ParticipantKind::Synthetic)
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut world = FakeWorld::new();
        let prop = world.spawn_prop(Pose::at(0.0, 2.0, 0.0));
        let participant = synthetic(&world, prop);
        let mut set = AttachmentSet::new();

        let first = set.attach(&mut world, &participant).unwrap();
        let second = set.attach(&mut world, &participant).unwrap();

        assert_eq!(first, second);
        assert_eq!(set.len(), 1);
        assert_eq!(world.attach_calls(), 1);
        assert!(world.has_physics_body(prop));

        set.detach_all(&mut world);
    }

    #[test]
    fn test_native_participants_are_not_attached() {
        let mut world = FakeWorld::new();
        let body = world.spawn_body(Pose::at(0.0, 2.0, 0.0));
        let participant = Participant::new(Snapshot::capture(&world, body).unwrap(), ParticipantKind::Native);
        let mut set = AttachmentSet::new();

        assert!(set.attach(&mut world, &participant).is_none());
        assert_eq!(world.attach_calls(), 0);
    }

    #[test]
    fn test_detach_removes_components_and_tolerates_dead_owner() {
        let mut world = FakeWorld::new();
        let a = world.spawn_prop(Pose::at(0.0, 2.0, 0.0));
        let b = world.spawn_prop(Pose::at(3.0, 2.0, 0.0));
        let (pa, pb) = (synthetic(&world, a), synthetic(&world, b));
        let mut set = AttachmentSet::new();
        set.attach(&mut world, &pa).unwrap();
        set.attach(&mut world, &pb).unwrap();

        world.destroy(b);

        assert!(set.detach(&mut world, a));
        assert!(!world.has_physics_body(a));
        assert!(!set.detach(&mut world, a));
        assert_eq!(set.detach_all(&mut world), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_failed_synthesis_is_not_recorded() {
        let mut world = FakeWorld::new();
        let prop = world.spawn_prop(Pose::at(0.0, 2.0, 0.0));
        world.fail_attach(prop);
        let participant = synthetic(&world, prop);
        let mut set = AttachmentSet::new();

        assert!(set.attach(&mut world, &participant).is_none());
        assert!(set.is_empty());
    }
}
