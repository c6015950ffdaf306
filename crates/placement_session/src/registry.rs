//! The working set of objects opted into simulation

use crate::adapter::{PhysicsAdapter, PlacementWorld, SceneAdapter};
use crate::attachment::AttachmentSet;
use crate::handle::ObjectHandle;
use crate::snapshot::Snapshot;
use std::collections::HashSet;

/// Whether a participant brought its own physics body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// Already carries a physics body in the scene
    Native,
    /// Has no body; one is synthesized only while a run is active
    Synthetic,
}

/// A tracked object and its last captured transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participant {
    snapshot: Snapshot,
    kind: ParticipantKind,
}

impl Participant {
    pub fn new(snapshot: Snapshot, kind: ParticipantKind) -> Self {
        Self { snapshot, kind }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.snapshot.handle()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    pub fn is_native(&self) -> bool {
        self.kind == ParticipantKind::Native
    }
}

/// Participants in insertion order, unique by handle.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    entries: Vec<Participant>,
    index: HashSet<ObjectHandle>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.index.contains(&handle)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&Participant> {
        if !self.contains(handle) {
            return None;
        }
        self.entries.iter().find(|p| p.handle() == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.entries.iter()
    }

    /// Handles of every participant
    pub fn handles(&self) -> &HashSet<ObjectHandle> {
        &self.index
    }

    /// Track `participant`; returns `false` if its handle is already tracked.
    pub fn insert(&mut self, participant: Participant) -> bool {
        if !self.index.insert(participant.handle()) {
            return false;
        }
        self.entries.push(participant);
        true
    }

    /// Track every handle that is not tracked yet, capturing its current transform.
    ///
    /// Objects without a physics body are tracked only when
    /// `include_non_physics` is set; no physics is synthesized here.
    /// Returns the number of newly tracked handles.
    pub fn add<S: SceneAdapter + ?Sized>(
        &mut self,
        world: &S,
        handles: &[ObjectHandle],
        include_non_physics: bool,
    ) -> usize {
        let mut added = 0;
        for &handle in handles {
            if self.contains(handle) {
                continue;
            }
            let kind = if world.has_physics_body(handle) {
                ParticipantKind::Native
            } else if include_non_physics {
                ParticipantKind::Synthetic
            } else {
                continue;
            };
            let Some(snapshot) = Snapshot::capture(world, handle) else {
                log::debug!("Skipping {}: not a live object", handle);
                continue;
            };
            if self.insert(Participant::new(snapshot, kind)) {
                added += 1;
            }
        }
        added
    }

    /// Stop tracking every listed handle, releasing ephemeral physics first.
    pub fn remove<P: PhysicsAdapter + ?Sized>(
        &mut self,
        physics: &mut P,
        attachments: &mut AttachmentSet,
        handles: &[ObjectHandle],
    ) -> usize {
        let doomed: HashSet<ObjectHandle> = handles.iter().copied().collect();
        self.drop_where(physics, attachments, |p| doomed.contains(&p.handle()))
    }

    /// Stop tracking everything.
    pub fn clear<P: PhysicsAdapter + ?Sized>(&mut self, physics: &mut P, attachments: &mut AttachmentSet) -> usize {
        attachments.detach_all(physics);
        let count = self.entries.len();
        self.entries.clear();
        self.index.clear();
        count
    }

    /// Drop participants that no longer resolve, and every non-physics
    /// participant when they are excluded. Returns the number dropped.
    pub fn validate<W: PlacementWorld + ?Sized>(
        &mut self,
        world: &mut W,
        attachments: &mut AttachmentSet,
        include_non_physics: bool,
    ) -> usize {
        let stale: HashSet<ObjectHandle> = self
            .entries
            .iter()
            .filter(|p| !world.is_live(p.handle()) || (!include_non_physics && !p.is_native()))
            .map(Participant::handle)
            .collect();
        self.drop_where(world, attachments, |p| stale.contains(&p.handle()))
    }

    /// Re-capture every participant's current transform so the next run
    /// continues from where objects are now. Stale and excluded entries are
    /// dropped first; returns how many were dropped.
    pub fn recapture<W: PlacementWorld + ?Sized>(
        &mut self,
        world: &mut W,
        attachments: &mut AttachmentSet,
        include_non_physics: bool,
    ) -> usize {
        let dropped = self.validate(world, attachments, include_non_physics);
        for participant in &mut self.entries {
            if let Some(snapshot) = Snapshot::capture(&*world, participant.handle()) {
                participant.snapshot = snapshot;
            }
        }
        dropped
    }

    fn drop_where<P, F>(&mut self, physics: &mut P, attachments: &mut AttachmentSet, mut doomed: F) -> usize
    where
        P: PhysicsAdapter + ?Sized,
        F: FnMut(&Participant) -> bool,
    {
        let before = self.entries.len();
        let index = &mut self.index;
        self.entries.retain(|p| {
            if !doomed(p) {
                return true;
            }
            attachments.detach(physics, p.handle());
            index.remove(&p.handle());
            false
        });
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Pose;
    use crate::testing::FakeWorld;

    #[test]
    fn test_add_is_idempotent() {
        let mut world = FakeWorld::new();
        let h = world.spawn_body(Pose::at(0.0, 1.0, 0.0));
        let mut registry = ParticipantRegistry::new();

        assert_eq!(registry.add(&world, &[h], false), 1);
        assert_eq!(registry.add(&world, &[h], false), 0);
        assert_eq!(registry.add(&world, &[h, h], false), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_non_physics_objects_need_inclusion() {
        let mut world = FakeWorld::new();
        let prop = world.spawn_prop(Pose::at(0.0, 1.0, 0.0));
        let mut registry = ParticipantRegistry::new();

        assert_eq!(registry.add(&world, &[prop], false), 0);
        assert_eq!(registry.add(&world, &[prop], true), 1);
        assert_eq!(registry.get(prop).unwrap().kind(), ParticipantKind::Synthetic);
        assert!(!world.has_physics_body(prop), "add must not synthesize physics");
    }

    #[test]
    fn test_add_captures_current_transform() {
        let mut world = FakeWorld::new();
        let h = world.spawn_body(Pose::at(1.0, 2.0, 3.0));
        let mut registry = ParticipantRegistry::new();
        registry.add(&world, &[h], false);

        assert_eq!(registry.get(h).unwrap().snapshot().pose(), Pose::at(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_remove_and_clear_release_attachments() {
        let mut world = FakeWorld::new();
        let body = world.spawn_body(Pose::at(0.0, 1.0, 0.0));
        let prop = world.spawn_prop(Pose::at(2.0, 1.0, 0.0));
        let mut registry = ParticipantRegistry::new();
        let mut attachments = AttachmentSet::new();
        registry.add(&world, &[body, prop], true);
        let participant = *registry.get(prop).unwrap();
        attachments.attach(&mut world, &participant).unwrap();

        assert_eq!(registry.remove(&mut world, &mut attachments, &[prop]), 1);
        assert!(attachments.is_empty());
        assert!(!world.has_physics_body(prop));

        assert_eq!(registry.clear(&mut world, &mut attachments), 1);
        assert!(registry.is_empty());
        assert!(!registry.contains(body));
    }

    #[test]
    fn test_validate_prunes_exactly_the_destroyed_handle() {
        let mut world = FakeWorld::new();
        let handles: Vec<_> = (0..3).map(|i| world.spawn_body(Pose::at(i as f32, 1.0, 0.0))).collect();
        let mut registry = ParticipantRegistry::new();
        let mut attachments = AttachmentSet::new();
        registry.add(&world, &handles, false);

        world.destroy(handles[1]);

        assert_eq!(registry.validate(&mut world, &mut attachments, false), 1);
        assert!(registry.contains(handles[0]));
        assert!(!registry.contains(handles[1]));
        assert!(registry.contains(handles[2]));
    }

    #[test]
    fn test_validate_drops_synthetic_when_excluded() {
        let mut world = FakeWorld::new();
        let body = world.spawn_body(Pose::at(0.0, 1.0, 0.0));
        let prop = world.spawn_prop(Pose::at(2.0, 1.0, 0.0));
        let mut registry = ParticipantRegistry::new();
        let mut attachments = AttachmentSet::new();
        registry.add(&world, &[body, prop], true);

        assert_eq!(registry.validate(&mut world, &mut attachments, true), 0);
        assert_eq!(registry.validate(&mut world, &mut attachments, false), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(body));
    }

    #[test]
    fn test_recapture_follows_moved_objects() {
        let mut world = FakeWorld::new();
        let h = world.spawn_body(Pose::at(0.0, 1.0, 0.0));
        let mut registry = ParticipantRegistry::new();
        let mut attachments = AttachmentSet::new();
        registry.add(&world, &[h], false);

        world.set_transform(h, Pose::at(0.0, 0.5, 0.0));
        assert_eq!(registry.recapture(&mut world, &mut attachments, false), 0);
        assert_eq!(registry.get(h).unwrap().snapshot().pose(), Pose::at(0.0, 0.5, 0.0));
    }
}
