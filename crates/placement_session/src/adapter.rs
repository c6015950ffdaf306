//! Contracts the session consumes from the host editor and physics engine

use crate::handle::ObjectHandle;
use crate::snapshot::Pose;
use std::ops::{Deref, DerefMut};

/// Read and write access to the host's scene and selection.
pub trait SceneAdapter {
    /// Objects currently selected in the editor
    fn current_selection(&self) -> Vec<ObjectHandle>;

    /// Every live object in the scene
    fn all_objects(&self) -> Vec<ObjectHandle>;

    /// Whether the object carries a physics body right now
    fn has_physics_body(&self, handle: ObjectHandle) -> bool;

    /// Current transform, `None` for unknown handles
    fn transform_of(&self, handle: ObjectHandle) -> Option<Pose>;

    /// Write a transform outside of the physics integration step
    fn set_transform(&mut self, handle: ObjectHandle, pose: Pose);

    /// Whether the handle still resolves to an object
    fn is_live(&self, handle: ObjectHandle) -> bool;
}

/// Who advances the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepMode {
    /// The host advances physics every frame
    #[default]
    Automatic,
    /// Only explicit `step` calls advance physics
    Manual,
}

/// Stepping control and per-body queries of the physics engine.
pub trait PhysicsAdapter {
    fn step_mode(&self) -> StepMode;
    fn set_step_mode(&mut self, mode: StepMode);

    /// Whether transforms are synchronized after every step
    fn auto_sync(&self) -> bool;
    fn set_auto_sync(&mut self, enabled: bool);

    /// Duration of one fixed tick in seconds
    fn fixed_timestep(&self) -> f32;

    /// Advance the whole world by `dt`
    fn step(&mut self, dt: f32);

    /// Whether the engine reports the body as settled (asleep)
    fn is_at_rest(&self, handle: ObjectHandle) -> bool;

    fn apply_impulse(&mut self, handle: ObjectHandle, impulse: [f32; 3]);

    /// Clear linear and angular velocity; no-op for objects without a body
    fn zero_velocity(&mut self, handle: ObjectHandle);

    /// Give a non-physics object a convex collider and a dynamic body.
    ///
    /// Returns `false` if the engine could not synthesize them.
    fn attach_collider_and_body(&mut self, handle: ObjectHandle) -> bool;

    /// Remove exactly what [`attach_collider_and_body`](Self::attach_collider_and_body)
    /// added. Must tolerate handles that no longer resolve.
    fn detach_collider_and_body(&mut self, handle: ObjectHandle);
}

/// A host world exposing both contracts.
pub trait PlacementWorld: SceneAdapter + PhysicsAdapter {}

impl<T: SceneAdapter + PhysicsAdapter + ?Sized> PlacementWorld for T {}

/// The process-wide physics switches a session borrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsMode {
    pub step_mode: StepMode,
    pub auto_sync: bool,
}

impl PhysicsMode {
    /// Manual stepping with transform sync deferred
    pub const MANUAL: Self = Self {
        step_mode: StepMode::Manual,
        auto_sync: false,
    };

    /// Read the current switches
    pub fn capture<P: PhysicsAdapter + ?Sized>(physics: &P) -> Self {
        Self {
            step_mode: physics.step_mode(),
            auto_sync: physics.auto_sync(),
        }
    }

    /// Write these switches back
    pub fn apply<P: PhysicsAdapter + ?Sized>(&self, physics: &mut P) {
        physics.set_step_mode(self.step_mode);
        physics.set_auto_sync(self.auto_sync);
    }
}

/// Holds the world in manual-step mode and restores the prior mode on drop.
///
/// Dropping the guard restores the saved switches on every exit path,
/// including early returns and unwinding.
pub struct PhysicsModeGuard<'w, W: PhysicsAdapter + ?Sized> {
    world: &'w mut W,
    saved: PhysicsMode,
}

impl<'w, W: PhysicsAdapter + ?Sized> PhysicsModeGuard<'w, W> {
    /// Save the current switches and enter [`PhysicsMode::MANUAL`].
    pub fn acquire(world: &'w mut W) -> Self {
        let saved = PhysicsMode::capture(&*world);
        PhysicsMode::MANUAL.apply(&mut *world);
        Self { world, saved }
    }

    /// The switches that will be restored
    pub fn saved(&self) -> PhysicsMode {
        self.saved
    }
}

impl<W: PhysicsAdapter + ?Sized> Deref for PhysicsModeGuard<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        &*self.world
    }
}

impl<W: PhysicsAdapter + ?Sized> DerefMut for PhysicsModeGuard<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut *self.world
    }
}

impl<W: PhysicsAdapter + ?Sized> Drop for PhysicsModeGuard<'_, W> {
    fn drop(&mut self) {
        self.saved.apply(&mut *self.world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWorld;

    #[test]
    fn test_guard_restores_on_drop() {
        let mut world = FakeWorld::new();
        world.set_auto_sync(true);

        {
            let guard = PhysicsModeGuard::acquire(&mut world);
            assert_eq!(guard.step_mode(), StepMode::Manual);
            assert!(!guard.auto_sync());
            assert_eq!(guard.saved().step_mode, StepMode::Automatic);
        }

        assert_eq!(world.step_mode(), StepMode::Automatic);
        assert!(world.auto_sync());
    }

    #[test]
    fn test_guard_restores_non_default_mode() {
        let mut world = FakeWorld::new();
        world.set_step_mode(StepMode::Manual);
        world.set_auto_sync(true);

        drop(PhysicsModeGuard::acquire(&mut world));

        assert_eq!(
            PhysicsMode::capture(&world),
            PhysicsMode {
                step_mode: StepMode::Manual,
                auto_sync: true
            }
        );
    }

    #[test]
    fn test_guard_restores_when_unwinding() {
        let mut world = FakeWorld::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = PhysicsModeGuard::acquire(&mut world);
            panic!("tick failed");
        }));

        assert!(result.is_err());
        assert_eq!(world.step_mode(), StepMode::Automatic);
        assert!(world.auto_sync());
    }
}
