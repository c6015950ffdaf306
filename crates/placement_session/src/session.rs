//! The session driver: one simulate-to-settle run at a time
//!
//! ```text
//!            simulate (blocking)                 simulate (step-visualized)
//!   Idle ──────────────────────▶ Running   Idle ─────────────────────────▶ Settling
//!    ▲                              │        ▲                                 │ tick() per host frame
//!    └──────────── finish ──────────┘        └──── finish (converged/cap/cancel)┘
//! ```
//!
//! Every tick advances the shared physics world once, puts every bystander
//! back, and checks whether all simulated bodies are at rest. Finishing a
//! run restores the physics engine's stepping switches, restores the
//! bystanders one last time and releases every ephemeral attachment.

use crate::adapter::{PhysicsMode, PhysicsModeGuard, PlacementWorld};
use crate::attachment::AttachmentSet;
use crate::force::LaunchForce;
use crate::handle::ObjectHandle;
use crate::registry::{Participant, ParticipantRegistry};
use crate::settings::SessionSettings;
use crate::snapshot::BystanderSet;
use crate::status::{parse_iterations, Status};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Lifecycle of a placement session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No run in progress; the registry is mutable
    #[default]
    Idle,
    /// A blocking run is executing
    Running,
    /// A step-wise run is spread across host frames
    Settling,
}

/// Loop counters and captured state of one run.
#[derive(Debug)]
struct ActiveRun {
    current_iteration: u32,
    max_iterations: u32,
    bystanders: BystanderSet,
    simulated: Vec<ObjectHandle>,
}

impl ActiveRun {
    /// Run one iteration. Returns the reported iteration count once the run
    /// has converged or hit its cap.
    fn advance<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Option<u32> {
        let dt = world.fixed_timestep();
        world.step(dt);
        self.bystanders.restore_all(world);
        self.current_iteration += 1;

        if self.simulated.iter().all(|h| world.is_at_rest(*h)) {
            log::debug!("Converged after {} iterations", self.current_iteration);
            return Some(self.current_iteration);
        }
        if self.current_iteration >= self.max_iterations {
            log::debug!("Iteration cap of {} reached", self.max_iterations);
            return Some(self.max_iterations);
        }
        None
    }
}

/// A step-wise run and the physics switches to restore when it ends.
#[derive(Debug)]
struct SettlingRun {
    run: ActiveRun,
    saved_mode: PhysicsMode,
}

/// Owns the participant registry and drives placement runs.
///
/// A step-wise run holds the world in manual stepping with sync off and keeps
/// ephemeral bodies attached until it ends. The session cannot reach the
/// world on drop, so call [`PlacementSession::cancel`] before dropping one
/// that is still settling.
pub struct PlacementSession {
    registry: ParticipantRegistry,
    attachments: AttachmentSet,
    state: SessionState,
    settling: Option<SettlingRun>,
    include_non_physics: bool,
    rng: StdRng,
    last_status: Option<Status>,
}

impl PlacementSession {
    /// Create an idle session with an entropy-seeded impulse RNG
    pub fn new(include_non_physics: bool) -> Self {
        Self::with_rng(include_non_physics, StdRng::from_entropy())
    }

    /// Create an idle session with reproducible launch impulses
    pub fn with_seed(include_non_physics: bool, seed: u64) -> Self {
        Self::with_rng(include_non_physics, StdRng::seed_from_u64(seed))
    }

    /// Create an idle session configured from settings
    pub fn from_settings(settings: &SessionSettings) -> Self {
        match settings.seed {
            Some(seed) => Self::with_seed(settings.include_non_physics, seed),
            None => Self::new(settings.include_non_physics),
        }
    }

    fn with_rng(include_non_physics: bool, rng: StdRng) -> Self {
        Self {
            registry: ParticipantRegistry::new(),
            attachments: AttachmentSet::new(),
            state: SessionState::Idle,
            settling: None,
            include_non_physics,
            rng,
            last_status: None,
        }
    }

    // ==================== Queries ====================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Tracked participants in insertion order
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.registry.iter()
    }

    pub fn attachments(&self) -> &AttachmentSet {
        &self.attachments
    }

    pub fn include_non_physics(&self) -> bool {
        self.include_non_physics
    }

    /// Most recently reported outcome, `None` before the first one
    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    /// Bystanders of the step-wise run in progress
    pub fn bystanders(&self) -> Option<&BystanderSet> {
        self.settling.as_ref().map(|s| &s.run.bystanders)
    }

    /// Bodies being simulated by the step-wise run in progress
    pub fn simulated_handles(&self) -> &[ObjectHandle] {
        self.settling
            .as_ref()
            .map(|s| s.run.simulated.as_slice())
            .unwrap_or(&[])
    }

    /// Ticks completed by the step-wise run in progress
    pub fn current_iteration(&self) -> Option<u32> {
        self.settling.as_ref().map(|s| s.run.current_iteration)
    }

    fn report(&mut self, status: Status) -> Status {
        log::info!("{}", status);
        self.last_status = Some(status);
        status
    }

    fn locked(&mut self) -> Option<Status> {
        if self.is_idle() {
            None
        } else {
            Some(self.report(Status::SimulationInProgress))
        }
    }

    // ==================== Registry ====================

    /// Track the listed objects
    pub fn add<W: PlacementWorld + ?Sized>(&mut self, world: &mut W, handles: &[ObjectHandle]) -> Status {
        if let Some(status) = self.locked() {
            return status;
        }
        let added = self.registry.add(&*world, handles, self.include_non_physics);
        self.report(Status::Added(added, self.registry.len()))
    }

    /// Track the host's current selection
    pub fn add_selection<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Status {
        let selection = world.current_selection();
        self.add(world, &selection)
    }

    /// Stop tracking the listed objects
    pub fn remove<W: PlacementWorld + ?Sized>(&mut self, world: &mut W, handles: &[ObjectHandle]) -> Status {
        if let Some(status) = self.locked() {
            return status;
        }
        let removed = self.registry.remove(world, &mut self.attachments, handles);
        self.report(Status::Removed(removed, self.registry.len()))
    }

    /// Stop tracking the host's current selection
    pub fn remove_selection<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Status {
        let selection = world.current_selection();
        self.remove(world, &selection)
    }

    /// Stop tracking everything
    pub fn clear<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Status {
        if let Some(status) = self.locked() {
            return status;
        }
        self.registry.clear(world, &mut self.attachments);
        self.report(Status::Cleared)
    }

    /// Drop participants whose objects are gone (or excluded non-physics ones)
    pub fn validate<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Status {
        if let Some(status) = self.locked() {
            return status;
        }
        let dropped = self
            .registry
            .validate(world, &mut self.attachments, self.include_non_physics);
        let status = Status::EntriesInvalidated(dropped);
        if dropped > 0 {
            self.report(status)
        } else {
            status
        }
    }

    /// Host callback for scene graph changes
    pub fn on_hierarchy_change<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) {
        if self.is_idle() {
            self.validate(world);
        }
    }

    /// Toggle tracking of objects without a physics body.
    ///
    /// Turning it off drops every non-physics participant and its ephemeral
    /// state.
    pub fn set_include_non_physics<W: PlacementWorld + ?Sized>(
        &mut self,
        world: &mut W,
        include: bool,
    ) -> Option<Status> {
        if let Some(status) = self.locked() {
            return Some(status);
        }
        self.include_non_physics = include;
        if include {
            return None;
        }
        match self.validate(world) {
            Status::EntriesInvalidated(0) => None,
            status => Some(status),
        }
    }

    // ==================== Simulation ====================

    /// Parse the iteration field and simulate
    pub fn simulate_input<W: PlacementWorld + ?Sized>(
        &mut self,
        world: &mut W,
        iterations: &str,
        force: &LaunchForce,
        step_visualized: bool,
    ) -> Status {
        if let Some(status) = self.locked() {
            return status;
        }
        match parse_iterations(iterations) {
            Ok(max_iterations) => self.simulate(world, max_iterations, force, step_visualized),
            Err(status) => self.report(status),
        }
    }

    /// Simulate with the iteration cap, force and mode from settings
    pub fn simulate_with<W: PlacementWorld + ?Sized>(&mut self, world: &mut W, settings: &SessionSettings) -> Status {
        self.simulate(world, settings.max_iterations, &settings.force, settings.step_visualized)
    }

    /// Relax the participants until they rest or `max_iterations` ticks pass.
    ///
    /// A blocking run returns `DoneSimulating`. A step-visualized run returns
    /// `SimulationInProgress` and is driven by [`tick`](Self::tick).
    pub fn simulate<W: PlacementWorld + ?Sized>(
        &mut self,
        world: &mut W,
        max_iterations: u32,
        force: &LaunchForce,
        step_visualized: bool,
    ) -> Status {
        if let Some(status) = self.locked() {
            return status;
        }
        if self.registry.is_empty() {
            return self.report(Status::NoBodiesToSimulate);
        }
        if max_iterations == 0 {
            return self.report(Status::InvalidIterationCount);
        }

        let dropped = self
            .registry
            .recapture(world, &mut self.attachments, self.include_non_physics);
        if dropped > 0 {
            log::warn!("Dropped {} stale participants before simulating", dropped);
        }
        if self.registry.is_empty() {
            return self.report(Status::NoBodiesToSimulate);
        }

        let simulated = self.prepare_bodies(world);
        let bystanders = BystanderSet::capture(&*world, self.registry.handles());

        if !force.is_zero() {
            for &handle in &simulated {
                let impulse = force.sample(&mut self.rng);
                world.apply_impulse(handle, impulse);
            }
        }

        log::info!(
            "Simulating {} bodies ({} ephemeral) with {} bystanders, at most {} iterations",
            simulated.len(),
            self.attachments.len(),
            bystanders.len(),
            max_iterations
        );

        let mut run = ActiveRun {
            current_iteration: 0,
            max_iterations,
            bystanders,
            simulated,
        };

        if step_visualized {
            let saved_mode = PhysicsMode::capture(&*world);
            PhysicsMode::MANUAL.apply(world);
            self.settling = Some(SettlingRun { run, saved_mode });
            self.state = SessionState::Settling;
            return self.report(Status::SimulationInProgress);
        }

        self.state = SessionState::Running;
        let iterations = {
            let mut guard = PhysicsModeGuard::acquire(world);
            loop {
                if let Some(iterations) = run.advance(&mut *guard) {
                    break iterations;
                }
            }
        };
        self.finish(world, run, iterations)
    }

    /// Advance a step-wise run by one tick; call once per host frame.
    ///
    /// Returns the final status when the run ends on this tick.
    pub fn tick<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Option<Status> {
        if self.state != SessionState::Settling {
            return None;
        }
        let mut settling = self.settling.take()?;
        match settling.run.advance(world) {
            Some(iterations) => {
                settling.saved_mode.apply(world);
                Some(self.finish(world, settling.run, iterations))
            }
            None => {
                self.settling = Some(settling);
                None
            }
        }
    }

    /// Stop a step-wise run at the current iteration boundary.
    pub fn cancel<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Option<Status> {
        if self.state != SessionState::Settling {
            return None;
        }
        let settling = self.settling.take()?;
        log::info!("Cancelled after {} iterations", settling.run.current_iteration);
        settling.saved_mode.apply(world);
        let iterations = settling.run.current_iteration;
        Some(self.finish(world, settling.run, iterations))
    }

    /// Put every participant back at its last captured transform with zero
    /// velocity, without running physics.
    pub fn reset<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Option<Status> {
        if let Some(status) = self.locked() {
            return Some(status);
        }
        for participant in self.registry.iter() {
            participant.snapshot().restore(world);
        }
        log::debug!("Reset {} participants", self.registry.len());
        None
    }

    /// Collect native bodies and give every included non-physics participant
    /// an ephemeral body.
    fn prepare_bodies<W: PlacementWorld + ?Sized>(&mut self, world: &mut W) -> Vec<ObjectHandle> {
        let mut simulated = Vec::with_capacity(self.registry.len());
        for participant in self.registry.iter() {
            if participant.is_native() {
                simulated.push(participant.handle());
            } else if self.include_non_physics {
                if let Some(attachment) = self.attachments.attach(world, participant) {
                    simulated.push(attachment.owner());
                }
            }
        }
        simulated
    }

    /// Shared tail of every run; the physics mode is already restored.
    fn finish<W: PlacementWorld + ?Sized>(&mut self, world: &mut W, run: ActiveRun, iterations: u32) -> Status {
        run.bystanders.restore_all(world);
        self.attachments.detach_all(world);
        self.state = SessionState::Idle;
        self.report(Status::DoneSimulating(iterations))
    }
}

impl std::fmt::Debug for PlacementSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementSession")
            .field("state", &self.state)
            .field("participants", &self.registry.len())
            .field("attachments", &self.attachments.len())
            .field("include_non_physics", &self.include_non_physics)
            .field("last_status", &self.last_status)
            .finish()
    }
}

impl Drop for PlacementSession {
    fn drop(&mut self) {
        if let Some(settling) = &self.settling {
            log::warn!(
                "Placement session dropped while settling at iteration {}; \
                 physics mode and {} ephemeral bodies were not restored",
                settling.run.current_iteration,
                self.attachments.len()
            );
        }
    }
}
