//! Placement Session - selective, reversible physics relaxation
//!
//! A scene designer picks a handful of objects, lets physics settle just
//! those objects, and then either keeps the result or rolls everything back.
//! This crate holds the bookkeeping for that workflow and nothing else: it
//! talks to the host editor and to the physics engine only through the
//! [`SceneAdapter`] and [`PhysicsAdapter`] traits.
//!
//! # Architecture
//!
//! ```text
//!  add / remove / clear / validate        simulate / tick / cancel / reset
//!              │                                     │
//!              ▼                                     ▼
//!   ┌─────────────────────┐   snapshots   ┌─────────────────────┐
//!   │ ParticipantRegistry │──────────────▶│   PlacementSession  │
//!   └─────────────────────┘               │  Idle/Running/      │
//!   ┌─────────────────────┐  attach/detach│  Settling           │
//!   │    AttachmentSet    │◀──────────────│  BystanderSet       │
//!   └─────────────────────┘               │  PhysicsModeGuard   │
//!                                         └──────────┬──────────┘
//!                                                    │
//!                                  SceneAdapter + PhysicsAdapter (host)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use placement_session::prelude::*;
//!
//! let mut session = PlacementSession::from_settings(&SessionSettings::default());
//! session.add_selection(&mut world);
//! let status = session.simulate(&mut world, 1000, &LaunchForce::default(), false);
//! println!("{status}");
//! session.reset(&mut world); // roll back if the result is not wanted
//! ```

pub mod adapter;
pub mod attachment;
pub mod force;
pub mod handle;
pub mod registry;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub mod prelude {
    //! Common imports for placement sessions
    pub use crate::adapter::{PhysicsAdapter, PhysicsMode, PhysicsModeGuard, PlacementWorld, SceneAdapter, StepMode};
    pub use crate::attachment::{AttachmentSet, EphemeralAttachment};
    pub use crate::force::LaunchForce;
    pub use crate::handle::ObjectHandle;
    pub use crate::registry::{Participant, ParticipantKind, ParticipantRegistry};
    pub use crate::session::{PlacementSession, SessionState};
    pub use crate::settings::{SessionSettings, SettingsError};
    pub use crate::snapshot::{BystanderSet, Pose, Snapshot};
    pub use crate::status::{parse_iterations, Status};
}

pub use prelude::*;
