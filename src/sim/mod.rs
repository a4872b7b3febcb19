//! Deterministic placement core
//!
//! All puzzle logic lives here. This module must stay pure and deterministic:
//! - Host-supplied time step only
//! - Seeded RNG only (layout shuffle)
//! - Physics reached through the `Physics` trait, never a concrete engine
//! - No rendering or platform dependencies

pub mod layout;
pub mod physics;
pub mod placement;
pub mod session;
pub mod settle;
pub mod slots;
pub mod state;

pub use layout::{LayoutProvider, RowLayout};
pub use physics::{BodyVelocity, BounceCombine, Physics};
pub use placement::{PlacementController, PlacementReport, PlacementRun, RunPhase};
pub use session::GameSession;
pub use settle::{SettleDetector, SettleProbe, SettleSample, SettleThresholds, SettleVerdict};
pub use slots::{Slot, SlotSequence};
pub use state::{
    DropOutcome, GameEvent, Item, ItemId, ItemState, LayerKind, Pose, RejectReason, SessionPhase,
};
