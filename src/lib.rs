//! Road Layers - a drag-and-drop sequencing puzzle
//!
//! Layers of a road (surface, base, subbase, subgrade) must be dropped into
//! the build zone in order. Each correct drop glides to an air anchor, falls
//! under physics, settles and is snapped into place.
//!
//! Core modules:
//! - `sim`: Deterministic placement core (session, slots, settle detection)
//! - `settings`: Data-driven tuning and puzzle setup
//! - `error`: Error taxonomy

pub mod error;
pub mod settings;
pub mod sim;

pub use error::PuzzleError;
pub use settings::{PuzzleSetup, Settings};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the host loop (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Settle detection defaults (world units, units/s, rad/s, seconds)
    pub const POS_TOLERANCE: f32 = 0.12;
    pub const LIN_VEL_THRESHOLD: f32 = 0.25;
    pub const ANG_VEL_THRESHOLD: f32 = 0.25;
    pub const SETTLE_TIMEOUT: f32 = 3.0;

    /// Scripted glide from drop point to air anchor
    pub const ANCHOR_DURATION: f32 = 0.18;
    /// Animated return to rest after a rejected drop
    pub const RETURN_DURATION: f32 = 0.35;
    /// Rate at which item scale eases between rest and drag scale
    pub const SCALE_SPEED: f32 = 10.0;
    /// Height an item is lifted when picked up
    pub const PICKUP_LIFT: f32 = 1.0;

    /// Spawn row spacing
    pub const SPAWN_SPACING: f32 = 1.2;
    /// Delay between completion and the reward drop
    pub const REWARD_DELAY: f32 = 0.25;
}

/// Interpolation factor clamped to [0, 1]
#[inline]
pub fn unit_clamp(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Exponential-style easing of a vector toward a target (frame-rate dependent,
/// matches `lerp(current, target, dt * speed)` per tick)
#[inline]
pub fn ease_toward(current: Vec3, target: Vec3, dt: f32, speed: f32) -> Vec3 {
    current.lerp(target, unit_clamp(dt * speed))
}
