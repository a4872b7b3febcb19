//! Physics capability consumed by the placement core
//!
//! The rigid-body engine lives in the host. The core only toggles bodies
//! between kinematic (scripted) and dynamic (simulated) control, reads
//! velocity/sleep/position feedback, and applies the damping fallback.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::{ItemId, Pose};

/// How two colliders' bounciness values are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BounceCombine {
    #[default]
    Average,
    Minimum,
    Multiply,
    Maximum,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyVelocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl BodyVelocity {
    pub fn is_zero(&self) -> bool {
        self.linear == Vec3::ZERO && self.angular == Vec3::ZERO
    }
}

pub trait Physics {
    /// False when the item has no rigid body; placement then snaps at once
    fn has_body(&self, item: ItemId) -> bool;

    fn set_kinematic(&mut self, item: ItemId, kinematic: bool);

    fn set_gravity(&mut self, item: ItemId, enabled: bool);

    fn velocity(&self, item: ItemId) -> Option<BodyVelocity>;

    fn is_asleep(&self, item: ItemId) -> bool;

    /// Simulated pose of the body
    fn pose(&self, item: ItemId) -> Option<Pose>;

    /// Teleport/move the body (kinematic move while scripted)
    fn set_pose(&mut self, item: ItemId, pose: Pose);

    fn set_velocity(&mut self, item: ItemId, velocity: BodyVelocity);

    fn set_bounciness(&mut self, item: ItemId, bounciness: f32, combine: BounceCombine);

    /// Undo any `set_bounciness` override (called on session reset)
    fn restore_material(&mut self, _item: ItemId) {}

    /// Hand the body to the simulation with gravity on
    fn release(&mut self, item: ItemId) {
        self.set_kinematic(item, false);
        self.set_gravity(item, true);
    }

    /// Take the body back under scripted control
    fn freeze(&mut self, item: ItemId) {
        self.set_kinematic(item, true);
        self.set_gravity(item, false);
    }
}
