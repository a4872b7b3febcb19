//! Session-level types: layer items, poses, phases and events
//!
//! Everything here is plain data; the state machines live in `placement`
//! and `session`.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::ease_toward;

/// Road construction layer kinds, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Surface,
    Base,
    Subbase,
    Subgrade,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Surface => "Surface",
            LayerKind::Base => "Base",
            LayerKind::Subbase => "Subbase",
            LayerKind::Subgrade => "Subgrade",
        }
    }
}

/// Position + rotation in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Lerp position, slerp rotation. `t` is clamped to [0, 1].
    pub fn blend(&self, to: &Pose, t: f32) -> Pose {
        let t = t.clamp(0.0, 1.0);
        Pose {
            position: self.position.lerp(to.position, t),
            rotation: self.rotation.slerp(to.rotation, t),
        }
    }
}

/// Stable handle for a layer item (index into the session's item list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Who currently controls an item
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemState {
    /// Resting at its rest pose, can be picked up
    Idle,
    /// Held by the drag surface
    Dragging,
    /// Gliding back to rest after a rejected drop
    Returning {
        from: Pose,
        from_scale: Vec3,
        t: f32,
        duration: f32,
    },
    /// Owned by the active placement run
    Settling,
    /// Snapped into its slot
    Locked,
}

/// A draggable road layer
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub kind: LayerKind,
    pub pose: Pose,
    pub scale: Vec3,
    /// Pose the item returns to on rejection and reset
    pub rest: Pose,
    pub rest_scale: Vec3,
    pub drag_scale: Vec3,
    /// Written by the drag surface while dragging; read at drop time
    pub in_zone: bool,
    pub state: ItemState,
}

impl Item {
    pub fn new(
        id: ItemId,
        kind: LayerKind,
        rest: Pose,
        rest_scale: Vec3,
        drag_scale: Vec3,
    ) -> Self {
        Self {
            id,
            kind,
            pose: rest,
            scale: rest_scale,
            rest,
            rest_scale,
            drag_scale,
            in_zone: false,
            state: ItemState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.state == ItemState::Dragging
    }

    /// Instantly put the item back at rest
    pub fn snap_to_rest(&mut self) {
        self.pose = self.rest;
        self.scale = self.rest_scale;
        self.in_zone = false;
        self.state = ItemState::Idle;
    }

    /// Start the animated glide back to rest
    pub fn begin_return(&mut self, duration: f32) {
        self.in_zone = false;
        if duration <= 0.0 {
            self.snap_to_rest();
            return;
        }
        self.state = ItemState::Returning {
            from: self.pose,
            from_scale: self.scale,
            t: 0.0,
            duration,
        };
    }

    /// Advance a return glide. Returns true on the tick the item arrives.
    pub fn step_return(&mut self, dt: f32) -> bool {
        let ItemState::Returning {
            from,
            from_scale,
            ref mut t,
            duration,
        } = self.state
        else {
            return false;
        };

        *t += dt / duration;
        if *t >= 1.0 {
            self.snap_to_rest();
            return true;
        }
        let t = *t;
        self.pose = from.blend(&self.rest, t);
        self.scale = from_scale.lerp(self.rest_scale, t);
        false
    }

    /// Ease scale toward drag scale while held, rest scale otherwise.
    /// Returning items animate their own scale.
    pub fn ease_scale(&mut self, dt: f32, speed: f32) {
        let target = match self.state {
            ItemState::Dragging => self.drag_scale,
            ItemState::Returning { .. } => return,
            _ => self.rest_scale,
        };
        self.scale = ease_toward(self.scale, target, dt, speed);
    }
}

/// Top-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Not started, or reset
    Idle,
    /// Accepting drops
    Playing,
    /// Every slot filled
    Complete,
}

/// Why a drop was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    NotPlaying,
    /// A placement run is still in flight
    Busy,
    OutsideZone,
    /// Right place, wrong layer
    WrongCategory,
    /// The item is already locked into a slot
    AlreadyPlaced,
}

/// Result of a drop evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Accepted { slot: usize },
    Rejected(RejectReason),
}

impl DropOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DropOutcome::Accepted { .. })
    }
}

/// Fire-and-forget notifications for presentation collaborators
/// (camera zoom, glow, UI fades). Drained by the host each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    SessionReset,
    HighlightChanged { slot: usize, on: bool },
    DropAccepted { item: ItemId, slot: usize },
    DropRejected { item: ItemId, reason: RejectReason },
    /// Fallback damping was applied before the snap
    PlacementDamped { item: ItemId },
    ProgressAdvanced { index: usize },
    /// Show replay, zoom camera in
    SequenceComplete,
    RewardDropped,
    RewardRemoved,
}
