//! Ordered slot sequence
//!
//! Slots are listed top to bottom of the road cross-section; the sequence
//! only ever moves forward, one slot per completed placement.

use serde::{Deserialize, Serialize};

use super::state::{LayerKind, Pose};
use crate::error::PuzzleError;

/// One position in the build order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub kind: LayerKind,
    /// Hover point above the final pose; the scripted glide ends here
    pub air_anchor: Pose,
    /// Exact resting pose the item is snapped to
    pub final_pose: Pose,
    #[serde(skip)]
    pub highlighted: bool,
}

impl Slot {
    pub fn new(kind: LayerKind, air_anchor: Pose, final_pose: Pose) -> Self {
        Self {
            kind,
            air_anchor,
            final_pose,
            highlighted: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SlotSequence {
    slots: Vec<Slot>,
    index: usize,
}

impl SlotSequence {
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Progress index in [0, len]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Slot at the progress index, or None once exhausted
    pub fn current(&self) -> Option<&Slot> {
        self.slots.get(self.index)
    }

    pub fn matches(&self, kind: LayerKind) -> bool {
        self.current().is_some_and(|slot| slot.kind == kind)
    }

    pub fn is_complete(&self) -> bool {
        self.index == self.slots.len()
    }

    /// Move to the next slot. Returns the new index.
    pub fn advance(&mut self) -> Result<usize, PuzzleError> {
        if self.is_complete() {
            return Err(PuzzleError::InvariantViolation(
                "advance called on an exhausted slot sequence",
            ));
        }
        self.index += 1;
        Ok(self.index)
    }

    /// Back to the first slot (session start/reset only)
    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Highlight exactly the current slot. Returns the slots whose flag
    /// changed as `(slot_index, on)`.
    pub fn refresh_highlights(&mut self) -> Vec<(usize, bool)> {
        let current = self.index;
        let mut changed = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let on = i == current;
            if slot.highlighted != on {
                slot.highlighted = on;
                changed.push((i, on));
            }
        }
        changed
    }
}
