//! Placement controller: locks one accepted layer into its slot
//!
//! A run is a small resumable state machine advanced once per tick:
//!
//! 1. `MovingToAnchor` - scripted glide from the drop point to the slot's
//!    air anchor (normalized `t += dt / duration`)
//! 2. `AwaitingSettle` - body released to physics, settle detector polled
//!
//! The run ends with the snap (optional damping, freeze, exact final pose),
//! which happens inside the tick that decided it, so it has no phase of its
//! own.
//!
//! Every run ends at the slot's final pose no matter how the physics behaved.

use glam::Vec3;

use super::physics::{BodyVelocity, BounceCombine, Physics};
use super::settle::{SettleDetector, SettleProbe, SettleSample, SettleThresholds, SettleVerdict};
use super::slots::Slot;
use super::state::{Item, ItemId, ItemState};
use crate::consts::ANCHOR_DURATION;
use crate::error::PuzzleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    MovingToAnchor,
    AwaitingSettle,
}

/// Transient state of the one in-flight placement
#[derive(Debug, Clone)]
pub struct PlacementRun {
    pub item: ItemId,
    pub slot: usize,
    pub phase: RunPhase,
    /// Drop position the glide starts from
    from: Vec3,
    /// Normalized glide progress
    t: f32,
    /// Time since release into physics
    elapsed: f32,
    probe: SettleProbe,
}

impl PlacementRun {
    pub fn progress(&self) -> f32 {
        self.t.min(1.0)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

/// Summary handed back to the session when a run completes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementReport {
    pub item: ItemId,
    pub slot: usize,
    /// `SettledNaturally` or `SettledByTimeout`
    pub verdict: SettleVerdict,
    /// Fallback damping was applied before the snap
    pub damped: bool,
}

#[derive(Debug, Clone)]
pub struct PlacementController {
    detector: SettleDetector,
    anchor_duration: f32,
    active: Option<PlacementRun>,
}

impl Default for PlacementController {
    fn default() -> Self {
        Self::new(SettleThresholds::default(), ANCHOR_DURATION)
    }
}

impl PlacementController {
    pub fn new(thresholds: SettleThresholds, anchor_duration: f32) -> Self {
        Self {
            detector: SettleDetector::new(thresholds),
            anchor_duration,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&PlacementRun> {
        self.active.as_ref()
    }

    /// Start locking `item` into `slot`.
    ///
    /// The item's rotation jumps to the final rotation right away; the glide
    /// itself starts on the next `step`.
    pub fn begin(
        &mut self,
        item: &mut Item,
        slot_index: usize,
        slot: &Slot,
        physics: &mut impl Physics,
    ) -> Result<(), PuzzleError> {
        if self.active.is_some() {
            return Err(PuzzleError::InvariantViolation(
                "placement begun while another run is active",
            ));
        }
        if item.kind != slot.kind {
            return Err(PuzzleError::InvariantViolation(
                "placement begun for an item that does not fit the slot",
            ));
        }

        item.state = ItemState::Settling;
        item.in_zone = false;
        item.pose.rotation = slot.final_pose.rotation;
        physics.freeze(item.id);
        physics.set_pose(item.id, item.pose);

        log::debug!(
            "Placement begin: {:?} ({}) -> slot {}",
            item.id,
            item.kind.as_str(),
            slot_index
        );

        self.active = Some(PlacementRun {
            item: item.id,
            slot: slot_index,
            phase: RunPhase::MovingToAnchor,
            from: item.pose.position,
            t: 0.0,
            elapsed: 0.0,
            probe: SettleProbe::new(),
        });
        Ok(())
    }

    /// Drop the in-flight run without touching the item. The caller is
    /// responsible for putting the item back at rest.
    pub fn cancel(&mut self) -> Option<PlacementRun> {
        let run = self.active.take();
        if let Some(run) = &run {
            log::warn!("Placement of {:?} cancelled in {:?}", run.item, run.phase);
        }
        run
    }

    /// Advance the active run by one tick. Returns the report on the tick
    /// the run completes; the run is cleared at that point.
    pub fn step(
        &mut self,
        item: &mut Item,
        slot: &Slot,
        physics: &mut impl Physics,
        dt: f32,
    ) -> Option<PlacementReport> {
        let run = self.active.as_mut()?;
        debug_assert_eq!(run.item, item.id, "step called with a foreign item");
        if run.item != item.id {
            log::error!("Placement step for {:?} but run owns {:?}", item.id, run.item);
            return None;
        }

        match run.phase {
            RunPhase::MovingToAnchor => {
                run.t += dt / self.anchor_duration;
                let target = slot.air_anchor.position;
                item.pose.position = run.from.lerp(target, run.t.min(1.0));
                physics.set_pose(item.id, item.pose);

                if run.t < 1.0 {
                    return None;
                }
                item.pose.position = target;
                if !physics.has_body(item.id) {
                    let verdict = SettleVerdict::SettledNaturally;
                    return Some(self.snap(item, slot, physics, verdict, None));
                }
                physics.release(item.id);
                run.phase = RunPhase::AwaitingSettle;
                log::debug!("{:?} released at air anchor", item.id);
                None
            }
            RunPhase::AwaitingSettle => {
                let Some(velocity) = physics.velocity(item.id) else {
                    let verdict = SettleVerdict::SettledNaturally;
                    return Some(self.snap(item, slot, physics, verdict, None));
                };
                if let Some(pose) = physics.pose(item.id) {
                    item.pose = pose;
                }

                let sample = SettleSample {
                    linear_speed: velocity.linear.length(),
                    angular_speed: velocity.angular.length(),
                    vertical_offset: item.pose.position.y - slot.final_pose.position.y,
                    asleep: physics.is_asleep(item.id),
                    elapsed: run.elapsed,
                };
                match self.detector.evaluate(&mut run.probe, &sample) {
                    SettleVerdict::Continue => {
                        run.elapsed += dt;
                        None
                    }
                    verdict => Some(self.snap(item, slot, physics, verdict, Some(velocity))),
                }
            }
        }
    }

    fn snap(
        &mut self,
        item: &mut Item,
        slot: &Slot,
        physics: &mut impl Physics,
        verdict: SettleVerdict,
        residual: Option<BodyVelocity>,
    ) -> PlacementReport {
        let slot_index = self.active.take().map_or(0, |run| run.slot);

        let damped = verdict == SettleVerdict::SettledByTimeout
            && residual.is_some_and(|v| !v.is_zero());
        if damped {
            log::warn!("{:?} did not settle in time, damping before snap", item.id);
            physics.set_velocity(item.id, BodyVelocity::default());
            physics.set_bounciness(item.id, 0.0, BounceCombine::Minimum);
        }

        physics.freeze(item.id);
        item.pose = slot.final_pose;
        item.state = ItemState::Locked;
        physics.set_pose(item.id, item.pose);

        log::debug!("{:?} locked into slot {} ({:?})", item.id, slot_index, verdict);

        PlacementReport {
            item: item.id,
            slot: slot_index,
            verdict,
            damped,
        }
    }
}
