//! Settle detection for a body released into physics
//!
//! Decides, one tick at a time, whether a falling layer has come to rest
//! near its target height or has run out of time. The detector never
//! touches the body; the only memory it needs (the debounce flag) lives in
//! a [`SettleProbe`] owned by the caller.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Thresholds for settle detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleThresholds {
    /// Max |y - target_y| to count as "near target"
    pub pos_tolerance: f32,
    pub lin_vel_threshold: f32,
    pub ang_vel_threshold: f32,
    /// Hard limit on time spent waiting
    pub settle_timeout: f32,
}

impl Default for SettleThresholds {
    fn default() -> Self {
        Self {
            pos_tolerance: POS_TOLERANCE,
            lin_vel_threshold: LIN_VEL_THRESHOLD,
            ang_vel_threshold: ANG_VEL_THRESHOLD,
            settle_timeout: SETTLE_TIMEOUT,
        }
    }
}

/// Live kinematic feedback for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleSample {
    pub linear_speed: f32,
    pub angular_speed: f32,
    /// Body height minus the slot's final height
    pub vertical_offset: f32,
    pub asleep: bool,
    /// Time since the body was released
    pub elapsed: f32,
}

/// Verdict for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettleVerdict {
    Continue,
    SettledNaturally,
    SettledByTimeout,
}

impl SettleVerdict {
    pub fn is_settled(&self) -> bool {
        !matches!(self, SettleVerdict::Continue)
    }
}

/// Debounce record: whether the previous tick already looked settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleProbe {
    low_motion_seen: bool,
}

impl SettleProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> bool {
        self.low_motion_seen
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettleDetector {
    pub thresholds: SettleThresholds,
}

impl SettleDetector {
    pub fn new(thresholds: SettleThresholds) -> Self {
        Self { thresholds }
    }

    /// True when velocity and height are all inside tolerance this tick
    pub fn is_low_motion(&self, sample: &SettleSample) -> bool {
        let th = &self.thresholds;
        sample.linear_speed <= th.lin_vel_threshold
            && sample.angular_speed <= th.ang_vel_threshold
            && sample.vertical_offset.abs() <= th.pos_tolerance
    }

    /// Evaluate one tick.
    ///
    /// A sleeping body settles immediately. Otherwise the full low-motion
    /// condition (both speeds and height) must hold on two consecutive
    /// ticks. The timeout wins only when neither natural rule fires.
    pub fn evaluate(&self, probe: &mut SettleProbe, sample: &SettleSample) -> SettleVerdict {
        if sample.asleep {
            return SettleVerdict::SettledNaturally;
        }

        let low = self.is_low_motion(sample);
        if low && probe.low_motion_seen {
            return SettleVerdict::SettledNaturally;
        }
        probe.low_motion_seen = low;

        if sample.elapsed >= self.thresholds.settle_timeout {
            return SettleVerdict::SettledByTimeout;
        }
        SettleVerdict::Continue
    }
}
