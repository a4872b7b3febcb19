//! Tuning and puzzle setup
//!
//! Both are plain serde data so hosts can ship them as JSON.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::PuzzleError;
use crate::sim::{LayerKind, Pose, SettleThresholds, Slot};

/// Timing and tolerance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub settle: SettleThresholds,
    /// Scripted glide to the air anchor (seconds)
    pub anchor_duration: f32,
    /// Animated return after a rejected drop (seconds, 0 = instant)
    pub return_duration: f32,
    /// Rest/drag scale easing rate
    pub scale_speed: f32,
    /// Distance between spawn row columns
    pub spawn_spacing: f32,
    /// Delay between completion and the reward drop (seconds)
    pub reward_delay: f32,
    /// Layout shuffle seed
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle: SettleThresholds::default(),
            anchor_duration: ANCHOR_DURATION,
            return_duration: RETURN_DURATION,
            scale_speed: SCALE_SPEED,
            spawn_spacing: SPAWN_SPACING,
            reward_delay: REWARD_DELAY,
            seed: 0x5EED,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), PuzzleError> {
        let s = &self.settle;
        let non_negative = [
            ("settle.pos_tolerance", s.pos_tolerance),
            ("settle.lin_vel_threshold", s.lin_vel_threshold),
            ("settle.ang_vel_threshold", s.ang_vel_threshold),
            ("return_duration", self.return_duration),
            ("scale_speed", self.scale_speed),
            ("spawn_spacing", self.spawn_spacing),
            ("reward_delay", self.reward_delay),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PuzzleError::Configuration(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("settle.settle_timeout", s.settle_timeout),
            ("anchor_duration", self.anchor_duration),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PuzzleError::Configuration(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn default_rest_scale() -> Vec3 {
    Vec3::splat(4.0)
}

fn default_drag_scale() -> Vec3 {
    Vec3::ONE
}

/// One draggable layer in the setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub kind: LayerKind,
    #[serde(default = "Quat::default")]
    pub rotation: Quat,
    #[serde(default = "default_rest_scale")]
    pub rest_scale: Vec3,
    #[serde(default = "default_drag_scale")]
    pub drag_scale: Vec3,
}

impl ItemSpec {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            rotation: Quat::IDENTITY,
            rest_scale: default_rest_scale(),
            drag_scale: default_drag_scale(),
        }
    }
}

/// Everything a session needs to be built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleSetup {
    #[serde(default)]
    pub settings: Settings,
    /// First column of the spawn row
    #[serde(default)]
    pub spawn_origin: Vec3,
    /// Build order
    pub slots: Vec<Slot>,
    pub items: Vec<ItemSpec>,
}

impl PuzzleSetup {
    /// Thickness of one layer in the stock road
    const LAYER_HEIGHT: f32 = 0.5;
    /// Air anchor height above the final pose
    const ANCHOR_LIFT: f32 = 2.5;

    /// The stock four-layer road, built bottom-up
    pub fn road_default() -> Self {
        let order = [
            LayerKind::Subgrade,
            LayerKind::Subbase,
            LayerKind::Base,
            LayerKind::Surface,
        ];
        let slots = order
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let final_pos = Vec3::new(0.0, i as f32 * Self::LAYER_HEIGHT, 0.0);
                Slot::new(
                    kind,
                    Pose::at(final_pos + Vec3::Y * Self::ANCHOR_LIFT),
                    Pose::at(final_pos),
                )
            })
            .collect();

        Self {
            settings: Settings::default(),
            spawn_origin: Vec3::new(-1.8, 0.0, 4.0),
            slots,
            items: order.iter().map(|&kind| ItemSpec::new(kind)).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PuzzleError> {
        let setup: PuzzleSetup = serde_json::from_str(json)?;
        Ok(setup)
    }

    pub fn to_json(&self) -> Result<String, PuzzleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the setup can actually be solved
    pub fn validate(&self) -> Result<(), PuzzleError> {
        self.settings.validate()?;
        let slot_kinds: Vec<LayerKind> = self.slots.iter().map(|s| s.kind).collect();
        let item_kinds: Vec<LayerKind> = self.items.iter().map(|i| i.kind).collect();
        validate_coverage(&slot_kinds, &item_kinds)
    }
}

/// The slot sequence must be non-empty and every slot must have an item
/// of its kind to fill it.
pub fn validate_coverage(slots: &[LayerKind], items: &[LayerKind]) -> Result<(), PuzzleError> {
    if slots.is_empty() {
        return Err(PuzzleError::Configuration("slot sequence is empty".into()));
    }
    for kind in slots {
        let needed = slots.iter().filter(|k| *k == kind).count();
        let available = items.iter().filter(|k| *k == kind).count();
        if available < needed {
            return Err(PuzzleError::Configuration(format!(
                "{} slot(s) expect {} but only {} item(s) exist",
                needed,
                kind.as_str(),
                available
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let s = Settings::default();
        assert_eq!(s.settle.pos_tolerance, 0.12);
        assert_eq!(s.settle.lin_vel_threshold, 0.25);
        assert_eq!(s.settle.ang_vel_threshold, 0.25);
        assert_eq!(s.settle.settle_timeout, 3.0);
        assert_eq!(s.anchor_duration, 0.18);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_road_default_is_valid() {
        let setup = PuzzleSetup::road_default();
        assert_eq!(setup.slots.len(), 4);
        assert_eq!(setup.slots[0].kind, LayerKind::Subgrade);
        assert_eq!(setup.slots[3].kind, LayerKind::Surface);
        assert!(setup.slots.iter().all(|s| s.air_anchor.position.y > s.final_pose.position.y));
        assert!(setup.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_keeps_slots() {
        let setup = PuzzleSetup::road_default();
        let json = setup.to_json().unwrap();
        let back = PuzzleSetup::from_json(&json).unwrap();
        assert_eq!(back, setup);
    }

    #[test]
    fn test_partial_settings_json_uses_defaults() {
        let json = r#"{
            "settings": { "settle": { "settle_timeout": 1.5 }, "seed": 9 },
            "slots": [
                { "kind": "Base",
                  "air_anchor": { "position": [0.0, 3.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0] },
                  "final_pose": { "position": [0.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0] } }
            ],
            "items": [ { "kind": "Base" } ]
        }"#;
        let setup = PuzzleSetup::from_json(json).unwrap();
        assert_eq!(setup.settings.settle.settle_timeout, 1.5);
        assert_eq!(setup.settings.settle.pos_tolerance, 0.12);
        assert_eq!(setup.settings.seed, 9);
        assert_eq!(setup.items[0].rest_scale, Vec3::splat(4.0));
        assert!(setup.validate().is_ok());
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        let err = PuzzleSetup::from_json("{ not json").unwrap_err();
        assert!(matches!(err, PuzzleError::Configuration(_)));
    }

    #[test]
    fn test_empty_slots_rejected() {
        let mut setup = PuzzleSetup::road_default();
        setup.slots.clear();
        assert!(matches!(setup.validate(), Err(PuzzleError::Configuration(_))));
    }

    #[test]
    fn test_missing_item_rejected() {
        let mut setup = PuzzleSetup::road_default();
        setup.items.retain(|i| i.kind != LayerKind::Base);
        assert!(matches!(setup.validate(), Err(PuzzleError::Configuration(_))));
    }

    #[test]
    fn test_bad_durations_rejected() {
        let mut s = Settings::default();
        s.anchor_duration = 0.0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.settle.lin_vel_threshold = -1.0;
        assert!(s.validate().is_err());
    }
}
