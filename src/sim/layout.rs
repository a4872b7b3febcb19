//! Spawn layout: where layers rest before they are placed
//!
//! The session never decides positions itself; it asks a [`LayoutProvider`].
//! [`RowLayout`] is the stock provider: a seeded shuffle into a single row.

use glam::Vec3;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;

use super::state::{Item, Pose};
use crate::consts::{RETURN_DURATION, SPAWN_SPACING};
use crate::settings::PuzzleSetup;

pub trait LayoutProvider {
    /// Adopt the setup's spawn row and timing. Called once when a session
    /// is built, before the first shuffle.
    fn configure(&mut self, _setup: &PuzzleSetup) {}

    /// Arrange and shuffle items, recording each new spot as the item's
    /// rest pose. Returns the rest poses in item order.
    fn place_and_shuffle(&mut self, items: &mut [Item]) -> Vec<Pose>;

    /// Send an item back to its rest pose, instantly or animated
    fn reset_item_to_rest(&mut self, item: &mut Item, instant: bool);
}

/// Shuffled single-row layout along +X from `origin`
#[derive(Debug, Clone)]
pub struct RowLayout {
    pub origin: Vec3,
    pub spacing: f32,
    pub return_duration: f32,
    rng: Pcg32,
}

impl RowLayout {
    pub fn new(origin: Vec3, seed: u64) -> Self {
        Self {
            origin,
            spacing: SPAWN_SPACING,
            return_duration: RETURN_DURATION,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }
}

impl LayoutProvider for RowLayout {
    fn configure(&mut self, setup: &PuzzleSetup) {
        let settings = &setup.settings;
        self.origin = setup.spawn_origin;
        self.spacing = settings.spawn_spacing;
        self.return_duration = settings.return_duration;
        self.rng = Pcg32::seed_from_u64(settings.seed);
    }

    fn place_and_shuffle(&mut self, items: &mut [Item]) -> Vec<Pose> {
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.shuffle(&mut self.rng);

        for (column, &idx) in order.iter().enumerate() {
            let item = &mut items[idx];
            let position = self.origin + Vec3::X * (column as f32 * self.spacing);
            item.rest = Pose::new(position, item.rest.rotation);
            item.snap_to_rest();
        }
        log::debug!("Layout shuffled {} items: {:?}", items.len(), order);

        items.iter().map(|item| item.rest).collect()
    }

    fn reset_item_to_rest(&mut self, item: &mut Item, instant: bool) {
        if instant {
            item.snap_to_rest();
        } else {
            item.begin_return(self.return_duration);
        }
    }
}
