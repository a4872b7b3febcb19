//! Game session: the top-level puzzle state machine
//!
//! `Idle -> Playing -> Complete`, with `reset` returning to `Idle` from
//! anywhere. The session owns the slot sequence, the items, the placement
//! controller and the injected physics/layout collaborators. Drops are
//! serialized: while a placement run is in flight every drop is rejected.

use glam::Vec3;

use super::layout::LayoutProvider;
use super::physics::Physics;
use super::placement::{PlacementController, PlacementReport, PlacementRun};
use super::slots::SlotSequence;
use super::state::{
    DropOutcome, GameEvent, Item, ItemId, ItemState, LayerKind, Pose, RejectReason, SessionPhase,
};
use crate::consts::PICKUP_LIFT;
use crate::error::PuzzleError;
use crate::settings::{PuzzleSetup, Settings, validate_coverage};

/// Reward object dropped after completion
#[derive(Debug, Clone, Copy, PartialEq)]
enum Reward {
    None,
    Pending { remaining: f32 },
    Dropped,
}

pub struct GameSession<P: Physics, L: LayoutProvider> {
    settings: Settings,
    slots: SlotSequence,
    items: Vec<Item>,
    phase: SessionPhase,
    placement: PlacementController,
    physics: P,
    layout: L,
    reward: Reward,
    events: Vec<GameEvent>,
}

impl<P: Physics, L: LayoutProvider> GameSession<P, L> {
    /// Build a session in `Idle`. Items start in a plain row at the spawn
    /// origin; `start` shuffles them. Setup errors surface from `start`.
    /// The layout provider is configured from the setup here.
    pub fn new(setup: &PuzzleSetup, physics: P, mut layout: L) -> Self {
        layout.configure(setup);
        let settings = setup.settings.clone();
        let items = setup
            .items
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let position = setup.spawn_origin + Vec3::X * (i as f32 * settings.spawn_spacing);
                Item::new(
                    ItemId(i as u32),
                    spec.kind,
                    Pose::new(position, spec.rotation),
                    spec.rest_scale,
                    spec.drag_scale,
                )
            })
            .collect();

        let placement = PlacementController::new(settings.settle, settings.anchor_duration);
        Self {
            settings,
            slots: SlotSequence::new(setup.slots.clone()),
            items,
            phase: SessionPhase::Idle,
            placement,
            physics,
            layout,
            reward: Reward::None,
            events: Vec::new(),
        }
    }

    // --- Queries -----------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True while a placement run is in flight
    pub fn is_busy(&self) -> bool {
        self.placement.is_active()
    }

    pub fn progress_index(&self) -> usize {
        self.slots.index()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &SlotSequence {
        &self.slots
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0 as usize)
    }

    /// Kind the session is waiting for, if any
    pub fn expected_kind(&self) -> Option<LayerKind> {
        self.slots.current().map(|slot| slot.kind)
    }

    pub fn active_run(&self) -> Option<&PlacementRun> {
        self.placement.active()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    pub fn reward_dropped(&self) -> bool {
        self.reward == Reward::Dropped
    }

    /// Take all queued presentation events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Phase transitions -------------------------------------------------

    /// Enter `Playing` with a freshly shuffled board.
    ///
    /// Validation happens before anything is touched; on error the session
    /// is left exactly as it was. Starting while already playing restarts.
    pub fn start(&mut self) -> Result<(), PuzzleError> {
        self.settings.validate()?;
        let slot_kinds: Vec<LayerKind> = self.slots.iter().map(|s| s.kind).collect();
        let item_kinds: Vec<LayerKind> = self.items.iter().map(|i| i.kind).collect();
        validate_coverage(&slot_kinds, &item_kinds)?;

        self.restore_board();
        self.phase = SessionPhase::Playing;
        self.events.push(GameEvent::SessionStarted);
        log::info!(
            "Session started: {} slots, {} items, expecting {:?}",
            self.slots.len(),
            self.items.len(),
            self.expected_kind()
        );
        Ok(())
    }

    /// Abort everything and return to `Idle`. Safe from any phase.
    pub fn reset(&mut self) {
        self.restore_board();
        self.phase = SessionPhase::Idle;
        self.events.push(GameEvent::SessionReset);
        log::info!("Session reset");
    }

    /// Reset, then start again
    pub fn replay(&mut self) -> Result<(), PuzzleError> {
        self.reset();
        self.start()
    }

    /// Cancel the active run, put every item back at rest (instantly, with
    /// physics frozen), reshuffle, rewind the slots.
    fn restore_board(&mut self) {
        self.placement.cancel();

        for item in &mut self.items {
            self.layout.reset_item_to_rest(item, true);
            self.physics.freeze(item.id);
            self.physics.restore_material(item.id);
        }
        self.layout.place_and_shuffle(&mut self.items);
        for item in &self.items {
            self.physics.set_pose(item.id, item.pose);
        }

        self.slots.rewind();
        self.refresh_highlights();

        if self.reward == Reward::Dropped {
            self.events.push(GameEvent::RewardRemoved);
        }
        self.reward = Reward::None;
    }

    fn refresh_highlights(&mut self) {
        for (slot, on) in self.slots.refresh_highlights() {
            self.events.push(GameEvent::HighlightChanged { slot, on });
        }
    }

    // --- Drag surface ------------------------------------------------------

    fn index_of(&self, id: ItemId) -> Result<usize, PuzzleError> {
        let idx = id.0 as usize;
        if idx < self.items.len() {
            Ok(idx)
        } else {
            Err(PuzzleError::UnknownItem(id))
        }
    }

    /// Whether any item may be picked up right now
    pub fn can_pick_up(&self) -> bool {
        self.phase == SessionPhase::Playing && !self.is_busy()
    }

    /// Drag surface asks to pick an item up. On success the session takes
    /// the body under kinematic control and lifts the item.
    pub fn on_pickup_attempt(&mut self, id: ItemId) -> Result<bool, PuzzleError> {
        let idx = self.index_of(id)?;
        if !self.can_pick_up() {
            return Ok(false);
        }
        let item = &mut self.items[idx];
        if matches!(item.state, ItemState::Locked | ItemState::Settling) {
            return Ok(false);
        }

        item.state = ItemState::Dragging;
        item.in_zone = false;
        item.pose.position.y += PICKUP_LIFT;
        self.physics.freeze(id);
        self.physics.set_pose(id, item.pose);
        log::debug!("Picked up {:?} ({})", id, item.kind.as_str());
        Ok(true)
    }

    /// Follow the pointer on the horizontal plane; height is kept
    pub fn drag_to(&mut self, id: ItemId, point: Vec3) -> Result<(), PuzzleError> {
        let idx = self.index_of(id)?;
        let item = &mut self.items[idx];
        if !item.is_dragging() {
            return Ok(());
        }
        item.pose.position.x = point.x;
        item.pose.position.z = point.z;
        self.physics.set_pose(id, item.pose);
        Ok(())
    }

    /// Drop-zone trigger enter/exit. Only recorded while the item is held.
    pub fn set_in_zone(&mut self, id: ItemId, inside: bool) -> Result<(), PuzzleError> {
        let idx = self.index_of(id)?;
        let item = &mut self.items[idx];
        if item.is_dragging() {
            item.in_zone = inside;
        }
        Ok(())
    }

    /// Evaluate a drop. Accepted iff playing, not busy, inside the zone and
    /// the item's kind matches the current slot. Rejected items glide back
    /// to rest; nothing else changes.
    pub fn on_drop(&mut self, id: ItemId) -> Result<DropOutcome, PuzzleError> {
        let idx = self.index_of(id)?;

        match self.items[idx].state {
            ItemState::Locked => return Ok(self.reject(idx, RejectReason::AlreadyPlaced, false)),
            ItemState::Settling => return Ok(self.reject(idx, RejectReason::Busy, false)),
            _ => {}
        }
        if self.phase != SessionPhase::Playing {
            return Ok(self.reject(idx, RejectReason::NotPlaying, true));
        }
        if self.is_busy() {
            return Ok(self.reject(idx, RejectReason::Busy, true));
        }
        // Zone membership is read now, not cached from an earlier tick
        if !self.items[idx].in_zone {
            return Ok(self.reject(idx, RejectReason::OutsideZone, true));
        }
        if !self.slots.matches(self.items[idx].kind) {
            return Ok(self.reject(idx, RejectReason::WrongCategory, true));
        }

        let slot_index = self.slots.index();
        let Some(slot) = self.slots.current() else {
            return Err(PuzzleError::InvariantViolation("matching slot vanished"));
        };
        self.placement
            .begin(&mut self.items[idx], slot_index, slot, &mut self.physics)?;

        self.events.push(GameEvent::DropAccepted { item: id, slot: slot_index });
        log::debug!("Drop accepted: {:?} -> slot {}", id, slot_index);
        Ok(DropOutcome::Accepted { slot: slot_index })
    }

    fn reject(&mut self, idx: usize, reason: RejectReason, send_home: bool) -> DropOutcome {
        let item = &mut self.items[idx];
        if send_home {
            self.layout.reset_item_to_rest(item, false);
            self.physics.freeze(item.id);
            self.physics.set_pose(item.id, item.pose);
        }
        self.events.push(GameEvent::DropRejected { item: item.id, reason });
        log::debug!("Drop rejected: {:?} ({:?})", item.id, reason);
        DropOutcome::Rejected(reason)
    }

    // --- Tick --------------------------------------------------------------

    /// Advance one host frame: return glides, scale easing, the active
    /// placement run and the reward timer.
    pub fn tick(&mut self, dt: f32) {
        let scale_speed = self.settings.scale_speed;
        for item in &mut self.items {
            if matches!(item.state, ItemState::Returning { .. }) {
                item.step_return(dt);
                self.physics.set_pose(item.id, item.pose);
            }
            item.ease_scale(dt, scale_speed);
        }

        if self.phase == SessionPhase::Playing {
            self.step_placement(dt);
        }

        if let Reward::Pending { remaining } = self.reward {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.reward = Reward::Dropped;
                self.events.push(GameEvent::RewardDropped);
                log::info!("Reward dropped");
            } else {
                self.reward = Reward::Pending { remaining };
            }
        }
    }

    fn step_placement(&mut self, dt: f32) {
        let Some(run) = self.placement.active() else {
            return;
        };
        let (item_id, slot_index) = (run.item, run.slot);
        let (Ok(idx), Some(slot)) = (self.index_of(item_id), self.slots.get(slot_index)) else {
            debug_assert!(false, "placement run references missing item or slot");
            log::error!("Dropping placement run for {:?}: missing item or slot", item_id);
            self.placement.cancel();
            return;
        };

        let report = self
            .placement
            .step(&mut self.items[idx], slot, &mut self.physics, dt);
        if let Some(report) = report {
            self.complete_placement(report);
        }
    }

    fn complete_placement(&mut self, report: PlacementReport) {
        if report.damped {
            self.events.push(GameEvent::PlacementDamped { item: report.item });
        }

        let index = match self.slots.advance() {
            Ok(index) => index,
            Err(err) => {
                debug_assert!(false, "{err}");
                log::error!("{err}");
                return;
            }
        };
        self.refresh_highlights();
        self.events.push(GameEvent::ProgressAdvanced { index });
        log::info!(
            "Layer {}/{} placed ({:?})",
            index,
            self.slots.len(),
            report.verdict
        );

        if self.slots.is_complete() {
            self.phase = SessionPhase::Complete;
            self.reward = Reward::Pending {
                remaining: self.settings.reward_delay,
            };
            self.events.push(GameEvent::SequenceComplete);
            log::info!("Sequence complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::layout::RowLayout;
    use crate::sim::physics::testing::{MockFrame, MockPhysics};
    use crate::sim::placement::RunPhase;
    use crate::sim::slots::Slot;
    use crate::settings::ItemSpec;
    use proptest::prelude::*;

    type TestSession = GameSession<MockPhysics, RowLayout>;

    const A: LayerKind = LayerKind::Subgrade;
    const B: LayerKind = LayerKind::Subbase;
    const C: LayerKind = LayerKind::Base;

    /// Three slots [A, B, C] with one item of each, item ids 0, 1, 2
    fn setup_abc() -> PuzzleSetup {
        let slots = [A, B, C]
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let y = i as f32 * 0.5;
                Slot::new(
                    kind,
                    Pose::at(Vec3::new(0.0, y + 2.5, 0.0)),
                    Pose::at(Vec3::new(0.0, y, 0.0)),
                )
            })
            .collect();
        PuzzleSetup {
            settings: Settings::default(),
            spawn_origin: Vec3::new(-2.0, 0.0, 4.0),
            slots,
            items: [A, B, C].iter().map(|&k| ItemSpec::new(k)).collect(),
        }
    }

    fn session() -> TestSession {
        let setup = setup_abc();
        let physics = MockPhysics::with_bodies((0..3).map(ItemId));
        let layout = RowLayout::new(setup.spawn_origin, 3);
        GameSession::new(&setup, physics, layout)
    }

    fn started() -> TestSession {
        let mut s = session();
        s.start().unwrap();
        s.drain_events();
        s
    }

    /// Pick up, move into the zone and drop
    fn drop_in_zone(s: &mut TestSession, id: ItemId) -> DropOutcome {
        s.on_pickup_attempt(id).unwrap();
        s.drag_to(id, Vec3::ZERO).unwrap();
        s.set_in_zone(id, true).unwrap();
        s.on_drop(id).unwrap()
    }

    fn tick(s: &mut TestSession) {
        s.physics_mut().step();
        s.tick(SIM_DT);
    }

    fn run_until_idle(s: &mut TestSession) {
        for _ in 0..1000 {
            if !s.is_busy() {
                return;
            }
            tick(s);
        }
        panic!("placement never finished");
    }

    #[test]
    fn test_new_session_is_idle() {
        let s = session();
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.progress_index(), 0);
        assert!(!s.is_busy());
        assert!(!s.can_pick_up());
    }

    #[test]
    fn test_start_highlights_first_slot() {
        let mut s = session();
        s.start().unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::HighlightChanged { slot: 0, on: true }));
        assert!(events.contains(&GameEvent::SessionStarted));
        let lit: Vec<bool> = s.slots().iter().map(|sl| sl.highlighted).collect();
        assert_eq!(lit, vec![true, false, false]);
    }

    #[test]
    fn test_start_with_empty_slots_fails_without_mutation() {
        let mut setup = setup_abc();
        setup.slots.clear();
        let mut s: TestSession = GameSession::new(
            &setup,
            MockPhysics::with_bodies((0..3).map(ItemId)),
            RowLayout::new(Vec3::ZERO, 1),
        );
        let before: Vec<Pose> = s.items().iter().map(|i| i.pose).collect();

        assert!(matches!(s.start(), Err(PuzzleError::Configuration(_))));
        assert_eq!(s.phase(), SessionPhase::Idle);
        let after: Vec<Pose> = s.items().iter().map(|i| i.pose).collect();
        assert_eq!(before, after);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_drop_before_start_rejected() {
        let mut s = session();
        assert!(!s.on_pickup_attempt(ItemId(0)).unwrap());
        assert_eq!(
            s.on_drop(ItemId(0)).unwrap(),
            DropOutcome::Rejected(RejectReason::NotPlaying)
        );
    }

    #[test]
    fn test_unknown_item_is_error() {
        let mut s = started();
        assert_eq!(s.on_drop(ItemId(99)), Err(PuzzleError::UnknownItem(ItemId(99))));
        assert!(s.on_pickup_attempt(ItemId(3)).is_err());
    }

    #[test]
    fn test_drop_outside_zone_rejected_and_returns() {
        let mut s = started();
        let id = ItemId(0);
        s.on_pickup_attempt(id).unwrap();
        s.drag_to(id, Vec3::new(9.0, 0.0, 9.0)).unwrap();
        let rest = s.item(id).unwrap().rest;

        assert_eq!(s.on_drop(id).unwrap(), DropOutcome::Rejected(RejectReason::OutsideZone));
        assert!(matches!(s.item(id).unwrap().state, ItemState::Returning { .. }));
        for _ in 0..60 {
            tick(&mut s);
        }
        let item = s.item(id).unwrap();
        assert_eq!(item.state, ItemState::Idle);
        assert_eq!(item.pose, rest);
        assert_eq!(s.progress_index(), 0);
    }

    #[test]
    fn test_zone_read_at_drop_time() {
        let mut s = started();
        let id = ItemId(0);
        s.on_pickup_attempt(id).unwrap();
        s.set_in_zone(id, true).unwrap();
        s.set_in_zone(id, false).unwrap();
        assert_eq!(s.on_drop(id).unwrap(), DropOutcome::Rejected(RejectReason::OutsideZone));
    }

    #[test]
    fn test_zone_ignored_when_not_dragging() {
        let mut s = started();
        let id = ItemId(0);
        s.set_in_zone(id, true).unwrap();
        assert!(!s.item(id).unwrap().in_zone);
    }

    #[test]
    fn test_accepted_drop_runs_to_lock() {
        let mut s = started();
        let id = ItemId(0);
        assert_eq!(drop_in_zone(&mut s, id), DropOutcome::Accepted { slot: 0 });
        assert!(s.is_busy());
        assert!(!s.can_pick_up());
        assert!(!s.on_pickup_attempt(ItemId(1)).unwrap());

        run_until_idle(&mut s);
        let item = s.item(id).unwrap();
        assert_eq!(item.state, ItemState::Locked);
        assert_eq!(item.pose, s.slots().get(0).unwrap().final_pose);
        assert_eq!(s.progress_index(), 1);
        assert_eq!(s.expected_kind(), Some(B));

        let events = s.drain_events();
        assert!(events.contains(&GameEvent::DropAccepted { item: id, slot: 0 }));
        assert!(events.contains(&GameEvent::ProgressAdvanced { index: 1 }));
        assert!(events.contains(&GameEvent::HighlightChanged { slot: 1, on: true }));
        assert!(events.contains(&GameEvent::HighlightChanged { slot: 0, on: false }));
    }

    #[test]
    fn test_abc_scenario() {
        let mut s = started();
        let (a, b, c) = (ItemId(0), ItemId(1), ItemId(2));

        assert_eq!(drop_in_zone(&mut s, c), DropOutcome::Rejected(RejectReason::WrongCategory));
        assert_eq!(s.progress_index(), 0);
        for _ in 0..30 {
            tick(&mut s);
        }

        assert!(drop_in_zone(&mut s, a).is_accepted());
        run_until_idle(&mut s);
        assert_eq!(s.progress_index(), 1);
        assert!(s.slots().get(1).unwrap().highlighted);

        // A is locked now; dropping it again is refused without moving it
        assert_eq!(s.on_drop(a).unwrap(), DropOutcome::Rejected(RejectReason::AlreadyPlaced));
        assert_eq!(s.item(a).unwrap().state, ItemState::Locked);

        assert!(drop_in_zone(&mut s, b).is_accepted());
        run_until_idle(&mut s);
        assert!(drop_in_zone(&mut s, c).is_accepted());
        run_until_idle(&mut s);

        assert_eq!(s.progress_index(), 3);
        assert_eq!(s.phase(), SessionPhase::Complete);
        assert!(s.slots().iter().all(|sl| !sl.highlighted));

        for _ in 0..60 {
            tick(&mut s);
        }
        let events = s.drain_events();
        let completes = events.iter().filter(|e| **e == GameEvent::SequenceComplete).count();
        let rewards = events.iter().filter(|e| **e == GameEvent::RewardDropped).count();
        assert_eq!(completes, 1);
        assert_eq!(rewards, 1);
        assert!(s.reward_dropped());

        // Nothing more is accepted once complete
        assert_eq!(s.on_drop(a).unwrap(), DropOutcome::Rejected(RejectReason::AlreadyPlaced));
    }

    #[test]
    fn test_duplicate_kind_rejected_while_busy() {
        let mut setup = setup_abc();
        setup.items.push(ItemSpec::new(A));
        let mut s: TestSession = GameSession::new(
            &setup,
            MockPhysics::with_bodies((0..4).map(ItemId)),
            RowLayout::new(Vec3::ZERO, 5),
        );
        s.start().unwrap();

        assert!(drop_in_zone(&mut s, ItemId(0)).is_accepted());
        // Second A: right kind for the unchanged current slot, but busy
        let second = ItemId(3);
        s.set_in_zone(second, true).unwrap();
        assert_eq!(s.on_drop(second).unwrap(), DropOutcome::Rejected(RejectReason::Busy));
        assert_eq!(s.progress_index(), 0);
        assert!(s.is_busy());

        run_until_idle(&mut s);
        assert_eq!(s.progress_index(), 1);
    }

    #[test]
    fn test_timeout_placement_reports_damping() {
        let mut s = started();
        let id = ItemId(0);
        let jitter: Vec<MockFrame> = (0..1000)
            .map(|i| MockFrame::moving(0.3 * (i % 4) as f32, 1.5))
            .collect();
        s.physics_mut().script(id, jitter);

        assert!(drop_in_zone(&mut s, id).is_accepted());
        run_until_idle(&mut s);
        assert_eq!(s.item(id).unwrap().pose, s.slots().get(0).unwrap().final_pose);
        assert!(s.drain_events().contains(&GameEvent::PlacementDamped { item: id }));
        assert_eq!(s.physics().body(id).bounciness, 0.0);
    }

    #[test]
    fn test_reset_mid_run() {
        let mut s = started();
        let id = ItemId(0);
        assert!(drop_in_zone(&mut s, id).is_accepted());
        for _ in 0..5 {
            tick(&mut s);
        }
        assert!(s.is_busy());

        s.reset();
        assert!(!s.is_busy());
        assert!(s.active_run().is_none());
        assert_eq!(s.progress_index(), 0);
        assert_eq!(s.phase(), SessionPhase::Idle);
        for item in s.items() {
            assert_eq!(item.state, ItemState::Idle);
            assert_eq!(item.pose, item.rest);
            assert!(s.physics().body(item.id).kinematic);
        }

        // Ticking after reset must not resurrect the run
        for _ in 0..30 {
            tick(&mut s);
        }
        assert_eq!(s.progress_index(), 0);
    }

    #[test]
    fn test_reset_while_awaiting_settle() {
        let mut s = started();
        let id = ItemId(0);
        let jitter: Vec<MockFrame> = (0..1000).map(|_| MockFrame::moving(2.0, 3.0)).collect();
        s.physics_mut().script(id, jitter);
        assert!(drop_in_zone(&mut s, id).is_accepted());
        for _ in 0..20 {
            tick(&mut s);
        }
        assert_eq!(s.active_run().map(|r| r.phase), Some(RunPhase::AwaitingSettle));
        let body = s.physics().body(id);
        assert!(!body.kinematic);
        assert!(body.gravity);

        s.reset();
        assert!(!s.is_busy());
        assert_eq!(s.progress_index(), 0);
        let body = s.physics().body(id);
        assert!(body.kinematic);
        assert!(!body.gravity);
        let item = s.item(id).unwrap();
        assert_eq!(item.state, ItemState::Idle);
        assert_eq!(item.pose, item.rest);
        assert_eq!(body.pose, item.rest);
    }

    #[test]
    fn test_setup_drives_layout() {
        let mut setup = setup_abc();
        setup.settings.return_duration = 0.0;
        setup.settings.spawn_spacing = 5.0;
        let mut s: TestSession = GameSession::new(
            &setup,
            MockPhysics::with_bodies((0..3).map(ItemId)),
            RowLayout::new(Vec3::ZERO, 1),
        );
        s.start().unwrap();

        let mut xs: Vec<f32> = s.items().iter().map(|i| i.rest.position.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(xs, vec![-2.0, 3.0, 8.0]);

        // Instant return: home on the rejecting call, no glide
        let id = ItemId(0);
        s.on_pickup_attempt(id).unwrap();
        s.drag_to(id, Vec3::new(9.0, 0.0, 9.0)).unwrap();
        assert_eq!(s.on_drop(id).unwrap(), DropOutcome::Rejected(RejectReason::OutsideZone));
        let item = s.item(id).unwrap();
        assert_eq!(item.state, ItemState::Idle);
        assert_eq!(item.pose, item.rest);
        assert_eq!(s.physics().body(id).pose, item.rest);
    }

    #[test]
    fn test_reset_restores_damped_material() {
        let mut s = started();
        let id = ItemId(0);
        let jitter: Vec<MockFrame> = (0..1000).map(|_| MockFrame::moving(2.0, 3.0)).collect();
        s.physics_mut().script(id, jitter);
        drop_in_zone(&mut s, id);
        run_until_idle(&mut s);
        assert_eq!(s.physics().body(id).bounciness, 0.0);

        s.reset();
        assert_eq!(s.physics().body(id).bounciness, 0.6);
    }

    #[test]
    fn test_replay_after_complete() {
        let mut s = started();
        for id in 0..3 {
            assert!(drop_in_zone(&mut s, ItemId(id)).is_accepted());
            run_until_idle(&mut s);
        }
        assert_eq!(s.phase(), SessionPhase::Complete);
        for _ in 0..30 {
            tick(&mut s);
        }
        assert!(s.reward_dropped());
        s.drain_events();

        s.replay().unwrap();
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(s.progress_index(), 0);
        assert!(!s.reward_dropped());
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::RewardRemoved));
        assert!(events.contains(&GameEvent::SessionReset));
        assert!(events.contains(&GameEvent::SessionStarted));
        assert!(s.items().iter().all(|i| i.state == ItemState::Idle));

        assert!(drop_in_zone(&mut s, ItemId(0)).is_accepted());
    }

    #[test]
    fn test_reset_before_reward_cancels_it() {
        let mut s = started();
        for id in 0..3 {
            drop_in_zone(&mut s, ItemId(id));
            run_until_idle(&mut s);
        }
        s.reset();
        for _ in 0..60 {
            tick(&mut s);
        }
        assert!(!s.drain_events().contains(&GameEvent::RewardDropped));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Drop { item: u32, in_zone: bool },
        Tick(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..3, any::<bool>()).prop_map(|(item, in_zone)| Op::Drop { item, in_zone }),
            (1u8..40).prop_map(Op::Tick),
        ]
    }

    proptest! {
        #[test]
        fn prop_progress_monotonic_and_acceptance_rule(ops in prop::collection::vec(op(), 1..60)) {
            let mut s = started();
            let mut last = 0;
            for op in ops {
                match op {
                    Op::Drop { item, in_zone } => {
                        let id = ItemId(item);
                        let picked = s.on_pickup_attempt(id).unwrap();
                        if in_zone {
                            s.set_in_zone(id, true).unwrap();
                        }
                        let eligible = s.phase() == SessionPhase::Playing
                            && !s.is_busy()
                            && s.item(id).unwrap().in_zone
                            && s.expected_kind() == Some(s.item(id).unwrap().kind);
                        let busy_before = s.is_busy();
                        let index_before = s.progress_index();

                        let outcome = s.on_drop(id).unwrap();
                        prop_assert_eq!(outcome.is_accepted(), eligible);
                        if !outcome.is_accepted() {
                            prop_assert_eq!(s.is_busy(), busy_before);
                            prop_assert_eq!(s.progress_index(), index_before);
                        }
                        if eligible {
                            prop_assert!(picked);
                        }
                    }
                    Op::Tick(n) => {
                        for _ in 0..n {
                            tick(&mut s);
                        }
                    }
                }
                let index = s.progress_index();
                prop_assert!(index >= last);
                prop_assert!(index <= s.slot_count());
                prop_assert_eq!(s.phase() == SessionPhase::Complete, index == s.slot_count());
                last = index;
            }
        }
    }
}
