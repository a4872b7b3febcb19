//! Road Layers headless host
//!
//! Drives the placement core with a fixed-timestep loop, a toy rigid-body
//! stand-in and a scripted player. Pass a JSON puzzle setup path as the
//! first argument to override the stock road.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::collections::HashMap;

    use glam::Vec3;
    use road_layers::consts::*;
    use road_layers::sim::{
        BodyVelocity, BounceCombine, GameEvent, GameSession, ItemId, ItemState, Physics, Pose,
        RowLayout, SessionPhase,
    };
    use road_layers::{PuzzleError, PuzzleSetup};

    const GRAVITY: f32 = -9.81;
    /// Speed below which a body counts as resting
    const SLEEP_SPEED: f32 = 0.05;
    /// Resting frames before a body falls asleep
    const SLEEP_FRAMES: u32 = 20;

    #[derive(Debug, Clone)]
    struct ToyBody {
        pose: Pose,
        velocity: BodyVelocity,
        kinematic: bool,
        gravity: bool,
        bounciness: f32,
        /// Height of whatever the body lands on
        support_y: f32,
        still_frames: u32,
    }

    /// Vertical-only falling bodies with a bouncy floor. Just enough physics
    /// to exercise the settle path; the real engine lives in the client.
    #[derive(Debug, Default)]
    struct ToyPhysics {
        bodies: HashMap<ItemId, ToyBody>,
    }

    impl ToyPhysics {
        fn add_body(&mut self, id: ItemId, pose: Pose) {
            self.bodies.insert(
                id,
                ToyBody {
                    pose,
                    velocity: BodyVelocity::default(),
                    kinematic: true,
                    gravity: false,
                    bounciness: 0.45,
                    support_y: 0.0,
                    still_frames: 0,
                },
            );
        }

        fn set_support(&mut self, id: ItemId, y: f32) {
            if let Some(body) = self.bodies.get_mut(&id) {
                body.support_y = y;
            }
        }

        fn step(&mut self, dt: f32) {
            for body in self.bodies.values_mut() {
                if body.kinematic {
                    continue;
                }
                if body.gravity {
                    body.velocity.linear.y += GRAVITY * dt;
                }
                body.pose.position += body.velocity.linear * dt;
                if body.pose.position.y < body.support_y {
                    body.pose.position.y = body.support_y;
                    body.velocity.linear.y = -body.velocity.linear.y * body.bounciness;
                }
                body.velocity.angular *= 0.9;

                if body.velocity.linear.length() < SLEEP_SPEED {
                    body.still_frames += 1;
                } else {
                    body.still_frames = 0;
                }
            }
        }
    }

    impl Physics for ToyPhysics {
        fn has_body(&self, item: ItemId) -> bool {
            self.bodies.contains_key(&item)
        }

        fn set_kinematic(&mut self, item: ItemId, kinematic: bool) {
            if let Some(body) = self.bodies.get_mut(&item) {
                body.kinematic = kinematic;
                body.still_frames = 0;
                if kinematic {
                    body.velocity = BodyVelocity::default();
                }
            }
        }

        fn set_gravity(&mut self, item: ItemId, enabled: bool) {
            if let Some(body) = self.bodies.get_mut(&item) {
                body.gravity = enabled;
            }
        }

        fn velocity(&self, item: ItemId) -> Option<BodyVelocity> {
            self.bodies.get(&item).map(|b| b.velocity)
        }

        fn is_asleep(&self, item: ItemId) -> bool {
            self.bodies
                .get(&item)
                .is_some_and(|b| !b.kinematic && b.still_frames >= SLEEP_FRAMES)
        }

        fn pose(&self, item: ItemId) -> Option<Pose> {
            self.bodies.get(&item).map(|b| b.pose)
        }

        fn set_pose(&mut self, item: ItemId, pose: Pose) {
            if let Some(body) = self.bodies.get_mut(&item) {
                body.pose = pose;
            }
        }

        fn set_velocity(&mut self, item: ItemId, velocity: BodyVelocity) {
            if let Some(body) = self.bodies.get_mut(&item) {
                body.velocity = velocity;
            }
        }

        fn set_bounciness(&mut self, item: ItemId, bounciness: f32, _combine: BounceCombine) {
            if let Some(body) = self.bodies.get_mut(&item) {
                body.bounciness = bounciness;
            }
        }

        fn restore_material(&mut self, item: ItemId) {
            if let Some(body) = self.bodies.get_mut(&item) {
                body.bounciness = 0.45;
            }
        }
    }

    /// Scripted player: one wrong drop per run, then the correct order
    #[derive(Debug, Default)]
    struct Player {
        tried_wrong: bool,
    }

    impl Player {
        fn act(
            &mut self,
            session: &mut GameSession<ToyPhysics, RowLayout>,
        ) -> Result<(), PuzzleError> {
            if !session.can_pick_up() {
                return Ok(());
            }
            let Some(expected) = session.expected_kind() else {
                return Ok(());
            };
            let free = |state: ItemState| matches!(state, ItemState::Idle);
            let pick = session.items().iter().find(|item| {
                free(item.state)
                    && if self.tried_wrong {
                        item.kind == expected
                    } else {
                        item.kind != expected
                    }
            });
            let Some(id) = pick.map(|item| item.id) else {
                // Nothing wrong left to try
                self.tried_wrong = true;
                return Ok(());
            };

            if session.on_pickup_attempt(id)? {
                session.drag_to(id, Vec3::ZERO)?;
                session.set_in_zone(id, true)?;
                let outcome = session.on_drop(id)?;
                log::info!("Player dropped {:?}: {:?}", id, outcome);
                self.tried_wrong = true;
            }
            Ok(())
        }
    }

    /// Host loop state
    struct Host {
        session: GameSession<ToyPhysics, RowLayout>,
        player: Player,
        accumulator: f32,
        completions: u32,
    }

    impl Host {
        fn new(setup: &PuzzleSetup) -> Self {
            let mut physics = ToyPhysics::default();
            let spacing = setup.settings.spawn_spacing;
            for (i, _) in setup.items.iter().enumerate() {
                let pos = setup.spawn_origin + Vec3::X * (i as f32 * spacing);
                physics.add_body(ItemId(i as u32), Pose::at(pos));
            }
            // The session configures the layout from the setup
            let layout = RowLayout::new(setup.spawn_origin, setup.settings.seed);

            Self {
                session: GameSession::new(setup, physics, layout),
                player: Player::default(),
                accumulator: 0.0,
                completions: 0,
            }
        }

        /// Run simulation ticks for one rendered frame
        fn update(&mut self, dt: f32) -> Result<(), PuzzleError> {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.player.act(&mut self.session)?;
                self.session.physics_mut().step(SIM_DT);
                self.session.tick(SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
                self.handle_events();
            }
            Ok(())
        }

        fn handle_events(&mut self) {
            for event in self.session.drain_events() {
                match event {
                    GameEvent::DropAccepted { item, slot } => {
                        let floor = self.session.slots().get(slot);
                        if let Some(y) = floor.map(|s| s.final_pose.position.y) {
                            self.session.physics_mut().set_support(item, y);
                        }
                    }
                    GameEvent::SequenceComplete => {
                        self.completions += 1;
                        log::info!("Road complete (run {})", self.completions);
                    }
                    GameEvent::RewardDropped => log::info!("Car dropped onto the finished road"),
                    other => log::debug!("{:?}", other),
                }
            }
        }
    }

    fn load_setup() -> Result<PuzzleSetup, PuzzleError> {
        let setup = match std::env::args().nth(1) {
            Some(path) => {
                let json = std::fs::read_to_string(&path).map_err(|err| {
                    PuzzleError::Configuration(format!("cannot read {path}: {err}"))
                })?;
                PuzzleSetup::from_json(&json)?
            }
            None => PuzzleSetup::road_default(),
        };
        setup.validate()?;
        Ok(setup)
    }

    pub fn run() -> Result<(), PuzzleError> {
        let setup = load_setup()?;
        let mut host = Host::new(&setup);
        host.session.start()?;

        // Uneven frame times to exercise the accumulator
        let frame_times = [1.0 / 55.0, 1.0 / 62.0, 1.0 / 48.0];
        let max_frames = 20_000;
        for frame in 0..max_frames {
            host.update(frame_times[frame % frame_times.len()])?;

            if host.session.phase() == SessionPhase::Complete && host.session.reward_dropped() {
                if host.completions >= 2 {
                    log::info!("Finished after {} frames", frame + 1);
                    return Ok(());
                }
                log::info!("Replaying");
                host.player = Player::default();
                host.session.replay()?;
            }
        }
        Err(PuzzleError::InvariantViolation("demo did not finish"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Road Layers (headless) starting...");

    if let Err(err) = native::run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The core is embedded by the web client; no standalone entry point
}
