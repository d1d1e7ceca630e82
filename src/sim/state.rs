//! Simulation world: actors, game phase, clock and score
//!
//! The world owns everything the tick loop mutates. It is built once from a
//! validated [`GameConfig`] and rebuilt in place when a round is restarted.

use glam::IVec2;

use super::actor::{Actor, ActorKind};
use super::body::{Body, BodySpec, Category, Phase};
use super::boundary::Boundary;
use super::collision::{Collide, Contact};
use super::controller::Controller;
use super::noise::GaussianNoise;
use super::player::Player;
use super::turret::Turret;
use crate::consts::SCORE_PER_SECOND;
use crate::error::ConfigError;
use crate::predictor::SequencePredictor;
use crate::settings::{ControlMode, GameConfig};

pub const PLAYER_ID: u32 = 0;
pub const BOUNDARY_ID: u32 = 1;
pub const TURRET_ID: u32 = 2;

/// Survival time in play, measured in ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub start_tick: u64,
    pub end_tick: u64,
    pub points: u64,
}

impl Score {
    /// Points for the ticks between start and end at `clock_rate` Hz
    pub fn update(&mut self, now: u64, clock_rate: u32) {
        self.end_tick = now;
        let elapsed = self.end_tick.saturating_sub(self.start_tick);
        self.points = elapsed * SCORE_PER_SECOND / u64::from(clock_rate.max(1));
    }
}

#[derive(Debug)]
pub struct SimulationWorld {
    pub phase: Phase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Ordered by id; order decides collision pairing
    pub actors: Vec<Actor>,
    pub score: Score,
    /// Number of in-place resets so far
    pub resets: u64,
    pub(crate) noise: GaussianNoise,
    closed: bool,
    config: GameConfig,
}

impl SimulationWorld {
    /// Validate `config` and build the initial actors
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut noise = GaussianNoise::new(config.seed);
        let actors = build_actors(&config, None, &mut noise)?;
        log::info!(
            "World created: {}x{} @ {} Hz, turret aim {}",
            config.screen_size.x,
            config.screen_size.y,
            config.clock_rate,
            config.turret.aim_mode.as_str()
        );
        Ok(Self {
            phase: Phase::Start,
            time_ticks: 0,
            actors,
            score: Score::default(),
            resets: 0,
            noise,
            closed: false,
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score.points
    }

    /// Rebuild every actor and start over from the title phase.
    ///
    /// The turret's predictor survives the reset with its observation
    /// window cleared, so the model keeps what it learned last round.
    pub fn reset(&mut self) {
        self.resets += 1;
        let carried = self
            .actors
            .iter_mut()
            .find_map(|a| a.kind.as_turret_mut())
            .and_then(Turret::take_predictor);
        if let Some(predictor) = &carried {
            predictor.clear_buffer();
        }

        self.noise = GaussianNoise::new(self.config.seed.wrapping_add(self.resets));
        match build_actors(&self.config, carried, &mut self.noise) {
            Ok(actors) => self.actors = actors,
            Err(e) => {
                log::error!("World reset failed: {e}");
                self.close();
                return;
            }
        }
        self.phase = Phase::Start;
        self.time_ticks = 0;
        self.score = Score::default();
        log::info!("World reset ({} so far)", self.resets);
    }

    /// Stop the world and shut every predictor down
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for actor in &mut self.actors {
            if let Some(turret) = actor.kind.as_turret_mut() {
                turret.shutdown();
            }
        }
        log::info!("World closed at tick {}", self.time_ticks);
    }

    /// Ask every predictor to persist its weights
    pub fn save_models(&self) {
        for turret in self.actors.iter().filter_map(|a| a.kind.as_turret()) {
            turret.save_model();
        }
    }

    pub fn actor(&self, id: u32) -> Option<&Actor> {
        self.actors.iter().find(|a| a.body.id == id)
    }

    pub fn actor_mut(&mut self, id: u32) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.body.id == id)
    }

    pub fn player(&self) -> Option<&Body> {
        self.actor(PLAYER_ID).map(|a| &a.body)
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.actor(BOUNDARY_ID).and_then(|a| a.kind.as_boundary())
    }

    pub fn boundary_mut(&mut self) -> Option<&mut Boundary> {
        self.actor_mut(BOUNDARY_ID)
            .and_then(|a| a.kind.as_boundary_mut())
    }

    pub fn turret(&self) -> Option<&Turret> {
        self.actor(TURRET_ID).and_then(|a| a.kind.as_turret())
    }

    pub fn turret_mut(&mut self) -> Option<&mut Turret> {
        self.actor_mut(TURRET_ID).and_then(|a| a.kind.as_turret_mut())
    }

    /// Snapshot of every actor as seen by the others
    pub fn contacts(&self) -> Vec<Contact> {
        self.actors.iter().map(Collide::contact).collect()
    }
}

fn base_spec(config: &GameConfig, id: u32, category: Category, pos: IVec2) -> BodySpec {
    let mut spec = BodySpec::new(id, category, pos);
    spec.gravity = config.gravity;
    spec.sample_rate = f64::from(config.clock_rate);
    spec.pixel_meter = config.pixel_meter;
    spec
}

/// Player at the center, ring around the screen, turret in the far corner
fn build_actors(
    config: &GameConfig,
    predictor: Option<SequencePredictor>,
    noise: &mut GaussianNoise,
) -> Result<Vec<Actor>, ConfigError> {
    let screen = config.screen_size;
    let center = screen / 2;

    let mut spec = base_spec(config, PLAYER_ID, Category::Player, center);
    spec.mass = config.player.mass;
    spec.resistance = config.surface_resistance;
    spec.noise_std_deviation = config.player.noise_std_deviation;
    spec.reaction_effect = true;
    spec.natural_action = true;
    let mut player = Actor::new(
        Body::new(spec)?,
        ActorKind::Player(Player::new(&config.player, config.surface_resistance)),
    );
    if config.player.control_mode == ControlMode::CloseLoop {
        player = player.with_controller(Controller::new(&config.controller, screen));
    }

    let mut spec = base_spec(config, BOUNDARY_ID, Category::Boundary, center);
    spec.mass = config.boundary.mass;
    spec.resistance = config.boundary.resistance;
    spec.noise_std_deviation = 0.0;
    spec.reaction_effect = true;
    let boundary = Actor::new(
        Body::new(spec)?,
        ActorKind::Boundary(Boundary::new(&config.boundary, screen, noise)),
    );

    let mut spec = base_spec(config, TURRET_ID, Category::Turret, screen);
    spec.mass = config.turret.mass;
    spec.resistance = config.surface_resistance;
    spec.noise_std_deviation = config.turret.noise_std_deviation;
    spec.reaction_effect = true;
    spec.natural_action = true;
    let turret = Turret::new(
        &config.turret,
        PLAYER_ID,
        predictor,
        || SequencePredictor::spawn(&config.predictor, screen),
        noise,
    );
    let turret = Actor::new(Body::new(spec)?, ActorKind::Turret(turret))
        .with_controller(Controller::new(&config.controller, screen));

    Ok(vec![player, boundary, turret])
}
