//! AI turret
//!
//! Each play tick the turret feeds the target's position to its sequence
//! predictor and steers toward the furthest forecast point. Firing is a
//! countdown cycle: standby while the timer is above the shot period, one
//! tick of fire (latching the shot position), then boom until the timer runs
//! out and the turret reloads.

use glam::IVec2;

use super::actor::Behavior;
use super::body::{Body, Category, Phase};
use super::collision::{Contact, within_shot_area};
use super::noise::NoiseSource;
use crate::consts::EXPLOSION_FRAMES;
use crate::predictor::{Readiness, SequencePredictor};
use crate::render::Rgb;
use crate::settings::{AimMode, TurretConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AimState {
    /// Waiting for the predictor to come online
    Loading,
    Standby,
    Fire,
    Boom,
}

#[derive(Debug)]
pub struct Turret {
    pub aim_state: AimState,
    pub aim_mode: AimMode,
    pub shot_timer: i32,
    pub shot_period: i32,
    pub shot_area: i32,
    pub shot_pos: IVec2,
    pub radius: i32,
    pub color: Rgb,
    /// Id of the actor being tracked
    pub target: u32,
    /// Current frame of the impact sprite
    pub explosion_frame: u32,
    predictor: Option<SequencePredictor>,
}

impl Turret {
    /// `predictor` is only used in predictive aim mode; pass `None` to have
    /// one spawned here.
    pub fn new(
        config: &TurretConfig,
        target: u32,
        predictor: Option<SequencePredictor>,
        spawn: impl FnOnce() -> SequencePredictor,
        noise: &mut dyn NoiseSource,
    ) -> Self {
        let predictor = match config.aim_mode {
            AimMode::Predictive => Some(predictor.unwrap_or_else(spawn)),
            AimMode::Direct => None,
        };
        let mut turret = Self {
            aim_state: AimState::Loading,
            aim_mode: config.aim_mode,
            shot_timer: 0,
            shot_period: config.shot_period,
            shot_area: config.shot_area,
            shot_pos: IVec2::ZERO,
            radius: config.radius,
            color: config.color,
            target,
            explosion_frame: EXPLOSION_FRAMES,
            predictor,
        };
        turret.reload(noise);
        turret
    }

    /// Direct aim counts as always ready
    pub fn readiness(&self) -> Readiness {
        match &self.predictor {
            Some(predictor) => predictor.readiness(),
            None => Readiness::Online,
        }
    }

    pub fn predictor(&self) -> Option<&SequencePredictor> {
        self.predictor.as_ref()
    }

    /// Hand the predictor over (used to keep a trained model across resets)
    pub fn take_predictor(&mut self) -> Option<SequencePredictor> {
        self.predictor.take()
    }

    /// Last `n` forecast points, oldest first
    pub fn forecast_tail(&self, n: usize) -> Vec<IVec2> {
        let Some(predictor) = &self.predictor else {
            return Vec::new();
        };
        let forecast = predictor.latest();
        let skip = forecast.len().saturating_sub(n);
        forecast[skip..].iter().map(|p| p.as_ivec2()).collect()
    }

    pub fn save_model(&self) {
        if let Some(predictor) = &self.predictor {
            predictor.save_model();
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(predictor) = &mut self.predictor {
            predictor.shutdown();
        }
    }

    fn reload(&mut self, noise: &mut dyn NoiseSource) {
        let period = self.shot_period as f64;
        self.shot_timer = (noise.gaussian(period).abs() + 2.0 * period).floor() as i32;
        self.aim_state = AimState::Loading;
    }

    fn count_down(&mut self, body: &Body, noise: &mut dyn NoiseSource) {
        let previous = self.aim_state;
        if self.shot_timer > self.shot_period {
            self.aim_state = AimState::Standby;
            self.shot_timer -= 1;
        } else if self.shot_timer > self.shot_period - 1 {
            self.aim_state = AimState::Fire;
            self.shot_timer -= 1;
            self.shot_pos = body.pos;
            log::debug!("Turret {} fired at {}", body.id, self.shot_pos);
        } else if self.shot_timer > 0 {
            self.aim_state = AimState::Boom;
            self.shot_timer -= 1;
        } else {
            self.reload(noise);
        }

        match self.aim_state {
            AimState::Fire => self.explosion_frame = 0,
            AimState::Boom if previous == AimState::Boom => {
                self.explosion_frame = (self.explosion_frame + 1).min(EXPLOSION_FRAMES);
            }
            _ => {}
        }
    }
}

impl Behavior for Turret {
    fn machine_state(&mut self, body: &mut Body, noise: &mut dyn NoiseSource) {
        if body.main_state != Phase::Play {
            return;
        }
        match self.aim_state {
            AimState::Loading => {
                if self.readiness() == Readiness::Online {
                    self.aim_state = AimState::Standby;
                }
            }
            AimState::Standby | AimState::Fire | AimState::Boom => self.count_down(body, noise),
        }
    }

    fn natural_forces(&mut self, body: &mut Body, noise: &mut dyn NoiseSource) {
        body.force.x = body.noise(noise);
        body.force.y = body.noise(noise);
    }

    fn ai_action(&mut self, body: &mut Body, others: &[Contact]) {
        let Some(target) = others.iter().find(|c| c.id == self.target) else {
            return;
        };
        match &self.predictor {
            Some(predictor) => {
                predictor.observe(target.pos);
                if let Some(aim) = predictor.aim_point() {
                    body.ref_pos = aim;
                }
            }
            None => body.ref_pos = target.pos,
        }
    }

    fn collision(&mut self, body: &mut Body, other: &Contact) {
        if other.category != Category::Player
            || body.main_state != Phase::Play
            || self.aim_state != AimState::Fire
        {
            return;
        }
        if within_shot_area(self.shot_pos, self.shot_area, other.pos) {
            body.main_state = Phase::Dead;
            log::debug!("Turret {} hit actor {} at {}", body.id, other.id, other.pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::BodySpec;
    use crate::sim::noise::{GaussianNoise, ScriptedNoise};

    fn direct_config() -> TurretConfig {
        TurretConfig {
            aim_mode: AimMode::Direct,
            ..Default::default()
        }
    }

    fn direct_turret(noise: &mut dyn NoiseSource) -> Turret {
        Turret::new(&direct_config(), 0, None, unreachable_spawn, noise)
    }

    fn unreachable_spawn() -> SequencePredictor {
        unreachable!("direct aim never spawns a predictor")
    }

    fn turret_body(pos: IVec2) -> Body {
        let mut spec = BodySpec::new(2, Category::Turret, pos);
        spec.mass = 0.1;
        spec.reaction_effect = true;
        spec.natural_action = true;
        let mut body = Body::new(spec).unwrap();
        body.main_state = Phase::Play;
        body
    }

    fn player_at(pos: IVec2) -> Contact {
        Contact {
            id: 0,
            category: Category::Player,
            main_state: Phase::Play,
            pos,
            resistance: 0.1,
            ring: None,
        }
    }

    #[test]
    fn test_firing_cycle_timing() {
        let mut noise = ScriptedNoise::new(vec![0.5]);
        let mut turret = direct_turret(&mut noise);
        let mut body = turret_body(IVec2::new(300, 200));
        turret.aim_state = AimState::Standby;
        turret.shot_timer = 7;

        turret.machine_state(&mut body, &mut noise);
        assert_eq!(turret.aim_state, AimState::Standby);

        body.pos = IVec2::new(310, 205);
        turret.machine_state(&mut body, &mut noise);
        assert_eq!(turret.aim_state, AimState::Fire);
        assert_eq!(turret.shot_pos, IVec2::new(310, 205));

        body.pos = IVec2::new(320, 210);
        for _ in 3..=7 {
            turret.machine_state(&mut body, &mut noise);
            assert_eq!(turret.aim_state, AimState::Boom);
        }
        assert_eq!(turret.shot_pos, IVec2::new(310, 205));
        assert_eq!(turret.shot_timer, 0);

        turret.machine_state(&mut body, &mut noise);
        assert_eq!(turret.aim_state, AimState::Loading);
        // |0.5·6| + 12 = 15
        assert_eq!(turret.shot_timer, 15);
    }

    #[test]
    fn test_reload_timer_never_negative() {
        let mut noise = GaussianNoise::new(99);
        let mut turret = direct_turret(&mut noise);
        for _ in 0..200 {
            turret.reload(&mut noise);
            assert!(turret.shot_timer >= 2 * turret.shot_period);
        }
    }

    #[test]
    fn test_loading_waits_for_readiness_without_counting() {
        let mut noise = ScriptedNoise::silent();
        let mut turret = direct_turret(&mut noise);
        let mut body = turret_body(IVec2::new(300, 200));
        assert_eq!(turret.aim_state, AimState::Loading);
        let timer = turret.shot_timer;

        turret.machine_state(&mut body, &mut noise);
        assert_eq!(turret.aim_state, AimState::Standby);
        assert_eq!(turret.shot_timer, timer);
    }

    #[test]
    fn test_idle_outside_play() {
        let mut noise = ScriptedNoise::silent();
        let mut turret = direct_turret(&mut noise);
        let mut body = turret_body(IVec2::new(300, 200));
        body.main_state = Phase::PrePlay;
        turret.machine_state(&mut body, &mut noise);
        assert_eq!(turret.aim_state, AimState::Loading);
    }

    #[test]
    fn test_explosion_frames_advance_during_boom() {
        let mut noise = ScriptedNoise::silent();
        let mut turret = direct_turret(&mut noise);
        let mut body = turret_body(IVec2::new(300, 200));
        turret.aim_state = AimState::Standby;
        turret.shot_timer = 6;

        turret.machine_state(&mut body, &mut noise);
        assert_eq!(turret.aim_state, AimState::Fire);
        assert_eq!(turret.explosion_frame, 0);
        turret.machine_state(&mut body, &mut noise);
        assert_eq!(turret.explosion_frame, 0);
        turret.machine_state(&mut body, &mut noise);
        assert_eq!(turret.explosion_frame, 1);
    }

    #[test]
    fn test_hit_only_while_firing() {
        let mut noise = ScriptedNoise::silent();
        let mut turret = direct_turret(&mut noise);
        let mut body = turret_body(IVec2::new(300, 200));
        turret.shot_pos = IVec2::new(500, 400);

        turret.aim_state = AimState::Boom;
        turret.collision(&mut body, &player_at(IVec2::new(505, 395)));
        assert_eq!(body.main_state, Phase::Play);

        turret.aim_state = AimState::Fire;
        turret.collision(&mut body, &player_at(IVec2::new(540, 400)));
        assert_eq!(body.main_state, Phase::Play);

        turret.collision(&mut body, &player_at(IVec2::new(505, 395)));
        assert_eq!(body.main_state, Phase::Dead);
    }

    #[test]
    fn test_direct_aim_tracks_target() {
        let mut noise = ScriptedNoise::silent();
        let mut turret = direct_turret(&mut noise);
        let mut body = turret_body(IVec2::new(300, 200));
        let others = [player_at(IVec2::new(640, 480))];
        turret.ai_action(&mut body, &others);
        assert_eq!(body.ref_pos, IVec2::new(640, 480));
        assert!(turret.forecast_tail(5).is_empty());
    }

    #[test]
    fn test_natural_forces_are_jitter() {
        let mut noise = ScriptedNoise::new(vec![1.0, -1.0]);
        let mut turret = direct_turret(&mut ScriptedNoise::silent());
        let mut body = turret_body(IVec2::new(300, 200));
        body.noise_std_deviation = 0.2;
        turret.natural_forces(&mut body, &mut noise);
        assert!((body.force.x - 0.2).abs() < 1e-12);
        assert!((body.force.y + 0.2).abs() < 1e-12);
    }
}
