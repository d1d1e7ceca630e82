//! Physical state shared by every actor kind
//!
//! Integration is explicit Euler with linear drag and Gaussian forcing.
//! Positions live in integer pixel space; each tick's displacement is
//! truncated toward zero before it is added, so slow bodies can stall.

use glam::{DVec2, IVec2};
use serde::{Deserialize, Serialize};

use super::noise::NoiseSource;
use crate::error::ConfigError;

/// Game phase. The world owns one, every actor carries a synchronized copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Phase {
    /// Title screen, ring breathing
    #[default]
    Start,
    /// Ring closing in toward play thickness
    PrePlay,
    /// Active round
    Play,
    /// Round over (ring burst or player hit)
    Dead,
    /// World rebuild requested
    Restart,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::PrePlay => "pre_play",
            Phase::Play => "play",
            Phase::Dead => "dead",
            Phase::Restart => "restart",
        }
    }
}

/// Actor kind tag used by collision rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Player,
    Boundary,
    Turret,
}

/// Construction parameters for a [`Body`]
#[derive(Debug, Clone)]
pub struct BodySpec {
    pub id: u32,
    pub category: Category,
    pub mass: f64,
    pub resistance: f64,
    pub gravity: f64,
    pub sample_rate: f64,
    pub pixel_meter: f64,
    pub noise_std_deviation: f64,
    pub reaction_effect: bool,
    pub natural_action: bool,
    pub pos: IVec2,
    pub vel: DVec2,
    pub force: DVec2,
}

impl BodySpec {
    pub fn new(id: u32, category: Category, pos: IVec2) -> Self {
        Self {
            id,
            category,
            mass: 1.0,
            resistance: 0.01,
            gravity: 9.8,
            sample_rate: 30.0,
            pixel_meter: 10.0,
            noise_std_deviation: 0.1,
            reaction_effect: false,
            natural_action: false,
            pos,
            vel: DVec2::ZERO,
            force: DVec2::ZERO,
        }
    }
}

/// Common actor record: identity, phase and kinematics
#[derive(Debug, Clone)]
pub struct Body {
    pub id: u32,
    pub category: Category,
    pub main_state: Phase,
    /// Pixel position
    pub pos: IVec2,
    /// Controller target (pixels)
    pub ref_pos: IVec2,
    /// Meters per second
    pub vel: DVec2,
    pub acl: DVec2,
    /// Force applied during the next integration step
    pub force: DVec2,
    /// Controller output for this tick, replaced rather than accumulated
    pub control_force: DVec2,
    mass: f64,
    /// Linear velocity damping per tick, 0 disables
    pub resistance: f64,
    pub gravity: f64,
    sample_period: f64,
    pub pixel_meter: f64,
    pub noise_std_deviation: f64,
    /// Participates in collision detection
    pub reaction_effect: bool,
    /// Natural forces (gravity, jitter) are applied each tick
    pub natural_action: bool,
}

impl Body {
    pub fn new(spec: BodySpec) -> Result<Self, ConfigError> {
        if !(spec.mass > 0.0) {
            return Err(ConfigError::InvalidMass {
                id: spec.id,
                mass: spec.mass,
            });
        }
        if !(spec.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate {
                id: spec.id,
                rate: spec.sample_rate,
            });
        }
        if !(spec.pixel_meter > 0.0) {
            return Err(ConfigError::InvalidPixelScale(spec.pixel_meter));
        }

        Ok(Self {
            id: spec.id,
            category: spec.category,
            main_state: Phase::Start,
            pos: spec.pos,
            ref_pos: spec.pos,
            vel: spec.vel,
            acl: spec.force / spec.mass,
            force: spec.force,
            control_force: DVec2::ZERO,
            mass: spec.mass,
            resistance: spec.resistance,
            gravity: spec.gravity,
            sample_period: 1.0 / spec.sample_rate,
            pixel_meter: spec.pixel_meter,
            noise_std_deviation: spec.noise_std_deviation,
            reaction_effect: spec.reaction_effect,
            natural_action: spec.natural_action,
        })
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// One Gaussian sample at this body's noise level
    pub fn noise(&self, noise: &mut dyn NoiseSource) -> f64 {
        noise.gaussian(self.noise_std_deviation)
    }

    /// Advance one tick.
    ///
    /// Per axis, with `F = force + control_force`: `a = F/m`,
    /// `v += a·dt − v·resistance + noise`,
    /// `p += trunc(v·dt·pixel_meter)`. Noise is drawn fresh for each axis.
    pub fn update_pos(&mut self, noise: &mut dyn NoiseSource) {
        let dt = self.sample_period;
        for axis in 0..2 {
            let acl = (self.force[axis] + self.control_force[axis]) / self.mass;
            self.acl[axis] = acl;
            self.vel[axis] += acl * dt - self.vel[axis] * self.resistance + self.noise(noise);
            self.pos[axis] += (self.vel[axis] * dt * self.pixel_meter).trunc() as i32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::noise::{GaussianNoise, ScriptedNoise};
    use proptest::prelude::*;

    fn falling_body(noise_std: f64) -> Body {
        let mut spec = BodySpec::new(0, Category::Player, IVec2::new(500, 400));
        spec.mass = 2.0;
        spec.resistance = 0.1;
        spec.sample_rate = 30.0;
        spec.pixel_meter = 100.0;
        spec.noise_std_deviation = noise_std;
        spec.force = DVec2::new(0.0, 19.6);
        Body::new(spec).unwrap()
    }

    #[test]
    fn test_rejects_bad_mass_and_rate() {
        let mut spec = BodySpec::new(4, Category::Turret, IVec2::ZERO);
        spec.mass = 0.0;
        assert!(matches!(
            Body::new(spec.clone()),
            Err(ConfigError::InvalidMass { id: 4, .. })
        ));
        spec.mass = 1.0;
        spec.sample_rate = -30.0;
        assert!(matches!(
            Body::new(spec),
            Err(ConfigError::InvalidSampleRate { id: 4, .. })
        ));
    }

    #[test]
    fn test_noiseless_fall_matches_hand_computed() {
        let mut body = falling_body(0.0);
        let mut noise = ScriptedNoise::silent();
        let dt = 1.0 / 30.0;

        // v1 = 9.8/30 = 0.32667 -> dp = trunc(1.0889) = 1
        body.update_pos(&mut noise);
        assert!((body.vel.y - 9.8 * dt).abs() < 1e-12);
        assert_eq!(body.pos, IVec2::new(500, 401));
        assert!((body.acl.y - 9.8).abs() < 1e-12);

        // v2 = 0.32667*0.9 + 0.32667 = 0.62067 -> dp = trunc(2.0689) = 2
        body.update_pos(&mut noise);
        assert!((body.vel.y - (9.8 * dt * 0.9 + 9.8 * dt)).abs() < 1e-12);
        assert_eq!(body.pos.y, 403);

        // v3 = 0.62067*0.9 + 0.32667 = 0.88527 -> dp = 2
        body.update_pos(&mut noise);
        assert_eq!(body.pos.y, 405);
        // v4 = 1.12341 -> dp = 3
        body.update_pos(&mut noise);
        assert_eq!(body.pos.y, 408);
        // v5 = 1.33773 -> dp = 4
        body.update_pos(&mut noise);
        assert_eq!(body.pos.y, 412);
        assert_eq!(body.pos.x, 500);
    }

    #[test]
    fn test_noise_enters_velocity_per_axis() {
        let mut body = falling_body(0.5);
        body.force = DVec2::ZERO;
        // x gets +1.0*0.5, y gets -2.0*0.5
        let mut noise = ScriptedNoise::new(vec![1.0, -2.0]);
        body.update_pos(&mut noise);
        assert!((body.vel.x - 0.5).abs() < 1e-12);
        assert!((body.vel.y + 1.0).abs() < 1e-12);
        // 0.5/30*100 = 1.67 -> 1 ; -1/30*100 = -3.33 -> -3 (toward zero)
        assert_eq!(body.pos, IVec2::new(501, 397));
    }

    #[test]
    fn test_control_force_adds_to_applied_force() {
        let mut body = falling_body(0.0);
        body.force = DVec2::new(10.0, 0.0);
        body.control_force = DVec2::new(-4.0, 6.0);
        body.update_pos(&mut ScriptedNoise::silent());
        assert!((body.acl.x - 3.0).abs() < 1e-12);
        assert!((body.acl.y - 3.0).abs() < 1e-12);
        // Integration leaves both inputs alone
        assert_eq!(body.control_force, DVec2::new(-4.0, 6.0));
    }

    #[test]
    fn test_slow_motion_truncates_to_zero() {
        let mut spec = BodySpec::new(0, Category::Player, IVec2::new(10, 10));
        spec.vel = DVec2::new(0.2, -0.2);
        spec.resistance = 0.0;
        spec.pixel_meter = 100.0;
        spec.noise_std_deviation = 0.0;
        let mut body = Body::new(spec).unwrap();
        let mut noise = ScriptedNoise::silent();
        for _ in 0..10 {
            body.update_pos(&mut noise);
        }
        // 0.2/30*100 = 0.67 px per tick never accumulates
        assert_eq!(body.pos, IVec2::new(10, 10));
    }

    proptest! {
        #[test]
        fn prop_seeded_integration_is_deterministic(
            seed in any::<u64>(),
            mass in 0.01f64..100.0,
            rate in 1.0f64..240.0,
            fx in -1000.0f64..1000.0,
            fy in -1000.0f64..1000.0,
        ) {
            let mut spec = BodySpec::new(1, Category::Turret, IVec2::new(300, 300));
            spec.mass = mass;
            spec.sample_rate = rate;
            spec.force = DVec2::new(fx, fy);
            let mut a = Body::new(spec.clone()).unwrap();
            let mut b = Body::new(spec).unwrap();
            let mut na = GaussianNoise::new(seed);
            let mut nb = GaussianNoise::new(seed);
            for _ in 0..5 {
                a.update_pos(&mut na);
                b.update_pos(&mut nb);
            }
            prop_assert_eq!(a.pos, b.pos);
            prop_assert_eq!(a.vel, b.vel);
        }
    }
}
