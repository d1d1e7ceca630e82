//! Closed-loop position controller
//!
//! Proportional-derivative law toward a reference pixel position with its
//! own Gaussian noise injection. Holds configuration only; every call is a
//! pure function of the body snapshot, the reference and the noise draw.

use glam::{DVec2, IVec2};

use super::body::Body;
use super::noise::NoiseSource;
use crate::settings::ControllerConfig;

#[derive(Debug, Clone)]
pub struct Controller {
    proportional_gain: f64,
    derivative_gain: f64,
    noise_std_deviation: f64,
    /// References are clamped into `[0, screen_size]`
    screen_size: IVec2,
}

impl Controller {
    pub fn new(config: &ControllerConfig, screen_size: IVec2) -> Self {
        Self {
            proportional_gain: config.proportional_gain,
            derivative_gain: config.derivative_gain,
            noise_std_deviation: config.noise_std_deviation,
            screen_size,
        }
    }

    /// Corrective force driving `body` toward `reference`.
    ///
    /// The position error is converted to meters so gains are independent
    /// of the pixel scale: `F = m·(kp·e − kd·v) + noise`.
    pub fn compute_action(
        &self,
        body: &Body,
        reference: IVec2,
        noise: &mut dyn NoiseSource,
    ) -> DVec2 {
        let reference = reference.clamp(IVec2::ZERO, self.screen_size);
        let error = (reference - body.pos).as_dvec2() / body.pixel_meter;
        let accel = error * self.proportional_gain - body.vel * self.derivative_gain;
        let jitter = DVec2::new(
            noise.gaussian(self.noise_std_deviation),
            noise.gaussian(self.noise_std_deviation),
        );
        accel * body.mass() + jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{BodySpec, Category};
    use crate::sim::noise::ScriptedNoise;

    fn controller() -> Controller {
        let config = ControllerConfig {
            proportional_gain: 16.0,
            derivative_gain: 4.0,
            noise_std_deviation: 0.0,
        };
        Controller::new(&config, IVec2::new(1000, 800))
    }

    fn body_at(pos: IVec2) -> Body {
        let mut spec = BodySpec::new(2, Category::Turret, pos);
        spec.mass = 0.5;
        spec.pixel_meter = 100.0;
        spec.resistance = 0.1;
        spec.noise_std_deviation = 0.0;
        Body::new(spec).unwrap()
    }

    #[test]
    fn test_force_points_at_reference() {
        let body = body_at(IVec2::new(500, 400));
        let force = controller().compute_action(
            &body,
            IVec2::new(600, 300),
            &mut ScriptedNoise::silent(),
        );
        // 1 m error each way, kp 16, mass 0.5
        assert!((force.x - 8.0).abs() < 1e-9);
        assert!((force.y + 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_is_damped() {
        let mut body = body_at(IVec2::new(500, 400));
        body.vel = DVec2::new(2.0, 0.0);
        let force = controller().compute_action(
            &body,
            IVec2::new(500, 400),
            &mut ScriptedNoise::silent(),
        );
        assert!((force.x + 4.0).abs() < 1e-9);
        assert_eq!(force.y, 0.0);
    }

    #[test]
    fn test_reference_clamped_to_screen() {
        let body = body_at(IVec2::new(990, 400));
        let force = controller().compute_action(
            &body,
            IVec2::new(5000, 400),
            &mut ScriptedNoise::silent(),
        );
        // clamped to x = 1000 -> 0.1 m error
        assert!((force.x - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_closed_loop_converges() {
        let mut body = body_at(IVec2::new(100, 100));
        let target = IVec2::new(700, 500);
        let ctrl = controller();
        let mut noise = ScriptedNoise::silent();
        for _ in 0..300 {
            body.force = ctrl.compute_action(&body, target, &mut noise);
            body.update_pos(&mut noise);
        }
        // Truncation stalls the body once a tick's displacement drops below 1 px
        let miss = (body.pos - target).abs();
        assert!(miss.x <= 15 && miss.y <= 15, "ended at {:?}", body.pos);
    }
}
