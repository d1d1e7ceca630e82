//! Player-controlled body

use glam::IVec2;

use super::actor::Behavior;
use super::body::{Body, Category};
use super::collision::Contact;
use super::noise::NoiseSource;
use super::tick::TickInput;
use crate::consts::WALL_PUSH_FORCE;
use crate::render::Rgb;
use crate::settings::{ControlMode, PlayerConfig};

#[derive(Debug, Clone)]
pub struct Player {
    pub control_mode: ControlMode,
    /// Cleared while the player is stuck in the wall
    pub key_events: bool,
    pub radius: i32,
    pub color: Rgb,
    pub key_force: f64,
    pub key_ref_step: i32,
    /// Drag restored when the player is back inside the ring
    surface_resistance: f64,
}

impl Player {
    pub fn new(config: &PlayerConfig, surface_resistance: f64) -> Self {
        Self {
            control_mode: config.control_mode,
            key_events: true,
            radius: config.radius,
            color: config.color,
            key_force: config.key_force,
            key_ref_step: config.key_ref_step,
            surface_resistance,
        }
    }
}

impl Behavior for Player {
    fn natural_forces(&mut self, body: &mut Body, noise: &mut dyn NoiseSource) {
        body.force.x = body.noise(noise);
        body.force.y = body.gravity * body.mass() + body.noise(noise);
    }

    fn key_action(&mut self, body: &mut Body, input: &TickInput) {
        if !self.key_events {
            return;
        }
        // Screen y grows downward
        let dx = input.right as i32 - input.left as i32;
        let dy = input.down as i32 - input.up as i32;
        match self.control_mode {
            ControlMode::InputForce => {
                body.force.x += dx as f64 * self.key_force;
                body.force.y += dy as f64 * self.key_force;
            }
            ControlMode::CloseLoop => {
                body.ref_pos += IVec2::new(dx, dy) * self.key_ref_step;
            }
        }
    }

    fn collision(&mut self, body: &mut Body, other: &Contact) {
        if other.category != Category::Boundary {
            return;
        }
        let Some(ring) = other.ring else {
            return;
        };
        match ring.violation(body.pos) {
            Some(side) => {
                let (axis, sign) = side.push();
                body.force[axis] = sign * WALL_PUSH_FORCE;
                self.key_events = false;
                body.natural_action = false;
                body.resistance = other.resistance;
            }
            None => {
                self.key_events = true;
                body.natural_action = true;
                body.resistance = self.surface_resistance;
            }
        }
    }
}
