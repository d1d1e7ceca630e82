//! Ring wall around the playable area
//!
//! Lifecycle per main state:
//! - `Start` / `Dead`: breathing animation around `start_thickness`
//! - `PrePlay`: closes in by [`WALL_SHRINK`] per tick, then enters `Play`
//! - `Play`: only grows (player contact); bursting the screen means `Dead`
//!
//! The palette is regenerated every `animation_period` ticks whatever the
//! main state.

use glam::IVec2;

use super::actor::Behavior;
use super::body::{Body, Category, Phase};
use super::collision::{Contact, Ring};
use super::noise::NoiseSource;
use crate::consts::{BREATH_SPAN, BREATH_STEP, WALL_GROWTH, WALL_SHRINK};
use crate::render::Rgb;
use crate::settings::BoundaryConfig;

/// Direction of the breathing animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct Boundary {
    pub start_thickness: i32,
    pub play_thickness: i32,
    pub thickness: i32,
    pub breath_timer: i32,
    pub spin: Spin,
    animation_period: u32,
    animation_timer: u32,
    complexity: usize,
    base_color: Rgb,
    palette: Vec<Rgb>,
    surface_size: IVec2,
}

impl Boundary {
    pub fn new(config: &BoundaryConfig, surface_size: IVec2, noise: &mut dyn NoiseSource) -> Self {
        let start_thickness = 2 * surface_size.x;
        let mut boundary = Self {
            start_thickness,
            play_thickness: config.play_thickness,
            thickness: start_thickness,
            breath_timer: 0,
            spin: Spin::Up,
            animation_period: config.animation_period.max(1),
            animation_timer: 0,
            complexity: config.animation_complexity,
            base_color: config.color,
            palette: Vec::new(),
            surface_size,
        };
        boundary.regenerate_palette(noise);
        boundary
    }

    pub fn ring(&self) -> Ring {
        Ring::new(self.thickness, self.surface_size)
    }

    pub fn surface_size(&self) -> IVec2 {
        self.surface_size
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    fn regenerate_palette(&mut self, noise: &mut dyn NoiseSource) {
        let [r, g, b] = self.base_color;
        self.palette = (0..self.complexity)
            .map(|_| {
                [
                    r.saturating_add(noise.bits(5) as u8),
                    g.saturating_add(noise.bits(6) as u8),
                    b.saturating_sub(noise.bits(7) as u8),
                ]
            })
            .collect();
    }

    fn breathe(&mut self) {
        match self.spin {
            Spin::Up => self.breath_timer += BREATH_STEP,
            Spin::Down => self.breath_timer -= BREATH_STEP,
        }
        self.thickness = self.start_thickness + self.breath_timer;
        if self.breath_timer >= BREATH_SPAN {
            self.spin = Spin::Down;
        } else if self.breath_timer <= 0 {
            self.spin = Spin::Up;
        }
    }
}

impl Behavior for Boundary {
    fn machine_state(&mut self, body: &mut Body, noise: &mut dyn NoiseSource) {
        self.animation_timer += 1;
        if self.animation_timer >= self.animation_period {
            self.animation_timer = 0;
            self.regenerate_palette(noise);
        }

        match body.main_state {
            Phase::Start | Phase::Dead => self.breathe(),
            Phase::PrePlay => {
                self.thickness -= WALL_SHRINK;
                if self.thickness <= self.play_thickness {
                    self.thickness = self.play_thickness;
                    body.main_state = Phase::Play;
                    log::debug!("Ring closed at thickness {}", self.thickness);
                }
            }
            Phase::Play => {
                if self.thickness > self.surface_size.x || self.thickness > self.surface_size.y {
                    body.main_state = Phase::Dead;
                    log::debug!("Ring burst at thickness {}", self.thickness);
                }
            }
            Phase::Restart => {}
        }
    }

    fn collision(&mut self, _body: &mut Body, other: &Contact) {
        if other.category == Category::Player && !self.ring().contains(other.pos) {
            self.thickness += WALL_GROWTH;
        }
    }

    fn decorate(&self, contact: &mut Contact) {
        contact.ring = Some(self.ring());
    }
}
