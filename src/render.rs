//! Presenter interface and draw routines
//!
//! The simulation never touches pixels. Each frame it walks the actors and
//! the HUD and issues primitive calls against a [`Presenter`] supplied by
//! whatever windowing layer hosts the game.

use glam::IVec2;

use crate::consts::EXPLOSION_FRAMES;
use crate::sim::actor::{Actor, ActorKind};
use crate::sim::body::Phase;
use crate::sim::boundary::Boundary;
use crate::sim::state::SimulationWorld;
use crate::sim::turret::{AimState, Turret};

pub type Rgb = [u8; 3];

pub const HUD_COLOR: Rgb = [175, 0, 0];
pub const SHOT_COLOR: Rgb = [255, 255, 0];

/// Axis-aligned rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub origin: IVec2,
    pub size: IVec2,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            origin: IVec2::new(x, y),
            size: IVec2::new(w, h),
        }
    }
}

/// Sprites the core asks the presenter to blit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    /// Turret impact explosion, frame `0..EXPLOSION_FRAMES`
    Explosion(u32),
}

/// Drawing surface provided by the host. A stroke width of 0 means filled.
pub trait Presenter {
    fn window_size(&self) -> IVec2;
    fn clear(&mut self, color: Rgb);
    fn draw_circle(&mut self, color: Rgb, center: IVec2, radius: i32, stroke: i32);
    fn draw_polygon(&mut self, color: Rgb, points: &[IVec2], stroke: i32);
    fn draw_rect(&mut self, color: Rgb, rect: Rect, stroke: i32);
    fn blit_image(&mut self, sprite: Sprite, pos: IVec2);
    /// Text centered on `center`
    fn draw_text(&mut self, text: &str, size: u32, color: Rgb, center: IVec2);
    /// Present the finished frame
    fn flip(&mut self) {}
}

fn scaled(color: Rgb, divisor: u8) -> Rgb {
    color.map(|c| c / divisor.max(1))
}

/// Draw one full frame: background, actors, HUD
pub fn draw_frame(world: &SimulationWorld, presenter: &mut dyn Presenter) {
    presenter.clear([0, 0, 0]);
    for actor in &world.actors {
        draw_actor(actor, presenter);
    }
    draw_hud(world, presenter);
    presenter.flip();
}

pub fn draw_actor(actor: &Actor, presenter: &mut dyn Presenter) {
    let body = &actor.body;
    match &actor.kind {
        ActorKind::Player(player) => {
            if body.main_state == Phase::Play {
                presenter.draw_circle(player.color, body.pos, player.radius, 0);
            }
        }
        ActorKind::Boundary(boundary) => draw_boundary(boundary, body.pos, presenter),
        ActorKind::Turret(turret) => {
            if body.main_state == Phase::Play {
                draw_turret(turret, body.pos, body.vel.x * body.vel.y, presenter);
            }
        }
    }
}

/// Nested rectangles, each stroke a fraction of the current wall thickness
fn draw_boundary(boundary: &Boundary, center: IVec2, presenter: &mut dyn Presenter) {
    let half = boundary.surface_size() / 2;
    let corners = [
        IVec2::new(center.x + half.x, center.y - half.y),
        IVec2::new(center.x - half.x, center.y - half.y),
        IVec2::new(center.x - half.x, center.y + half.y),
        IVec2::new(center.x + half.x, center.y + half.y),
    ];
    for (i, color) in boundary.palette().iter().enumerate() {
        let stroke = boundary.thickness / (i as i32 + 1);
        if stroke > 0 {
            presenter.draw_polygon(*color, &corners, stroke);
        }
    }
}

fn draw_turret(turret: &Turret, pos: IVec2, vel_product: f64, presenter: &mut dyn Presenter) {
    let color = turret.color;
    let radius = turret.radius;

    match turret.aim_state {
        AimState::Fire => {
            let reticle = 4 * turret.shot_period / (turret.shot_timer + 1).max(1);
            presenter.draw_circle(SHOT_COLOR, turret.shot_pos, reticle, 3);
        }
        AimState::Boom => {
            if turret.explosion_frame < EXPLOSION_FRAMES {
                presenter.blit_image(
                    Sprite::Explosion(turret.explosion_frame),
                    turret.shot_pos,
                );
            }
        }
        AimState::Loading | AimState::Standby => {}
    }

    // Last few forecast points, darker red further back
    let forecast = turret.forecast_tail(5);
    for (i, point) in forecast.iter().enumerate() {
        let shade = (51 * i).min(255) as u8;
        presenter.draw_circle([shade, 0, 0], *point, radius, i as i32 + 1);
    }

    presenter.draw_circle(color, pos, radius, 0);
    presenter.draw_circle(color, pos, 10 * radius, 3);
    let speed = vel_product.abs();
    presenter.draw_circle(color, pos, speed.sqrt() as i32 + 10, 3);
    presenter.draw_circle(color, pos, speed.cbrt() as i32 + 10, 4);

    // Crosshair
    presenter.draw_rect(
        color,
        Rect::new(pos.x - 12 * radius, pos.y - 2, 24 * radius, 4),
        0,
    );
    presenter.draw_rect(
        color,
        Rect::new(pos.x - 2, pos.y - 12 * radius, 4, 24 * radius),
        0,
    );
    let dim = scaled(color, 2);
    presenter.draw_rect(
        dim,
        Rect::new(pos.x - 12 * radius + 1, pos.y - 1, 24 * radius + 2, 2),
        0,
    );
    presenter.draw_rect(
        dim,
        Rect::new(pos.x - 1, pos.y - 12 * radius + 1, 2, 24 * radius + 2),
        0,
    );
    presenter.draw_circle(scaled(color, 3), pos, radius / 2, 3);
    presenter.draw_circle(scaled(color, 10), pos, radius / 2, 0);
}

pub fn draw_hud(world: &SimulationWorld, presenter: &mut dyn Presenter) {
    let size = presenter.window_size();
    let center_x = size.x / 2;
    let score = world.score().to_string();

    match world.phase() {
        Phase::Start => {
            presenter.draw_text(
                "Machine Revolution",
                70,
                HUD_COLOR,
                IVec2::new(center_x, size.y / 3),
            );
            presenter.draw_text(
                "AI powered by an online recurrent network",
                40,
                HUD_COLOR,
                IVec2::new(center_x, size.y / 2),
            );
            presenter.draw_text(
                "Push Space",
                50,
                HUD_COLOR,
                IVec2::new(center_x, size.y / 2 + size.y / 6),
            );
        }
        Phase::Play => {
            presenter.draw_text(&score, 40, HUD_COLOR, IVec2::new(center_x, size.y / 20));
        }
        Phase::Dead => {
            presenter.draw_text(&score, 40, HUD_COLOR, IVec2::new(center_x, size.y / 2));
            presenter.draw_text(
                "Push Backspace",
                50,
                HUD_COLOR,
                IVec2::new(center_x, size.y / 2 + size.y / 6),
            );
        }
        Phase::PrePlay | Phase::Restart => {}
    }
}

/// Presenter that records calls, for tests and headless runs
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub size: IVec2,
    pub circles: usize,
    pub polygons: usize,
    pub rects: usize,
    pub sprites: Vec<Sprite>,
    pub texts: Vec<String>,
    pub frames: u64,
}

impl RecordingPresenter {
    pub fn new(size: IVec2) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Forget the current frame's calls (frame count is kept)
    pub fn reset(&mut self) {
        self.circles = 0;
        self.polygons = 0;
        self.rects = 0;
        self.sprites.clear();
        self.texts.clear();
    }
}

impl Presenter for RecordingPresenter {
    fn window_size(&self) -> IVec2 {
        self.size
    }

    fn clear(&mut self, _color: Rgb) {
        self.reset();
    }

    fn draw_circle(&mut self, _color: Rgb, _center: IVec2, _radius: i32, _stroke: i32) {
        self.circles += 1;
    }

    fn draw_polygon(&mut self, _color: Rgb, _points: &[IVec2], _stroke: i32) {
        self.polygons += 1;
    }

    fn draw_rect(&mut self, _color: Rgb, _rect: Rect, _stroke: i32) {
        self.rects += 1;
    }

    fn blit_image(&mut self, sprite: Sprite, _pos: IVec2) {
        self.sprites.push(sprite);
    }

    fn draw_text(&mut self, text: &str, _size: u32, _color: Rgb, _center: IVec2) {
        self.texts.push(text.to_string());
    }

    fn flip(&mut self) {
        self.frames += 1;
    }
}
