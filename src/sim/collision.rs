//! Collision detection and response between actors
//!
//! Geometry is deliberately simple: the only solid is the ring wall, whose
//! inner playable area is an axis-aligned rectangle inset by half the wall
//! thickness from every screen edge. Everything else is a point test.

use glam::IVec2;

use super::body::{Category, Phase};

/// Inner playable rectangle of the ring wall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring {
    pub thickness: i32,
    pub surface_size: IVec2,
}

/// Which edge of the ring a point has crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl WallSide {
    /// Axis index and unit sign of the push back toward the interior
    pub fn push(&self) -> (usize, f64) {
        match self {
            WallSide::Left => (0, 1.0),
            WallSide::Right => (0, -1.0),
            WallSide::Top => (1, 1.0),
            WallSide::Bottom => (1, -1.0),
        }
    }
}

impl Ring {
    pub fn new(thickness: i32, surface_size: IVec2) -> Self {
        Self {
            thickness,
            surface_size,
        }
    }

    /// First violated edge, checked left, right, top, bottom.
    ///
    /// Only one side is reported even when a corner is crossed. The inset is
    /// half the thickness rounded down, so odd walls lose their last half pixel.
    pub fn violation(&self, p: IVec2) -> Option<WallSide> {
        let inset = self.thickness.div_euclid(2);
        let size = self.surface_size;
        if inset > p.x {
            Some(WallSide::Left)
        } else if p.x > size.x - inset {
            Some(WallSide::Right)
        } else if inset > p.y {
            Some(WallSide::Top)
        } else if p.y > size.y - inset {
            Some(WallSide::Bottom)
        } else {
            None
        }
    }

    pub fn contains(&self, p: IVec2) -> bool {
        self.violation(p).is_none()
    }
}

/// What one actor can see of another during collision response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub id: u32,
    pub category: Category,
    pub main_state: Phase,
    pub pos: IVec2,
    pub resistance: f64,
    /// Present when the other actor is a ring wall
    pub ring: Option<Ring>,
}

/// Anything that takes part in the pairwise collision pass
pub trait Collide {
    /// Reaction-effect flag
    fn participates(&self) -> bool;
    fn contact(&self) -> Contact;
    fn on_collision(&mut self, other: &Contact);
}

/// Run both directions of the collision rule once for every unordered pair
/// of participating actors.
///
/// Pairs are visited in list order. The second direction sees the first
/// actor as it is after its own response.
pub fn check_collision_events<A: Collide>(actors: &mut [A]) {
    let n = actors.len();
    for i in 0..n {
        if !actors[i].participates() {
            continue;
        }
        for j in (i + 1)..n {
            if !actors[j].participates() {
                continue;
            }
            let a = actors[i].contact();
            let b = actors[j].contact();
            if a.id == b.id {
                continue;
            }
            actors[i].on_collision(&b);
            let a = actors[i].contact();
            actors[j].on_collision(&a);
        }
    }
}

/// Strict square hit test around a latched shot position
pub fn within_shot_area(shot_pos: IVec2, area: i32, p: IVec2) -> bool {
    shot_pos.x - area < p.x
        && p.x < shot_pos.x + area
        && shot_pos.y - area < p.y
        && p.y < shot_pos.y + area
}
