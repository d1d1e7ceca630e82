//! Actors: a shared body record plus per-kind behavior
//!
//! The set of kinds is closed, so dispatch goes through [`ActorKind`] to a
//! [`Behavior`] implementation rather than through boxed trait objects.

use super::body::Body;
use super::boundary::Boundary;
use super::collision::{Collide, Contact};
use super::controller::Controller;
use super::noise::NoiseSource;
use super::player::Player;
use super::tick::TickInput;
use super::turret::Turret;

/// Per-kind hooks the world calls each tick. Every hook defaults to a no-op.
pub trait Behavior {
    /// Advance the kind's own state machine
    fn machine_state(&mut self, _body: &mut Body, _noise: &mut dyn NoiseSource) {}

    /// Gravity and jitter. Only called while `body.natural_action` is set.
    fn natural_forces(&mut self, _body: &mut Body, _noise: &mut dyn NoiseSource) {}

    /// React to the keyboard snapshot
    fn key_action(&mut self, _body: &mut Body, _input: &TickInput) {}

    /// Look at the other actors and pick a reference position
    fn ai_action(&mut self, _body: &mut Body, _others: &[Contact]) {}

    fn collision(&mut self, _body: &mut Body, _other: &Contact) {}

    /// Extra collision data this kind exposes to others
    fn decorate(&self, _contact: &mut Contact) {}
}

#[derive(Debug)]
pub enum ActorKind {
    Player(Player),
    Boundary(Boundary),
    Turret(Turret),
}

impl ActorKind {
    fn behavior(&self) -> &dyn Behavior {
        match self {
            ActorKind::Player(p) => p,
            ActorKind::Boundary(b) => b,
            ActorKind::Turret(t) => t,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn Behavior {
        match self {
            ActorKind::Player(p) => p,
            ActorKind::Boundary(b) => b,
            ActorKind::Turret(t) => t,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            ActorKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_boundary(&self) -> Option<&Boundary> {
        match self {
            ActorKind::Boundary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_boundary_mut(&mut self) -> Option<&mut Boundary> {
        match self {
            ActorKind::Boundary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_turret(&self) -> Option<&Turret> {
        match self {
            ActorKind::Turret(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_turret_mut(&mut self) -> Option<&mut Turret> {
        match self {
            ActorKind::Turret(t) => Some(t),
            _ => None,
        }
    }
}

/// One simulated entity
#[derive(Debug)]
pub struct Actor {
    pub body: Body,
    pub kind: ActorKind,
    /// Drives `body.control_force` toward `body.ref_pos` when present
    pub controller: Option<Controller>,
}

impl Actor {
    pub fn new(body: Body, kind: ActorKind) -> Self {
        Self {
            body,
            kind,
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn machine_state(&mut self, noise: &mut dyn NoiseSource) {
        self.kind.behavior_mut().machine_state(&mut self.body, noise);
    }

    pub fn natural_forces(&mut self, noise: &mut dyn NoiseSource) {
        if self.body.natural_action {
            self.kind.behavior_mut().natural_forces(&mut self.body, noise);
        }
    }

    pub fn key_action(&mut self, input: &TickInput) {
        self.kind.behavior_mut().key_action(&mut self.body, input);
    }

    pub fn ai_action(&mut self, others: &[Contact]) {
        self.kind.behavior_mut().ai_action(&mut self.body, others);
    }

    /// Recompute this tick's corrective force toward `ref_pos`
    pub fn control(&mut self, noise: &mut dyn NoiseSource) {
        if let Some(controller) = &self.controller {
            self.body.control_force =
                controller.compute_action(&self.body, self.body.ref_pos, noise);
        }
    }

    pub fn update_pos(&mut self, noise: &mut dyn NoiseSource) {
        self.body.update_pos(noise);
    }
}

impl Collide for Actor {
    fn participates(&self) -> bool {
        self.body.reaction_effect
    }

    fn contact(&self) -> Contact {
        let mut contact = Contact {
            id: self.body.id,
            category: self.body.category,
            main_state: self.body.main_state,
            pos: self.body.pos,
            resistance: self.body.resistance,
            ring: None,
        };
        self.kind.behavior().decorate(&mut contact);
        contact
    }

    fn on_collision(&mut self, other: &Contact) {
        self.kind.behavior_mut().collision(&mut self.body, other);
    }
}
