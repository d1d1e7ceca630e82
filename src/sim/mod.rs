//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same seed and inputs the world
//! evolves identically:
//! - Fixed timestep only
//! - Seeded noise only
//! - Stable iteration order (by actor id)
//! - No rendering or platform dependencies
//!
//! The one nondeterministic input is the predictive turret, whose forecasts
//! arrive from a background thread.

pub mod actor;
pub mod body;
pub mod boundary;
pub mod collision;
pub mod controller;
pub mod noise;
pub mod player;
pub mod state;
pub mod tick;
pub mod turret;

pub use actor::{Actor, ActorKind, Behavior};
pub use body::{Body, BodySpec, Category, Phase};
pub use boundary::{Boundary, Spin};
pub use collision::{Contact, Ring, WallSide, check_collision_events};
pub use controller::Controller;
pub use noise::{GaussianNoise, NoiseSource};
pub use player::Player;
pub use state::{BOUNDARY_ID, PLAYER_ID, Score, SimulationWorld, TURRET_ID};
pub use tick::{TickInput, tick};
pub use turret::{AimState, Turret};
