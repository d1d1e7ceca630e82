//! Machine Revolution - survive inside a breathing ring while an AI turret
//! learns how you move and shoots where you are going to be.
//!
//! Core modules:
//! - `sim`: Fixed-timestep simulation (bodies, state machines, collisions, world)
//! - `predictor`: Online recurrent motion predictor running on its own thread
//! - `render`: Presenter interface the simulation draws through
//! - `platform`: Frame pacing and input source abstraction
//! - `settings`: Data-driven game configuration

pub mod error;
pub mod platform;
pub mod predictor;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::{CheckpointError, ConfigError};
pub use settings::GameConfig;

/// Fixed gameplay constants
pub mod consts {
    /// Force applied per pressed arrow key in `input_force` mode
    pub const KEY_FORCE: f64 = 700.0;
    /// Reference position step per pressed arrow key in `close_loop` mode (pixels)
    pub const KEY_REF_STEP: i32 = 5;

    /// Corrective force pushing the player back inside the ring
    pub const WALL_PUSH_FORCE: f64 = 4000.0;
    /// Wall thickness gained each tick the player sits outside the ring
    pub const WALL_GROWTH: i32 = 10;
    /// Wall thickness lost per tick while closing in
    pub const WALL_SHRINK: i32 = 15;

    /// Breathing animation step and span (start/dead phases)
    pub const BREATH_STEP: i32 = 15;
    pub const BREATH_SPAN: i32 = 300;

    /// Score points per second of survival
    pub const SCORE_PER_SECOND: u64 = 100;

    /// Frames in the turret explosion sprite sheet
    pub const EXPLOSION_FRAMES: u32 = 6;
}
