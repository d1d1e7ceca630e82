//! Game configuration
//!
//! Every tunable lives here. Loaded from JSON on native targets, falls back
//! to defaults for any missing field.

use std::path::{Path, PathBuf};

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{KEY_FORCE, KEY_REF_STEP};
use crate::error::ConfigError;
use crate::render::Rgb;

/// How the player's arrow keys act on the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Keys add force directly
    #[default]
    InputForce,
    /// Keys move the reference position, a controller chases it
    CloseLoop,
}

/// Where the turret gets its reference position from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AimMode {
    /// Last point of the sequence predictor's forecast
    #[default]
    Predictive,
    /// The target's current position, no predictor thread
    Direct,
}

impl AimMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AimMode::Predictive => "predictive",
            AimMode::Direct => "direct",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub mass: f64,
    pub radius: i32,
    pub noise_std_deviation: f64,
    pub control_mode: ControlMode,
    /// Force per pressed arrow key in `input_force` mode
    pub key_force: f64,
    /// Reference step per pressed arrow key in `close_loop` mode (pixels)
    pub key_ref_step: i32,
    pub color: Rgb,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mass: 2.0,
            radius: 15,
            noise_std_deviation: 0.1,
            control_mode: ControlMode::InputForce,
            key_force: KEY_FORCE,
            key_ref_step: KEY_REF_STEP,
            color: [0, 255, 0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Wall thickness once the ring has closed in
    pub play_thickness: i32,
    pub mass: f64,
    /// Damping copied onto the player while it is stuck in the wall
    pub resistance: f64,
    pub color: Rgb,
    /// Ticks between palette regenerations
    pub animation_period: u32,
    /// Number of nested rings drawn
    pub animation_complexity: usize,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            play_thickness: 100,
            mass: 100.0,
            resistance: 1.0,
            color: [10, 50, 255],
            animation_period: 10,
            animation_complexity: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Acceleration per meter of position error (1/s²)
    pub proportional_gain: f64,
    /// Acceleration per m/s of velocity (1/s)
    pub derivative_gain: f64,
    pub noise_std_deviation: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            proportional_gain: 16.0,
            derivative_gain: 4.0,
            noise_std_deviation: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretConfig {
    pub mass: f64,
    pub radius: i32,
    /// Half-width of the square hit zone around the latched shot position
    pub shot_area: i32,
    /// Ticks spent in fire+boom per cycle
    pub shot_period: i32,
    pub aim_mode: AimMode,
    pub noise_std_deviation: f64,
    pub color: Rgb,
}

impl Default for TurretConfig {
    fn default() -> Self {
        Self {
            mass: 0.1,
            radius: 7,
            shot_area: 20,
            shot_period: 6,
            aim_mode: AimMode::Predictive,
            noise_std_deviation: 0.1,
            color: [255, 0, 0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Length of the observation and prediction windows
    pub input_length: usize,
    pub num_neurons: usize,
    pub learning_rate: f32,
    /// Autoregressive passes per forecast
    pub num_y_pred_output: usize,
    pub checkpoint_path: Option<PathBuf>,
    pub load_checkpoint: bool,
    pub save_on_shutdown: bool,
    pub seed: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            input_length: 100,
            num_neurons: 200,
            learning_rate: 0.001,
            num_y_pred_output: 5,
            checkpoint_path: None,
            load_checkpoint: false,
            save_on_shutdown: false,
            seed: 0x5EED,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub screen_size: IVec2,
    /// Ticks per second
    pub clock_rate: u32,
    pub pixel_meter: f64,
    pub gravity: f64,
    /// Ambient drag restored on the player whenever it is inside the ring
    pub surface_resistance: f64,
    pub seed: u64,
    pub player: PlayerConfig,
    pub boundary: BoundaryConfig,
    pub turret: TurretConfig,
    pub controller: ControllerConfig,
    pub predictor: PredictorConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            screen_size: IVec2::new(1000, 800),
            clock_rate: 30,
            pixel_meter: 100.0,
            gravity: 9.8,
            surface_resistance: 0.1,
            seed: 20_180_501,
            player: PlayerConfig::default(),
            boundary: BoundaryConfig::default(),
            turret: TurretConfig::default(),
            controller: ControllerConfig::default(),
            predictor: PredictorConfig::default(),
        }
    }
}

impl GameConfig {
    /// Reject values that would make the simulation meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_size.x <= 0 || self.screen_size.y <= 0 {
            return Err(ConfigError::InvalidScreen {
                width: self.screen_size.x,
                height: self.screen_size.y,
            });
        }
        if self.clock_rate == 0 {
            return Err(ConfigError::InvalidSampleRate {
                id: 0,
                rate: self.clock_rate as f64,
            });
        }
        if !(self.pixel_meter > 0.0) {
            return Err(ConfigError::InvalidPixelScale(self.pixel_meter));
        }
        for (id, mass) in [
            (0, self.player.mass),
            (1, self.boundary.mass),
            (2, self.turret.mass),
        ] {
            if !(mass > 0.0) {
                return Err(ConfigError::InvalidMass { id, mass });
            }
        }
        if self.turret.shot_period < 1 {
            return Err(ConfigError::InvalidShotPeriod(self.turret.shot_period));
        }
        let p = &self.predictor;
        if p.input_length < 2 {
            return Err(ConfigError::InvalidPredictor(format!(
                "input_length must be at least 2 (got {})",
                p.input_length
            )));
        }
        if p.num_neurons == 0 {
            return Err(ConfigError::InvalidPredictor(
                "num_neurons must be positive".to_string(),
            ));
        }
        if p.num_y_pred_output == 0 {
            return Err(ConfigError::InvalidPredictor(
                "num_y_pred_output must be positive".to_string(),
            ));
        }
        if !(p.learning_rate > 0.0) {
            return Err(ConfigError::InvalidPredictor(format!(
                "learning_rate must be positive (got {})",
                p.learning_rate
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }
}
