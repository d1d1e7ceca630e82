//! Gaussian noise for motion jitter and randomized timers

use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg32;

/// Source of random samples consumed by the simulation
pub trait NoiseSource {
    /// Zero-mean Gaussian sample with the given standard deviation
    fn gaussian(&mut self, std_dev: f64) -> f64;

    /// Uniform random integer in `[0, 2^width)`
    fn bits(&mut self, width: u32) -> u32;
}

/// Seeded PCG-backed Gaussian noise
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    rng: Pcg32,
}

impl GaussianNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl NoiseSource for GaussianNoise {
    fn gaussian(&mut self, std_dev: f64) -> f64 {
        // Zero (or NaN) spread means no noise and no RNG draw
        if !(std_dev > 0.0) {
            return 0.0;
        }
        let z: f64 = self.rng.sample(StandardNormal);
        z * std_dev
    }

    fn bits(&mut self, width: u32) -> u32 {
        if width == 0 {
            return 0;
        }
        let value: u32 = self.rng.random();
        value >> (32 - width.min(32))
    }
}

/// Replays a fixed list of unit samples, scaled by the requested deviation.
/// Cycles when exhausted.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ScriptedNoise {
    samples: Vec<f64>,
    next: usize,
}

#[cfg(test)]
impl ScriptedNoise {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples, next: 0 }
    }

    pub fn silent() -> Self {
        Self::new(vec![0.0])
    }
}

#[cfg(test)]
impl NoiseSource for ScriptedNoise {
    fn gaussian(&mut self, std_dev: f64) -> f64 {
        let z = self.samples[self.next % self.samples.len()];
        self.next += 1;
        z * std_dev
    }

    fn bits(&mut self, _width: u32) -> u32 {
        0
    }
}
