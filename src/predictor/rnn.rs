//! Elman recurrent network with a linear output projection
//!
//! `h_t = selu(W_x·x_t + b_h + W_h·h_{t-1})`, `y_t = W_o·h_t + b_o`.
//! Weights live in a candle [`VarMap`]; gradients come from candle's
//! autograd through the unrolled sequence and AdamW (no weight decay)
//! applies them.

use std::sync::PoisonError;

use candle_core::{DType, Device, Module, Result, Tensor};
use candle_nn::{AdamW, Linear, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg32;

/// Features per time step (x, y)
pub const INPUTS: usize = 2;
/// Outputs per time step (x, y)
pub const OUTPUTS: usize = 2;

const SELU_SCALE: f64 = 1.050_700_987_355_480_5;
const SELU_ALPHA: f64 = 1.673_263_242_354_377_3;

pub type Point = [f32; INPUTS];

fn selu(a: &Tensor) -> Result<Tensor> {
    a.elu(SELU_ALPHA)?.affine(SELU_SCALE, 0.0)
}

/// Sequence-to-sequence regressor
pub struct Rnn {
    vars: VarMap,
    input: Linear,
    recurrent: Linear,
    output: Linear,
    optimizer: AdamW,
    hidden: usize,
    device: Device,
}

impl Rnn {
    /// Fresh network with LeCun-normal weights drawn from `seed`
    pub fn new(hidden: usize, learning_rate: f32, seed: u64) -> Result<Self> {
        let device = Device::Cpu;
        let vars = VarMap::new();
        let vb = VarBuilder::from_varmap(&vars, DType::F32, &device);
        let input = candle_nn::linear(INPUTS, hidden, vb.pp("input"))?;
        let recurrent = candle_nn::linear_no_bias(hidden, hidden, vb.pp("recurrent"))?;
        let output = candle_nn::linear(hidden, OUTPUTS, vb.pp("output"))?;
        seed_weights(&vars, seed)?;

        let params = ParamsAdamW {
            lr: f64::from(learning_rate),
            weight_decay: 0.0,
            ..Default::default()
        };
        let optimizer = AdamW::new(vars.all_vars(), params)?;

        Ok(Self {
            vars,
            input,
            recurrent,
            output,
            optimizer,
            hidden,
            device,
        })
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }

    /// Trainable variables, shared with the optimizer
    pub fn vars(&self) -> &VarMap {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VarMap {
        &mut self.vars
    }

    fn to_tensor(&self, points: &[Point]) -> Result<Tensor> {
        let flat: Vec<f32> = points.iter().flatten().copied().collect();
        Tensor::from_vec(flat, (points.len(), INPUTS), &self.device)
    }

    /// Unrolls the cell over `xs` (shape `steps × INPUTS`)
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let steps = xs.dim(0)?;
        let driven = self.input.forward(xs)?;
        let mut state = Tensor::zeros((1, self.hidden), DType::F32, &self.device)?;
        let mut states = Vec::with_capacity(steps);
        for t in 0..steps {
            let pre = (driven.narrow(0, t, 1)? + self.recurrent.forward(&state)?)?;
            state = selu(&pre)?;
            states.push(state.clone());
        }
        self.output.forward(&Tensor::cat(&states, 0)?)
    }

    /// Per-step outputs for an input sequence
    pub fn predict(&self, xs: &[Point]) -> Result<Vec<Point>> {
        if xs.is_empty() {
            return Ok(Vec::new());
        }
        let ys = self.forward(&self.to_tensor(xs)?)?.to_vec2::<f32>()?;
        Ok(ys.into_iter().map(|y| [y[0], y[1]]).collect())
    }

    /// Mean squared error of `predict(xs)` against `targets`
    pub fn loss(&self, xs: &[Point], targets: &[Point]) -> Result<f32> {
        if xs.is_empty() {
            return Ok(0.0);
        }
        let ys = self.forward(&self.to_tensor(xs)?)?;
        candle_nn::loss::mse(&ys, &self.to_tensor(targets)?)?.to_scalar::<f32>()
    }

    /// One optimizer step on a single sequence. Returns the loss before the update.
    pub fn train_step(&mut self, xs: &[Point], targets: &[Point]) -> Result<f32> {
        debug_assert_eq!(xs.len(), targets.len());
        if xs.is_empty() {
            return Ok(0.0);
        }
        let ys = self.forward(&self.to_tensor(xs)?)?;
        let loss = candle_nn::loss::mse(&ys, &self.to_tensor(targets)?)?;
        let value = loss.to_scalar::<f32>()?;
        if value.is_finite() {
            self.optimizer.backward_step(&loss)?;
        }
        Ok(value)
    }
}

/// Overwrites every variable in name order: biases to zero, weights to
/// `N(0, 1/fan_in)`. Candle's own initializers are not seedable on CPU.
fn seed_weights(vars: &VarMap, seed: u64) -> Result<()> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let data = vars.data().lock().unwrap_or_else(PoisonError::into_inner);
    let mut names: Vec<&String> = data.keys().collect();
    names.sort();

    for name in names {
        let var = &data[name];
        if name.ends_with("bias") {
            var.set(&var.zeros_like()?)?;
            continue;
        }
        let fan_in = var.dims().last().copied().unwrap_or(1).max(1);
        let std = (1.0 / fan_in as f32).sqrt();
        let values: Vec<f32> = (0..var.elem_count())
            .map(|_| rng.sample::<f32, _>(StandardNormal) * std)
            .collect();
        var.set(&Tensor::from_vec(values, var.dims(), var.device())?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, offset: usize) -> Vec<Point> {
        (0..len)
            .map(|i| {
                let t = (i + offset) as f32 * 0.05;
                [t - 0.5, 0.3 * (t * 2.0).sin()]
            })
            .collect()
    }

    #[test]
    fn test_output_shape() {
        let rnn = Rnn::new(6, 0.01, 1).unwrap();
        let ys = rnn.predict(&ramp(12, 0)).unwrap();
        assert_eq!(ys.len(), 12);
        assert!(ys.iter().all(|y| y[0].is_finite() && y[1].is_finite()));
        assert!(rnn.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut rnn = Rnn::new(16, 0.01, 42).unwrap();
        let xs = ramp(10, 0);
        let ys = ramp(10, 1);
        let before = rnn.loss(&xs, &ys).unwrap();
        for _ in 0..300 {
            rnn.train_step(&xs, &ys).unwrap();
        }
        let after = rnn.loss(&xs, &ys).unwrap();
        assert!(after < before * 0.5, "loss {before} -> {after}");
    }

    #[test]
    fn test_train_step_reports_loss_before_update() {
        let mut rnn = Rnn::new(8, 0.01, 3).unwrap();
        let xs = ramp(6, 0);
        let ys = ramp(6, 1);
        let before = rnn.loss(&xs, &ys).unwrap();
        let reported = rnn.train_step(&xs, &ys).unwrap();
        assert!((reported - before).abs() < 1e-6);
        assert_ne!(rnn.loss(&xs, &ys).unwrap(), before);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let xs = ramp(7, 0);
        let a = Rnn::new(5, 0.01, 11).unwrap().predict(&xs).unwrap();
        let b = Rnn::new(5, 0.01, 11).unwrap().predict(&xs).unwrap();
        let c = Rnn::new(5, 0.01, 12).unwrap().predict(&xs).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_biases_start_at_zero() {
        let rnn = Rnn::new(4, 0.01, 9).unwrap();
        let data = rnn.vars().data().lock().unwrap();
        let bias = data["input.bias"].to_vec1::<f32>().unwrap();
        assert_eq!(bias, vec![0.0; 4]);
        assert_eq!(data["recurrent.weight"].dims(), &[4, 4]);
        assert!(!data.contains_key("recurrent.bias"));
    }
}
