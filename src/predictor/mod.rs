//! Online motion predictor
//!
//! A [`SequencePredictor`] owns one background thread that trains a small
//! recurrent network on the stream of observed positions and republishes a
//! forecast after every training step. The simulation thread never blocks
//! on it:
//! - observations and commands go in through a crossbeam channel
//! - forecasts come out as an `Arc` snapshot swapped under a mutex
//! - readiness and shutdown are atomics
//!
//! Failures on the worker are logged there and never cross the boundary.

pub mod checkpoint;
pub mod rnn;
pub mod window;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use glam::{DVec2, IVec2};

use self::rnn::{Point, Rnn};
use self::window::RollingWindow;
use crate::settings::PredictorConfig;

/// How often an idle worker wakes up to look at the shutdown flag
const IDLE_POLL: Duration = Duration::from_millis(20);

/// Whether the predictor has initialized and is publishing forecasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Offline,
    Online,
}

enum Request {
    Observe(DVec2),
    ClearBuffer,
    SaveModel,
}

/// State visible to both threads
struct Shared {
    online: AtomicBool,
    shutdown: AtomicBool,
    /// Latest completed forecast, oldest to newest
    forecast: Mutex<Arc<[DVec2]>>,
    /// Number of forecasts published
    generation: AtomicU64,
}

impl Shared {
    fn publish(&self, forecast: Arc<[DVec2]>) {
        *self.forecast.lock().unwrap_or_else(PoisonError::into_inner) = forecast;
        self.generation.fetch_add(1, Ordering::Release);
    }
}

/// Maps pixel coordinates to roughly `[-1, 1]` and back
#[derive(Debug, Clone, Copy)]
struct Normalizer {
    center: DVec2,
    half: DVec2,
}

impl Normalizer {
    fn new(surface_size: IVec2) -> Self {
        let half = (surface_size.as_dvec2() / 2.0).max(DVec2::ONE);
        Self {
            center: surface_size.as_dvec2() / 2.0,
            half,
        }
    }

    fn encode(&self, p: DVec2) -> Point {
        let n = (p - self.center) / self.half;
        [n.x as f32, n.y as f32]
    }

    fn decode(&self, p: Point) -> DVec2 {
        DVec2::new(p[0] as f64, p[1] as f64) * self.half + self.center
    }
}

/// Handle to a running predictor. Dropping it shuts the worker down.
pub struct SequencePredictor {
    requests: Sender<Request>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    input_length: usize,
}

impl SequencePredictor {
    /// Starts the worker thread. The predictor is `Offline` until the
    /// worker has built (or loaded) its model.
    pub fn spawn(config: &PredictorConfig, surface_size: IVec2) -> Self {
        let input_length = config.input_length.max(1);
        let center = surface_size.as_dvec2() / 2.0;
        let shared = Arc::new(Shared {
            online: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            forecast: Mutex::new(vec![center; input_length].into()),
            generation: AtomicU64::new(0),
        });
        let (tx, rx) = crossbeam_channel::unbounded();

        let worker = Worker::new(config, surface_size, rx, Arc::clone(&shared));
        let handle = std::thread::Builder::new()
            .name("sequence-predictor".to_string())
            .spawn(move || worker.run());

        let worker = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to start predictor thread: {e}");
                None
            }
        };

        Self {
            requests: tx,
            shared,
            worker,
            input_length,
        }
    }

    pub fn readiness(&self) -> Readiness {
        if self.shared.online.load(Ordering::Acquire) {
            Readiness::Online
        } else {
            Readiness::Offline
        }
    }

    pub fn input_length(&self) -> usize {
        self.input_length
    }

    /// Queue a new observed position
    pub fn observe(&self, point: IVec2) {
        self.send(Request::Observe(point.as_dvec2()));
    }

    /// Reset the observation window to the screen center
    pub fn clear_buffer(&self) {
        self.send(Request::ClearBuffer);
    }

    /// Persist weights to the configured checkpoint path
    pub fn save_model(&self) {
        self.send(Request::SaveModel);
    }

    /// Most recently completed forecast (never blocks on training)
    pub fn latest(&self) -> Arc<[DVec2]> {
        Arc::clone(
            &self
                .shared
                .forecast
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Furthest-ahead forecast point, snapped to pixels
    pub fn aim_point(&self) -> Option<IVec2> {
        self.latest().last().map(|p| p.as_ivec2())
    }

    /// Number of forecasts published so far
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// Cooperative shutdown: waits for the in-flight step to finish
    pub fn shutdown(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Predictor thread panicked");
            }
        }
    }

    fn send(&self, request: Request) {
        // A dead worker leaves readiness where it was; nothing to report here
        let _ = self.requests.send(request);
    }
}

impl Drop for SequencePredictor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SequencePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequencePredictor")
            .field("readiness", &self.readiness())
            .field("input_length", &self.input_length)
            .field("generation", &self.generation())
            .finish()
    }
}

/// Background training and forecasting loop
struct Worker {
    window: RollingWindow<Point>,
    scale: Normalizer,
    hidden: usize,
    horizon: usize,
    input_length: usize,
    checkpoint_path: Option<PathBuf>,
    load_checkpoint: bool,
    save_on_shutdown: bool,
    requests: Receiver<Request>,
    shared: Arc<Shared>,
    seed: u64,
    learning_rate: f32,
}

impl Worker {
    fn new(
        config: &PredictorConfig,
        surface_size: IVec2,
        requests: Receiver<Request>,
        shared: Arc<Shared>,
    ) -> Self {
        let input_length = config.input_length.max(1);
        Self {
            window: RollingWindow::filled(input_length, [0.0, 0.0]),
            scale: Normalizer::new(surface_size),
            hidden: config.num_neurons.max(1),
            horizon: config.num_y_pred_output.max(1),
            input_length,
            checkpoint_path: config.checkpoint_path.clone(),
            load_checkpoint: config.load_checkpoint,
            save_on_shutdown: config.save_on_shutdown,
            requests,
            shared,
            seed: config.seed,
            learning_rate: config.learning_rate,
        }
    }

    fn run(mut self) {
        let mut rnn = match self.init_model() {
            Ok(rnn) => rnn,
            Err(e) => {
                log::error!("Predictor model could not be built, staying offline: {e}");
                return;
            }
        };
        self.shared.online.store(true, Ordering::Release);
        log::info!(
            "Predictor online ({} neurons, window {}, horizon {})",
            rnn.hidden(),
            self.input_length,
            self.horizon
        );

        while !self.shared.shutdown.load(Ordering::Acquire) {
            match self.requests.recv_timeout(IDLE_POLL) {
                Ok(first) => {
                    let mut batch = vec![first];
                    batch.extend(self.requests.try_iter());
                    self.process(&mut rnn, batch);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if self.save_on_shutdown {
            self.save(&rnn);
        }
        self.shared.online.store(false, Ordering::Release);
        log::info!("Predictor offline");
    }

    fn fresh_model(&self) -> candle_core::Result<Rnn> {
        Rnn::new(self.hidden, self.learning_rate, self.seed)
    }

    fn init_model(&self) -> candle_core::Result<Rnn> {
        let mut rnn = self.fresh_model()?;
        if !self.load_checkpoint {
            return Ok(rnn);
        }
        let Some(path) = self.checkpoint_path.as_deref() else {
            return Ok(rnn);
        };
        match checkpoint::load(path, &mut rnn) {
            Ok(()) => log::info!("Loaded predictor checkpoint {}", path.display()),
            Err(e) => {
                log::warn!("Ignoring predictor checkpoint {}: {e}", path.display());
                // A failed load can leave some variables overwritten
                rnn = self.fresh_model()?;
            }
        }
        Ok(rnn)
    }

    fn process(&mut self, rnn: &mut Rnn, batch: Vec<Request>) {
        let mut pending: Vec<Point> = Vec::new();
        let mut save = false;
        for request in batch {
            match request {
                Request::Observe(p) => pending.push(self.scale.encode(p)),
                Request::ClearBuffer => {
                    pending.clear();
                    self.window.reset([0.0, 0.0]);
                }
                Request::SaveModel => save = true,
            }
        }

        if save {
            self.save(rnn);
        }

        let Some((&newest, backlog)) = pending.split_last() else {
            return;
        };
        for &p in backlog {
            self.window.push(p);
        }

        // Next-step regression: targets are the inputs shifted by one
        let inputs = self.window.to_vec();
        self.window.push(newest);
        let targets = self.window.to_vec();
        let loss = match rnn.train_step(&inputs, &targets) {
            Ok(loss) => loss,
            Err(e) => {
                log::warn!("Predictor training step failed: {e}");
                return;
            }
        };
        if !loss.is_finite() {
            log::warn!("Predictor loss diverged ({loss}), reinitializing weights");
            self.seed = self.seed.wrapping_add(1);
            match self.fresh_model() {
                Ok(fresh) => *rnn = fresh,
                Err(e) => log::warn!("Predictor reinitialization failed: {e}"),
            }
            return;
        }

        match self.forecast(rnn) {
            Ok(forecast) => self.shared.publish(forecast),
            Err(e) => log::warn!("Predictor forecast failed: {e}"),
        }
    }

    /// Feeds the model its own output `horizon` times
    fn forecast(&self, rnn: &Rnn) -> candle_core::Result<Arc<[DVec2]>> {
        let mut sequence = self.window.to_vec();
        for _ in 0..self.horizon {
            sequence = rnn.predict(&sequence)?;
        }
        Ok(sequence.into_iter().map(|p| self.scale.decode(p)).collect())
    }

    fn save(&self, rnn: &Rnn) {
        let Some(path) = self.checkpoint_path.as_deref() else {
            log::warn!("Predictor save requested but no checkpoint path is configured");
            return;
        };
        match checkpoint::save(path, rnn) {
            Ok(()) => log::info!("Saved predictor checkpoint {}", path.display()),
            Err(e) => log::warn!("Predictor checkpoint save failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn tiny_config() -> PredictorConfig {
        PredictorConfig {
            input_length: 8,
            num_neurons: 6,
            learning_rate: 0.01,
            num_y_pred_output: 2,
            ..Default::default()
        }
    }

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_initial_forecast_is_screen_center() {
        let predictor = SequencePredictor::spawn(&tiny_config(), IVec2::new(400, 200));
        let forecast = predictor.latest();
        assert_eq!(forecast.len(), 8);
        assert!(forecast.iter().all(|p| *p == DVec2::new(200.0, 100.0)));
    }

    #[test]
    fn test_comes_online_and_publishes() {
        let predictor = SequencePredictor::spawn(&tiny_config(), IVec2::new(400, 200));
        assert!(wait_for(|| predictor.readiness() == Readiness::Online));

        for x in 0..5 {
            predictor.observe(IVec2::new(100 + x * 10, 80));
        }
        assert!(wait_for(|| predictor.generation() > 0));
        let forecast = predictor.latest();
        assert_eq!(forecast.len(), predictor.input_length());
        assert!(forecast.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert!(predictor.aim_point().is_some());
    }

    #[test]
    fn test_shutdown_goes_offline() {
        let mut predictor = SequencePredictor::spawn(&tiny_config(), IVec2::new(400, 200));
        assert!(wait_for(|| predictor.readiness() == Readiness::Online));
        predictor.shutdown();
        assert_eq!(predictor.readiness(), Readiness::Offline);
        // Requests after shutdown are dropped quietly
        predictor.observe(IVec2::new(1, 1));
        predictor.clear_buffer();
    }

    #[test]
    fn test_save_request_writes_checkpoint_and_reload() {
        let path = std::env::temp_dir().join(format!(
            "machine_revolution_predictor_{}.safetensors",
            std::process::id()
        ));
        let mut config = tiny_config();
        config.checkpoint_path = Some(path.clone());

        let mut predictor = SequencePredictor::spawn(&config, IVec2::new(400, 200));
        assert!(wait_for(|| predictor.readiness() == Readiness::Online));
        predictor.save_model();
        assert!(wait_for(|| path.exists()));
        predictor.shutdown();

        config.load_checkpoint = true;
        let reloaded = SequencePredictor::spawn(&config, IVec2::new(400, 200));
        assert!(wait_for(|| reloaded.readiness() == Readiness::Online));
        drop(reloaded);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_failed_save_keeps_training() {
        let mut config = tiny_config();
        config.checkpoint_path = Some(
            std::env::temp_dir()
                .join(format!("machine_revolution_no_dir_{}", std::process::id()))
                .join("model.safetensors"),
        );
        let predictor = SequencePredictor::spawn(&config, IVec2::new(400, 200));
        assert!(wait_for(|| predictor.readiness() == Readiness::Online));

        predictor.save_model();
        for x in 0..3 {
            predictor.observe(IVec2::new(50 + x * 10, 60));
        }
        assert!(wait_for(|| predictor.generation() > 0));
        assert_eq!(predictor.readiness(), Readiness::Online);

        let seen = predictor.generation();
        predictor.save_model();
        predictor.observe(IVec2::new(90, 60));
        assert!(wait_for(|| predictor.generation() > seen));
        assert_eq!(predictor.readiness(), Readiness::Online);
    }

    #[test]
    fn test_corrupt_checkpoint_starts_fresh() {
        let path = std::env::temp_dir().join(format!(
            "machine_revolution_corrupt_{}.safetensors",
            std::process::id()
        ));
        std::fs::write(&path, b"definitely not tensors").unwrap();
        let mut config = tiny_config();
        config.checkpoint_path = Some(path.clone());
        config.load_checkpoint = true;

        let predictor = SequencePredictor::spawn(&config, IVec2::new(400, 200));
        assert!(wait_for(|| predictor.readiness() == Readiness::Online));
        predictor.observe(IVec2::new(120, 90));
        predictor.observe(IVec2::new(130, 90));
        assert!(wait_for(|| predictor.generation() > 0));
        assert!(predictor.latest().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        drop(predictor);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_normalizer_round_trip() {
        let scale = Normalizer::new(IVec2::new(1000, 800));
        let p = DVec2::new(250.0, 700.0);
        let back = scale.decode(scale.encode(p));
        assert!((back - p).length() < 1e-3);
        assert_eq!(scale.encode(DVec2::new(500.0, 400.0)), [0.0, 0.0]);
    }
}
