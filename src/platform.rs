//! Platform glue: frame pacing and input sources
//!
//! The simulation thread owns the world outright. Input is produced on a
//! separate thread and handed over as key snapshots through a channel, so
//! polling the OS never stalls a tick.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};

use crate::sim::TickInput;

/// Maximum ticks per frame to prevent spiral of death
pub const MAX_SUBSTEPS: u32 = 8;
/// Longer frames than this are clamped (debugger pauses, suspended laptop)
pub const MAX_FRAME_DT: f64 = 0.1;

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    period: f64,
    accumulator: f64,
    max_substeps: u32,
}

impl FixedTimestep {
    pub fn new(clock_rate: u32) -> Self {
        Self {
            period: 1.0 / f64::from(clock_rate.max(1)),
            accumulator: 0.0,
            max_substeps: MAX_SUBSTEPS,
        }
    }

    /// Seconds per tick
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Feed elapsed wall time, get back how many ticks to run now
    pub fn advance(&mut self, dt: f64) -> u32 {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);
        let mut steps = 0;
        while self.accumulator >= self.period && steps < self.max_substeps {
            self.accumulator -= self.period;
            steps += 1;
        }
        // Drop whatever the substep cap left behind
        if steps == self.max_substeps {
            self.accumulator = self.accumulator.min(self.period);
        }
        steps
    }

    /// Time until the next tick is due
    pub fn until_next(&self) -> Duration {
        Duration::from_secs_f64((self.period - self.accumulator).max(0.0))
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Drives a [`FixedTimestep`] from the monotonic clock
#[derive(Debug)]
pub struct Pacer {
    timestep: FixedTimestep,
    last: Instant,
}

impl Pacer {
    pub fn new(clock_rate: u32) -> Self {
        Self {
            timestep: FixedTimestep::new(clock_rate),
            last: Instant::now(),
        }
    }

    /// Sleep until at least one tick is due and return the tick count
    pub fn wait(&mut self) -> u32 {
        loop {
            let now = Instant::now();
            let dt = now.duration_since(self.last).as_secs_f64();
            self.last = now;
            let steps = self.timestep.advance(dt);
            if steps > 0 {
                return steps;
            }
            std::thread::sleep(self.timestep.until_next());
        }
    }
}

/// Per-tick key snapshot provider
pub trait InputSource {
    fn poll(&mut self) -> TickInput;
}

/// Keys arriving from an input thread.
///
/// Direction keys follow the latest snapshot. Space, backspace and quit
/// latch until the next poll so a short press between ticks is not lost.
#[derive(Debug)]
pub struct ChannelInput {
    rx: Receiver<TickInput>,
    held: TickInput,
    disconnected: bool,
}

impl ChannelInput {
    pub fn new(rx: Receiver<TickInput>) -> Self {
        Self {
            rx,
            held: TickInput::default(),
            disconnected: false,
        }
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl InputSource for ChannelInput {
    fn poll(&mut self) -> TickInput {
        let mut one_shot = TickInput::default();
        loop {
            match self.rx.try_recv() {
                Ok(snapshot) => {
                    one_shot.space |= snapshot.space;
                    one_shot.backspace |= snapshot.backspace;
                    one_shot.quit |= snapshot.quit;
                    self.held = snapshot;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        log::info!("Input source disconnected");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
        TickInput {
            space: one_shot.space,
            backspace: one_shot.backspace,
            quit: one_shot.quit || self.disconnected,
            ..self.held
        }
    }
}
