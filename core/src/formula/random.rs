//! Pseudorandom draws for the `random` identifier.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send {
    fn draw(&mut self) -> f64;
}

impl RandomSource for StdRng {
    fn draw(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

static GENERATOR: Lazy<Mutex<StdRng>> = Lazy::new(|| Mutex::new(StdRng::seed_from_u64(clock_seed())));

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

/// The process-wide generator, seeded once from wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedRandom;

impl RandomSource for SharedRandom {
    fn draw(&mut self) -> f64 {
        draw()
    }
}

pub fn draw() -> f64 {
    GENERATOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .gen::<f64>()
}

/// Replace the process-wide generator with a deterministic one.
pub fn reseed(seed: u64) {
    *GENERATOR.lock().unwrap_or_else(PoisonError::into_inner) = StdRng::seed_from_u64(seed);
}
