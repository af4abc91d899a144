//! Random sources used to draw Monte Carlo samples.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Source of uniform draws in `[0, 1)`.
///
/// Seeded and unseeded runs both go through this trait so the simulator
/// never touches a global generator.
pub trait RandomSource {
    /// Returns the next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Returns a uniform value in `[min, max]`.
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }
}

const LCG_MULTIPLIER: u64 = 1_664_525;
const LCG_INCREMENT: u64 = 1_013_904_223;
const LCG_MODULUS: u64 = 1 << 32;

/// 32-bit linear congruential generator for reproducible runs.
///
/// Uses the Numerical Recipes constants; identical seeds yield identical
/// sequences on every platform.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Creates a generator from `seed` (only the low 32 bits are used).
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MODULUS,
        }
    }
}

impl RandomSource for Lcg {
    fn next_unit(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }
}

/// OS-seeded generator for exploratory, non-reproducible runs.
#[derive(Debug, Clone)]
pub struct EntropySource {
    rng: StdRng,
}

impl EntropySource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropySource {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Builds the source for an optional seed: an [`Lcg`] when seeded,
/// otherwise an [`EntropySource`].
pub fn source_for_seed(seed: Option<u64>) -> Box<dyn RandomSource + Send> {
    match seed {
        Some(seed) => Box::new(Lcg::new(seed)),
        None => Box::new(EntropySource::new()),
    }
}
