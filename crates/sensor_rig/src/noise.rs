//! Noise strategies applied to ground-truth payloads.
//!
//! The model is injected per sensor from configuration; nothing here assumes
//! a particular kind. Random-walk state lives in the channel and advances at
//! the sensor's native rate.

use contracts::NoiseModel;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Walk excursion bound, expressed in multiples of `walk_sigma`
const WALK_BOUND_SIGMAS: f64 = 100.0;

/// One scalar noise channel (one axis, or one pixel stream).
#[derive(Debug, Clone)]
pub struct NoiseChannel {
    model: NoiseModel,
    walk: f64,
}

impl NoiseChannel {
    pub fn new(model: NoiseModel) -> Self {
        Self { model, walk: 0.0 }
    }

    /// Zero accumulated random-walk state.
    pub fn reset(&mut self) {
        self.walk = 0.0;
    }

    /// Advance the random walk by one native period.
    pub fn step(&mut self, rng: &mut ChaCha8Rng) {
        if let NoiseModel::BiasRandomWalk { walk_sigma, .. } = self.model {
            let bound = WALK_BOUND_SIGMAS * walk_sigma;
            self.walk = (self.walk + walk_sigma * gaussian(rng)).clamp(-bound, bound);
        }
    }

    /// Apply the configured model to one ground-truth value.
    pub fn apply(&self, value: f64, rng: &mut ChaCha8Rng) -> f64 {
        match self.model {
            NoiseModel::None => value,
            NoiseModel::Gaussian { sigma } => value + sigma * gaussian(rng),
            NoiseModel::BiasRandomWalk { bias, sigma, .. } => {
                value + bias + self.walk + sigma * gaussian(rng)
            }
        }
    }
}

/// Standard normal draw (Box-Muller).
pub fn gaussian(rng: &mut ChaCha8Rng) -> f64 {
    // u1 in (0, 1] so the log is finite
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
