//! Simulation clock / timestep authority.
//!
//! Tick-counter based: time is always `ticks * physics_dt`, never a floating
//! accumulation, so equal episodes produce bit-identical timestamps. The
//! render cadence is likewise counter-derived and independent of real
//! execution speed.

use contracts::{EnvError, SimulationConfig};

/// Relative tolerance when checking that the render step is an integer
/// multiple of the physics step.
const RATIO_TOLERANCE: f64 = 1e-9;

/// Monotonic simulation clock with a fixed physics step and a derived
/// lower-rate render/sensor step.
///
/// Mutated only by the environment controller during stepping; sensors and
/// the bridge see time as plain `f64` values.
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Fixed physics step (seconds)
    physics_dt: f64,
    /// Physics advances per render tick
    render_interval: u64,
    /// Physics ticks since reset
    ticks: u64,
}

impl SimClock {
    /// Build a clock from configuration.
    ///
    /// # Errors
    /// Fails fast with a configuration error if either step is non-positive
    /// or `render_dt` is not an integer multiple of `physics_dt`.
    pub fn new(config: &SimulationConfig) -> Result<Self, EnvError> {
        if !(config.physics_dt > 0.0) {
            return Err(EnvError::config_validation(
                "simulation.physics_dt",
                format!("physics_dt must be > 0, got {}", config.physics_dt),
            ));
        }
        if !(config.render_dt > 0.0) {
            return Err(EnvError::config_validation(
                "simulation.render_dt",
                format!("render_dt must be > 0, got {}", config.render_dt),
            ));
        }

        let ratio = config.render_dt / config.physics_dt;
        let render_interval = ratio.round();
        if render_interval < 1.0 || (ratio - render_interval).abs() > RATIO_TOLERANCE * ratio {
            return Err(EnvError::config_validation(
                "simulation.render_dt",
                format!(
                    "render_dt ({}) must be a positive integer multiple of physics_dt ({})",
                    config.render_dt, config.physics_dt
                ),
            ));
        }

        Ok(Self {
            physics_dt: config.physics_dt,
            render_interval: render_interval as u64,
            ticks: 0,
        })
    }

    /// Advance one physics tick and return the new simulation time.
    /// Never blocks.
    pub fn advance(&mut self) -> f64 {
        self.ticks += 1;
        self.time()
    }

    /// True exactly on every `render_interval`-th physics advance,
    /// starting from the `render_interval`-th.
    pub fn due_render_tick(&self) -> bool {
        self.ticks > 0 && self.ticks % self.render_interval == 0
    }

    /// Zero time and the render-tick counter.
    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    /// Current simulation time (seconds)
    pub fn time(&self) -> f64 {
        self.ticks as f64 * self.physics_dt
    }

    /// Fixed physics step (seconds)
    pub fn physics_dt(&self) -> f64 {
        self.physics_dt
    }

    /// Fixed render step (seconds)
    pub fn render_dt(&self) -> f64 {
        self.physics_dt * self.render_interval as f64
    }

    /// Physics advances per render tick
    pub fn render_interval(&self) -> u64 {
        self.render_interval
    }

    /// Completed render ticks since reset
    pub fn render_tick_index(&self) -> u64 {
        self.ticks / self.render_interval
    }
}
