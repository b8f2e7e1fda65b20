//! ObservationSnapshot - Observation Assembler output
//!
//! One consistent per-step bundle of the latest sample from every
//! configured sensor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{SensorName, SensorSample};

/// Per-step observation bundle
///
/// Contains exactly one entry per enabled sensor, valid or not. Created
/// fresh each step; never retained by the core across steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSnapshot {
    /// Simulation clock time at assembly (not any sensor's own timestamp)
    pub timestamp: f64,

    /// Latest sample per sensor (sensor name -> sample)
    pub samples: HashMap<SensorName, SensorSample>,

    /// True once every sensor carries a valid sample
    pub complete: bool,
}

impl ObservationSnapshot {
    /// Build a snapshot, deriving completeness from sample validity
    pub fn new(timestamp: f64, samples: HashMap<SensorName, SensorSample>) -> Self {
        let complete = !samples.is_empty() && samples.values().all(|s| s.valid);
        Self {
            timestamp,
            samples,
            complete,
        }
    }

    /// Look up a sample by sensor name
    pub fn get(&self, name: &str) -> Option<&SensorSample> {
        self.samples.get(name)
    }

    /// Number of valid samples in this snapshot
    pub fn valid_count(&self) -> usize {
        self.samples.values().filter(|s| s.valid).count()
    }
}
