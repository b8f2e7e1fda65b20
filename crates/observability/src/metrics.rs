//! Episode metric recording and aggregation.

use contracts::ObservationSnapshot;

/// Record per-step metrics from a snapshot.
pub fn record_step_metrics(snapshot: &ObservationSnapshot) {
    metrics::counter!("env_steps_total").increment(1);

    let total = snapshot.samples.len().max(1);
    let completeness = snapshot.valid_count() as f64 / total as f64;
    metrics::histogram!("observation_completeness_ratio").record(completeness);

    if snapshot.complete {
        metrics::counter!("observations_complete_total").increment(1);
    }
}

/// Running statistics over a stream of values
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl RunningStats {
    /// Fold in one value
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Arithmetic mean, or 0.0 when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Smallest observed value
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Largest observed value
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Number of folded values
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Aggregates per-step observations into an episode summary.
#[derive(Debug, Clone, Default)]
pub struct EpisodeAggregator {
    steps: u64,
    complete_snapshots: u64,
    completeness: RunningStats,
}

impl EpisodeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one step's snapshot.
    pub fn update(&mut self, snapshot: &ObservationSnapshot) {
        self.steps += 1;
        if snapshot.complete {
            self.complete_snapshots += 1;
        }
        let total = snapshot.samples.len().max(1);
        self.completeness
            .update(snapshot.valid_count() as f64 / total as f64);
    }

    /// Final episode summary.
    pub fn summary(&self) -> EpisodeSummary {
        EpisodeSummary {
            steps: self.steps,
            complete_snapshots: self.complete_snapshots,
            mean_completeness: self.completeness.mean(),
            min_completeness: self.completeness.min().unwrap_or(0.0),
        }
    }
}

/// Printable episode statistics
#[derive(Debug, Clone, Copy)]
pub struct EpisodeSummary {
    /// Steps taken this episode
    pub steps: u64,

    /// Snapshots where every sensor was valid
    pub complete_snapshots: u64,

    /// Mean fraction of valid sensors per snapshot
    pub mean_completeness: f64,

    /// Worst per-snapshot valid fraction
    pub min_completeness: f64,
}
