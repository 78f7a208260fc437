use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::matcher::ConfusionCounts;

/// Run-level summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub counts: ConfusionCounts,
    /// Images scored, including those that failed detection.
    pub images: usize,
    /// `None` when no prediction was made.
    pub precision: Option<f64>,
    /// `None` when there was no ground truth.
    pub recall: Option<f64>,
    /// Mean of the recorded per-image durations, in milliseconds.
    pub mean_latency_ms: Option<f64>,
}

/// Accumulates per-image counts and durations over a run.
#[derive(Clone, Debug, Default)]
pub struct MetricsAggregator {
    counts: ConfusionCounts,
    images: usize,
    latency_total: Duration,
    timed: u32,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one image. `elapsed` is `None` for images whose timing should not
    /// enter the latency mean.
    pub fn record(&mut self, counts: ConfusionCounts, elapsed: Option<Duration>) {
        self.counts += counts;
        self.images += 1;
        if let Some(elapsed) = elapsed {
            self.latency_total += elapsed;
            self.timed += 1;
        }
    }

    pub fn merge(&mut self, other: &MetricsAggregator) {
        self.counts += other.counts;
        self.images += other.images;
        self.latency_total += other.latency_total;
        self.timed += other.timed;
    }

    pub fn counts(&self) -> ConfusionCounts {
        self.counts
    }

    pub fn mean_latency(&self) -> Option<Duration> {
        (self.timed > 0).then(|| self.latency_total / self.timed)
    }

    pub fn finish(&self) -> RunMetrics {
        RunMetrics {
            counts: self.counts,
            images: self.images,
            precision: self.counts.precision(),
            recall: self.counts.recall(),
            mean_latency_ms: self.mean_latency().map(|d| d.as_secs_f64() * 1e3),
        }
    }
}
