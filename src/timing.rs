//! Per-frame timing records and post-run statistics.

use serde::{Serialize, Serializer};
use std::time::Duration;

/// Timing of one dispatched frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameTiming {
    pub index: usize,
    /// Recorded capture time, seconds.
    pub timestamp: f64,
    /// Wall-clock time spent inside the consumer.
    #[serde(serialize_with = "millis")]
    pub processing: Duration,
    /// Pacing budget for this frame.
    #[serde(serialize_with = "millis")]
    pub budget: Duration,
    /// Time actually spent waiting after processing.
    #[serde(serialize_with = "millis")]
    pub waited: Duration,
}

impl FrameTiming {
    /// The consumer used the whole budget (or more); no wait happened.
    pub fn behind(&self) -> bool {
        !self.budget.is_zero() && self.processing >= self.budget
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimingStats {
    pub frames: usize,
    #[serde(serialize_with = "millis")]
    pub total_processing: Duration,
    #[serde(serialize_with = "millis")]
    pub mean: Duration,
    #[serde(serialize_with = "millis")]
    pub median: Duration,
    #[serde(serialize_with = "millis")]
    pub p95: Duration,
    #[serde(serialize_with = "millis")]
    pub max: Duration,
    pub frames_behind: usize,
}

impl TimingStats {
    pub fn from_timings(timings: &[FrameTiming]) -> Self {
        if timings.is_empty() {
            return Self::default();
        }
        let mut sorted: Vec<Duration> = timings.iter().map(|t| t.processing).collect();
        sorted.sort_unstable();
        let n = sorted.len();
        let total: Duration = sorted.iter().sum();

        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2
        };
        // nearest-rank
        let rank = ((n as f64) * 0.95).ceil() as usize;
        let p95 = sorted[rank.clamp(1, n) - 1];

        Self {
            frames: n,
            total_processing: total,
            mean: total / n as u32,
            median,
            p95,
            max: sorted[n - 1],
            frames_behind: timings.iter().filter(|t| t.behind()).count(),
        }
    }
}

/// JSON document written after a run.
#[derive(Debug, Serialize)]
pub struct TimingReport<'a> {
    pub stats: TimingStats,
    pub frames: &'a [FrameTiming],
}

fn millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_nanos() as f64 / 1e6)
}
