//! Real-time playback scheduler.
//!
//! Replays a `SequenceCatalog` to a `FrameConsumer` at the recorded capture
//! cadence. For every frame the scheduler:
//! 1. Loads the left and right images (an unavailable image aborts the run)
//! 2. Hands the pair to the consumer and measures how long it took
//! 3. Waits out whatever is left of the gap to the next capture
//!
//! The scheduler never skips or reorders frames. A consumer slower than the
//! capture rate simply gets the next frame immediately; falling behind is
//! tolerated and only shows up in the timing statistics.

use anyhow::Result;
use std::time::Duration;

use crate::catalog::SequenceCatalog;
use crate::clock::{Clock, WaitOutcome};
use crate::consumer::FrameConsumer;
use crate::error::ReplayError;
use crate::stop::StopToken;
use crate::store::ImageStore;
use crate::timing::{FrameTiming, TimingStats};

/// How a playback run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every frame in the catalog was dispatched.
    Completed,
    /// A stop was requested; `next_index` is the first frame not dispatched.
    Stopped { next_index: usize },
}

#[derive(Clone, Debug)]
pub struct PlaybackReport {
    pub outcome: PlaybackOutcome,
    pub frames_dispatched: usize,
    pub timings: Vec<FrameTiming>,
    /// Clock time from the start of the run until the consumer was shut down.
    pub elapsed: Duration,
}

impl PlaybackReport {
    pub fn stats(&self) -> TimingStats {
        TimingStats::from_timings(&self.timings)
    }
}

/// Pacing budget for the frame at `index`.
///
/// The gap to the next capture; for the final frame, the gap from the
/// previous one; zero for a single-frame sequence. Negative gaps from an
/// unsorted manifest clamp to zero. Gaps too large for a `Duration`
/// saturate at `Duration::MAX`.
pub fn pacing_budget(timestamps: &[f64], index: usize) -> Duration {
    let gap = if index + 1 < timestamps.len() {
        timestamps[index + 1] - timestamps[index]
    } else if index > 0 && index < timestamps.len() {
        timestamps[index] - timestamps[index - 1]
    } else {
        0.0
    };
    if gap.is_finite() && gap > 0.0 {
        Duration::try_from_secs_f64(gap).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Mutable state of one run. Only the run loop touches it.
#[derive(Debug, Default)]
struct PlaybackState {
    current_index: usize,
    last_processing_duration: Duration,
}

pub struct PlaybackScheduler<S, K> {
    catalog: SequenceCatalog,
    timestamps: Vec<f64>,
    store: S,
    clock: K,
    stop: StopToken,
}

impl<S: ImageStore, K: Clock> PlaybackScheduler<S, K> {
    pub fn new(catalog: SequenceCatalog, store: S, clock: K) -> Self {
        let timestamps = catalog.timestamps();
        Self {
            catalog,
            timestamps,
            store,
            clock,
            stop: StopToken::new(),
        }
    }

    /// Use an externally owned stop token (e.g. one wired to Ctrl-C).
    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn catalog(&self) -> &SequenceCatalog {
        &self.catalog
    }

    pub fn run<C: FrameConsumer + ?Sized>(&mut self, consumer: &mut C) -> Result<PlaybackReport> {
        self.run_with(consumer, |_| {})
    }

    /// Run playback, reporting each frame's timing to `on_frame` as soon as
    /// its pacing wait is over.
    pub fn run_with<C, F>(&mut self, consumer: &mut C, mut on_frame: F) -> Result<PlaybackReport>
    where
        C: FrameConsumer + ?Sized,
        F: FnMut(&FrameTiming),
    {
        let started = self.clock.now();
        let total = self.catalog.len();
        let mut state = PlaybackState::default();
        let mut timings = Vec::with_capacity(total);
        let mut outcome = PlaybackOutcome::Completed;

        log::info!(
            "playback started: {} frames, {:.3}s recorded",
            total,
            self.catalog.duration()
        );

        while state.current_index < total {
            let index = state.current_index;
            if self.stop.is_stopped() {
                outcome = PlaybackOutcome::Stopped { next_index: index };
                break;
            }

            let Some(record) = self.catalog.get(index) else {
                break;
            };
            let left = load_image(&self.store, index, &record.left_path)?;
            let right = load_image(&self.store, index, &record.right_path)?;

            let dispatched = self.clock.now();
            consumer.process(&left, &right, record.timestamp, &record.identifier);
            state.last_processing_duration = self.clock.now().saturating_sub(dispatched);

            let budget = pacing_budget(&self.timestamps, index);
            let remaining = budget.saturating_sub(state.last_processing_duration);
            let mut waited = Duration::ZERO;
            let mut interrupted = false;
            if remaining.is_zero() {
                if !budget.is_zero() {
                    log::debug!(
                        "frame {} behind schedule: processing {:?} >= budget {:?}",
                        index,
                        state.last_processing_duration,
                        budget
                    );
                }
            } else {
                let wait_start = self.clock.now();
                interrupted = self.clock.wait(remaining, &self.stop) == WaitOutcome::Stopped;
                waited = self.clock.now().saturating_sub(wait_start);
            }

            let timing = FrameTiming {
                index,
                timestamp: record.timestamp,
                processing: state.last_processing_duration,
                budget,
                waited,
            };
            log::debug!(
                "frame {} processed in {:?}, waited {:?}",
                index,
                timing.processing,
                timing.waited
            );
            on_frame(&timing);
            timings.push(timing);
            state.current_index += 1;

            if interrupted && state.current_index < total {
                outcome = PlaybackOutcome::Stopped {
                    next_index: state.current_index,
                };
                break;
            }
        }

        match outcome {
            PlaybackOutcome::Completed => log::info!("playback completed: {} frames", timings.len()),
            PlaybackOutcome::Stopped { next_index } => log::warn!(
                "playback stopped before frame {} ({} of {} dispatched)",
                next_index,
                timings.len(),
                total
            ),
        }
        consumer.shutdown();

        Ok(PlaybackReport {
            outcome,
            frames_dispatched: timings.len(),
            timings,
            elapsed: self.clock.now().saturating_sub(started),
        })
    }
}

fn load_image<S: ImageStore>(
    store: &S,
    index: usize,
    path: &std::path::Path,
) -> Result<image::DynamicImage> {
    store.load(path).map_err(|err| {
        log::error!("could not read image at {}", path.display());
        ReplayError::ImageUnavailable {
            index,
            path: path.to_path_buf(),
            reason: format!("{:#}", err),
        }
        .into()
    })
}
