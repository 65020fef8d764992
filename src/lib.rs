//! Stereo sequence replay
//!
//! Replays a recorded, timestamp-synchronized stereo image sequence to an
//! estimation engine at the pace it was captured.
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! 1. **Catalog**: the manifest is parsed into an ordered, immutable
//!    `SequenceCatalog` of stereo `FrameRecord`s.
//! 2. **Playback**: `PlaybackScheduler` owns the catalog, loads each image pair
//!    from an `ImageStore`, hands it to a `FrameConsumer`, and waits out the
//!    recorded inter-frame gap minus the consumer's measured latency.
//!
//! The consumer's latency is the only feedback the scheduler observes.
//!
//! # Module Structure
//!
//! - `catalog`: manifest parsing and the sequence catalog
//! - `playback`: the real-time scheduler and its pacing law
//! - `clock`, `stop`: injectable time and cooperative cancellation
//! - `store`, `consumer`: the image storage and engine collaborators
//! - `timing`: per-frame timing and post-run statistics
//! - `config`, `ui`: support for the `stereo_replay` binary

pub mod catalog;
pub mod clock;
pub mod config;
pub mod consumer;
pub mod error;
pub mod playback;
pub mod stop;
pub mod store;
pub mod timing;
pub mod ui;

pub use catalog::{FrameRecord, SequenceCatalog, DEFAULT_IMAGE_EXTENSION};
pub use clock::{Clock, ManualClock, SystemClock, WaitOutcome};
pub use config::ReplayConfig;
pub use consumer::{FrameConsumer, TraceConsumer, TraceStats};
pub use error::ReplayError;
pub use playback::{pacing_budget, PlaybackOutcome, PlaybackReport, PlaybackScheduler};
pub use stop::StopToken;
pub use store::{FilesystemImageStore, ImageStore, InMemoryImageStore};
pub use timing::{FrameTiming, TimingReport, TimingStats};
