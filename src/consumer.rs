//! Frame consumer capability.
//!
//! The scheduler only needs two things from the estimation engine it feeds:
//! a blocking `process` call per stereo pair and a final `shutdown`. Any
//! engine satisfying `FrameConsumer` can be replayed against.

use image::{DynamicImage, GenericImageView};

pub trait FrameConsumer {
    /// Handle one stereo pair. Blocking; the scheduler measures its duration.
    fn process(
        &mut self,
        left: &DynamicImage,
        right: &DynamicImage,
        timestamp: f64,
        identifier: &str,
    );

    /// Release engine resources. Called once at the end of a run, including
    /// runs that dispatched zero frames.
    fn shutdown(&mut self);
}

impl<C: FrameConsumer + ?Sized> FrameConsumer for Box<C> {
    fn process(
        &mut self,
        left: &DynamicImage,
        right: &DynamicImage,
        timestamp: f64,
        identifier: &str,
    ) {
        (**self).process(left, right, timestamp, identifier)
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}

/// Built-in consumer used when no estimation engine is linked.
///
/// Checks that both images of each pair share dimensions and logs every
/// frame at debug level.
#[derive(Debug, Default)]
pub struct TraceConsumer {
    frames: u64,
    size_mismatches: u64,
    last_timestamp: Option<f64>,
    shut_down: bool,
}

impl TraceConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> TraceStats {
        TraceStats {
            frames: self.frames,
            size_mismatches: self.size_mismatches,
            last_timestamp: self.last_timestamp,
            shut_down: self.shut_down,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraceStats {
    pub frames: u64,
    pub size_mismatches: u64,
    pub last_timestamp: Option<f64>,
    pub shut_down: bool,
}

impl FrameConsumer for TraceConsumer {
    fn process(
        &mut self,
        left: &DynamicImage,
        right: &DynamicImage,
        timestamp: f64,
        identifier: &str,
    ) {
        self.frames += 1;
        self.last_timestamp = Some(timestamp);
        let (lw, lh) = left.dimensions();
        let (rw, rh) = right.dimensions();
        if (lw, lh) != (rw, rh) {
            self.size_mismatches += 1;
            log::warn!(
                "stereo size mismatch at {}: left {}x{}, right {}x{}",
                identifier,
                lw,
                lh,
                rw,
                rh
            );
        }
        log::debug!("frame {} t={:.6} {}x{}", identifier, timestamp, lw, lh);
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        log::info!(
            "trace consumer: {} frames, {} size mismatches",
            self.frames,
            self.size_mismatches
        );
    }
}
