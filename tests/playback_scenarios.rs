//! End-to-end playback over real PNG sequences on disk.
//!
//! Each test lays out a small EuRoC-style sequence in a temp directory,
//! loads it through the manifest loader and replays it through the
//! filesystem image store.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tempfile::TempDir;

use stereo_replay::{
    FilesystemImageStore, FrameConsumer, ManualClock, PlaybackOutcome, PlaybackScheduler,
    ReplayConfig, ReplayError, SequenceCatalog, StopToken, SystemClock, TraceConsumer,
};

struct Sequence {
    _dir: TempDir,
    manifest: PathBuf,
    left: PathBuf,
    right: PathBuf,
}

/// Write a manifest with the given lines and one 8x6 PNG per camera for
/// every non-blank line.
fn write_sequence(lines: &[&str]) -> Result<Sequence> {
    let dir = tempfile::tempdir()?;
    let (left, right) = ReplayConfig::default().camera_roots(dir.path());
    std::fs::create_dir_all(&left)?;
    std::fs::create_dir_all(&right)?;
    for (shade, line) in lines.iter().enumerate() {
        let Some(id) = line.split_whitespace().next() else {
            continue;
        };
        let image = GrayImage::from_pixel(8, 6, Luma([shade as u8]));
        image.save(left.join(format!("{}.png", id)))?;
        image.save(right.join(format!("{}.png", id)))?;
    }
    let manifest = dir.path().join("timestamps.txt");
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(&manifest, body)?;
    Ok(Sequence {
        _dir: dir,
        manifest,
        left,
        right,
    })
}

fn load(seq: &Sequence) -> Result<SequenceCatalog> {
    SequenceCatalog::load(&seq.manifest, &seq.left, &seq.right)
}

#[derive(Default)]
struct RecordingConsumer {
    frames: Vec<(String, f64, (u32, u32))>,
    shutdowns: usize,
}

impl FrameConsumer for RecordingConsumer {
    fn process(&mut self, left: &DynamicImage, _right: &DynamicImage, ts: f64, id: &str) {
        self.frames.push((id.to_string(), ts, left.dimensions()));
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
    }
}

#[test]
fn manifest_with_blank_line_yields_three_records() -> Result<()> {
    let catalog = SequenceCatalog::from_reader(
        Cursor::new("100\n200\n\n300\n"),
        Path::new("/L"),
        Path::new("/R"),
        "png",
    )?;
    assert_eq!(catalog.len(), 3);
    let first = catalog.get(0).unwrap();
    assert_eq!(first.left_path, PathBuf::from("/L/100.png"));
    assert_eq!(first.right_path, PathBuf::from("/R/100.png"));
    assert_eq!(first.timestamp, 1e-7);
    assert_eq!(catalog.get(1).unwrap().timestamp, 2e-7);
    assert_eq!(catalog.get(2).unwrap().timestamp, 3e-7);
    assert_eq!(catalog.get(2).unwrap().index, 2);
    Ok(())
}

#[test]
fn replays_every_frame_in_order_from_disk() -> Result<()> {
    let seq = write_sequence(&["1000000", "2000000", "", "3000000", "4000000"])?;
    let catalog = load(&seq)?;
    assert_eq!(catalog.len(), 4);

    let clock = ManualClock::new();
    let mut consumer = RecordingConsumer::default();
    let mut scheduler =
        PlaybackScheduler::new(catalog, FilesystemImageStore::new(), clock.clone());
    let report = scheduler.run(&mut consumer)?;

    assert_eq!(report.outcome, PlaybackOutcome::Completed);
    let ids: Vec<&str> = consumer.frames.iter().map(|(id, _, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["1000000", "2000000", "3000000", "4000000"]);
    assert!(consumer.frames.iter().all(|(_, _, dims)| *dims == (8, 6)));
    assert_eq!(consumer.shutdowns, 1);
    // 1ms gaps, last one repeated
    assert_eq!(clock.waits().len(), 4);
    Ok(())
}

#[test]
fn missing_image_aborts_before_later_frames() -> Result<()> {
    let seq = write_sequence(&["100", "200", "300"])?;
    let missing = seq.left.join("200.png");
    std::fs::remove_file(&missing)?;

    let catalog = load(&seq)?;
    let mut consumer = RecordingConsumer::default();
    let mut scheduler =
        PlaybackScheduler::new(catalog, FilesystemImageStore::new(), ManualClock::new());
    let err = scheduler.run(&mut consumer).unwrap_err();

    match err.downcast_ref::<ReplayError>() {
        Some(ReplayError::ImageUnavailable { index, path, .. }) => {
            assert_eq!(*index, 1);
            assert_eq!(path, &missing);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("200.png"));
    let ids: Vec<&str> = consumer.frames.iter().map(|(id, _, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["100"]);
    assert_eq!(consumer.shutdowns, 0);
    Ok(())
}

#[test]
fn corrupt_right_image_is_fatal() -> Result<()> {
    let seq = write_sequence(&["100", "200"])?;
    let corrupt = seq.right.join("100.png");
    std::fs::write(&corrupt, b"not an image")?;

    let mut scheduler =
        PlaybackScheduler::new(load(&seq)?, FilesystemImageStore::new(), ManualClock::new());
    let err = scheduler.run(&mut TraceConsumer::new()).unwrap_err();
    match err.downcast_ref::<ReplayError>() {
        Some(ReplayError::ImageUnavailable { index, path, .. }) => {
            assert_eq!(*index, 0);
            assert_eq!(path, &corrupt);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

#[test]
fn real_time_run_tracks_recorded_span() -> Result<()> {
    // 5 frames, 20ms apart: 80ms span plus the repeated final gap
    let seq = write_sequence(&["0", "20000000", "40000000", "60000000", "80000000"])?;
    let catalog = load(&seq)?;
    let span = Duration::from_secs_f64(catalog.duration());
    assert_eq!(span, Duration::from_millis(80));

    let mut consumer = TraceConsumer::new();
    let mut scheduler =
        PlaybackScheduler::new(catalog, FilesystemImageStore::new(), SystemClock::new());
    let start = Instant::now();
    let report = scheduler.run(&mut consumer)?;
    let wall = start.elapsed();

    assert_eq!(report.outcome, PlaybackOutcome::Completed);
    assert_eq!(consumer.stats().frames, 5);
    assert!(consumer.stats().shut_down);
    assert!(wall >= Duration::from_millis(100), "ran too fast: {:?}", wall);
    assert!(wall < Duration::from_secs(2), "ran too slow: {:?}", wall);
    Ok(())
}

/// Signals the first dispatched frame so a test can stop mid-wait.
struct SignallingConsumer {
    inner: RecordingConsumer,
    dispatched: mpsc::Sender<usize>,
}

impl FrameConsumer for SignallingConsumer {
    fn process(&mut self, left: &DynamicImage, right: &DynamicImage, ts: f64, id: &str) {
        self.inner.process(left, right, ts, id);
        let _ = self.dispatched.send(self.inner.frames.len());
    }

    fn shutdown(&mut self) {
        self.inner.shutdown();
    }
}

#[test]
fn stop_from_another_thread_ends_long_wait() -> Result<()> {
    // 10s gap between frames; the stop must cut the wait short
    let seq = write_sequence(&["0", "10000000000", "20000000000"])?;
    let (tx, rx) = mpsc::channel();
    let mut consumer = SignallingConsumer {
        inner: RecordingConsumer::default(),
        dispatched: tx,
    };
    let stop = StopToken::new();
    let mut scheduler =
        PlaybackScheduler::new(load(&seq)?, FilesystemImageStore::new(), SystemClock::new())
            .with_stop_token(stop.clone());

    let stopper = std::thread::spawn(move || {
        let _ = rx.recv();
        std::thread::sleep(Duration::from_millis(20));
        stop.stop();
    });
    let start = Instant::now();
    let report = scheduler.run(&mut consumer)?;
    stopper.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(report.outcome, PlaybackOutcome::Stopped { next_index: 1 });
    assert_eq!(report.frames_dispatched, 1);
    assert_eq!(consumer.inner.frames.len(), 1);
    assert_eq!(consumer.inner.shutdowns, 1);
    Ok(())
}

#[test]
fn catalog_paths_stay_under_camera_roots() -> Result<()> {
    let seq = write_sequence(&["5", "6"])?;
    let catalog = load(&seq)?;
    for (left, right) in catalog.left_paths().zip(catalog.right_paths()) {
        assert_eq!(left.parent(), Some(seq.left.as_path()));
        assert_eq!(right.parent(), Some(seq.right.as_path()));
        assert_eq!(left.file_name(), right.file_name());
        assert!(left.exists());
    }
    Ok(())
}
