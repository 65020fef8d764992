//! stereo_replay - replay a recorded stereo sequence in real time
//!
//! This tool:
//! 1. Loads the sequence manifest into a catalog of stereo frame paths
//! 2. Replays every frame to the consumer at the recorded capture cadence
//! 3. Reports per-frame tracking time statistics after the run
//!
//! Ctrl-C stops playback cleanly between frames.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use stereo_replay::ui::{format_duration, Ui, UiMode};
use stereo_replay::{
    FilesystemImageStore, PlaybackOutcome, PlaybackScheduler, ReplayConfig, ReplayError,
    SequenceCatalog, StopToken, SystemClock, TimingReport, TraceConsumer,
};

#[derive(Parser, Debug)]
#[command(
    name = "stereo_replay",
    version,
    about = "Replay a recorded stereo image sequence at its capture rate"
)]
struct Args {
    /// Resource bundle for the estimation engine (e.g. ORB vocabulary)
    #[arg(value_name = "VOCABULARY")]
    vocabulary: PathBuf,

    /// Engine settings file
    #[arg(value_name = "SETTINGS")]
    settings: PathBuf,

    /// Sequence root directory (contains mav0/cam0/data and mav0/cam1/data)
    #[arg(value_name = "SEQUENCE")]
    sequence: PathBuf,

    /// Timestamp manifest, one frame per line (nanoseconds)
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Write per-frame timing as JSON to this path
    #[arg(long, value_name = "PATH")]
    timing_out: Option<PathBuf>,

    /// UI mode for stderr progress
    #[arg(long, value_enum, default_value_t = UiMode::Auto, value_name = "MODE")]
    ui: UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    run(args).inspect_err(|err| log::error!("replay aborted: {:#}", err))
}

fn run(args: Args) -> Result<()> {
    let ui = Ui::new(args.ui, std::io::stderr().is_terminal());
    let mut cfg = ReplayConfig::load()?;
    if args.timing_out.is_some() {
        cfg.timing_out = args.timing_out.clone();
    }

    require_file(&args.vocabulary, "vocabulary")?;
    require_file(&args.settings, "settings")?;
    log::info!(
        "engine resources: vocabulary={} settings={}",
        args.vocabulary.display(),
        args.settings.display()
    );

    let (left_root, right_root) = cfg.camera_roots(&args.sequence);
    let catalog = {
        let _stage = ui.stage("Load sequence manifest");
        SequenceCatalog::load_with_extension(
            &args.manifest,
            &left_root,
            &right_root,
            &cfg.image_extension,
        )?
    };

    let stop = StopToken::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        log::warn!("stop requested, finishing current frame");
        handler_stop.stop();
    })
    .context("error setting Ctrl-C handler")?;

    let progress = ui.playback(catalog.len());
    let mut consumer = TraceConsumer::new();
    let mut scheduler =
        PlaybackScheduler::new(catalog, FilesystemImageStore::new(), SystemClock::new())
            .with_stop_token(stop);
    let result = scheduler.run_with(&mut consumer, |timing| progress.frame(timing));
    progress.finish();
    let report = result?;

    let stats = report.stats();
    match report.outcome {
        PlaybackOutcome::Completed => log::info!(
            "replayed {} frames in {}",
            report.frames_dispatched,
            format_duration(report.elapsed)
        ),
        PlaybackOutcome::Stopped { next_index } => log::info!(
            "replay stopped after {} of {} frames (next frame {})",
            report.frames_dispatched,
            scheduler.catalog().len(),
            next_index
        ),
    }
    log::info!(
        "tracking time: median={} mean={} p95={} max={} behind={}",
        format_duration(stats.median),
        format_duration(stats.mean),
        format_duration(stats.p95),
        format_duration(stats.max),
        stats.frames_behind
    );

    if let Some(path) = &cfg.timing_out {
        let doc = TimingReport {
            stats,
            frames: &report.timings,
        };
        let json = serde_json::to_vec_pretty(&doc)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing timing report to {}", path.display()))?;
        log::info!("timing report written to {}", path.display());
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        return Err(ReplayError::configuration(format!(
            "{} file {} is not readable",
            what,
            path.display()
        ))
        .into());
    }
    Ok(())
}
