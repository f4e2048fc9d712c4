mod capture;
mod error;
mod filter;
mod label;
mod output;
mod record;
mod stitch;

use anyhow::{Context, Result};
use capture::WebcamCapture;
use clap::{Args, Parser, Subcommand};
use filter::{FrameFilter, LightnessFilter};
use label::{FontFace, Labeler};
use output::{FrameWriter, LATEST_LINK};
use record::Recorder;
use std::path::{Path, PathBuf};
use stitch::{Backend, SkippedFile, Stitcher, VideoSettings};

#[derive(Parser, Debug)]
#[command(author, version, about = "Timelapse capture and stitching", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a labelled still from a video device on a fixed interval
    Record(RecordArgs),
    /// Combine a directory of stills into an .mjpeg or .gif file
    Stitch(StitchArgs),
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// 0 based index of recording device to use
    #[arg(long, default_value_t = 0)]
    device: u32,

    /// How often to capture an image
    #[arg(long, default_value = "1m", value_parser = parse_interval)]
    interval: humantime::Duration,

    /// Path to store resultant images
    #[arg(long, default_value = ".")]
    filepath: PathBuf,

    /// TrueType/OpenType font for the timestamp; defaults to a built-in
    /// monospace bitmap face
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StitchArgs {
    /// Width to use in the stitched file
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Height to use in the stitched file
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Directory full of stills to stitch together
    #[arg(long, default_value = "./")]
    directory: PathBuf,

    /// Output file; the extension (.mjpeg or .gif) picks the format
    #[arg(long, default_value = "out.mjpeg")]
    filename: PathBuf,

    /// Frames per second to use in the output
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Drop frames whose sampled lightness (0.0 to 1.0) is below this
    #[arg(long, num_args = 0..=1, default_missing_value = "0.5")]
    lightness: Option<f64>,
}

/// Frame names have one-second resolution, so ticks must be at least that far apart.
fn parse_interval(value: &str) -> std::result::Result<humantime::Duration, String> {
    let interval: humantime::Duration = value.parse().map_err(|e| format!("{e}"))?;
    if std::time::Duration::from(interval) < std::time::Duration::from_secs(1) {
        return Err(format!("interval {interval} is shorter than 1s"));
    }
    Ok(interval)
}

/// What a stitch run produced.
#[derive(Debug)]
struct StitchSummary {
    written: usize,
    skipped: Vec<SkippedFile>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let result = match cli.command {
        Command::Record(args) => run_record(args),
        Command::Stitch(args) => run_stitch(args),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_record(args: RecordArgs) -> Result<()> {
    tracing::info!("Recording from device {}", args.device);
    tracing::info!("Interval: {}", args.interval);
    tracing::info!(
        "Output directory: {} (latest frame at {})",
        args.filepath.display(),
        LATEST_LINK
    );

    let face = FontFace::load(args.font.as_deref()).context("Failed to load label font")?;

    let capture = WebcamCapture::new(args.device)
        .with_context(|| format!("Failed to initialize capture device {}", args.device))?;

    let writer = FrameWriter::new(&args.filepath);
    let mut recorder = Recorder::new(capture, writer, Labeler::new(face), args.interval.into());

    recorder
        .run()
        .with_context(|| format!("Recording from device {} stopped", args.device))
}

fn run_stitch(args: StitchArgs) -> Result<()> {
    let settings = VideoSettings {
        width: args.width,
        height: args.height,
        fps: args.fps,
    };
    let backend = Backend::for_output(&args.filename, settings)
        .with_context(|| format!("Cannot stitch to {}", args.filename.display()))?;

    tracing::info!("Stitching {} into {}", args.directory.display(), args.filename.display());
    tracing::info!("Format: {:?}", backend.format());

    let mut filter = args.lightness.map(|min| {
        tracing::info!("Minimum lightness: {}", min);
        LightnessFilter::new(min)
    });

    let summary = stitch_directory(
        &args.directory,
        &args.filename,
        &backend,
        filter.as_mut().map(|f| f as &mut dyn FrameFilter),
    )?;

    tracing::info!(
        "Wrote {} frames to {} ({} skipped)",
        summary.written,
        args.filename.display(),
        summary.skipped.len()
    );
    for skipped in &summary.skipped {
        tracing::debug!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    Ok(())
}

fn stitch_directory<S: Stitcher>(
    directory: &Path,
    output: &Path,
    stitcher: &S,
    filter: Option<&mut dyn FrameFilter>,
) -> Result<StitchSummary> {
    let set = stitch::load_frames(directory, filter)
        .with_context(|| format!("Failed to load frames from {}", directory.display()))?;

    stitcher
        .stitch(&set.frames, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(StitchSummary {
        written: set.frames.len(),
        skipped: set.skipped,
    })
}
