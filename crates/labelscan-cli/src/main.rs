// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// labelscan: offline label detection and correction from the command line.
//
// Entry point. Initialises logging, parses arguments and dispatches to the
// subcommand.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use image::DynamicImage;
use labelscan_core::{DetectionMode, ProbabilityGrid, Rotation, ScanConfig};
use labelscan_document::detect::{compute_stats, select_threshold};
use labelscan_document::scan::model::{
    LuminanceModel, SegmentationModel, StaticGridModel, grid_from_luma,
};
use labelscan_document::scan::{PrepStyle, prepare_for_recognition};
use labelscan_document::{FrameDetection, LabelDetector, ScanSession};
use serde_json::json;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "labelscan")]
#[command(about = "Find a label in a segmentation probability map and rectify it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the label and optionally write the corrected crop.
    Detect(DetectArgs),

    /// Print probability-map statistics and the thresholds they select.
    Stats {
        /// Probability map as an 8-bit grayscale image.
        #[arg(long)]
        grid: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Probability map as an 8-bit grayscale image (0 = background, 255 = label).
    /// Without it, brightness of --image stands in for the model.
    #[arg(long, required_unless_present = "image")]
    grid: Option<PathBuf>,

    /// Full-resolution sensor frame the grid was computed from.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Clockwise rotation that makes the sensor frame upright (0, 90, 180, 270).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    rotation: i32,

    /// Use the stricter final-capture thresholds instead of live preview.
    #[arg(long = "final")]
    final_pass: bool,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the corrected crop here (needs --image).
    #[arg(long, requires = "image")]
    out: Option<PathBuf>,

    /// Write the detection report here instead of stdout.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Prepare the corrected crop for recognition before writing it.
    #[arg(long, value_enum, requires = "out")]
    prep: Option<PrepArg>,

    /// Treat dark pixels as label when no --grid is given.
    #[arg(long, conflicts_with = "grid")]
    invert: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PrepArg {
    Grayscale,
    Equalize,
    LocalContrast,
    Adaptive,
    Otsu,
}

impl From<PrepArg> for PrepStyle {
    fn from(arg: PrepArg) -> Self {
        match arg {
            PrepArg::Grayscale => PrepStyle::Grayscale,
            PrepArg::Equalize => PrepStyle::Equalize,
            PrepArg::LocalContrast => PrepStyle::LocalContrast { radius: 15 },
            PrepArg::Adaptive => PrepStyle::default(),
            PrepArg::Otsu => PrepStyle::Otsu,
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Stats { grid } => run_stats(&grid),
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_stats(path: &Path) -> CliResult<()> {
    let grid = load_grid(path)?;
    println!("{}", serde_json::to_string_pretty(&stats_report(&grid))?);
    Ok(())
}

fn stats_report(grid: &ProbabilityGrid) -> serde_json::Value {
    let stats = compute_stats(grid);
    let cap = ScanConfig::default().detector.live_threshold_cap;
    json!({
        "width": grid.width(),
        "height": grid.height(),
        "stats": stats,
        "threshold_live": select_threshold(&stats, DetectionMode::Live, cap),
        "threshold_final": select_threshold(&stats, DetectionMode::Final, cap),
    })
}

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    let rotation = Rotation::from_degrees(args.rotation).ok_or_else(|| -> CliError {
        format!("rotation must be a multiple of 90, got {}", args.rotation).into()
    })?;
    let mode = if args.final_pass {
        DetectionMode::Final
    } else {
        DetectionMode::Live
    };

    let grid = args.grid.as_deref().map(load_grid).transpose()?;
    if let Some(grid) = &grid {
        // The map defines the model size.
        config.detector.model_width = grid.width();
        config.detector.model_height = grid.height();
    }

    let Some(image_path) = &args.image else {
        // Grid only: model-space result, nothing to correct.
        let grid = grid.ok_or("either --grid or --image is required")?;
        let report = grid_report(&grid, &config, mode)?;
        return write_report(&report, args.json.as_deref());
    };

    tracing::info!("Loading image: {}", image_path.display());
    let frame = image::open(image_path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", image_path.display(), e).into()
    })?;

    match grid {
        Some(grid) => {
            let session = ScanSession::new(StaticGridModel::new(grid), &config)?;
            detect_frame(&session, &frame, rotation, mode, args)
        }
        None => {
            let mut model =
                LuminanceModel::new(config.detector.model_width, config.detector.model_height);
            if args.invert {
                model = model.inverted();
            }
            let session = ScanSession::new(model, &config)?;
            detect_frame(&session, &frame, rotation, mode, args)
        }
    }
}

/// Model-space analysis of a probability map on its own.
fn grid_report(
    grid: &ProbabilityGrid,
    config: &ScanConfig,
    mode: DetectionMode,
) -> CliResult<serde_json::Value> {
    let analysis = LabelDetector::new(config.detector.clone())?.analyze(grid, mode)?;
    if !analysis.result.detected {
        tracing::warn!(miss = ?analysis.miss, "No label found");
    }
    Ok(serde_json::to_value(&analysis)?)
}

fn detect_frame<M: SegmentationModel>(
    session: &ScanSession<M>,
    frame: &DynamicImage,
    rotation: Rotation,
    mode: DetectionMode,
    args: &DetectArgs,
) -> CliResult<()> {
    let detection = session.process_frame(frame, rotation, mode)?;
    if detection.detected() {
        tracing::info!(
            confidence = detection.result().confidence,
            "Label found in {}x{} frame",
            detection.sensor_width,
            detection.sensor_height
        );
    } else {
        tracing::warn!(miss = ?detection.analysis.miss, "No label found");
    }

    let mut report = serde_json::to_value(&detection)?;
    if let Some(out) = &args.out {
        let corrected = write_crop(session, frame, &detection, out, args.prep)?;
        report["corrected"] = corrected;
    }
    write_report(&report, args.json.as_deref())
}

fn write_crop<M: SegmentationModel>(
    session: &ScanSession<M>,
    frame: &DynamicImage,
    detection: &FrameDetection,
    out: &Path,
    prep: Option<PrepArg>,
) -> CliResult<serde_json::Value> {
    let Some(corrected) = session.confirm(frame, detection) else {
        tracing::warn!("Nothing to correct; {} not written", out.display());
        return Ok(serde_json::Value::Null);
    };

    match prep {
        Some(style) => prepare_for_recognition(&corrected.image, style.into()).save(out)?,
        None => corrected.image.save(out)?,
    }
    tracing::info!("Corrected crop written to {}", out.display());

    Ok(json!({
        "path": out.display().to_string(),
        "width": corrected.width,
        "height": corrected.height,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_grid(path: &Path) -> CliResult<ProbabilityGrid> {
    let img = image::open(path).map_err(|e| -> CliError {
        format!("Failed to open probability map {}: {}", path.display(), e).into()
    })?;
    Ok(grid_from_luma(&img.to_luma8())?)
}

fn write_report(report: &serde_json::Value, path: Option<&Path>) -> CliResult<()> {
    let text = serde_json::to_string_pretty(report)?;
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
