//! groundgraph CLI — ground-plane social-distancing assessment over JSON files.
//!
//! The surrounding video pipeline owns decoding, detection, and rendering;
//! this binary exposes the core over files so that pipeline can drive it:
//! `calibrate` turns four reference-frame points into a calibration file,
//! `assess` runs the per-frame pipeline over a detections file.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use groundgraph_core::{
    Assessor, BoundingBox, Calibration, CalibrationInput, CalibrationRecord, Detection,
    FrameAssessment,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "groundgraph")]
#[command(
    about = "Assess social distancing from per-frame person detections via ground-plane projection"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the ground-plane homography and distance threshold from four
    /// reference points.
    Calibrate(CliCalibrateArgs),

    /// Assess per-frame detections against a calibration.
    Assess(CliAssessArgs),

    /// Print a calibration file's matrix and threshold.
    CalibInfo {
        /// Path to the calibration JSON.
        #[arg(long)]
        calibration: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliCalibrateArgs {
    /// Path to the calibration input JSON: four image points (top-left,
    /// top-right, bottom-right, bottom-left), rectangle dimensions, and the
    /// minimum safe distance.
    #[arg(long)]
    input: PathBuf,

    /// Optional reference frame; when given, the four points must fall
    /// inside its bounds.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Path to write the calibration (JSON).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct CliAssessArgs {
    /// Path to the calibration JSON produced by `calibrate`.
    #[arg(long)]
    calibration: PathBuf,

    /// Path to the detections JSON: an array of frames, each an array of
    /// {"bbox": [x1, y1, x2, y2], "score": s}.
    #[arg(long)]
    detections: PathBuf,

    /// Confidence threshold; detections scoring below it are discarded
    /// before assessment.
    #[arg(long, default_value = "0.5")]
    min_score: f32,

    /// Path to write per-frame assessments (JSON array).
    #[arg(long)]
    out: PathBuf,
}

/// Wire format for one detector output, as the surrounding pipeline emits it.
#[derive(Debug, Clone, serde::Deserialize)]
struct RawDetection {
    /// [x1, y1, x2, y2] in image pixels.
    bbox: [f64; 4],
    score: f32,
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
        Commands::Calibrate(args) => run_calibrate(&args),
        Commands::Assess(args) => run_assess(&args),
        Commands::CalibInfo { calibration } => run_calib_info(&calibration),
    }
}

// ── calibrate ──────────────────────────────────────────────────────────

fn run_calibrate(args: &CliCalibrateArgs) -> CliResult<()> {
    let input: CalibrationInput = read_json(&args.input)?;

    if let Some(ref path) = args.reference {
        let img = image::open(path).map_err(|e| -> CliError {
            format!("failed to open reference image {}: {}", path.display(), e).into()
        })?;
        let (w, h) = (img.width() as f64, img.height() as f64);
        for (idx, p) in input.image_quad.iter().enumerate() {
            if p[0] < 0.0 || p[0] >= w || p[1] < 0.0 || p[1] >= h {
                return Err(format!(
                    "calibration point {} at ({}, {}) is outside the {}x{} reference frame",
                    idx, p[0], p[1], img.width(), img.height()
                )
                .into());
            }
        }
        tracing::info!("Reference frame: {}x{}, all points in bounds", img.width(), img.height());
    }

    let calibration = groundgraph_core::homography::estimate(&input)?;
    tracing::info!(
        "Calibrated: safe distance {} maps to {:.2} ground units",
        input.safe_distance,
        calibration.threshold
    );

    write_json(&args.out, &CalibrationRecord::from(&calibration))?;
    tracing::info!("Calibration written to {}", args.out.display());
    Ok(())
}

// ── assess ─────────────────────────────────────────────────────────────

fn run_assess(args: &CliAssessArgs) -> CliResult<()> {
    let record: CalibrationRecord = read_json(&args.calibration)?;
    let assessor = Assessor::new(Calibration::from(&record));

    let frames: Vec<Vec<RawDetection>> = read_json(&args.detections)?;
    tracing::info!("Assessing {} frames", frames.len());

    let mut assessments: Vec<FrameAssessment> = Vec::with_capacity(frames.len());
    let mut total_detections = 0usize;
    let mut total_unsafe = 0usize;

    for (frame_idx, raw) in frames.iter().enumerate() {
        let detections = convert_frame(raw, args.min_score).map_err(|e| -> CliError {
            format!("frame {}: {}", frame_idx, e).into()
        })?;

        let assessment = assessor.assess(&detections);
        total_detections += assessment.detection_count();
        total_unsafe += assessment.unsafe_count();

        tracing::debug!(
            "frame {}: {} detections, {} unsafe, {} violations",
            frame_idx,
            assessment.detection_count(),
            assessment.unsafe_count(),
            assessment.violations.len()
        );
        assessments.push(assessment);
    }

    tracing::info!(
        "Done: {} frames, {} detections, {} unsafe statuses",
        frames.len(),
        total_detections,
        total_unsafe
    );

    write_json(&args.out, &assessments)?;
    tracing::info!("Assessments written to {}", args.out.display());
    Ok(())
}

/// Apply the confidence threshold and validate boxes. Filtering happens
/// here, before `Detection` construction, per the detector boundary
/// contract.
fn convert_frame(raw: &[RawDetection], min_score: f32) -> CliResult<Vec<Detection>> {
    let mut detections = Vec::with_capacity(raw.len());
    for (idx, r) in raw.iter().enumerate() {
        if r.score < min_score {
            continue;
        }
        let bbox = BoundingBox::new(r.bbox[0], r.bbox[1], r.bbox[2], r.bbox[3])
            .map_err(|e| -> CliError { format!("detection {}: {}", idx, e).into() })?;
        let det = Detection::new(bbox, r.score)
            .map_err(|e| -> CliError { format!("detection {}: {}", idx, e).into() })?;
        detections.push(det);
    }
    Ok(detections)
}

// ── calib-info ─────────────────────────────────────────────────────────

fn run_calib_info(path: &Path) -> CliResult<()> {
    let record: CalibrationRecord = read_json(path)?;

    println!("groundgraph calibration: {}", path.display());
    println!("  threshold:  {:.4} ground units", record.threshold);
    println!("  homography:");
    for row in &record.homography {
        println!("    [{:>12.6} {:>12.6} {:>12.6}]", row[0], row[1], row[2]);
    }
    Ok(())
}

// ── file I/O ───────────────────────────────────────────────────────────

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| -> CliError { format!("failed to read {}: {}", path.display(), e).into() })?;
    serde_json::from_str(&text)
        .map_err(|e| -> CliError { format!("failed to parse {}: {}", path.display(), e).into() })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, &json)
        .map_err(|e| -> CliError { format!("failed to write {}: {}", path.display(), e).into() })
}
