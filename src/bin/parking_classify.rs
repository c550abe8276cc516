//! parking_classify - occupancy of one frame from recorded vehicle detections

use anyhow::{anyhow, Result};
use clap::Parser;
use parking_occupancy::detect::{Detection, FrameBounds, VehicleDetectionSet};
use parking_occupancy::{aggregate, OccupancyConfig, SlotRegistry};
use std::io::IsTerminal;
use std::path::PathBuf;

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Detector output for the frame: JSON array of {x1, y1, x2, y2, confidence, class_id}.
    #[arg(long, env = "PARKING_DETECTIONS")]
    detections: PathBuf,
    /// Slot definitions (JSON object id -> [[x, y], ...]); overrides PARKING_SLOTS_PATH.
    #[arg(long)]
    slots: Option<PathBuf>,
    /// Occupancy rule (area-overlap|centroid-containment); overrides PARKING_RULE.
    #[arg(long)]
    rule: Option<String>,
    /// Points on a slot edge (exclude|include); overrides PARKING_BOUNDARY.
    #[arg(long)]
    boundary: Option<String>,
    /// Minimum detector confidence; overrides PARKING_MIN_CONFIDENCE.
    #[arg(long)]
    min_confidence: Option<f32>,
    /// Frame width in pixels; detections outside the frame are dropped.
    #[arg(long, requires = "frame_height")]
    frame_width: Option<u32>,
    /// Frame height in pixels.
    #[arg(long, requires = "frame_width")]
    frame_height: Option<u32>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(&args.ui, is_tty, !stdout_is_tty);

    let mut cfg = OccupancyConfig::load()?;
    if let Some(slots) = args.slots {
        cfg.slots_path = slots;
    }
    if let Some(rule) = args.rule.as_deref() {
        cfg.rule = rule.parse().map_err(|e: String| anyhow!(e))?;
    }
    if let Some(boundary) = args.boundary.as_deref() {
        cfg.boundary = boundary.parse().map_err(|e: String| anyhow!(e))?;
    }
    if let Some(min_confidence) = args.min_confidence {
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(anyhow!("--min-confidence must be within 0..=1"));
        }
        cfg.detection.min_confidence = min_confidence;
    }
    let bounds = match (args.frame_width, args.frame_height) {
        (Some(width), Some(height)) => Some(FrameBounds::new(width, height)),
        _ => None,
    };

    let registry = {
        let _stage = ui.stage("Load slot registry");
        SlotRegistry::load(&cfg.slots_path)?
    };
    let lot = registry.summary();
    log::info!("{} slots in {}", lot.total_slots, cfg.slots_path.display());
    let vehicles = {
        let _stage = ui.stage("Load detections");
        let raw = std::fs::read_to_string(&args.detections).map_err(|e| {
            anyhow!(
                "failed to read detections {}: {}",
                args.detections.display(),
                e
            )
        })?;
        let detections: Vec<Detection> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid detections {}: {}", args.detections.display(), e))?;
        VehicleDetectionSet::from_detections(
            &detections,
            &cfg.detection,
            cfg.rule.region_form(),
            bounds,
        )
    };
    if vehicles.rejected() > 0 {
        log::warn!("{} vehicle regions rejected", vehicles.rejected());
    }

    let classifier = cfg.classifier();
    let verdict = {
        let _stage = ui.stage("Classify slots");
        classifier.classify(&registry, &vehicles)
    };
    let stats = aggregate(&verdict);
    log::info!(
        "{} rule: {}/{} slots occupied ({:.1}%)",
        classifier.rule(),
        stats.occupied,
        stats.total_slots,
        stats.occupancy_rate
    );

    let slots = verdict
        .iter()
        .map(|(id, occupied)| serde_json::json!({ "id": id, "occupied": occupied }))
        .collect::<Vec<_>>();
    let output = serde_json::json!({
        "rule": classifier.rule().as_str(),
        "boundary": classifier.boundary().as_str(),
        "vehicles": vehicles.len(),
        "statistics": stats,
        "lot": lot,
        "slots": slots,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
