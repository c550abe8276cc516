//! parking_evaluate - accuracy of the occupancy rules over a labeled dataset

use anyhow::{anyhow, Result};
use clap::Parser;
use parking_occupancy::dataset::{self, DatasetLoader};
use parking_occupancy::detect::{DetectorBackend, ReplayBackend};
use parking_occupancy::{AccuracyReport, EvaluationHarness, OccupancyConfig};
use std::io::IsTerminal;
use std::path::PathBuf;

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Recorded detections keyed by frame name (JSON).
    #[arg(long, env = "PARKING_REPLAY_PATH")]
    detections: PathBuf,
    /// Image directory; overrides PARKING_IMAGES_DIR.
    #[arg(long)]
    images_dir: Option<PathBuf>,
    /// Annotation directory; overrides PARKING_ANNOTATIONS_DIR.
    #[arg(long)]
    annotations_dir: Option<PathBuf>,
    /// Occupancy rule (area-overlap|centroid-containment); overrides PARKING_RULE.
    #[arg(long)]
    rule: Option<String>,
    /// Points on a slot edge (exclude|include); overrides PARKING_BOUNDARY.
    #[arg(long)]
    boundary: Option<String>,
    /// Write the full report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Evaluate frames on one thread.
    #[arg(long)]
    sequential: bool,
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
    if let Some(dir) = args.images_dir {
        cfg.dataset.images_dir = dir;
    }
    if let Some(dir) = args.annotations_dir {
        cfg.dataset.annotations_dir = dir;
    }
    if let Some(rule) = args.rule.as_deref() {
        cfg.rule = rule.parse().map_err(|e: String| anyhow!(e))?;
    }
    if let Some(boundary) = args.boundary.as_deref() {
        cfg.boundary = boundary.parse().map_err(|e: String| anyhow!(e))?;
    }

    let mut backend = {
        let _stage = ui.stage("Load recorded detections");
        let mut backend = ReplayBackend::load(&args.detections)?;
        backend.warm_up()?;
        backend
    };
    let frames = {
        let _stage = ui.stage("Pair images with annotations");
        dataset::scan(&cfg.dataset.images_dir, &cfg.dataset.annotations_dir)?
    };

    let items = {
        let _stage = ui.stage("Load frames");
        let progress = ui.frames(frames.len());
        let mut loader =
            DatasetLoader::new(&mut backend, cfg.detection.clone(), cfg.rule.region_form());
        let items = frames
            .into_iter()
            .map(|frame| {
                let item = loader.load(frame);
                progress.inc(1);
                item
            })
            .collect::<Vec<_>>();
        progress.finish_and_clear();
        items
    };

    let harness = EvaluationHarness::new(cfg.classifier());
    let report = {
        let _stage = ui.stage("Evaluate");
        evaluate(&harness, items, args.sequential)?
    };

    println!("Rule: {} (boundary {})", cfg.rule, cfg.boundary);
    println!(
        "Accuracy: {:.4} ({}/{} labeled slots)",
        report.accuracy, report.matches, report.labeled
    );
    println!(
        "Occupied: {} correct, {} missed (recall {})",
        report.counts.true_occupied,
        report.counts.false_vacant,
        format_ratio(report.occupied_recall)
    );
    println!(
        "Vacant:   {} correct, {} false alarms (recall {})",
        report.counts.true_vacant,
        report.counts.false_occupied,
        format_ratio(report.vacant_recall)
    );
    println!(
        "Frames:   {} evaluated, {} skipped, {} unlabeled slots",
        report.counts.frames_evaluated, report.frames_skipped, report.counts.unlabeled_slots
    );

    if let Some(path) = args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .map_err(|e| anyhow!("failed to write report {}: {}", path.display(), e))?;
        log::info!("report written to {}", path.display());
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn evaluate(
    harness: &EvaluationHarness,
    items: Vec<Result<parking_occupancy::DatasetItem, parking_occupancy::FrameSkipped>>,
    sequential: bool,
) -> Result<AccuracyReport> {
    let report = if sequential {
        harness.evaluate(items)?
    } else {
        harness.evaluate_parallel(items)?
    };
    Ok(report)
}

#[cfg(not(feature = "parallel"))]
fn evaluate(
    harness: &EvaluationHarness,
    items: Vec<Result<parking_occupancy::DatasetItem, parking_occupancy::FrameSkipped>>,
    _sequential: bool,
) -> Result<AccuracyReport> {
    Ok(harness.evaluate(items)?)
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio
        .map(|r| format!("{:.4}", r))
        .unwrap_or_else(|| "n/a".to_string())
}
