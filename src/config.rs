use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::classify::{OccupancyClassifier, OccupancyRule};
use crate::detect::{DetectionFilter, COCO_CAR, DEFAULT_MIN_CONFIDENCE};
use crate::geometry::BoundaryPolicy;

const DEFAULT_SLOTS_PATH: &str = "data/UFPR04/slots.json";
const DEFAULT_IMAGES_DIR: &str = "data/UFPR04/images";
const DEFAULT_ANNOTATIONS_DIR: &str = "data/UFPR04/xml";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OccupancyConfigFile {
    slots_path: Option<PathBuf>,
    classifier: Option<ClassifierConfigFile>,
    detection: Option<DetectionConfigFile>,
    dataset: Option<DatasetConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ClassifierConfigFile {
    rule: Option<String>,
    boundary: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectionConfigFile {
    min_confidence: Option<f32>,
    vehicle_classes: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DatasetConfigFile {
    images_dir: Option<PathBuf>,
    annotations_dir: Option<PathBuf>,
}

/// Resolved settings: file (`PARKING_CONFIG`), then defaults, then
/// `PARKING_*` environment overrides.
#[derive(Debug, Clone)]
pub struct OccupancyConfig {
    pub slots_path: PathBuf,
    pub rule: OccupancyRule,
    pub boundary: BoundaryPolicy,
    pub detection: DetectionFilter,
    pub dataset: DatasetSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSettings {
    pub images_dir: PathBuf,
    pub annotations_dir: PathBuf,
}

impl OccupancyConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PARKING_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: OccupancyConfigFile) -> Result<Self> {
        let slots_path = file
            .slots_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SLOTS_PATH));
        let rule = match file.classifier.as_ref().and_then(|c| c.rule.as_deref()) {
            Some(raw) => parse_rule(raw)?,
            None => OccupancyRule::default(),
        };
        let boundary = match file.classifier.as_ref().and_then(|c| c.boundary.as_deref()) {
            Some(raw) => parse_boundary(raw)?,
            None => BoundaryPolicy::default(),
        };
        let detection = DetectionFilter {
            min_confidence: file
                .detection
                .as_ref()
                .and_then(|d| d.min_confidence)
                .unwrap_or(DEFAULT_MIN_CONFIDENCE),
            vehicle_classes: file
                .detection
                .and_then(|d| d.vehicle_classes)
                .unwrap_or_else(|| vec![COCO_CAR]),
        };
        let dataset = DatasetSettings {
            images_dir: file
                .dataset
                .as_ref()
                .and_then(|d| d.images_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR)),
            annotations_dir: file
                .dataset
                .and_then(|d| d.annotations_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ANNOTATIONS_DIR)),
        };
        Ok(Self {
            slots_path,
            rule,
            boundary,
            detection,
            dataset,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(path) = non_empty_env("PARKING_SLOTS_PATH") {
            self.slots_path = PathBuf::from(path);
        }
        if let Some(rule) = non_empty_env("PARKING_RULE") {
            self.rule = parse_rule(&rule)?;
        }
        if let Some(boundary) = non_empty_env("PARKING_BOUNDARY") {
            self.boundary = parse_boundary(&boundary)?;
        }
        if let Some(confidence) = non_empty_env("PARKING_MIN_CONFIDENCE") {
            self.detection.min_confidence = confidence
                .trim()
                .parse()
                .map_err(|_| anyhow!("PARKING_MIN_CONFIDENCE must be a number"))?;
        }
        if let Some(classes) = non_empty_env("PARKING_VEHICLE_CLASSES") {
            self.detection.vehicle_classes = split_csv(&classes)
                .iter()
                .map(|entry| {
                    entry
                        .parse::<u32>()
                        .map_err(|_| anyhow!("bad PARKING_VEHICLE_CLASSES entry '{}'", entry))
                })
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(dir) = non_empty_env("PARKING_IMAGES_DIR") {
            self.dataset.images_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty_env("PARKING_ANNOTATIONS_DIR") {
            self.dataset.annotations_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection.min_confidence) {
            return Err(anyhow!("min_confidence must be within 0..=1"));
        }
        if self.detection.vehicle_classes.is_empty() {
            return Err(anyhow!("at least one vehicle class is required"));
        }
        self.detection.vehicle_classes.sort_unstable();
        self.detection.vehicle_classes.dedup();
        Ok(())
    }

    pub fn classifier(&self) -> OccupancyClassifier {
        OccupancyClassifier::new(self.rule).with_boundary(self.boundary)
    }
}

fn read_config_file(path: &Path) -> Result<OccupancyConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn parse_rule(raw: &str) -> Result<OccupancyRule> {
    raw.parse().map_err(|e: String| anyhow!(e))
}

fn parse_boundary(raw: &str) -> Result<BoundaryPolicy> {
    raw.parse().map_err(|e: String| anyhow!(e))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
