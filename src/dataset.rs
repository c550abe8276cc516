//! Labeled dataset on disk.
//!
//! Layout (PKLot after separation):
//! - `images/<frame>.jpg`
//! - `xml/<frame>.xml`
//!
//! Pairing is decided per image before anything is classified: an image
//! without an annotation becomes a `FrameSkipped` item, as does a frame whose
//! annotation fails to parse or whose detector call fails. One bad frame never
//! aborts the run.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::detect::{DetectionFilter, DetectorBackend, FrameRef, RegionForm, VehicleDetectionSet};
use crate::error::FrameSkipped;
use crate::evaluate::DatasetItem;
use crate::slots::load_annotation;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// An image paired with its annotation file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledFrame {
    pub name: String,
    pub image_path: PathBuf,
    pub annotation_path: PathBuf,
}

fn is_image(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// List images in `images_dir` (sorted by file name) and pair each with
/// `<stem>.xml` in `annotations_dir`.
///
/// Fails only when the image directory itself cannot be read.
pub fn scan(
    images_dir: impl AsRef<Path>,
    annotations_dir: impl AsRef<Path>,
) -> Result<Vec<Result<LabeledFrame, FrameSkipped>>> {
    let images_dir = images_dir.as_ref();
    let annotations_dir = annotations_dir.as_ref();

    let mut images = std::fs::read_dir(images_dir)
        .map_err(|e| anyhow!("failed to read images {}: {}", images_dir.display(), e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect::<Vec<_>>();
    images.sort();

    let frames = images
        .into_iter()
        .map(|image_path| pair(image_path, annotations_dir))
        .collect::<Vec<_>>();

    log::info!(
        "found {} images in {} ({} skipped)",
        frames.len(),
        images_dir.display(),
        frames.iter().filter(|f| f.is_err()).count()
    );
    Ok(frames)
}

fn pair(image_path: PathBuf, annotations_dir: &Path) -> Result<LabeledFrame, FrameSkipped> {
    let stem = image_path.file_stem().unwrap_or_default();
    let Some(name) = stem.to_str() else {
        let lossy = stem.to_string_lossy();
        return Err(FrameSkipped::new(lossy, "file name is not valid UTF-8"));
    };
    let name = name.to_string();
    let annotation_path = annotations_dir.join(format!("{}.xml", name));
    if !annotation_path.is_file() {
        return Err(FrameSkipped::new(name, "no paired annotation"));
    }
    Ok(LabeledFrame {
        name,
        image_path,
        annotation_path,
    })
}

/// Turns paired frames into classifier input using a detector collaborator.
pub struct DatasetLoader<'d> {
    detector: &'d mut dyn DetectorBackend,
    filter: DetectionFilter,
    form: RegionForm,
}

impl<'d> DatasetLoader<'d> {
    pub fn new(
        detector: &'d mut dyn DetectorBackend,
        filter: DetectionFilter,
        form: RegionForm,
    ) -> Self {
        Self {
            detector,
            filter,
            form,
        }
    }

    /// Load annotations and detections for one frame.
    pub fn load(
        &mut self,
        frame: Result<LabeledFrame, FrameSkipped>,
    ) -> Result<DatasetItem, FrameSkipped> {
        let frame = frame?;

        let slots = load_annotation(&frame.annotation_path)
            .map_err(|e| FrameSkipped::new(&frame.name, e.to_string()))?;

        let backend = self.detector.name();
        let detections = self
            .detector
            .detect(&FrameRef::new(&frame.name, &frame.image_path))
            .map_err(|e| FrameSkipped::new(&frame.name, format!("{backend} detector: {e}")))?;

        let detections =
            VehicleDetectionSet::from_detections(&detections, &self.filter, self.form, None);
        Ok(DatasetItem {
            name: frame.name,
            detections,
            slots,
        })
    }

    /// Load every frame, keeping input order.
    pub fn load_all(
        &mut self,
        frames: Vec<Result<LabeledFrame, FrameSkipped>>,
    ) -> Vec<Result<DatasetItem, FrameSkipped>> {
        frames.into_iter().map(|frame| self.load(frame)).collect()
    }
}
