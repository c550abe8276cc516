use std::path::Path;

use anyhow::Result;

use crate::detect::result::Detection;

/// Frame handed to a detector backend.
///
/// The core never decodes images; a backend that needs pixels reads them from
/// `image_path` itself. Backends that replay recorded output key on `name`.
#[derive(Clone, Copy, Debug)]
pub struct FrameRef<'a> {
    /// Frame name, the image file stem (e.g. "2012-12-07_16_42_25").
    pub name: &'a str,
    pub image_path: &'a Path,
}

impl<'a> FrameRef<'a> {
    pub fn new(name: &'a str, image_path: &'a Path) -> Self {
        Self { name, image_path }
    }
}

/// Vehicle detector collaborator.
///
/// The detector is constructed by the caller and passed in, never held as
/// process-wide state, so tests substitute a stub or replay backend.
/// Class and confidence filtering happen after `detect` through
/// `DetectionFilter`; backends return everything they see.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &FrameRef<'_>) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
