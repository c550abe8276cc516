use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};

use crate::detect::backend::{DetectorBackend, FrameRef};
use crate::detect::result::Detection;

/// Serves detections recorded from an earlier detector run.
///
/// The recording is a JSON object mapping frame names to detection lists:
///
/// ```json
/// { "2012-12-07_16_42_25": [{ "x1": 0, "y1": 0, "x2": 40, "y2": 30, "confidence": 0.9 }] }
/// ```
///
/// A frame missing from the recording is an error, not an empty frame.
pub struct ReplayBackend {
    frames: HashMap<String, Vec<Detection>>,
}

impl ReplayBackend {
    pub fn new(frames: HashMap<String, Vec<Detection>>) -> Self {
        Self { frames }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let frames = serde_json::from_str(raw)
            .map_err(|e| anyhow!("invalid detection recording: {}", e))?;
        Ok(Self::new(frames))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read recording {}: {}", path.display(), e))?;
        let backend = Self::from_json_str(&raw)?;
        log::debug!(
            "loaded recorded detections for {} frames from {}",
            backend.frame_count(),
            path.display()
        );
        Ok(backend)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&mut self, frame: &FrameRef<'_>) -> Result<Vec<Detection>> {
        self.frames
            .get(frame.name)
            .cloned()
            .ok_or_else(|| anyhow!("no recorded detections for frame {}", frame.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_recorded_frames() {
        let mut backend = ReplayBackend::from_json_str(
            r#"{
                "frame_a": [
                    {"x1": 0, "y1": 0, "x2": 10, "y2": 10, "confidence": 0.9, "class_id": 2}
                ],
                "frame_b": []
            }"#,
        )
        .unwrap();
        assert_eq!(backend.frame_count(), 2);

        let a = backend
            .detect(&FrameRef::new("frame_a", Path::new("frame_a.jpg")))
            .unwrap();
        let expected = Detection::vehicle(0.0, 0.0, 10.0, 10.0).with_confidence(0.9);
        assert_eq!(a, vec![expected]);

        let b = backend
            .detect(&FrameRef::new("frame_b", Path::new("frame_b.jpg")))
            .unwrap();
        assert!(b.is_empty());

        assert!(backend
            .detect(&FrameRef::new("frame_c", Path::new("frame_c.jpg")))
            .is_err());
    }

    #[test]
    fn rejects_malformed_recording() {
        let truncated = ReplayBackend::from_json_str(r#"{"frame_a": [{"x1": 0}]}"#);
        assert!(truncated.is_err());
    }
}
