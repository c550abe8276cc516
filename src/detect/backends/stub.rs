use anyhow::Result;

use crate::detect::backend::{DetectorBackend, FrameRef};
use crate::detect::result::Detection;

/// Stub backend for testing. Returns the same detections for every frame.
pub struct StubBackend {
    detections: Vec<Detection>,
    frames_seen: u64,
}

impl StubBackend {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            frames_seen: 0,
        }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &FrameRef<'_>) -> Result<Vec<Detection>> {
        self.frames_seen += 1;
        Ok(self.detections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn stub_backend_repeats_detections() {
        let mut backend = StubBackend::new(vec![Detection::vehicle(0.0, 0.0, 4.0, 4.0)]);
        let frame = FrameRef::new("a", Path::new("a.jpg"));

        let r1 = backend.detect(&frame).unwrap();
        let r2 = backend.detect(&frame).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(r1.len(), 1);
        assert_eq!(backend.frames_seen(), 2);

        let mut empty = StubBackend::default();
        assert!(empty.detect(&frame).unwrap().is_empty());
    }
}
