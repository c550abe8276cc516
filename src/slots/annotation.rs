//! PKLot-style ground-truth annotations.
//!
//! One document per frame:
//!
//! ```xml
//! <parking id="ufpr04">
//!   <space id="1" occupied="0">
//!     <contour>
//!       <point x="278" y="230" />
//!       ...
//!     </contour>
//!   </space>
//! </parking>
//! ```
//!
//! A `space` without an `occupied` attribute is unlabeled, not vacant. Other
//! elements (`rotatedRect` and friends) are ignored. The format is flat and
//! attribute-only, so it is scanned with anchored regular expressions rather
//! than a full XML parser.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use regex::Regex;

use super::{Slot, SlotId, SlotRegistry};
use crate::error::OccupancyError;
use crate::geometry::Point;

fn space_re() -> &'static Regex {
    static SPACE_RE: OnceLock<Regex> = OnceLock::new();
    SPACE_RE.get_or_init(|| {
        Regex::new(r"(?is)<space\b([^>]*?)(?:/\s*>|>(.*?)</space\s*>)").unwrap()
    })
}

fn contour_re() -> &'static Regex {
    static CONTOUR_RE: OnceLock<Regex> = OnceLock::new();
    CONTOUR_RE.get_or_init(|| Regex::new(r"(?is)<contour\b[^>]*>(.*?)</contour\s*>").unwrap())
}

fn point_re() -> &'static Regex {
    static POINT_RE: OnceLock<Regex> = OnceLock::new();
    POINT_RE.get_or_init(|| Regex::new(r"(?i)<point\b([^>]*)>").unwrap())
}

fn attr_re() -> &'static Regex {
    static ATTR_RE: OnceLock<Regex> = OnceLock::new();
    ATTR_RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
    })
}

fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    attr_re().captures_iter(attrs).find_map(|caps| {
        let key = caps.get(1)?.as_str();
        if key.eq_ignore_ascii_case(name) {
            caps.get(2)
                .or_else(|| caps.get(3))
                .map(|v| v.as_str().trim())
        } else {
            None
        }
    })
}

fn parse_label(slot: &str, raw: &str) -> Result<bool, OccupancyError> {
    match raw {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(OccupancyError::malformed(
            slot,
            format!("occupied must be 0 or 1, got '{}'", other),
        )),
    }
}

fn parse_coord(slot: &str, attrs: &str, axis: &str) -> Result<f64, OccupancyError> {
    let raw = attribute(attrs, axis)
        .ok_or_else(|| OccupancyError::malformed(slot, format!("point without {}", axis)))?;
    raw.parse::<f64>()
        .map_err(|_| OccupancyError::malformed(slot, format!("bad {} coordinate '{}'", axis, raw)))
}

/// Parse one annotation document into a labeled registry.
pub fn parse_annotation(xml: &str) -> Result<SlotRegistry, OccupancyError> {
    let mut slots = Vec::new();

    for space in space_re().captures_iter(xml) {
        let attrs = space.get(1).map_or("", |m| m.as_str());

        let raw_id = attribute(attrs, "id")
            .ok_or_else(|| OccupancyError::malformed("<unknown>", "space without id"))?;
        let id: u32 = raw_id
            .parse()
            .map_err(|_| OccupancyError::malformed(raw_id, "space id must be an integer"))?;
        let id = SlotId::from(id);

        let ground_truth = attribute(attrs, "occupied")
            .map(|raw| parse_label(id.as_str(), raw))
            .transpose()?;

        // A self-closing `<space ... />` has no body.
        let contour = space
            .get(2)
            .and_then(|body| contour_re().captures(body.as_str()))
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| OccupancyError::malformed(id.as_str(), "space without contour"))?;

        let points = point_re()
            .captures_iter(contour.as_str())
            .map(|caps| {
                let attrs = caps.get(1).map_or("", |m| m.as_str());
                Ok(Point::new(
                    parse_coord(id.as_str(), attrs, "x")?,
                    parse_coord(id.as_str(), attrs, "y")?,
                ))
            })
            .collect::<Result<Vec<_>, OccupancyError>>()?;

        slots.push(Slot::new(id, points)?.with_ground_truth(ground_truth));
    }

    SlotRegistry::new(slots)
}

/// Read and parse an annotation file.
pub fn load_annotation(path: impl AsRef<Path>) -> Result<SlotRegistry> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read annotation {}: {}", path.display(), e))?;
    parse_annotation(&raw).map_err(|e| anyhow!("invalid annotation {}: {}", path.display(), e))
}
