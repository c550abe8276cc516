//! Planar geometry for the occupancy rules.
//!
//! All coordinates are image pixel space (`x` right, `y` down) held as `f64`.
//! Integer input coordinates widen losslessly, so the orientation tests below
//! are exact for any realistic image size.
//!
//! - `Point`: a pixel location (vehicle centroid, polygon vertex).
//! - `Rect`: an axis-aligned box given by two opposite corners.
//! - `Polygon`: a validated simple polygon (slot outline).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Intersection areas at or below this many square pixels count as zero.
///
/// Clipping a polygon against a box that only touches it produces a sliver
/// whose computed area is float noise rather than exactly zero.
pub const AREA_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(f64::from(x), f64::from(y))
    }
}

/// Axis-aligned rectangle `(x1, y1)-(x2, y2)`.
///
/// A well-formed rectangle has `x1 < x2` and `y1 < y2`. Construction does not
/// enforce this; callers check `is_degenerate` where it matters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// True for non-finite corners or non-positive width/height.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite());
        !(finite && self.x1 < self.x2 && self.y1 < self.y2)
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Closed containment: points on the border are inside.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    /// True when the interiors overlap, i.e. the intersection has positive area.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2 && self.y1 < other.y2 && other.y1 < self.y2
    }

    fn bounding(points: &[Point]) -> Self {
        let mut rect = Rect::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for p in points {
            rect.x1 = rect.x1.min(p.x);
            rect.y1 = rect.y1.min(p.y);
            rect.x2 = rect.x2.max(p.x);
            rect.y2 = rect.y2.max(p.y);
        }
        rect
    }
}

/// How a point lying exactly on a polygon edge or vertex is classified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// On-edge points are outside; only strictly interior points count.
    #[default]
    Exclude,
    /// On-edge points are inside.
    Include,
}

impl BoundaryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exclude => "exclude",
            Self::Include => "include",
        }
    }
}

impl std::fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BoundaryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclude" | "outside" | "strict" => Ok(Self::Exclude),
            "include" | "inside" => Ok(Self::Include),
            other => Err(format!(
                "unknown boundary policy '{}' (expected exclude|include)",
                other
            )),
        }
    }
}

/// Reasons a vertex list is rejected as a slot outline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolygonDefect {
    #[error("polygon needs at least 3 distinct points, got {0}")]
    TooFewPoints(usize),
    #[error("vertex {0} has a non-finite coordinate")]
    NonFinite(usize),
    #[error("vertex {0} repeats the previous vertex")]
    RepeatedVertex(usize),
    #[error("vertex {0} is collinear with its neighbours")]
    CollinearVertex(usize),
    #[error("polygon has zero area")]
    ZeroArea,
    #[error("edges {0} and {1} intersect")]
    SelfIntersecting(usize, usize),
}

/// A simple (non-self-intersecting) polygon with positive area.
///
/// Either winding order is accepted. A closing vertex equal to the first one
/// is dropped, so closed and open rings describe the same polygon.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
    bounds: Rect,
}

impl Polygon {
    pub fn new(mut vertices: Vec<Point>) -> Result<Self, PolygonDefect> {
        if vertices.len() > 3 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if let Some(idx) = vertices.iter().position(|p| !p.is_finite()) {
            return Err(PolygonDefect::NonFinite(idx));
        }
        let distinct = count_distinct(&vertices);
        if distinct < 3 {
            return Err(PolygonDefect::TooFewPoints(distinct));
        }

        let n = vertices.len();
        if let Some(i) = (0..n).find(|&i| vertices[i] == vertices[(i + n - 1) % n]) {
            return Err(PolygonDefect::RepeatedVertex(i));
        }
        for i in 0..n {
            let prev = vertices[(i + n - 1) % n];
            let next = vertices[(i + 1) % n];
            if orient(prev, vertices[i], next) == 0.0 {
                return Err(PolygonDefect::CollinearVertex(i));
            }
        }
        if let Some((a, b)) = first_crossing(&vertices) {
            return Err(PolygonDefect::SelfIntersecting(a, b));
        }
        if signed_area(&vertices) == 0.0 {
            return Err(PolygonDefect::ZeroArea);
        }

        let bounds = Rect::bounding(&vertices);
        Ok(Self { vertices, bounds })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Area centroid (centre of mass of the enclosed region).
    pub fn centroid(&self) -> Point {
        let n = self.vertices.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let cross = a.x * b.y - b.x * a.y;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        let six_a = 6.0 * signed_area(&self.vertices);
        Point::new(cx / six_a, cy / six_a)
    }

    /// Point-in-polygon by ray casting, with an explicit on-edge test first so
    /// the boundary policy is applied consistently instead of depending on
    /// float rounding in the crossing computation.
    pub fn contains(&self, p: Point, boundary: BoundaryPolicy) -> bool {
        if !p.is_finite() || !self.bounds.contains_point(p) {
            return false;
        }

        let n = self.vertices.len();
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            if orient(a, b, p) == 0.0 && within_span(a, b, p) {
                return boundary == BoundaryPolicy::Include;
            }
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Area of the region shared with `rect` (Sutherland–Hodgman clipping).
    ///
    /// The clip window is the rectangle, which is convex, so the subject may
    /// be any simple polygon. Degenerate rectangles share no area.
    pub fn intersection_area(&self, rect: &Rect) -> f64 {
        if rect.is_degenerate() || !self.bounds.overlaps(rect) {
            return 0.0;
        }

        let mut clipped = self.vertices.clone();
        clipped = clip_half_plane(&clipped, |p| p.x >= rect.x1, |a, b| at_x(a, b, rect.x1));
        clipped = clip_half_plane(&clipped, |p| p.x <= rect.x2, |a, b| at_x(a, b, rect.x2));
        clipped = clip_half_plane(&clipped, |p| p.y >= rect.y1, |a, b| at_y(a, b, rect.y1));
        clipped = clip_half_plane(&clipped, |p| p.y <= rect.y2, |a, b| at_y(a, b, rect.y2));

        if clipped.len() < 3 {
            0.0
        } else {
            signed_area(&clipped).abs()
        }
    }
}

/// Twice the signed triangle area; positive when `a -> b -> c` turns
/// counter-clockwise in a y-up frame.
fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// For `p` collinear with `a`-`b`: is `p` on the closed segment?
fn within_span(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    let mut twice = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    twice / 2.0
}

fn count_distinct(vertices: &[Point]) -> usize {
    let mut seen: Vec<Point> = Vec::with_capacity(vertices.len());
    for p in vertices {
        if !seen.contains(p) {
            seen.push(*p);
        }
    }
    seen.len()
}

/// Closed-segment intersection test (touching counts).
fn segments_touch(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_span(q1, q2, p1))
        || (d2 == 0.0 && within_span(q1, q2, p2))
        || (d3 == 0.0 && within_span(p1, p2, q1))
        || (d4 == 0.0 && within_span(p1, p2, q2))
}

/// First pair of non-adjacent edges that touch, if any. Edge `i` runs from
/// vertex `i` to vertex `i + 1`.
fn first_crossing(vertices: &[Point]) -> Option<(usize, usize)> {
    let n = vertices.len();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (p1, p2) = (vertices[i], vertices[(i + 1) % n]);
            let (q1, q2) = (vertices[j], vertices[(j + 1) % n]);
            if segments_touch(p1, p2, q1, q2) {
                return Some((i, j));
            }
        }
    }
    None
}

fn clip_half_plane(
    input: &[Point],
    inside: impl Fn(Point) -> bool,
    cross: impl Fn(Point, Point) -> Point,
) -> Vec<Point> {
    let mut output = Vec::with_capacity(input.len() + 4);
    let Some(&last) = input.last() else {
        return output;
    };
    let mut prev = last;
    for &cur in input {
        match (inside(prev), inside(cur)) {
            (true, true) => output.push(cur),
            (true, false) => output.push(cross(prev, cur)),
            (false, true) => {
                output.push(cross(prev, cur));
                output.push(cur);
            }
            (false, false) => {}
        }
        prev = cur;
    }
    output
}

fn at_x(a: Point, b: Point, x: f64) -> Point {
    let t = (x - a.x) / (b.x - a.x);
    Point::new(x, a.y + t * (b.y - a.y))
}

fn at_y(a: Point, b: Point, y: f64) -> Point {
    let t = (y - a.y) / (b.y - a.y);
    Point::new(a.x + t * (b.x - a.x), y)
}
