//! Image annotation shapes, geometry and validation.
//!
//! All coordinates are percentages of the annotated image (0..=100 on both
//! axes) so annotations survive any display size. Shapes are stored as a
//! JSON array of [`Annotation`] values, one array per asset.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound of the percentage coordinate space.
pub const CANVAS_EXTENT: f64 = 100.0;

/// Maximum number of shapes stored per asset.
pub const MAX_ANNOTATIONS: usize = 200;

/// Maximum stroke width in pixels.
pub const MAX_STROKE_WIDTH: f64 = 20.0;

/// Minimum stroke width in pixels.
pub const MIN_STROKE_WIDTH: f64 = 0.5;

/// Maximum text length for a text label.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Maximum number of points in a freehand path.
pub const MAX_PATH_POINTS: usize = 5000;

/// Font size bounds for text labels, in percent of image height.
pub const MIN_FONT_SIZE: f64 = 1.0;
pub const MAX_FONT_SIZE: f64 = 50.0;

/// Approximate glyph width as a fraction of font size, used for text bounds.
const TEXT_WIDTH_FACTOR: f64 = 0.6;

/// Distance (in percent units) within which a stroke counts as hit.
pub const HIT_TOLERANCE: f64 = 1.5;

/// Radius (in percent units) of a resize handle.
pub const HANDLE_RADIUS: f64 = 1.5;

/// Coordinates may drift this far outside the canvas before being rejected.
const COORD_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Geometry primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Clamp into the canvas.
    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.clamp(0.0, CANVAS_EXTENT),
            y: self.y.clamp(0.0, CANVAS_EXTENT),
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle with non-negative width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Build bounds spanning two arbitrary corner points.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn corner(&self, corner: Corner) -> Point {
        let (right, bottom) = (self.x + self.width, self.y + self.height);
        match corner {
            Corner::TopLeft => Point::new(self.x, self.y),
            Corner::TopRight => Point::new(right, self.y),
            Corner::BottomLeft => Point::new(self.x, bottom),
            Corner::BottomRight => Point::new(right, bottom),
        }
    }
}

/// Limit a shift along one axis so the shape stays on the canvas. A shape
/// larger than the canvas on this axis only keeps its origin on the canvas.
fn edge_limited(delta: f64, start: f64, size: f64) -> f64 {
    if !delta.is_finite() {
        return 0.0;
    }
    let lo = -start;
    let hi = if size > CANVAS_EXTENT {
        CANVAS_EXTENT - start
    } else {
        CANVAS_EXTENT - (start + size)
    };
    delta.clamp(lo, hi.max(lo))
}

/// Distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point::new(a.x + t * dx, a.y + t * dy))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// A grab point for resizing the selected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Corner(Corner),
    ArrowStart,
    ArrowEnd,
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Shape-specific geometry, tagged by `type` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Ellipse inscribed in the given box.
    Circle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Arrow {
        start: Point,
        end: Point,
    },
    Freehand {
        path: Vec<Point>,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
    },
}

fn default_font_size() -> f64 {
    3.0
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Rectangle { .. } => "rectangle",
            Shape::Circle { .. } => "circle",
            Shape::Arrow { .. } => "arrow",
            Shape::Freehand { .. } => "freehand",
            Shape::Text { .. } => "text",
        }
    }

    /// Build a box-shaped variant of the same kind from bounds.
    fn with_box(&self, b: Bounds) -> Shape {
        match self {
            Shape::Circle { .. } => Shape::Circle {
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
            },
            _ => Shape::Rectangle {
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
            },
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Shape::Rectangle {
                x,
                y,
                width,
                height,
            }
            | Shape::Circle {
                x,
                y,
                width,
                height,
            } => Bounds::from_corners(Point::new(*x, *y), Point::new(x + width, y + height)),
            Shape::Arrow { start, end } => Bounds::from_corners(*start, *end),
            Shape::Freehand { path } => {
                let Some(first) = path.first() else {
                    return Bounds {
                        x: 0.0,
                        y: 0.0,
                        width: 0.0,
                        height: 0.0,
                    };
                };
                let (mut min, mut max) = (*first, *first);
                for p in path {
                    min.x = min.x.min(p.x);
                    min.y = min.y.min(p.y);
                    max.x = max.x.max(p.x);
                    max.y = max.y.max(p.y);
                }
                Bounds::from_corners(min, max)
            }
            Shape::Text {
                x,
                y,
                text,
                font_size,
            } => Bounds {
                x: *x,
                y: *y,
                width: text.chars().count() as f64 * font_size * TEXT_WIDTH_FACTOR,
                height: *font_size,
            },
        }
    }

    /// Whether `p` touches this shape.
    ///
    /// Box shapes and text are hit anywhere inside their bounds; arrows and
    /// freehand strokes within `tolerance` of a segment.
    pub fn hit_test(&self, p: Point, tolerance: f64) -> bool {
        match self {
            Shape::Rectangle { .. } | Shape::Circle { .. } | Shape::Text { .. } => {
                self.bounds().contains(p)
            }
            Shape::Arrow { start, end } => distance_to_segment(p, *start, *end) <= tolerance,
            Shape::Freehand { path } => match path.as_slice() {
                [] => false,
                [only] => p.distance(only) <= tolerance,
                points => points
                    .windows(2)
                    .any(|w| distance_to_segment(p, w[0], w[1]) <= tolerance),
            },
        }
    }

    /// Resize handles this shape exposes.
    pub fn handles(&self) -> Vec<(Handle, Point)> {
        match self {
            Shape::Rectangle { .. } | Shape::Circle { .. } => {
                let b = self.bounds();
                Corner::ALL
                    .iter()
                    .map(|c| (Handle::Corner(*c), b.corner(*c)))
                    .collect()
            }
            Shape::Arrow { start, end } => {
                vec![(Handle::ArrowStart, *start), (Handle::ArrowEnd, *end)]
            }
            Shape::Freehand { .. } | Shape::Text { .. } => Vec::new(),
        }
    }

    /// The handle under `p`, if any.
    pub fn handle_at(&self, p: Point, radius: f64) -> Option<Handle> {
        self.handles()
            .into_iter()
            .find(|(_, at)| at.distance(&p) <= radius)
            .map(|(h, _)| h)
    }

    /// Move the shape by `(dx, dy)`, stopping at the canvas edges.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        let b = self.bounds();
        let dx = edge_limited(dx, b.x, b.width);
        let dy = edge_limited(dy, b.y, b.height);

        match self {
            Shape::Rectangle { x, y, .. } | Shape::Circle { x, y, .. } | Shape::Text { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Shape::Arrow { start, end } => {
                for p in [start, end] {
                    p.x += dx;
                    p.y += dy;
                }
            }
            Shape::Freehand { path } => {
                for p in path.iter_mut() {
                    p.x += dx;
                    p.y += dy;
                }
            }
        }
    }

    /// Drag `handle` to `to`. Box shapes keep the opposite corner fixed.
    pub fn resize(&mut self, handle: Handle, to: Point) {
        let to = to.clamped();
        match handle {
            Handle::Corner(corner) => {
                if matches!(self, Shape::Rectangle { .. } | Shape::Circle { .. }) {
                    let anchor = self.bounds().corner(corner.opposite());
                    *self = self.with_box(Bounds::from_corners(anchor, to));
                }
            }
            Handle::ArrowStart => {
                if let Shape::Arrow { start, .. } = self {
                    *start = to;
                }
            }
            Handle::ArrowEnd => {
                if let Shape::Arrow { end, .. } = self {
                    *end = to;
                }
            }
        }
    }

    /// Box shapes derived from a drag between two points.
    pub fn rectangle_between(a: Point, b: Point) -> Shape {
        let r = Bounds::from_corners(a.clamped(), b.clamped());
        Shape::Rectangle {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }

    pub fn circle_between(a: Point, b: Point) -> Shape {
        let r = Bounds::from_corners(a.clamped(), b.clamped());
        Shape::Circle {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }

    fn validate(&self, index: usize) -> Result<(), CoreError> {
        let check_point = |p: &Point| -> Result<(), CoreError> {
            if !p.is_finite() || !in_canvas(p.x) || !in_canvas(p.y) {
                return Err(CoreError::Validation(format!(
                    "annotations[{index}] has a point outside the 0-100 canvas"
                )));
            }
            Ok(())
        };

        match self {
            Shape::Rectangle {
                x,
                y,
                width,
                height,
            }
            | Shape::Circle {
                x,
                y,
                width,
                height,
            } => {
                if !width.is_finite() || !height.is_finite() || *width < 0.0 || *height < 0.0 {
                    return Err(CoreError::Validation(format!(
                        "annotations[{index}] must have a non-negative width and height"
                    )));
                }
                check_point(&Point::new(*x, *y))?;
                check_point(&Point::new(x + width, y + height))?;
            }
            Shape::Arrow { start, end } => {
                check_point(start)?;
                check_point(end)?;
            }
            Shape::Freehand { path } => {
                if path.is_empty() {
                    return Err(CoreError::Validation(format!(
                        "annotations[{index}] freehand path must not be empty"
                    )));
                }
                if path.len() > MAX_PATH_POINTS {
                    return Err(CoreError::Validation(format!(
                        "annotations[{index}] has {} path points, maximum is {MAX_PATH_POINTS}",
                        path.len()
                    )));
                }
                path.iter().try_for_each(check_point)?;
            }
            Shape::Text {
                x,
                y,
                text,
                font_size,
            } => {
                check_point(&Point::new(*x, *y))?;
                if text.trim().is_empty() {
                    return Err(CoreError::Validation(format!(
                        "annotations[{index}] text must not be empty"
                    )));
                }
                if text.chars().count() > MAX_TEXT_LENGTH {
                    return Err(CoreError::Validation(format!(
                        "annotations[{index}] text exceeds {MAX_TEXT_LENGTH} characters"
                    )));
                }
                if !font_size.is_finite() || !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(font_size) {
                    return Err(CoreError::Validation(format!(
                        "annotations[{index}] font_size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn in_canvas(v: f64) -> bool {
    (-COORD_EPSILON..=CANVAS_EXTENT + COORD_EPSILON).contains(&v)
}

/// One drawn annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub color: String,
    pub stroke_width: f64,
    #[serde(flatten)]
    pub shape: Shape,
}

/// Index of the topmost (last drawn) annotation under `p`.
pub fn topmost_at(annotations: &[Annotation], p: Point, tolerance: f64) -> Option<usize> {
    annotations
        .iter()
        .rposition(|a| a.shape.hit_test(p, tolerance))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that a stroke width is within the allowed range.
pub fn validate_stroke_width(width: f64) -> Result<(), CoreError> {
    if width.is_nan() || width.is_infinite() {
        return Err(CoreError::Validation(
            "stroke width must be a finite number".to_string(),
        ));
    }
    if !(MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH).contains(&width) {
        return Err(CoreError::Validation(format!(
            "stroke width must be between {MIN_STROKE_WIDTH} and {MAX_STROKE_WIDTH}, got {width}"
        )));
    }
    Ok(())
}

/// Validate that a color string matches `#RRGGBB` or `#RRGGBBAA` hex format.
pub fn validate_color_hex(color: &str) -> Result<(), CoreError> {
    let valid_length = color.len() == 7 || color.len() == 9;

    if !valid_length {
        return Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Must be in #RRGGBB or #RRGGBBAA hex format"
        )));
    }

    if !color.starts_with('#') {
        return Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Must start with '#'"
        )));
    }

    if !color[1..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Must contain only hex digits after '#'"
        )));
    }

    Ok(())
}

/// Validate a full annotation set before it is saved.
pub fn validate_annotations(annotations: &[Annotation]) -> Result<(), CoreError> {
    if annotations.len() > MAX_ANNOTATIONS {
        return Err(CoreError::Validation(format!(
            "{} annotations submitted, maximum is {MAX_ANNOTATIONS}",
            annotations.len()
        )));
    }

    let mut seen = HashSet::with_capacity(annotations.len());
    for (i, a) in annotations.iter().enumerate() {
        if a.id.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "annotations[{i}] is missing an id"
            )));
        }
        if !seen.insert(a.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "annotations[{i}] reuses id '{}'",
                a.id
            )));
        }
        validate_color_hex(&a.color)?;
        validate_stroke_width(a.stroke_width)?;
        a.shape.validate(i)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Per-kind counts for an annotation set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnotationSummary {
    pub total: usize,
    pub rectangles: usize,
    pub circles: usize,
    pub arrows: usize,
    pub freehand: usize,
    pub texts: usize,
}

pub fn summarize(annotations: &[Annotation]) -> AnnotationSummary {
    let mut summary = AnnotationSummary {
        total: annotations.len(),
        ..Default::default()
    };
    for a in annotations {
        match a.shape {
            Shape::Rectangle { .. } => summary.rectangles += 1,
            Shape::Circle { .. } => summary.circles += 1,
            Shape::Arrow { .. } => summary.arrows += 1,
            Shape::Freehand { .. } => summary.freehand += 1,
            Shape::Text { .. } => summary.texts += 1,
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
