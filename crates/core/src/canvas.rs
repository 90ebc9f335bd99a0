//! Annotation canvas interaction model.
//!
//! [`CanvasEditor`] holds the shapes being edited for one asset and turns
//! pointer and pinch gestures into shape edits. Pointer positions are passed
//! in percentage coordinates; use [`Viewport`] to convert from screen pixels.
//!
//! Gesture states:
//!
//! ```text
//! Idle --down on empty canvas, tool selected--> Drawing --up--> Idle (commit)
//! Idle --down on selected shape body---------> Dragging --up--> Idle
//! Idle --down on selected shape handle-------> Resizing --up--> Idle
//! ```

use serde::{Deserialize, Serialize};

use crate::annotation::{
    self, Annotation, Handle, Point, Shape, HANDLE_RADIUS, HIT_TOLERANCE,
};
use crate::error::CoreError;

/// Smallest width and height a committed box shape may have.
pub const MIN_SHAPE_SIZE: f64 = 0.5;

/// Shortest arrow that will be committed.
pub const MIN_ARROW_LENGTH: f64 = 1.0;

/// Freehand points closer than this to the previous point are skipped.
pub const MIN_FREEHAND_STEP: f64 = 0.2;

/// Zoom change applied by a single zoom-in or zoom-out step.
pub const ZOOM_STEP: f64 = 0.25;

pub const DEFAULT_COLOR: &str = "#FF4444";
pub const DEFAULT_STROKE_WIDTH: f64 = 3.0;

// ---------------------------------------------------------------------------
// Zoom
// ---------------------------------------------------------------------------

/// Bounds applied to the zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl ZoomLimits {
    /// Limits for the annotation editor.
    pub const DEFAULT: ZoomLimits = ZoomLimits { min: 0.5, max: 3.0 };

    /// Limits for the full-screen review viewer.
    pub const WIDE: ZoomLimits = ZoomLimits {
        min: 0.25,
        max: 3.0,
    };

    pub fn clamp(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return 1.0_f64.clamp(self.min, self.max);
        }
        zoom.clamp(self.min, self.max)
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Where the image is drawn on screen, used to map pointer positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen position of the unzoomed image's top-left corner.
    pub left: f64,
    pub top: f64,
    /// Unzoomed displayed image size in pixels.
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Viewport {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    /// Screen pixel to percentage coordinates, clamped to the canvas.
    pub fn to_percent(&self, screen_x: f64, screen_y: f64) -> Point {
        let w = self.width * self.zoom;
        let h = self.height * self.zoom;
        if w <= 0.0 || h <= 0.0 {
            return Point::new(0.0, 0.0);
        }
        Point::new(
            (screen_x - self.left - self.pan_x) / w * 100.0,
            (screen_y - self.top - self.pan_y) / h * 100.0,
        )
        .clamped()
    }

    /// Percentage coordinates to a screen pixel.
    pub fn to_screen(&self, p: Point) -> (f64, f64) {
        (
            self.left + self.pan_x + p.x / 100.0 * self.width * self.zoom,
            self.top + self.pan_y + p.y / 100.0 * self.height * self.zoom,
        )
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Rectangle,
    Circle,
    Arrow,
    Freehand,
    Text,
}

/// Current gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Idle,
    Drawing { start: Point, draft: Shape },
    Dragging { index: usize, last: Point },
    Resizing { index: usize, handle: Handle },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pinch {
    last_distance: f64,
}

#[derive(Debug, Clone)]
pub struct CanvasEditor {
    shapes: Vec<Annotation>,
    selected: Option<usize>,
    tool: Option<Tool>,
    color: String,
    stroke_width: f64,
    pending_text: String,
    interaction: Interaction,
    zoom: f64,
    limits: ZoomLimits,
    pinch: Option<Pinch>,
    next_id: u64,
    dirty: bool,
}

impl CanvasEditor {
    pub fn new(shapes: Vec<Annotation>) -> Self {
        Self::with_limits(shapes, ZoomLimits::DEFAULT)
    }

    pub fn with_limits(shapes: Vec<Annotation>, limits: ZoomLimits) -> Self {
        Self {
            next_id: next_free_number(&shapes),
            shapes,
            selected: None,
            tool: None,
            color: DEFAULT_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            pending_text: String::new(),
            interaction: Interaction::Idle,
            zoom: limits.clamp(1.0),
            limits,
            pinch: None,
            dirty: false,
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.shapes
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_tool(&mut self, tool: Option<Tool>) {
        self.tool = tool;
        if tool.is_some() {
            self.selected = None;
        }
    }

    pub fn set_color(&mut self, color: &str) -> Result<(), CoreError> {
        annotation::validate_color_hex(color)?;
        self.color = color.to_string();
        Ok(())
    }

    pub fn set_stroke_width(&mut self, width: f64) -> Result<(), CoreError> {
        annotation::validate_stroke_width(width)?;
        self.stroke_width = width;
        Ok(())
    }

    /// Label placed by the next text-tool click.
    pub fn set_pending_text(&mut self, text: &str) {
        self.pending_text = text.to_string();
    }

    pub fn pointer_down(&mut self, p: Point) {
        if self.pinch.is_some() {
            return;
        }
        let p = p.clamped();

        if let Some(index) = self.selected {
            let shape = &self.shapes[index].shape;
            if let Some(handle) = shape.handle_at(p, HANDLE_RADIUS) {
                self.interaction = Interaction::Resizing { index, handle };
                return;
            }
            if shape.hit_test(p, HIT_TOLERANCE) {
                self.interaction = Interaction::Dragging { index, last: p };
                return;
            }
        }

        if let Some(index) = annotation::topmost_at(&self.shapes, p, HIT_TOLERANCE) {
            self.selected = Some(index);
            self.interaction = Interaction::Idle;
            return;
        }

        self.selected = None;
        self.interaction = match self.tool {
            Some(tool) => Interaction::Drawing {
                start: p,
                draft: self.draft_for(tool, p, p),
            },
            None => Interaction::Idle,
        };
    }

    pub fn pointer_move(&mut self, p: Point) {
        let p = p.clamped();
        match &mut self.interaction {
            Interaction::Idle => {}
            Interaction::Drawing { start, draft } => match draft {
                Shape::Freehand { path } => {
                    if path.last().is_none_or(|last| last.distance(&p) >= MIN_FREEHAND_STEP) {
                        path.push(p);
                    }
                }
                Shape::Rectangle { .. } => *draft = Shape::rectangle_between(*start, p),
                Shape::Circle { .. } => *draft = Shape::circle_between(*start, p),
                Shape::Arrow { end, .. } => *end = p,
                Shape::Text { x, y, .. } => {
                    *x = p.x;
                    *y = p.y;
                }
            },
            Interaction::Dragging { index, last } => {
                let (dx, dy) = (p.x - last.x, p.y - last.y);
                self.shapes[*index].shape.translate(dx, dy);
                *last = p;
                self.dirty = true;
            }
            Interaction::Resizing { index, handle } => {
                self.shapes[*index].shape.resize(*handle, p);
                self.dirty = true;
            }
        }
    }

    /// Finish the current gesture. Returns the id of a newly committed shape.
    pub fn pointer_up(&mut self, p: Point) -> Option<String> {
        self.pointer_move(p);
        let finished = std::mem::replace(&mut self.interaction, Interaction::Idle);
        let Interaction::Drawing { draft, .. } = finished else {
            return None;
        };
        if is_degenerate(&draft) {
            return None;
        }

        let id = self.allocate_id();
        self.shapes.push(Annotation {
            id: id.clone(),
            color: self.color.clone(),
            stroke_width: self.stroke_width,
            shape: draft,
        });
        if self.tool == Some(Tool::Text) {
            self.pending_text.clear();
        }
        self.dirty = true;
        Some(id)
    }

    /// Next `aN` id not used by any shape on the canvas.
    fn allocate_id(&mut self) -> String {
        loop {
            let id = format!("a{}", self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            if !self.shapes.iter().any(|a| a.id == id) {
                return id;
            }
        }
    }

    pub fn delete_selected(&mut self) -> bool {
        let Some(index) = self.selected.take() else {
            return false;
        };
        self.shapes.remove(index);
        self.interaction = Interaction::Idle;
        self.dirty = true;
        true
    }

    pub fn clear(&mut self) {
        if !self.shapes.is_empty() {
            self.dirty = true;
        }
        self.shapes.clear();
        self.selected = None;
        self.interaction = Interaction::Idle;
    }

    // -- zoom ----------------------------------------------------------------

    pub fn zoom_in(&mut self) {
        self.zoom = self.limits.clamp(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.limits.clamp(self.zoom - ZOOM_STEP);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = self.limits.clamp(1.0);
    }

    /// Two-finger touch began. Cancels any gesture in progress.
    pub fn pinch_start(&mut self, a: Point, b: Point) {
        self.interaction = Interaction::Idle;
        self.pinch = Some(Pinch {
            last_distance: a.distance(&b),
        });
    }

    /// Scale zoom by the change in finger distance since the last frame.
    pub fn pinch_move(&mut self, a: Point, b: Point) {
        let Some(pinch) = self.pinch.as_mut() else {
            return;
        };
        let distance = a.distance(&b);
        if pinch.last_distance > 0.0 && distance > 0.0 {
            self.zoom = self.limits.clamp(self.zoom * distance / pinch.last_distance);
        }
        pinch.last_distance = distance;
    }

    pub fn pinch_end(&mut self) {
        self.pinch = None;
    }

    /// Validated shapes ready to persist. Clears the dirty flag.
    pub fn save(&mut self) -> Result<Vec<Annotation>, CoreError> {
        annotation::validate_annotations(&self.shapes)?;
        self.dirty = false;
        Ok(self.shapes.clone())
    }

    fn draft_for(&self, tool: Tool, start: Point, end: Point) -> Shape {
        match tool {
            Tool::Rectangle => Shape::rectangle_between(start, end),
            Tool::Circle => Shape::circle_between(start, end),
            Tool::Arrow => Shape::Arrow { start, end },
            Tool::Freehand => Shape::Freehand { path: vec![start] },
            Tool::Text => Shape::Text {
                x: start.x,
                y: start.y,
                text: self.pending_text.trim().to_string(),
                font_size: 3.0,
            },
        }
    }
}

/// One past the highest `aN` id among `shapes`. Ids in other formats are ignored.
fn next_free_number(shapes: &[Annotation]) -> u64 {
    shapes
        .iter()
        .filter_map(|a| a.id.strip_prefix('a')?.parse::<u64>().ok())
        .max()
        .map_or(1, |n| n.saturating_add(1))
}

/// Shapes too small to be intentional are dropped at commit.
fn is_degenerate(shape: &Shape) -> bool {
    match shape {
        Shape::Rectangle { width, height, .. } | Shape::Circle { width, height, .. } => {
            *width < MIN_SHAPE_SIZE || *height < MIN_SHAPE_SIZE
        }
        Shape::Arrow { start, end } => start.distance(end) < MIN_ARROW_LENGTH,
        Shape::Freehand { path } => path.len() < 2,
        Shape::Text { text, .. } => text.trim().is_empty(),
    }
}
