//! Canvas tools and in-progress draw gestures.
//!
//! The active tool decides how the controller interprets a pointer-down.
//! Drawing tools open a [`DrawSession`] that accumulates points into a
//! preview shape; nothing touches the store until the gesture commits.

use kg_core::model::*;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;

/// Shorter spans than this (world units) count as a click, not a shape.
const MIN_SPAN: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Pan,
    #[default]
    Select,
    Rectangle,
    Diamond,
    Circle,
    Arrow,
    Line,
    Pen,
    Text,
    Eraser,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::Pan,
        ToolKind::Select,
        ToolKind::Rectangle,
        ToolKind::Diamond,
        ToolKind::Circle,
        ToolKind::Arrow,
        ToolKind::Line,
        ToolKind::Pen,
        ToolKind::Text,
        ToolKind::Eraser,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pan => "pan",
            ToolKind::Select => "select",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Diamond => "diamond",
            ToolKind::Circle => "circle",
            ToolKind::Arrow => "arrow",
            ToolKind::Line => "line",
            ToolKind::Pen => "pen",
            ToolKind::Text => "text",
            ToolKind::Eraser => "eraser",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Shape kind produced by a drag with this tool. Text is placed by a
    /// click, not dragged, so it has none.
    pub fn drawn_kind(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Diamond => Some(ShapeKind::Diamond),
            ToolKind::Circle => Some(ShapeKind::Circle),
            ToolKind::Arrow => Some(ShapeKind::Arrow),
            ToolKind::Line => Some(ShapeKind::Line),
            ToolKind::Pen => Some(ShapeKind::Pen),
            ToolKind::Pan | ToolKind::Select | ToolKind::Text | ToolKind::Eraser => None,
        }
    }

    /// CSS cursor while this tool is idle over empty canvas.
    pub fn cursor(self) -> &'static str {
        match self {
            ToolKind::Pan => "grab",
            ToolKind::Select => "default",
            ToolKind::Text => "text",
            _ => "crosshair",
        }
    }
}

/// A draw gesture between pointer-down and pointer-up.
#[derive(Debug, Clone)]
pub struct DrawSession {
    shape: Shape,
}

impl DrawSession {
    /// Start drawing with `tool` at `start`. `None` for non-drawing tools.
    pub fn begin(tool: ToolKind, start: Point, style: &ShapeStyle, group: GroupKey) -> Option<Self> {
        let kind = tool.drawn_kind()?;
        Some(Self {
            shape: Shape::new(kind, smallvec![start], style, group),
        })
    }

    /// Feed a pointer sample. Pen appends; every other kind keeps its
    /// start point and replaces the end.
    pub fn extend(&mut self, p: Point) {
        let points = &mut self.shape.points;
        if self.shape.kind == ShapeKind::Pen {
            if points.last() != Some(&p) {
                points.push(p);
            }
        } else {
            points.truncate(1);
            points.push(p);
        }
    }

    /// The dashed preview shown while the gesture is live.
    pub fn preview(&self) -> &Shape {
        &self.shape
    }

    /// The committed shape, or `None` for a degenerate gesture. Bounded
    /// kinds need two distinct points; pen strokes need one.
    pub fn finish(self) -> Option<Shape> {
        let shape = self.shape;
        if shape.kind == ShapeKind::Pen {
            return (!shape.points.is_empty()).then_some(shape);
        }
        match shape.points.as_slice() {
            [a, b] if a.distance(*b) > MIN_SPAN => Some(shape),
            _ => None,
        }
    }
}
