//! Backend wire format for drawings, nodes, and groups.
//!
//! The REST backend stores a drawing's geometry as a single string field
//! holding a JSON array of `{x, y}` objects. Everything else is plain
//! camelCase JSON.

use crate::id::EntityId;
use crate::model::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("unknown drawing type `{0}`")]
    UnknownKind(String),
    #[error("malformed points field: {0}")]
    Points(#[from] serde_json::Error),
    #[error("`{kind}` drawing needs at least {min} points, got {got}")]
    TooFewPoints {
        kind: &'static str,
        min: usize,
        got: usize,
    },
    #[error("drawing has no id")]
    MissingId,
}

/// Serialize points into the string-encoded wire form.
pub fn encode_points(points: &[Point]) -> String {
    serde_json::to_string(points).unwrap_or_else(|_| "[]".to_string())
}

/// Parse the string-encoded wire form back into points.
pub fn decode_points(raw: &str) -> Result<Points, WireError> {
    let points: Vec<Point> = serde_json::from_str(raw)?;
    Ok(points.into_iter().collect())
}

// ─── Drawings ────────────────────────────────────────────────────────────

/// A drawing as the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDrawing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(rename = "type")]
    pub kind: String,
    pub points: String,
    pub color: String,
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupKey>,
}

impl WireDrawing {
    /// Wire form of a shape. The id is omitted for local-only shapes.
    pub fn from_shape(shape: &Shape) -> Self {
        let (text, font_size, font_family) = match &shape.kind {
            ShapeKind::Text {
                text,
                font_size,
                font_family,
            } => (
                Some(text.clone()),
                Some(*font_size),
                Some(font_family.clone()),
            ),
            _ => (None, None, None),
        };
        Self {
            id: (!shape.id.is_local()).then_some(shape.id),
            kind: shape.kind.name().to_string(),
            points: encode_points(&shape.points),
            color: shape.color.clone(),
            stroke_width: shape.stroke_width,
            stroke_style: shape.stroke_style,
            text,
            font_size,
            font_family,
            group_id: Some(shape.group),
        }
    }

    /// Parse into a persisted shape. Drawings without a group land in
    /// `fallback_group`.
    pub fn into_shape(self, fallback_group: GroupKey) -> Result<Shape, WireError> {
        let id = self.id.ok_or(WireError::MissingId)?;
        let style = ShapeStyle::default();
        let kind = match self.kind.as_str() {
            "pen" => ShapeKind::Pen,
            "line" => ShapeKind::Line,
            "arrow" => ShapeKind::Arrow,
            "rectangle" => ShapeKind::Rectangle,
            "diamond" => ShapeKind::Diamond,
            "circle" => ShapeKind::Circle,
            "text" => ShapeKind::Text {
                text: self.text.clone().unwrap_or_default(),
                font_size: self.font_size.unwrap_or(style.font_size),
                font_family: self.font_family.clone().unwrap_or(style.font_family),
            },
            other => return Err(WireError::UnknownKind(other.to_string())),
        };
        let points = decode_points(&self.points)?;
        if points.len() < kind.min_points() {
            return Err(WireError::TooFewPoints {
                kind: kind.name(),
                min: kind.min_points(),
                got: points.len(),
            });
        }
        Ok(Shape {
            id,
            kind,
            points,
            color: self.color,
            stroke_width: self.stroke_width,
            stroke_style: self.stroke_style,
            group: self.group_id.unwrap_or(fallback_group),
            persistence: PersistenceState::Persisted,
        })
    }
}

/// Partial drawing update sent to `updateDrawing`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<StrokeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl DrawingPatch {
    /// Geometry only: points, plus font size for text (resize scales it).
    pub fn geometry(shape: &Shape) -> Self {
        let font_size = match &shape.kind {
            ShapeKind::Text { font_size, .. } => Some(*font_size),
            _ => None,
        };
        Self {
            points: Some(encode_points(&shape.points)),
            font_size,
            ..Default::default()
        }
    }

    /// Every mutable field of `shape`.
    pub fn full(shape: &Shape) -> Self {
        let wire = WireDrawing::from_shape(shape);
        Self {
            points: Some(wire.points),
            color: Some(wire.color),
            stroke_width: Some(wire.stroke_width),
            stroke_style: Some(wire.stroke_style),
            text: wire.text,
            font_size: wire.font_size,
        }
    }

    /// Wire form of a local [`ShapePatch`].
    pub fn from_patch(patch: &ShapePatch) -> Self {
        Self {
            points: patch.points.as_ref().map(|p| encode_points(p)),
            color: patch.color.clone(),
            stroke_width: patch.stroke_width,
            stroke_style: patch.stroke_style,
            text: patch.text.clone(),
            font_size: patch.font_size,
        }
    }
}

// ─── Nodes, links, groups ────────────────────────────────────────────────

/// Partial node update sent to `updateNode`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupKey>,
}

impl NodePatch {
    pub fn position(p: Point) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            ..Default::default()
        }
    }

    pub fn apply(&self, node: &mut Node) {
        if let Some(x) = self.x {
            node.x = x;
        }
        if let Some(y) = self.y {
            node.y = y;
        }
        if let Some(title) = &self.title {
            node.title = title.clone();
        }
        if let Some(color) = &self.color {
            node.color = Some(color.clone());
        }
        if let Some(group) = self.group_id {
            node.group = group;
        }
    }
}

/// A link between two nodes, as the layout library consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLink {
    pub source: EntityId,
    pub target: EntityId,
}

/// Everything needed to open a project canvas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSnapshot {
    pub groups: Vec<Group>,
    pub nodes: Vec<Node>,
    pub links: Vec<WireLink>,
    pub drawings: Vec<WireDrawing>,
}

impl ProjectSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
