//! Core data model for the drawing canvas.
//!
//! Shapes and graph nodes share one world coordinate space. Shapes carry
//! their geometry as an ordered point list whose meaning depends on the
//! shape kind; see [`ShapeKind`] for the encoding. Bounds are always derived
//! (see [`crate::geometry::compute_bounds`]), never stored.

use crate::id::EntityId;
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub use kurbo::Point;

/// Ordered shape geometry. Bounded primitives fit inline; pen strokes spill.
pub type Points = SmallVec<[Point; 4]>;

/// Partition key shared by nodes and shapes. Refers to [`Group::order`].
pub type GroupKey = u32;

// ─── Shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "solid" => Some(Self::Solid),
            "dashed" => Some(Self::Dashed),
            "dotted" => Some(Self::Dotted),
            _ => None,
        }
    }
}

/// Where a shape stands relative to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistenceState {
    /// Exists only in client memory under a local id.
    #[default]
    LocalPending,
    /// A create request is outstanding.
    InFlight,
    /// Carries a server-assigned id.
    Persisted,
}

/// The kind of a drawn shape, with kind-specific fields.
///
/// Point encoding per kind:
/// - `Pen`: every sampled point (≥ 1).
/// - `Line` / `Arrow`: start and end point.
/// - `Rectangle` / `Diamond` / `Circle`: either the 2-point axis-aligned
///   bounding pair, or after a rotation the 4 transformed outline points
///   (corners for rectangles, vertices for diamonds, cardinal points
///   top/right/bottom/left for circles).
/// - `Text`: the anchor (top-left of the unrotated box), optionally
///   followed by a direction point `anchor + (cos θ, sin θ)` encoding the
///   rotation angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Pen,
    Line,
    Arrow,
    Rectangle,
    Diamond,
    Circle,
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        font_size: f64,
        font_family: String,
    },
}

impl ShapeKind {
    /// Wire/tool name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Line => "line",
            Self::Arrow => "arrow",
            Self::Rectangle => "rectangle",
            Self::Diamond => "diamond",
            Self::Circle => "circle",
            Self::Text { .. } => "text",
        }
    }

    /// Fewest points a shape of this kind may carry.
    pub fn min_points(&self) -> usize {
        match self {
            Self::Pen | Self::Text { .. } => 1,
            _ => 2,
        }
    }

    /// Closed primitives described by a bounding pair or outline.
    pub fn is_outlined(&self) -> bool {
        matches!(self, Self::Rectangle | Self::Diamond | Self::Circle)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// Style applied to newly drawn shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeStyle {
    pub color: String,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub font_size: f64,
    pub font_family: String,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            color: "#1E1E1E".to_string(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            font_size: 20.0,
            font_family: "Inter, sans-serif".to_string(),
        }
    }
}

/// A drawn annotation on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: EntityId,
    #[serde(flatten)]
    pub kind: ShapeKind,
    pub points: Points,
    pub color: String,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub group: GroupKey,
    pub persistence: PersistenceState,
}

impl Shape {
    /// A fresh local-pending shape with a locally minted id.
    pub fn new(kind: ShapeKind, points: Points, style: &ShapeStyle, group: GroupKey) -> Self {
        Self {
            id: EntityId::local(),
            kind,
            points,
            color: style.color.clone(),
            stroke_width: style.stroke_width,
            stroke_style: style.stroke_style,
            group,
            persistence: PersistenceState::LocalPending,
        }
    }

    /// Whether the point list satisfies the kind's minimum.
    pub fn has_valid_points(&self) -> bool {
        self.points.len() >= self.kind.min_points()
    }

    /// Arithmetic mean of the shape's points.
    pub fn centroid(&self) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let sum = self
            .points
            .iter()
            .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
        Some((sum / n).to_point())
    }

    /// Shift every point by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    /// Rotation angle of a text shape (radians), 0 when unrotated or not text.
    pub fn text_angle(&self) -> f64 {
        match (self.kind.is_text(), self.points.as_slice()) {
            (true, [anchor, dir, ..]) => (*dir - *anchor).atan2(),
            _ => 0.0,
        }
    }

    /// Short human-readable label, used by the selection pane.
    pub fn label(&self) -> String {
        match &self.kind {
            ShapeKind::Text { text, .. } => {
                let first_line = text.lines().next().unwrap_or_default();
                format!("Text “{first_line}”")
            }
            ShapeKind::Pen => "Pen stroke".to_string(),
            ShapeKind::Line => "Line".to_string(),
            ShapeKind::Arrow => "Arrow".to_string(),
            ShapeKind::Rectangle => "Rectangle".to_string(),
            ShapeKind::Diamond => "Diamond".to_string(),
            ShapeKind::Circle => "Circle".to_string(),
        }
    }
}

/// Partial update of a shape. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub points: Option<Points>,
    pub color: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_style: Option<StrokeStyle>,
    pub text: Option<String>,
    pub font_size: Option<f64>,
}

impl ShapePatch {
    pub fn points(points: Points) -> Self {
        Self {
            points: Some(points),
            ..Default::default()
        }
    }

    /// Apply to `shape`. Text-only fields are ignored for other kinds, and a
    /// point list below the kind's minimum is rejected.
    pub fn apply(&self, shape: &mut Shape) {
        if let Some(points) = &self.points
            && points.len() >= shape.kind.min_points()
        {
            shape.points = points.clone();
        }
        if let Some(color) = &self.color {
            shape.color = color.clone();
        }
        if let Some(w) = self.stroke_width {
            shape.stroke_width = w;
        }
        if let Some(style) = self.stroke_style {
            shape.stroke_style = style;
        }
        if let ShapeKind::Text {
            text, font_size, ..
        } = &mut shape.kind
        {
            if let Some(t) = &self.text {
                *text = t.clone();
            }
            if let Some(fs) = self.font_size {
                *font_size = fs;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ─── Graph nodes & groups ────────────────────────────────────────────────

/// A knowledge-graph vertex as far as the canvas is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(rename = "groupId", default)]
    pub group: GroupKey,
}

impl Node {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }
}

/// A named, colored partition (tab/layer) of nodes and shapes.
///
/// `order` is the partition key entities refer to; it is assigned once on
/// creation and does not change when tabs are reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: EntityId,
    pub name: String,
    pub color: String,
    pub order: GroupKey,
}

/// A reference to either kind of selectable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Node(EntityId),
    Shape(EntityId),
}

// ─── Selection ───────────────────────────────────────────────────────────

/// Selected node ids and selected shape ids, each in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    pub nodes: Vec<EntityId>,
    pub shapes: Vec<EntityId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.shapes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.shapes.clear();
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Node(id) => self.nodes.contains(&id),
            EntityRef::Shape(id) => self.shapes.contains(&id),
        }
    }

    /// Replace the whole selection with a single entity.
    pub fn select_only(&mut self, entity: EntityRef) {
        self.clear();
        self.add(entity);
    }

    pub fn add(&mut self, entity: EntityRef) {
        let list = self.list_mut(entity);
        let id = entity_id(entity);
        if !list.contains(&id) {
            list.push(id);
        }
    }

    pub fn remove(&mut self, entity: EntityRef) -> bool {
        let id = entity_id(entity);
        let list = self.list_mut(entity);
        let before = list.len();
        list.retain(|x| *x != id);
        list.len() != before
    }

    pub fn toggle(&mut self, entity: EntityRef) {
        if !self.remove(entity) {
            self.add(entity);
        }
    }

    /// The single selected shape, if exactly one shape (and no node) is selected.
    pub fn single_shape(&self) -> Option<EntityId> {
        match (self.shapes.as_slice(), self.nodes.is_empty()) {
            ([only], true) => Some(*only),
            _ => None,
        }
    }

    /// Rewrite a shape id in place, keeping its position in the list.
    pub fn replace_shape_id(&mut self, old: EntityId, new: EntityId) -> bool {
        match self.shapes.iter_mut().find(|id| **id == old) {
            Some(slot) => {
                *slot = new;
                true
            }
            None => false,
        }
    }

    /// All selected entities, nodes first.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.nodes
            .iter()
            .map(|id| EntityRef::Node(*id))
            .chain(self.shapes.iter().map(|id| EntityRef::Shape(*id)))
    }

    fn list_mut(&mut self, entity: EntityRef) -> &mut Vec<EntityId> {
        match entity {
            EntityRef::Node(_) => &mut self.nodes,
            EntityRef::Shape(_) => &mut self.shapes,
        }
    }
}

fn entity_id(entity: EntityRef) -> EntityId {
    match entity {
        EntityRef::Node(id) | EntityRef::Shape(id) => id,
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Build from two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Smallest box containing every point; `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::from_corners(first, first), |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Grow by `d` on every side.
    pub fn inflate(&self, d: f64) -> Self {
        Self {
            min_x: self.min_x - d,
            min_y: self.min_y - d,
            max_x: self.max_x + d,
            max_y: self.max_y + d,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}
