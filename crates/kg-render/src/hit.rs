//! Hit testing: point → shape/node/handle lookup, marquee containment.
//!
//! Shape hits are bounding-box tests, not path-distance tests. Drawn
//! shapes are mostly compact and the tolerance is generous, so the box is
//! a good enough stand-in; a diagonal pen stroke will register hits in the
//! empty corners of its box. That imprecision is accepted.

use kg_core::geometry::{HANDLE_RADIUS, Handle, compute_bounds};
use kg_core::id::EntityId;
use kg_core::model::{Bounds, GroupKey, Point, Shape};
use kg_core::KnowledgeGraph;

/// Whether `point` lies within the shape's bounds grown by
/// `tolerance / scale` (tolerance is in screen pixels).
pub fn is_near(point: Point, shape: &Shape, scale: f64, tolerance: f64) -> bool {
    compute_bounds(shape).is_some_and(|b| b.inflate(tolerance / scale).contains(point))
}

/// The first handle (in [`Handle::ALL`] priority order) whose screen-space
/// radius contains `point`.
pub fn handle_at_point(point: Point, bounds: &Bounds, scale: f64) -> Option<Handle> {
    let radius = HANDLE_RADIUS / scale;
    Handle::ALL
        .into_iter()
        .find(|h| h.position(bounds, scale).distance(point) <= radius)
}

/// Topmost shape of `group` under `point` (last painted wins).
pub fn shape_at_point(
    shapes: &[Shape],
    point: Point,
    scale: f64,
    tolerance: f64,
    group: GroupKey,
) -> Option<&Shape> {
    shapes
        .iter()
        .rev()
        .filter(|s| s.group == group)
        .find(|s| is_near(point, s, scale, tolerance))
}

/// Every shape of `group` under `point`, in paint order.
pub fn shapes_at_point(
    shapes: &[Shape],
    point: Point,
    scale: f64,
    tolerance: f64,
    group: GroupKey,
) -> Vec<EntityId> {
    shapes
        .iter()
        .filter(|s| s.group == group && is_near(point, s, scale, tolerance))
        .map(|s| s.id)
        .collect()
}

/// Closest node of `group` whose disc (radius in world units, plus
/// `tolerance / scale`) contains `point`.
pub fn node_at_point(
    graph: &KnowledgeGraph,
    point: Point,
    radius: f64,
    scale: f64,
    tolerance: f64,
    group: GroupKey,
) -> Option<EntityId> {
    let reach = radius + tolerance / scale;
    graph
        .in_group(group)
        .map(|n| (n.id, n.position().distance(point)))
        .filter(|(_, d)| *d <= reach)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Entities captured by a marquee rectangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarqueeHits {
    pub nodes: Vec<EntityId>,
    pub shapes: Vec<EntityId>,
}

/// Nodes whose position lies inside `rect`, and shapes whose point
/// centroid lies inside it. Shapes only partly covered by the marquee are
/// still captured when their centroid is.
pub fn marquee_hits(
    rect: &Bounds,
    graph: &KnowledgeGraph,
    shapes: &[Shape],
    group: GroupKey,
) -> MarqueeHits {
    let nodes = graph
        .in_group(group)
        .filter(|n| rect.contains(n.position()))
        .map(|n| n.id)
        .collect();
    let shapes = shapes
        .iter()
        .filter(|s| s.group == group)
        .filter(|s| s.centroid().is_some_and(|c| rect.contains(c)))
        .map(|s| s.id)
        .collect();
    MarqueeHits { nodes, shapes }
}
