//! Shapes + selection chrome → backend-agnostic draw commands.
//!
//! Produces a flat list of world-space commands each frame. The host
//! (Canvas2D in the WASM bridge) replays them inside the layout library's
//! post-render hook, where the context is already in graph coordinates.
//! Chrome widths are divided by the zoom so they stay constant on screen.

use kg_core::KnowledgeGraph;
use kg_core::geometry::{
    HANDLE_RADIUS, Handle, LINE_HEIGHT, compute_bounds, outline_points,
};
use kg_core::model::*;
use kurbo::{BezPath, Ellipse, Rect, Shape as _, Vec2};

/// Accent used for selection boxes, handles, and the marquee.
pub const SELECTION_COLOR: &str = "#4F8EF7";
const MARQUEE_FILL: &str = "rgba(79, 142, 247, 0.08)";
const HANDLE_FILL: &str = "#FFFFFF";

/// Flattening tolerance for curves, in world units.
const PATH_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Stroke {
        path: BezPath,
        color: String,
        width: f64,
        dash: StrokeStyle,
    },
    Fill {
        path: BezPath,
        color: String,
    },
    /// Text block; `anchor` is the top-left of the unrotated box and each
    /// line sits one line height below the previous.
    Text {
        anchor: Point,
        angle: f64,
        lines: Vec<String>,
        font_size: f64,
        font_family: String,
        color: String,
    },
}

/// What one frame needs to know.
pub struct SceneView<'a> {
    pub shapes: &'a [Shape],
    pub graph: &'a KnowledgeGraph,
    pub selection: &'a SelectionSet,
    pub group: GroupKey,
    pub preview: Option<&'a Shape>,
    pub marquee: Option<Bounds>,
    pub scale: f64,
    pub node_radius: f64,
}

/// Paint the active group's shapes, then the in-progress preview, then
/// selection chrome on top.
pub fn paint_scene(view: &SceneView<'_>) -> Vec<DrawCmd> {
    let scale = if view.scale > 0.0 { view.scale } else { 1.0 };
    let mut out = Vec::new();

    for shape in view.shapes.iter().filter(|s| s.group == view.group) {
        paint_shape(&mut out, shape, shape.stroke_style);
    }

    if let Some(preview) = view.preview {
        paint_shape(&mut out, preview, StrokeStyle::Dashed);
    }

    for id in &view.selection.shapes {
        let Some(shape) = view.shapes.iter().find(|s| s.id == *id) else {
            continue;
        };
        if shape.group != view.group {
            continue;
        }
        if let Some(b) = compute_bounds(shape) {
            paint_selection_box(&mut out, &b, scale);
        }
    }

    if let Some(id) = view.selection.single_shape()
        && let Some(shape) = view.shapes.iter().find(|s| s.id == id && s.group == view.group)
        && let Some(b) = compute_bounds(shape)
    {
        paint_handles(&mut out, &b, scale);
    }

    for id in &view.selection.nodes {
        if let Some(node) = view.graph.get(*id)
            && node.group == view.group
        {
            let ring = Ellipse::new(
                node.position(),
                Vec2::new(view.node_radius + 3.0 / scale, view.node_radius + 3.0 / scale),
                0.0,
            );
            out.push(DrawCmd::Stroke {
                path: ring.to_path(PATH_TOLERANCE),
                color: SELECTION_COLOR.to_string(),
                width: 2.0 / scale,
                dash: StrokeStyle::Solid,
            });
        }
    }

    if let Some(m) = view.marquee {
        let path = m.to_rect().to_path(PATH_TOLERANCE);
        out.push(DrawCmd::Fill {
            path: path.clone(),
            color: MARQUEE_FILL.to_string(),
        });
        out.push(DrawCmd::Stroke {
            path,
            color: SELECTION_COLOR.to_string(),
            width: 1.0 / scale,
            dash: StrokeStyle::Dashed,
        });
    }

    out
}

/// Canvas line-dash segments for a stroke style at a given width.
pub fn dash_pattern(style: StrokeStyle, width: f64) -> Vec<f64> {
    let w = width.max(1.0);
    match style {
        StrokeStyle::Solid => Vec::new(),
        StrokeStyle::Dashed => vec![w * 4.0, w * 3.0],
        StrokeStyle::Dotted => vec![w, w * 2.0],
    }
}

fn paint_shape(out: &mut Vec<DrawCmd>, shape: &Shape, dash: StrokeStyle) {
    if let ShapeKind::Text {
        text,
        font_size,
        font_family,
    } = &shape.kind
    {
        if let Some(anchor) = shape.points.first() {
            out.push(DrawCmd::Text {
                anchor: *anchor,
                angle: shape.text_angle(),
                lines: text.split('\n').map(str::to_string).collect(),
                font_size: *font_size,
                font_family: font_family.clone(),
                color: shape.color.clone(),
            });
        }
        return;
    }
    let Some(path) = shape_path(shape) else {
        return;
    };
    out.push(DrawCmd::Stroke {
        path,
        color: shape.color.clone(),
        width: shape.stroke_width,
        dash,
    });
}

/// Outline of a non-text shape in world coordinates.
pub fn shape_path(shape: &Shape) -> Option<BezPath> {
    let pts = shape.points.as_slice();
    let first = *pts.first()?;
    let path = match shape.kind {
        ShapeKind::Pen | ShapeKind::Line => polyline(pts, false),
        ShapeKind::Arrow => {
            let mut path = polyline(pts, false);
            if let [.., tail, tip] = pts {
                arrow_head(&mut path, *tail, *tip, shape.stroke_width);
            }
            path
        }
        ShapeKind::Rectangle | ShapeKind::Diamond => polyline(&outline_points(shape), true),
        ShapeKind::Circle => match pts {
            [a, b] => Ellipse::from_rect(Rect::from_points(*a, *b)).to_path(PATH_TOLERANCE),
            [top, right, bottom, left, ..] => {
                let center = top.midpoint(*bottom);
                let rx = center.distance(*right);
                let ry = center.distance(*top);
                let angle = (*right - left.midpoint(*right)).atan2();
                Ellipse::new(center, Vec2::new(rx, ry), angle).to_path(PATH_TOLERANCE)
            }
            _ => Ellipse::new(first, Vec2::ZERO, 0.0).to_path(PATH_TOLERANCE),
        },
        ShapeKind::Text { .. } => return None,
    };
    Some(path)
}

fn polyline(pts: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = pts.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        // A single sample still leaves a visible dot with round caps.
        if pts.len() == 1 {
            path.line_to(*first);
        }
    }
    for p in iter {
        path.line_to(*p);
    }
    if closed {
        path.close_path();
    }
    path
}

fn arrow_head(path: &mut BezPath, tail: Point, tip: Point, stroke_width: f64) {
    let dir = tip - tail;
    if dir.hypot() < f64::EPSILON {
        return;
    }
    let len = 10.0 + stroke_width * 2.0;
    let back = -dir.normalize() * len;
    let spread = std::f64::consts::FRAC_PI_6;
    for a in [spread, -spread] {
        path.move_to(tip);
        path.line_to(tip + rotate_vec(back, a));
    }
}

fn rotate_vec(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

fn paint_selection_box(out: &mut Vec<DrawCmd>, b: &Bounds, scale: f64) {
    out.push(DrawCmd::Stroke {
        path: b.inflate(4.0 / scale).to_rect().to_path(PATH_TOLERANCE),
        color: SELECTION_COLOR.to_string(),
        width: 1.0 / scale,
        dash: StrokeStyle::Dashed,
    });
}

fn paint_handles(out: &mut Vec<DrawCmd>, b: &Bounds, scale: f64) {
    let n = Handle::N.position(b, scale);
    let rot = Handle::Rotate.position(b, scale);
    let mut stem = BezPath::new();
    stem.move_to(n);
    stem.line_to(rot);
    out.push(DrawCmd::Stroke {
        path: stem,
        color: SELECTION_COLOR.to_string(),
        width: 1.0 / scale,
        dash: StrokeStyle::Solid,
    });

    // Drawn a little smaller than the hit radius.
    let r = HANDLE_RADIUS * 0.6 / scale;
    for handle in Handle::ALL {
        let c = handle.position(b, scale);
        let path = match handle {
            Handle::Rotate => Ellipse::new(c, Vec2::new(r, r), 0.0).to_path(PATH_TOLERANCE),
            _ => Rect::from_center_size(c, (r * 2.0, r * 2.0)).to_path(PATH_TOLERANCE),
        };
        out.push(DrawCmd::Fill {
            path: path.clone(),
            color: HANDLE_FILL.to_string(),
        });
        out.push(DrawCmd::Stroke {
            path,
            color: SELECTION_COLOR.to_string(),
            width: 1.5 / scale,
            dash: StrokeStyle::Solid,
        });
    }
}

/// Vertical offset of line `i` of a text block.
pub fn text_line_offset(i: usize, font_size: f64) -> f64 {
    i as f64 * font_size * LINE_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use kg_core::EntityId;
    use pretty_assertions::assert_eq;

    fn shape(kind: ShapeKind, pts: &[(f64, f64)]) -> Shape {
        Shape::new(
            kind,
            pts.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            &ShapeStyle::default(),
            0,
        )
    }

    fn view<'a>(
        shapes: &'a [Shape],
        graph: &'a KnowledgeGraph,
        selection: &'a SelectionSet,
    ) -> SceneView<'a> {
        SceneView {
            shapes,
            graph,
            selection,
            group: 0,
            preview: None,
            marquee: None,
            scale: 1.0,
            node_radius: 4.0,
        }
    }

    fn strokes(cmds: &[DrawCmd]) -> usize {
        cmds.iter()
            .filter(|c| matches!(c, DrawCmd::Stroke { .. }))
            .count()
    }

    #[test]
    fn only_active_group_is_painted() {
        let mut other = shape(ShapeKind::Line, &[(0.0, 0.0), (1.0, 1.0)]);
        other.group = 2;
        let shapes = vec![shape(ShapeKind::Line, &[(0.0, 0.0), (5.0, 5.0)]), other];
        let graph = KnowledgeGraph::new();
        let sel = SelectionSet::new();
        let cmds = paint_scene(&view(&shapes, &graph, &sel));
        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn single_selection_paints_handles() {
        let rect = shape(ShapeKind::Rectangle, &[(0.0, 0.0), (50.0, 50.0)]);
        let mut sel = SelectionSet::new();
        sel.select_only(EntityRef::Shape(rect.id));
        let shapes = vec![rect];
        let graph = KnowledgeGraph::new();
        let cmds = paint_scene(&view(&shapes, &graph, &sel));
        // shape + box + stem + 9 handle outlines
        assert_eq!(strokes(&cmds), 12);
        let fills = cmds.iter().filter(|c| matches!(c, DrawCmd::Fill { .. })).count();
        assert_eq!(fills, 9);
    }

    #[test]
    fn multi_selection_has_boxes_but_no_handles() {
        let a = shape(ShapeKind::Rectangle, &[(0.0, 0.0), (50.0, 50.0)]);
        let b = shape(ShapeKind::Circle, &[(60.0, 0.0), (90.0, 30.0)]);
        let mut sel = SelectionSet::new();
        sel.add(EntityRef::Shape(a.id));
        sel.add(EntityRef::Shape(b.id));
        let shapes = vec![a, b];
        let graph = KnowledgeGraph::new();
        let cmds = paint_scene(&view(&shapes, &graph, &sel));
        assert_eq!(strokes(&cmds), 4);
    }

    #[test]
    fn preview_is_dashed() {
        let preview = shape(ShapeKind::Rectangle, &[(0.0, 0.0), (10.0, 10.0)]);
        let graph = KnowledgeGraph::new();
        let sel = SelectionSet::new();
        let mut v = view(&[], &graph, &sel);
        v.preview = Some(&preview);
        let cmds = paint_scene(&v);
        assert!(matches!(
            cmds.as_slice(),
            [DrawCmd::Stroke {
                dash: StrokeStyle::Dashed,
                ..
            }]
        ));
    }

    #[test]
    fn selected_node_gets_a_ring() {
        let mut graph = KnowledgeGraph::new();
        let id = EntityId::intern("ring-node");
        graph.insert(Node {
            id,
            x: 10.0,
            y: 10.0,
            title: String::new(),
            color: None,
            group: 0,
        });
        let mut sel = SelectionSet::new();
        sel.add(EntityRef::Node(id));
        let cmds = paint_scene(&view(&[], &graph, &sel));
        assert_eq!(strokes(&cmds), 1);
    }

    #[test]
    fn text_becomes_text_command() {
        let t = shape(
            ShapeKind::Text {
                text: "a\nbc".into(),
                font_size: 12.0,
                font_family: "Inter".into(),
            },
            &[(3.0, 4.0)],
        );
        let graph = KnowledgeGraph::new();
        let sel = SelectionSet::new();
        let shapes = vec![t];
        let cmds = paint_scene(&view(&shapes, &graph, &sel));
        match &cmds[0] {
            DrawCmd::Text { anchor, lines, .. } => {
                assert_eq!(*anchor, Point::new(3.0, 4.0));
                assert_eq!(lines, &vec!["a".to_string(), "bc".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rotated_circle_keeps_radii() {
        // Cardinal points of an upright 20×40 ellipse.
        let c = shape(
            ShapeKind::Circle,
            &[(30.0, -10.0), (40.0, 10.0), (30.0, 30.0), (20.0, 10.0)],
        );
        let path = shape_path(&c).unwrap();
        let bb = path.bounding_box();
        assert!((bb.width() - 20.0).abs() < 0.5);
        assert!((bb.height() - 40.0).abs() < 0.5);
    }

    #[test]
    fn dash_patterns() {
        assert!(dash_pattern(StrokeStyle::Solid, 2.0).is_empty());
        assert_eq!(dash_pattern(StrokeStyle::Dashed, 2.0), vec![8.0, 6.0]);
        assert_eq!(dash_pattern(StrokeStyle::Dotted, 0.5), vec![1.0, 2.0]);
    }
}
