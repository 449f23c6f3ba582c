//! Pure shape geometry: bounds, resize, rotate, and handle layout.
//!
//! Everything here works on axis-aligned bounding boxes derived from a
//! shape's points. Text has no real glyph metrics at this layer; its box is
//! estimated from character counts (see [`text_box_size`]). Painting and
//! hit testing both go through the same estimate, so they always agree.

use crate::model::{Bounds, Point, Points, Shape, ShapeKind};
use kurbo::{Affine, Vec2};
use smallvec::smallvec;

/// Smallest edge length a resize may produce, in world units.
pub const MIN_SHAPE_SIZE: f64 = 20.0;

/// Average glyph advance as a fraction of the font size.
pub const AVG_GLYPH_WIDTH: f64 = 0.6;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// Screen-space radius of a selection handle, in pixels.
pub const HANDLE_RADIUS: f64 = 8.0;

/// Screen-space distance of the rotate handle above the top edge.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

const EPSILON: f64 = 1e-9;

// ─── Handles ─────────────────────────────────────────────────────────────

/// A draggable control on the single selected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Rotate,
    Nw,
    Ne,
    Sw,
    Se,
    N,
    S,
    E,
    W,
}

impl Handle {
    /// Hit-test priority order. On small boxes the corner discs overlap the
    /// edge midpoints, and corners win.
    pub const ALL: [Handle; 9] = [
        Handle::Rotate,
        Handle::Nw,
        Handle::Ne,
        Handle::Sw,
        Handle::Se,
        Handle::N,
        Handle::S,
        Handle::E,
        Handle::W,
    ];

    pub fn moves_west(self) -> bool {
        matches!(self, Handle::Nw | Handle::Sw | Handle::W)
    }

    pub fn moves_east(self) -> bool {
        matches!(self, Handle::Ne | Handle::Se | Handle::E)
    }

    pub fn moves_north(self) -> bool {
        matches!(self, Handle::Nw | Handle::Ne | Handle::N)
    }

    pub fn moves_south(self) -> bool {
        matches!(self, Handle::Sw | Handle::Se | Handle::S)
    }

    /// World position of this handle on `bounds` at zoom `scale`.
    pub fn position(self, bounds: &Bounds, scale: f64) -> Point {
        let c = bounds.center();
        match self {
            Handle::Rotate => Point::new(c.x, bounds.min_y - ROTATE_HANDLE_OFFSET / scale),
            Handle::Nw => Point::new(bounds.min_x, bounds.min_y),
            Handle::Ne => Point::new(bounds.max_x, bounds.min_y),
            Handle::Sw => Point::new(bounds.min_x, bounds.max_y),
            Handle::Se => Point::new(bounds.max_x, bounds.max_y),
            Handle::N => Point::new(c.x, bounds.min_y),
            Handle::S => Point::new(c.x, bounds.max_y),
            Handle::E => Point::new(bounds.max_x, c.y),
            Handle::W => Point::new(bounds.min_x, c.y),
        }
    }
}

/// CSS cursor name for hovering or dragging `handle`.
pub fn cursor_for_handle(handle: Handle) -> &'static str {
    match handle {
        Handle::Nw | Handle::Se => "nwse-resize",
        Handle::Ne | Handle::Sw => "nesw-resize",
        Handle::N | Handle::S => "ns-resize",
        Handle::E | Handle::W => "ew-resize",
        Handle::Rotate => "grab",
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Estimated `(width, height)` of a text block.
///
/// Approximation: the longest line's character count times an average
/// glyph width, and one line height per line. Not exact text metrics.
pub fn text_box_size(text: &str, font_size: f64) -> (f64, f64) {
    let lines = text.split('\n');
    let (count, longest) = lines.fold((0usize, 0usize), |(n, w), line| {
        (n + 1, w.max(line.chars().count()))
    });
    let width = longest.max(1) as f64 * AVG_GLYPH_WIDTH * font_size;
    let height = count.max(1) as f64 * font_size * LINE_HEIGHT;
    (width, height)
}

/// Axis-aligned bounds of a shape; `None` only when it has no points.
pub fn compute_bounds(shape: &Shape) -> Option<Bounds> {
    match &shape.kind {
        ShapeKind::Text {
            text, font_size, ..
        } => {
            let anchor = *shape.points.first()?;
            let (w, h) = text_box_size(text, *font_size);
            let rot = Affine::rotate_about(shape.text_angle(), anchor);
            let corners = [
                anchor,
                anchor + Vec2::new(w, 0.0),
                anchor + Vec2::new(w, h),
                anchor + Vec2::new(0.0, h),
            ]
            .map(|p| rot * p);
            Bounds::from_points(corners.iter())
        }
        _ => Bounds::from_points(shape.points.iter()),
    }
}

// ─── Resize ──────────────────────────────────────────────────────────────

/// Resize `shape` by dragging `handle` from `drag_start` to `current`.
///
/// Only the edges implied by the handle move; each moving edge is clamped
/// so the box never shrinks below [`MIN_SHAPE_SIZE`] (the fixed edge never
/// moves). Every point is then remapped by its fractional position inside
/// `start_bounds` into the new box, which scales pen strokes and rotated
/// outlines without losing their shape. Text keeps its anchor offset and
/// scales its font size instead.
pub fn resize(
    shape: &Shape,
    handle: Handle,
    current: Point,
    drag_start: Point,
    start_bounds: &Bounds,
) -> Shape {
    if handle == Handle::Rotate {
        return shape.clone();
    }
    let target = resized_bounds(handle, current - drag_start, start_bounds);

    let mut out = shape.clone();
    out.points = shape
        .points
        .iter()
        .map(|p| remap(*p, start_bounds, &target))
        .collect();

    if let ShapeKind::Text { font_size, .. } = &mut out.kind {
        let ratio = if matches!(handle, Handle::E | Handle::W) {
            axis_ratio(target.width(), start_bounds.width())
        } else {
            axis_ratio(target.height(), start_bounds.height())
        };
        *font_size *= ratio;
        // Keep the direction point a unit step from the new anchor.
        if let (Some(old_anchor), Some(old_dir)) = (shape.points.first(), shape.points.get(1)) {
            let offset = *old_dir - *old_anchor;
            out.points[1] = out.points[0] + offset;
        }
    }
    out
}

/// The box `start` becomes after dragging `handle` by `delta`.
pub fn resized_bounds(handle: Handle, delta: Vec2, start: &Bounds) -> Bounds {
    let mut b = *start;
    if handle.moves_west() {
        b.min_x = (start.min_x + delta.x).min(start.max_x - MIN_SHAPE_SIZE);
    }
    if handle.moves_east() {
        b.max_x = (start.max_x + delta.x).max(start.min_x + MIN_SHAPE_SIZE);
    }
    if handle.moves_north() {
        b.min_y = (start.min_y + delta.y).min(start.max_y - MIN_SHAPE_SIZE);
    }
    if handle.moves_south() {
        b.max_y = (start.max_y + delta.y).max(start.min_y + MIN_SHAPE_SIZE);
    }
    b
}

fn remap(p: Point, from: &Bounds, to: &Bounds) -> Point {
    Point::new(
        remap_axis(p.x, from.min_x, from.width(), to.min_x, to.width()),
        remap_axis(p.y, from.min_y, from.height(), to.min_y, to.height()),
    )
}

fn remap_axis(v: f64, from_min: f64, from_len: f64, to_min: f64, to_len: f64) -> f64 {
    if from_len.abs() < EPSILON {
        // Degenerate axis: no fraction to preserve, carry the offset over.
        to_min + (v - from_min)
    } else {
        to_min + (v - from_min) / from_len * to_len
    }
}

fn axis_ratio(new_len: f64, old_len: f64) -> f64 {
    if old_len.abs() < EPSILON {
        1.0
    } else {
        new_len / old_len
    }
}

// ─── Rotate ──────────────────────────────────────────────────────────────

/// Rotate `shape` about the center of `bounds` by the angle swept from
/// `drag_start` to `current`. Size is preserved; only orientation changes.
pub fn rotate(shape: &Shape, current: Point, drag_start: Point, bounds: &Bounds) -> Shape {
    let center = bounds.center();
    let delta = (current - center).atan2() - (drag_start - center).atan2();
    rotate_by(shape, delta, center)
}

/// Rotate every point of `shape` by `angle` radians about `center`.
pub fn rotate_by(shape: &Shape, angle: f64, center: Point) -> Shape {
    let mut out = shape.clone();
    out.points = outline_points(shape);
    if out.kind.is_text() && out.points.len() == 1 {
        let anchor = out.points[0];
        out.points.push(anchor + Vec2::new(1.0, 0.0));
    }
    let rotation = Affine::rotate_about(angle, center);
    for p in &mut out.points {
        *p = rotation * *p;
    }
    out
}

/// Points of `shape` with any 2-point rectangle/diamond/circle expanded to
/// its 4-point outline encoding. Other shapes are returned unchanged.
pub fn outline_points(shape: &Shape) -> Points {
    if !shape.kind.is_outlined() || shape.points.len() != 2 {
        return shape.points.clone();
    }
    let b = Bounds::from_corners(shape.points[0], shape.points[1]);
    let c = b.center();
    match shape.kind {
        ShapeKind::Rectangle => smallvec![
            Point::new(b.min_x, b.min_y),
            Point::new(b.max_x, b.min_y),
            Point::new(b.max_x, b.max_y),
            Point::new(b.min_x, b.max_y),
        ],
        // Diamond vertices and circle cardinal points: top, right, bottom, left.
        _ => smallvec![
            Point::new(c.x, b.min_y),
            Point::new(b.max_x, c.y),
            Point::new(c.x, b.max_y),
            Point::new(b.min_x, c.y),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShapeStyle;
    use pretty_assertions::assert_eq;
    use std::f64::consts::FRAC_PI_2;

    fn shape(kind: ShapeKind, pts: &[(f64, f64)]) -> Shape {
        Shape::new(
            kind,
            pts.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            &ShapeStyle::default(),
            0,
        )
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-6
    }

    #[test]
    fn bounds_of_empty_shape_is_none() {
        let s = shape(ShapeKind::Pen, &[]);
        assert!(compute_bounds(&s).is_none());
    }

    #[test]
    fn bounds_of_two_point_rect() {
        let s = shape(ShapeKind::Rectangle, &[(30.0, 40.0), (10.0, 0.0)]);
        let b = compute_bounds(&s).unwrap();
        assert_eq!(b, Bounds::from_corners(Point::new(10.0, 0.0), Point::new(30.0, 40.0)));
        assert_eq!(b.width(), 20.0);
        assert_eq!(b.height(), 40.0);
    }

    #[test]
    fn text_bounds_use_glyph_estimate() {
        let s = shape(
            ShapeKind::Text {
                text: "abcd\nab".into(),
                font_size: 10.0,
                font_family: "Inter".into(),
            },
            &[(100.0, 100.0)],
        );
        let b = compute_bounds(&s).unwrap();
        assert!((b.width() - 4.0 * AVG_GLYPH_WIDTH * 10.0).abs() < 1e-9);
        assert!((b.height() - 2.0 * 10.0 * LINE_HEIGHT).abs() < 1e-9);
        assert_eq!(b.min_x, 100.0);
    }

    #[test]
    fn resize_east_moves_only_max_x() {
        let s = shape(ShapeKind::Rectangle, &[(0.0, 0.0), (100.0, 50.0)]);
        let b = compute_bounds(&s).unwrap();
        let out = resize(&s, Handle::E, Point::new(150.0, 80.0), Point::new(100.0, 25.0), &b);
        let nb = compute_bounds(&out).unwrap();
        assert_eq!((nb.min_x, nb.min_y, nb.max_x, nb.max_y), (0.0, 0.0, 150.0, 50.0));
    }

    #[test]
    fn resize_clamps_moving_edge() {
        let s = shape(ShapeKind::Rectangle, &[(0.0, 0.0), (100.0, 100.0)]);
        let b = compute_bounds(&s).unwrap();
        let out = resize(&s, Handle::Nw, Point::new(500.0, 500.0), Point::new(0.0, 0.0), &b);
        let nb = compute_bounds(&out).unwrap();
        assert_eq!((nb.min_x, nb.min_y), (80.0, 80.0));
        assert_eq!((nb.max_x, nb.max_y), (100.0, 100.0));
    }

    #[test]
    fn resize_scales_pen_points_proportionally() {
        let s = shape(ShapeKind::Pen, &[(0.0, 0.0), (50.0, 25.0), (100.0, 100.0)]);
        let b = compute_bounds(&s).unwrap();
        let out = resize(&s, Handle::Se, Point::new(200.0, 200.0), Point::new(100.0, 100.0), &b);
        assert!(close(out.points[1], Point::new(100.0, 50.0)));
        assert!(close(out.points[2], Point::new(200.0, 200.0)));
    }

    #[test]
    fn resize_text_scales_font() {
        let s = shape(
            ShapeKind::Text {
                text: "hello".into(),
                font_size: 10.0,
                font_family: "Inter".into(),
            },
            &[(0.0, 0.0)],
        );
        let b = compute_bounds(&s).unwrap();
        let out = resize(&s, Handle::S, Point::new(0.0, b.max_y + b.height()), Point::new(0.0, b.max_y), &b);
        match out.kind {
            ShapeKind::Text { font_size, .. } => assert!((font_size - 20.0).abs() < 1e-9),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn rotate_quarter_turn_about_center() {
        let s = shape(ShapeKind::Line, &[(0.0, 0.0), (100.0, 0.0)]);
        let b = Bounds::from_corners(Point::new(0.0, -50.0), Point::new(100.0, 50.0));
        // Sweep from the east side of the center to the south side.
        let out = rotate(&s, Point::new(50.0, 100.0), Point::new(100.0, 0.0), &b);
        assert!(close(out.points[0], Point::new(50.0, -50.0)));
        assert!(close(out.points[1], Point::new(50.0, 50.0)));
    }

    #[test]
    fn rotate_expands_rectangle_to_corners() {
        let s = shape(ShapeKind::Rectangle, &[(0.0, 0.0), (40.0, 20.0)]);
        let out = rotate_by(&s, FRAC_PI_2, Point::new(20.0, 10.0));
        assert_eq!(out.points.len(), 4);
        let nb = compute_bounds(&out).unwrap();
        assert!((nb.width() - 20.0).abs() < 1e-9);
        assert!((nb.height() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn rotate_text_records_angle() {
        let s = shape(
            ShapeKind::Text {
                text: "a".into(),
                font_size: 10.0,
                font_family: "Inter".into(),
            },
            &[(0.0, 0.0)],
        );
        let out = rotate_by(&s, FRAC_PI_2, Point::new(0.0, 0.0));
        assert_eq!(out.points.len(), 2);
        assert!((out.text_angle() - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn cursor_mapping() {
        assert_eq!(cursor_for_handle(Handle::Nw), "nwse-resize");
        assert_eq!(cursor_for_handle(Handle::Se), "nwse-resize");
        assert_eq!(cursor_for_handle(Handle::Ne), "nesw-resize");
        assert_eq!(cursor_for_handle(Handle::N), "ns-resize");
        assert_eq!(cursor_for_handle(Handle::W), "ew-resize");
        assert_eq!(cursor_for_handle(Handle::Rotate), "grab");
    }
}
