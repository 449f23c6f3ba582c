//! Canvas controller: pointer and key events → gestures → store mutations.
//!
//! The controller holds interaction state only (active tool, camera
//! mirror, the gesture in progress). Everything it edits lives in the
//! [`AppState`] passed to each call.
//!
//! ```text
//!                 ┌──────────── pointer-up / Escape ────────────┐
//!                 ▼                                              │
//!   Idle ──down──► Drawing | Erasing | Resizing | Rotating |     │
//!                  DraggingSelection | MarqueeSelecting | Panning┘
//! ```

use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::persist::{Backend, PersistOutcome};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::state::AppState;
use crate::tools::{DrawSession, ToolKind};
use kg_core::geometry::{Handle, compute_bounds, cursor_for_handle, resize, rotate};
use kg_core::id::EntityId;
use kg_core::model::*;
use kg_core::viewport::Viewport;
use kg_core::Vec2;
use kg_render::{
    DrawCmd, SceneView, handle_at_point, marquee_hits, node_at_point, paint_scene, shape_at_point,
    shapes_at_point,
};
use smallvec::smallvec;

/// Snapshot of everything a selection drag moves, taken when it starts.
#[derive(Debug, Clone)]
struct DragSession {
    anchor: Point,
    nodes: Vec<(EntityId, Point)>,
    shapes: Vec<(EntityId, Points)>,
    moved: bool,
    /// Started from the layout library's node-drag callback rather than
    /// a canvas pointer-down.
    via_layout: bool,
}

impl DragSession {
    fn begin(app: &AppState, anchor: Point, via_layout: bool) -> Self {
        let nodes = app
            .selection
            .nodes
            .iter()
            .filter_map(|id| app.nodes.get(*id).map(|n| (*id, n.position())))
            .collect();
        let shapes = app
            .selection
            .shapes
            .iter()
            .filter_map(|id| app.shapes.get(*id).map(|s| (*id, s.points.clone())))
            .collect();
        Self {
            anchor,
            nodes,
            shapes,
            moved: false,
            via_layout,
        }
    }

    /// Move everything to `origin + (current − anchor)`. The first real
    /// move records an undo step when shapes are involved.
    fn apply(&mut self, app: &mut AppState, current: Point) {
        let delta = current - self.anchor;
        if !self.moved {
            if delta == Vec2::ZERO {
                return;
            }
            if !self.shapes.is_empty() {
                app.shapes.push_undo_snapshot();
            }
            self.moved = true;
        }
        for (id, origin) in &self.nodes {
            app.nodes.set_position(*id, *origin + delta);
        }
        for (id, points) in &self.shapes {
            app.shapes
                .set_points(*id, points.iter().map(|p| *p + delta).collect());
        }
        app.mark_dirty();
    }

    /// Persist each touched entity on its own.
    fn finish(self, app: &mut AppState) {
        if !self.moved {
            return;
        }
        for (id, _) in &self.nodes {
            app.persist_node_position(*id);
        }
        for (id, _) in &self.shapes {
            app.persist_geometry(*id);
        }
    }

    fn remap(&mut self, old: EntityId, new: EntityId) {
        for (id, _) in &mut self.shapes {
            if *id == old {
                *id = new;
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
enum Mode {
    #[default]
    Idle,
    Drawing(DrawSession),
    Erasing {
        snapshotted: bool,
    },
    Resizing {
        id: EntityId,
        handle: Handle,
        drag_start: Point,
        start_bounds: Bounds,
        original: Shape,
    },
    Rotating {
        id: EntityId,
        drag_start: Point,
        bounds: Bounds,
        original: Shape,
    },
    DraggingSelection(DragSession),
    MarqueeSelecting {
        start: Point,
        current: Point,
    },
    Panning {
        last_screen: Point,
    },
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Drawing(_) => "drawing",
            Mode::Erasing { .. } => "erasing",
            Mode::Resizing { .. } => "resizing",
            Mode::Rotating { .. } => "rotating",
            Mode::DraggingSelection(_) => "draggingSelection",
            Mode::MarqueeSelecting { .. } => "marqueeSelecting",
            Mode::Panning { .. } => "panning",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CanvasController {
    pub tool: ToolKind,
    /// Mirror of the layout library's camera.
    pub viewport: Viewport,
    mode: Mode,
}

impl CanvasController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the current gesture state, e.g. `"idle"` or `"resizing"`.
    pub fn mode_name(&self) -> &'static str {
        self.mode.name()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.mode, Mode::Idle)
    }

    fn scale(&self) -> f64 {
        self.viewport.zoom
    }

    pub fn set_view(&mut self, app: &mut AppState, translate: Vec2, zoom: f64) {
        self.viewport = Viewport::new(translate, zoom);
        app.mark_dirty();
    }

    /// Switch tools. A gesture in progress is ended first.
    pub fn set_tool(&mut self, app: &mut AppState, tool: ToolKind) {
        self.end_gesture(app, false);
        if self.tool != tool {
            log::debug!("tool {} -> {}", self.tool.name(), tool.name());
            self.tool = tool;
        }
    }

    // ─── Event entry points ──────────────────────────────────────────────

    /// Dispatch a normalized input event. Returns whether a key event was
    /// claimed; pointer events always return `true`.
    pub fn handle(&mut self, app: &mut AppState, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                self.pointer_down(app, Point::new(*x, *y), *button, *modifiers);
                true
            }
            InputEvent::PointerMove { x, y } => {
                self.pointer_move(app, Point::new(*x, *y));
                true
            }
            InputEvent::PointerUp { x, y } => {
                self.pointer_up(app, Point::new(*x, *y));
                true
            }
            InputEvent::Key {
                key,
                modifiers,
                in_text_input,
            } => self.key_down(app, key, *modifiers, *in_text_input),
        }
    }

    pub fn pointer_down(
        &mut self,
        app: &mut AppState,
        screen: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) {
        // A lost pointer-up (e.g. released outside the canvas) closes the
        // previous gesture here.
        if !self.is_idle() {
            self.end_gesture(app, true);
        }
        if button == PointerButton::Middle || self.tool == ToolKind::Pan {
            self.mode = Mode::Panning {
                last_screen: screen,
            };
            return;
        }
        if button != PointerButton::Primary {
            return;
        }

        let world = self.viewport.screen_to_world(screen);
        match self.tool {
            ToolKind::Select => self.select_down(app, world, modifiers),
            ToolKind::Text => self.place_text(app, world),
            ToolKind::Eraser => {
                self.mode = Mode::Erasing { snapshotted: false };
                self.erase_at(app, world);
            }
            tool => {
                if let Some(session) = DrawSession::begin(tool, world, &app.style, app.active_group())
                {
                    self.mode = Mode::Drawing(session);
                    app.mark_dirty();
                }
            }
        }
        log::debug!("pointer down → {}", self.mode.name());
    }

    pub fn pointer_move(&mut self, app: &mut AppState, screen: Point) {
        let world = self.viewport.screen_to_world(screen);
        match &mut self.mode {
            Mode::Idle => {}
            Mode::Drawing(session) => {
                session.extend(world);
                app.mark_dirty();
            }
            Mode::Erasing { .. } => self.erase_at(app, world),
            Mode::Resizing {
                id,
                handle,
                drag_start,
                start_bounds,
                original,
            } => {
                let next = resize(original, *handle, world, *drag_start, start_bounds);
                app.shapes.set_geometry(*id, &next);
                app.mark_dirty();
            }
            Mode::Rotating {
                id,
                drag_start,
                bounds,
                original,
            } => {
                let next = rotate(original, world, *drag_start, bounds);
                app.shapes.set_geometry(*id, &next);
                app.mark_dirty();
            }
            Mode::DraggingSelection(drag) => drag.apply(app, world),
            Mode::MarqueeSelecting { current, .. } => {
                *current = world;
                app.mark_dirty();
            }
            Mode::Panning { last_screen } => {
                self.viewport.pan_by(screen - *last_screen);
                *last_screen = screen;
                app.mark_dirty();
            }
        }
    }

    pub fn pointer_up(&mut self, app: &mut AppState, screen: Point) {
        self.pointer_move(app, screen);
        self.end_gesture(app, true);
    }

    /// Handle a key press through the shortcut map. Returns whether the
    /// key was claimed.
    pub fn key_down(
        &mut self,
        app: &mut AppState,
        key: &str,
        modifiers: Modifiers,
        in_text_input: bool,
    ) -> bool {
        let Some(action) = ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
            in_text_input,
        ) else {
            return false;
        };
        match action {
            ShortcutAction::Tool(tool) => self.set_tool(app, tool),
            ShortcutAction::Undo => {
                self.end_gesture(app, false);
                app.undo();
            }
            ShortcutAction::Redo => {
                self.end_gesture(app, false);
                app.redo();
            }
            ShortcutAction::Delete => {
                self.end_gesture(app, false);
                app.delete_selection();
            }
            ShortcutAction::SelectAll => app.select_all(),
            ShortcutAction::Deselect => {
                self.end_gesture(app, false);
                app.clear_selection();
            }
        }
        true
    }

    // ─── Layout library callbacks ────────────────────────────────────────

    /// A node is being dragged by the layout library. Dragging a selected
    /// node moves the whole selection with it; an unselected node is
    /// selected alone first.
    pub fn on_node_drag(&mut self, app: &mut AppState, id: EntityId, world: Point) -> bool {
        if let Mode::DraggingSelection(drag) = &mut self.mode {
            if !drag.via_layout {
                return false;
            }
            drag.apply(app, world);
            return true;
        }
        let Some(origin) = app.nodes.get(id).map(|n| n.position()) else {
            return false;
        };
        self.end_gesture(app, true);
        let entity = EntityRef::Node(id);
        if !app.selection.contains(entity) {
            app.selection.select_only(entity);
        }
        let mut drag = DragSession::begin(app, origin, true);
        drag.apply(app, world);
        self.mode = Mode::DraggingSelection(drag);
        true
    }

    pub fn on_node_drag_end(&mut self, app: &mut AppState, id: EntityId) -> bool {
        match &self.mode {
            Mode::DraggingSelection(drag) if drag.via_layout => {
                log::debug!("node drag of {id} ended");
                self.end_gesture(app, true);
                true
            }
            _ => false,
        }
    }

    pub fn on_node_click(&mut self, app: &mut AppState, id: EntityId, additive: bool) -> bool {
        if !app.nodes.contains(id) {
            return false;
        }
        let entity = EntityRef::Node(id);
        if additive {
            app.selection.toggle(entity);
        } else {
            app.selection.select_only(entity);
        }
        app.mark_dirty();
        true
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Fold a backend outcome in, keeping any gesture on the same shape
    /// pointed at its new id.
    pub fn resolve(&mut self, app: &mut AppState, outcome: PersistOutcome) {
        let Some((old, new)) = app.resolve(outcome) else {
            return;
        };
        match &mut self.mode {
            Mode::Resizing { id, original, .. } | Mode::Rotating { id, original, .. }
                if *id == old =>
            {
                *id = new;
                original.id = new;
            }
            Mode::DraggingSelection(drag) => drag.remap(old, new),
            _ => {}
        }
    }

    /// Drain completed outcomes from `backend`, then hand it every queued
    /// request. Returns how many requests were dispatched.
    pub fn pump(&mut self, app: &mut AppState, backend: &mut impl Backend) -> usize {
        for outcome in backend.poll() {
            self.resolve(app, outcome);
        }
        let requests = app.take_requests();
        let count = requests.len();
        for request in requests {
            backend.dispatch(request);
        }
        count
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    pub fn preview(&self) -> Option<&Shape> {
        match &self.mode {
            Mode::Drawing(session) => Some(session.preview()),
            _ => None,
        }
    }

    pub fn marquee(&self) -> Option<Bounds> {
        match &self.mode {
            Mode::MarqueeSelecting { start, current, .. } => {
                Some(Bounds::from_corners(*start, *current))
            }
            _ => None,
        }
    }

    /// Paint list for one frame at the layout library's `scale`.
    pub fn paint(&self, app: &AppState, scale: f64) -> Vec<DrawCmd> {
        paint_scene(&SceneView {
            shapes: app.shapes.shapes(),
            graph: &app.nodes,
            selection: &app.selection,
            group: app.active_group(),
            preview: self.preview(),
            marquee: self.marquee(),
            scale,
            node_radius: app.config.node_radius,
        })
    }

    /// CSS cursor for the pointer at `screen`.
    pub fn cursor_at(&self, app: &AppState, screen: Point) -> &'static str {
        match &self.mode {
            Mode::Panning { .. } => return "grabbing",
            Mode::Resizing { handle, .. } => return cursor_for_handle(*handle),
            Mode::Rotating { .. } => return cursor_for_handle(Handle::Rotate),
            Mode::DraggingSelection(_) => return "move",
            _ => {}
        }
        if self.tool != ToolKind::Select {
            return self.tool.cursor();
        }
        let world = self.viewport.screen_to_world(screen);
        if let Some(handle) = self.handle_under(app, world) {
            return cursor_for_handle(handle);
        }
        if self.entity_under(app, world).is_some() {
            return "move";
        }
        self.tool.cursor()
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    fn handle_under(&self, app: &AppState, world: Point) -> Option<Handle> {
        let id = app.selection.single_shape()?;
        let bounds = compute_bounds(app.shapes.get(id)?)?;
        handle_at_point(world, &bounds, self.scale())
    }

    /// Nodes are tested before shapes so a node drawn over a shape stays
    /// grabbable.
    fn entity_under(&self, app: &AppState, world: Point) -> Option<EntityRef> {
        let group = app.active_group();
        let scale = self.scale();
        let tolerance = app.config.hit_tolerance;
        node_at_point(
            &app.nodes,
            world,
            app.config.node_radius,
            scale,
            tolerance,
            group,
        )
        .map(EntityRef::Node)
        .or_else(|| {
            shape_at_point(app.shapes.shapes(), world, scale, tolerance, group)
                .map(|s| EntityRef::Shape(s.id))
        })
    }

    fn select_down(&mut self, app: &mut AppState, world: Point, modifiers: Modifiers) {
        if let Some(handle) = self.handle_under(app, world)
            && let Some(id) = app.selection.single_shape()
            && let Some(original) = app.shapes.get(id).cloned()
            && let Some(bounds) = compute_bounds(&original)
        {
            app.shapes.push_undo_snapshot();
            self.mode = if handle == Handle::Rotate {
                Mode::Rotating {
                    id,
                    drag_start: world,
                    bounds,
                    original,
                }
            } else {
                Mode::Resizing {
                    id,
                    handle,
                    drag_start: world,
                    start_bounds: bounds,
                    original,
                }
            };
            return;
        }

        match self.entity_under(app, world) {
            Some(entity) => {
                if modifiers.shift {
                    app.selection.toggle(entity);
                    app.mark_dirty();
                    if !app.selection.contains(entity) {
                        return;
                    }
                } else if !app.selection.contains(entity) {
                    app.selection.select_only(entity);
                    app.mark_dirty();
                }
                self.mode = Mode::DraggingSelection(DragSession::begin(app, world, false));
            }
            None => {
                if !modifiers.shift {
                    app.clear_selection();
                }
                self.mode = Mode::MarqueeSelecting {
                    start: world,
                    current: world,
                };
            }
        }
    }

    fn place_text(&mut self, app: &mut AppState, world: Point) {
        let kind = ShapeKind::Text {
            text: app.config.text_placeholder.clone(),
            font_size: app.style.font_size,
            font_family: app.style.font_family.clone(),
        };
        let shape = Shape::new(kind, smallvec![world], &app.style, app.active_group());
        app.shapes.push_undo_snapshot();
        let id = app.create_shape(shape);
        app.selection.select_only(EntityRef::Shape(id));
    }

    fn erase_at(&mut self, app: &mut AppState, world: Point) {
        let Mode::Erasing { snapshotted } = &mut self.mode else {
            return;
        };
        let hits = shapes_at_point(
            app.shapes.shapes(),
            world,
            self.viewport.zoom,
            app.config.eraser_tolerance,
            app.active_group(),
        );
        if hits.is_empty() {
            return;
        }
        if !*snapshotted {
            app.shapes.push_undo_snapshot();
            *snapshotted = true;
        }
        for id in hits {
            app.delete_shape(id);
        }
    }

    /// Leave the current gesture. With `commit` unset, drawings and
    /// marquees are dropped; edits already applied to the store are still
    /// persisted.
    fn end_gesture(&mut self, app: &mut AppState, commit: bool) {
        match std::mem::take(&mut self.mode) {
            Mode::Idle | Mode::Erasing { .. } | Mode::Panning { .. } => {}
            Mode::Drawing(session) => {
                if commit && let Some(shape) = session.finish() {
                    app.shapes.push_undo_snapshot();
                    let id = app.create_shape(shape);
                    app.selection.select_only(EntityRef::Shape(id));
                }
                app.mark_dirty();
            }
            Mode::Resizing { id, .. } | Mode::Rotating { id, .. } => app.persist_geometry(id),
            Mode::DraggingSelection(drag) => drag.finish(app),
            Mode::MarqueeSelecting { start, current, .. } => {
                let span = start.distance(current) * self.viewport.zoom;
                if commit && span >= app.config.marquee_threshold {
                    let rect = Bounds::from_corners(start, current);
                    let hits = marquee_hits(
                        &rect,
                        &app.nodes,
                        app.shapes.shapes(),
                        app.active_group(),
                    );
                    for id in hits.nodes {
                        app.selection.add(EntityRef::Node(id));
                    }
                    for id in hits.shapes {
                        app.selection.add(EntityRef::Shape(id));
                    }
                }
                app.mark_dirty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::PersistRequest;
    use kg_core::config::CanvasConfig;
    use pretty_assertions::assert_eq;

    fn setup() -> (CanvasController, AppState) {
        (
            CanvasController::new(),
            AppState::new("p", CanvasConfig::default()),
        )
    }

    fn drag(c: &mut CanvasController, app: &mut AppState, from: (f64, f64), to: (f64, f64)) {
        c.handle(app, &InputEvent::pointer_down(from.0, from.1));
        c.handle(app, &InputEvent::pointer_move(to.0, to.1));
        c.handle(app, &InputEvent::pointer_up(to.0, to.1));
    }

    #[test]
    fn rectangle_drag_commits_and_selects() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Rectangle);
        c.handle(&mut app, &InputEvent::pointer_down(10.0, 10.0));
        assert_eq!(c.mode_name(), "drawing");
        c.handle(&mut app, &InputEvent::pointer_move(60.0, 40.0));
        assert!(c.preview().is_some());
        assert!(app.shapes.is_empty());
        c.handle(&mut app, &InputEvent::pointer_up(60.0, 40.0));

        assert_eq!(app.shapes.len(), 1);
        let shape = &app.shapes.shapes()[0];
        assert_eq!(shape.kind, ShapeKind::Rectangle);
        assert_eq!(app.selection.single_shape(), Some(shape.id));
        assert!(c.preview().is_none());
        assert!(app.shapes.can_undo());
    }

    #[test]
    fn click_without_drag_draws_nothing() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Circle);
        drag(&mut c, &mut app, (10.0, 10.0), (10.0, 10.0));
        assert!(app.shapes.is_empty());
        assert!(!app.shapes.can_undo());
    }

    #[test]
    fn escape_cancels_drawing() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Line);
        c.handle(&mut app, &InputEvent::pointer_down(0.0, 0.0));
        c.handle(&mut app, &InputEvent::pointer_move(30.0, 0.0));
        assert!(c.key_down(&mut app, "Escape", Modifiers::NONE, false));
        assert!(c.is_idle());
        assert!(app.shapes.is_empty());
    }

    #[test]
    fn text_tool_places_placeholder() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Text);
        c.handle(&mut app, &InputEvent::pointer_down(5.0, 5.0));
        c.handle(&mut app, &InputEvent::pointer_up(5.0, 5.0));
        let shape = &app.shapes.shapes()[0];
        assert!(matches!(&shape.kind, ShapeKind::Text { text, .. } if text == "Text"));
        assert_eq!(c.tool, ToolKind::Text);
        assert!(app.set_text("Hello"));
    }

    #[test]
    fn resize_through_handle() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Rectangle);
        drag(&mut c, &mut app, (0.0, 0.0), (100.0, 100.0));
        c.set_tool(&mut app, ToolKind::Select);
        let id = app.shapes.shapes()[0].id;

        // South-east handle sits on the corner.
        c.handle(&mut app, &InputEvent::pointer_down(100.0, 100.0));
        assert_eq!(c.mode_name(), "resizing");
        c.handle(&mut app, &InputEvent::pointer_move(150.0, 120.0));
        c.handle(&mut app, &InputEvent::pointer_up(150.0, 120.0));

        let b = compute_bounds(app.shapes.get(id).unwrap()).unwrap();
        assert_eq!((b.max_x, b.max_y), (150.0, 120.0));
        assert_eq!((b.min_x, b.min_y), (0.0, 0.0));
    }

    #[test]
    fn rotate_through_handle_expands_outline() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Rectangle);
        drag(&mut c, &mut app, (0.0, 0.0), (100.0, 100.0));
        c.set_tool(&mut app, ToolKind::Select);
        let id = app.shapes.shapes()[0].id;

        // Rotate handle: 24px above the top edge midpoint.
        c.handle(&mut app, &InputEvent::pointer_down(50.0, -24.0));
        assert_eq!(c.mode_name(), "rotating");
        c.handle(&mut app, &InputEvent::pointer_up(124.0, 50.0));
        assert_eq!(app.shapes.get(id).unwrap().points.len(), 4);
    }

    #[test]
    fn shift_click_toggles_and_empty_click_clears() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Rectangle);
        drag(&mut c, &mut app, (0.0, 0.0), (40.0, 40.0));
        drag(&mut c, &mut app, (200.0, 0.0), (240.0, 40.0));
        c.set_tool(&mut app, ToolKind::Select);
        app.clear_selection();

        let shift = |x, y| InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::Primary,
            modifiers: Modifiers::SHIFT,
        };
        c.handle(&mut app, &shift(20.0, 20.0));
        c.handle(&mut app, &InputEvent::pointer_up(20.0, 20.0));
        c.handle(&mut app, &shift(220.0, 20.0));
        c.handle(&mut app, &InputEvent::pointer_up(220.0, 20.0));
        assert_eq!(app.selection.shapes.len(), 2);

        drag(&mut c, &mut app, (500.0, 500.0), (500.0, 500.0));
        assert!(app.selection.is_empty());
    }

    #[test]
    fn shift_marquee_keeps_existing_selection() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Rectangle);
        drag(&mut c, &mut app, (0.0, 0.0), (40.0, 40.0));
        drag(&mut c, &mut app, (200.0, 0.0), (240.0, 40.0));
        let first = app.shapes.shapes()[0].id;
        c.set_tool(&mut app, ToolKind::Select);
        app.selection.select_only(EntityRef::Shape(first));

        c.handle(
            &mut app,
            &InputEvent::PointerDown {
                x: 180.0,
                y: -10.0,
                button: PointerButton::Primary,
                modifiers: Modifiers::SHIFT,
            },
        );
        assert_eq!(c.mode_name(), "marqueeSelecting");
        c.handle(&mut app, &InputEvent::pointer_move(260.0, 60.0));
        c.handle(&mut app, &InputEvent::pointer_up(260.0, 60.0));
        assert_eq!(app.selection.shapes.len(), 2);
        assert!(app.selection.contains(EntityRef::Shape(first)));
    }

    #[test]
    fn pan_moves_viewport_only() {
        let (mut c, mut app) = setup();
        c.handle(
            &mut app,
            &InputEvent::PointerDown {
                x: 0.0,
                y: 0.0,
                button: PointerButton::Middle,
                modifiers: Modifiers::NONE,
            },
        );
        assert_eq!(c.mode_name(), "panning");
        c.handle(&mut app, &InputEvent::pointer_move(30.0, -10.0));
        c.handle(&mut app, &InputEvent::pointer_up(30.0, -10.0));
        assert_eq!(c.viewport.translate, Vec2::new(30.0, -10.0));
        assert!(app.shapes.is_empty());
    }

    #[test]
    fn zoomed_view_maps_pointer_to_world() {
        let (mut c, mut app) = setup();
        c.set_view(&mut app, Vec2::new(100.0, 0.0), 2.0);
        c.set_tool(&mut app, ToolKind::Line);
        drag(&mut c, &mut app, (100.0, 0.0), (300.0, 0.0));
        let pts = &app.shapes.shapes()[0].points;
        assert_eq!(pts.as_slice(), &[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
    }

    #[test]
    fn cursor_reflects_handle_and_hover() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Rectangle);
        assert_eq!(c.cursor_at(&app, Point::new(0.0, 0.0)), "crosshair");
        drag(&mut c, &mut app, (0.0, 0.0), (100.0, 100.0));
        c.set_tool(&mut app, ToolKind::Select);
        assert_eq!(c.cursor_at(&app, Point::new(100.0, 100.0)), "nwse-resize");
        assert_eq!(c.cursor_at(&app, Point::new(50.0, 50.0)), "move");
        assert_eq!(c.cursor_at(&app, Point::new(400.0, 400.0)), "default");
    }

    #[test]
    fn resolve_during_resize_follows_new_id() {
        let (mut c, mut app) = setup();
        c.set_tool(&mut app, ToolKind::Rectangle);
        drag(&mut c, &mut app, (0.0, 0.0), (100.0, 100.0));
        c.set_tool(&mut app, ToolKind::Select);
        let local = app.shapes.shapes()[0].id;
        app.take_requests();

        c.handle(&mut app, &InputEvent::pointer_down(100.0, 100.0));
        let server = EntityId::intern("srv-resize");
        c.resolve(
            &mut app,
            PersistOutcome::Created {
                local_id: local,
                server_id: server,
            },
        );
        c.handle(&mut app, &InputEvent::pointer_up(140.0, 140.0));

        let reqs = app.take_requests();
        assert!(matches!(
            reqs.last(),
            Some(PersistRequest::UpdateDrawing { id, .. }) if *id == server
        ));
    }
}
