//! WASM bridge for KG Canvas. Exposes the drawing engine to the page
//! hosting the force-layout graph.
//!
//! Compiled via `wasm-pack build --target web`. The host forwards pointer
//! and key events, mirrors the layout library's camera, calls `render`
//! from its post-frame hook, and supplies a persistence API object.

mod backend;
mod logger;
mod render2d;

use backend::JsBackend;
use kg_core::config::CanvasConfig;
use kg_core::id::EntityId;
use kg_core::model::{EntityRef, Point, StrokeStyle};
use kg_core::wire::{NodePatch, ProjectSnapshot};
use kg_core::Vec2;
use kg_editor::{
    AppState, CanvasController, GroupError, InputEvent, Modifiers, PointerButton, ToolKind,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// One canvas bound to one project.
#[wasm_bindgen]
pub struct KgCanvas {
    app: AppState,
    controller: CanvasController,
    backend: Option<JsBackend>,
}

#[wasm_bindgen]
impl KgCanvas {
    /// `config_json` may be empty; unknown or invalid settings fall back
    /// to defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(project_id: &str, config_json: &str) -> Self {
        console_setup();
        let config = CanvasConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("invalid canvas config, using defaults: {e}");
            CanvasConfig::default()
        });
        Self {
            app: AppState::new(project_id, config),
            controller: CanvasController::new(),
            backend: None,
        }
    }

    /// Replace the canvas contents with a fetched project. Returns JSON:
    /// `{"ok":true,"shapes":n,"nodes":n,"skipped":n}` or
    /// `{"ok":false,"error":"..."}`.
    pub fn load(&mut self, json: &str) -> String {
        match ProjectSnapshot::from_json(json) {
            Ok(snapshot) => {
                let report = self.app.load(snapshot);
                serde_json::json!({
                    "ok": true,
                    "shapes": report.shapes,
                    "nodes": report.nodes,
                    "skipped": report.skipped,
                })
                .to_string()
            }
            Err(e) => {
                log::warn!("project load failed: {e}");
                serde_json::json!({ "ok": false, "error": e.to_string() }).to_string()
            }
        }
    }

    /// Install the persistence API and flush anything queued so far.
    pub fn set_backend(&mut self, api: js_sys::Object) {
        self.backend = Some(JsBackend::new(api));
        self.pump();
    }

    /// Fold in completed requests and dispatch queued ones. Call once per
    /// frame. Without a backend, requests stay queued.
    pub fn pump(&mut self) -> usize {
        match &mut self.backend {
            Some(backend) => self.controller.pump(&mut self.app, backend),
            None => 0,
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) {
        let event = InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_dom(button),
            modifiers: Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        };
        self.controller.handle(&mut self.app, &event);
        self.pump();
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.controller
            .handle(&mut self.app, &InputEvent::pointer_move(x, y));
        self.pump();
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) {
        self.controller
            .handle(&mut self.app, &InputEvent::pointer_up(x, y));
        self.pump();
    }

    /// Returns `true` when the key was claimed (the host should then
    /// `preventDefault`).
    pub fn key_down(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        in_text_input: bool,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let claimed = self
            .controller
            .key_down(&mut self.app, key, modifiers, in_text_input);
        self.pump();
        claimed
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Paint shapes and selection chrome. `ctx` is already in world space.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d, scale: f64) {
        self.app.take_redraw();
        let cmds = self.controller.paint(&self.app, scale);
        render2d::render_commands(ctx, &cmds);
    }

    pub fn needs_redraw(&self) -> bool {
        self.app.is_dirty()
    }

    /// Mirror the layout library's camera (`screen = world * zoom + t`).
    pub fn set_view(&mut self, translate_x: f64, translate_y: f64, zoom: f64) {
        self.controller
            .set_view(&mut self.app, Vec2::new(translate_x, translate_y), zoom);
    }

    /// Camera after canvas panning, as `{"x":..,"y":..,"zoom":..}`.
    pub fn view_json(&self) -> String {
        let v = self.controller.viewport;
        serde_json::json!({ "x": v.translate.x, "y": v.translate.y, "zoom": v.zoom }).to_string()
    }

    pub fn set_tool(&mut self, name: &str) -> bool {
        match ToolKind::from_name(name) {
            Some(tool) => {
                self.controller.set_tool(&mut self.app, tool);
                self.pump();
                true
            }
            None => false,
        }
    }

    pub fn tool_name(&self) -> String {
        self.controller.tool.name().to_string()
    }

    pub fn mode_name(&self) -> String {
        self.controller.mode_name().to_string()
    }

    pub fn cursor_at(&self, x: f64, y: f64) -> String {
        self.controller
            .cursor_at(&self.app, Point::new(x, y))
            .to_string()
    }

    // ─── Graph nodes ─────────────────────────────────────────────────────

    /// `{nodes, links}` of the active group for the layout library.
    pub fn graph_data(&self) -> String {
        let data = self.app.nodes.graph_data(self.app.active_group());
        serde_json::to_string(&data).unwrap_or_else(|e| {
            log::error!("graph data serialization failed: {e}");
            r#"{"nodes":[],"links":[]}"#.to_string()
        })
    }

    /// Mirror simulated positions: JSON `[{"id":..,"x":..,"y":..}]`.
    pub fn sync_node_positions(&mut self, json: &str) -> bool {
        match parse_positions(json) {
            Ok(positions) => {
                self.app.sync_node_positions(&positions);
                true
            }
            Err(e) => {
                log::warn!("bad node positions: {e}");
                false
            }
        }
    }

    pub fn on_node_drag(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.controller
            .on_node_drag(&mut self.app, EntityId::intern(id), Point::new(x, y))
    }

    pub fn on_node_drag_end(&mut self, id: &str) -> bool {
        let ended = self
            .controller
            .on_node_drag_end(&mut self.app, EntityId::intern(id));
        self.pump();
        ended
    }

    pub fn on_node_click(&mut self, id: &str, additive: bool) -> bool {
        self.controller
            .on_node_click(&mut self.app, EntityId::intern(id), additive)
    }

    /// Apply a partial node edit (`{"title":..,"color":..,"groupId":..}`).
    pub fn update_node(&mut self, id: &str, patch_json: &str) -> bool {
        let patch: NodePatch = match serde_json::from_str(patch_json) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("bad node patch: {e}");
                return false;
            }
        };
        let updated = self.app.update_node(EntityId::intern(id), patch);
        self.pump();
        updated
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        let deleted = self.app.delete_node(EntityId::intern(id));
        self.pump();
        deleted
    }

    // ─── Selection & pane ────────────────────────────────────────────────

    /// `{"nodes":[..],"shapes":[..]}`.
    pub fn selection_json(&self) -> String {
        serde_json::json!({
            "nodes": id_strings(&self.app.selection.nodes),
            "shapes": id_strings(&self.app.selection.shapes),
        })
        .to_string()
    }

    pub fn pane_entries(&self) -> String {
        serde_json::to_string(&self.app.pane_entries()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn pane_focus(&mut self, kind: &str, id: &str) -> bool {
        entity_ref(kind, id).is_some_and(|e| self.app.pane_focus(e))
    }

    pub fn pane_remove(&mut self, kind: &str, id: &str) -> bool {
        entity_ref(kind, id).is_some_and(|e| self.app.pane_remove(e))
    }

    pub fn pane_delete(&mut self, kind: &str, id: &str) -> bool {
        let deleted = entity_ref(kind, id).is_some_and(|e| self.app.pane_delete(e));
        self.pump();
        deleted
    }

    pub fn select_all(&mut self) {
        self.app.select_all();
    }

    pub fn clear_selection(&mut self) -> bool {
        self.app.clear_selection()
    }

    pub fn delete_selected(&mut self) -> bool {
        let deleted = self.app.delete_selection();
        self.pump();
        deleted
    }

    // ─── Shape edits ─────────────────────────────────────────────────────

    pub fn set_text(&mut self, text: &str) -> bool {
        let changed = self.app.set_text(text);
        self.pump();
        changed
    }

    /// Each style setter also becomes the style for new shapes. Returns
    /// how many selected shapes changed.
    pub fn set_color(&mut self, color: &str) -> usize {
        let n = self.app.set_color(color);
        self.pump();
        n
    }

    pub fn set_stroke_width(&mut self, width: f64) -> usize {
        let n = self.app.set_stroke_width(width);
        self.pump();
        n
    }

    pub fn set_stroke_style(&mut self, name: &str) -> usize {
        let Some(style) = StrokeStyle::from_name(name) else {
            return 0;
        };
        let n = self.app.set_stroke_style(style);
        self.pump();
        n
    }

    pub fn set_font_size(&mut self, size: f64) -> usize {
        let n = self.app.set_font_size(size);
        self.pump();
        n
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.app.undo();
        self.pump();
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.app.redo();
        self.pump();
        changed
    }

    pub fn can_undo(&self) -> bool {
        self.app.shapes.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.app.shapes.can_redo()
    }

    // ─── Group tabs ──────────────────────────────────────────────────────

    /// Tabs in display order.
    pub fn groups_json(&self) -> String {
        serde_json::to_string(self.app.groups.groups()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn active_group(&self) -> u32 {
        self.app.active_group()
    }

    pub fn add_group(&mut self, name: &str, color: &str) -> u32 {
        let key = self.app.add_group(name, color);
        self.pump();
        key
    }

    pub fn rename_group(&mut self, key: u32, name: &str) -> bool {
        let result = self.app.rename_group(key, name);
        self.settle(result)
    }

    pub fn recolor_group(&mut self, key: u32, color: &str) -> bool {
        let result = self.app.recolor_group(key, color);
        self.settle(result)
    }

    pub fn reorder_groups(&mut self, from: usize, to: usize) -> bool {
        let result = self.app.reorder_groups(from, to);
        self.settle(result)
    }

    pub fn set_active_group(&mut self, key: u32) -> bool {
        let result = self.app.set_active_group(key);
        self.settle(result)
    }

    pub fn delete_group(&mut self, key: u32) -> bool {
        let result = self.app.delete_group(key);
        self.settle(result)
    }
}

impl KgCanvas {
    fn settle(&mut self, result: Result<(), GroupError>) -> bool {
        self.pump();
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }
}

/// Set the console log level (`"off"` … `"trace"`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> bool {
    match logger::parse_level(level) {
        Some(filter) => {
            logger::init(filter);
            true
        }
        None => false,
    }
}

#[derive(Deserialize)]
struct NodePosition {
    id: EntityId,
    x: f64,
    y: f64,
}

fn parse_positions(json: &str) -> Result<Vec<(EntityId, Point)>, serde_json::Error> {
    let raw: Vec<NodePosition> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|p| (p.id, Point::new(p.x, p.y)))
        .collect())
}

fn id_strings(list: &[EntityId]) -> Vec<&str> {
    list.iter().map(|id| id.as_str()).collect()
}

fn entity_ref(kind: &str, id: &str) -> Option<EntityRef> {
    let id = EntityId::intern(id);
    match kind {
        "node" => Some(EntityRef::Node(id)),
        "shape" => Some(EntityRef::Shape(id)),
        _ => None,
    }
}

// ─── Panic hook & logging for WASM debugging ─────────────────────────────

fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("KG Canvas WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            logger::init(log::LevelFilter::Warn);
        });
    }
}
