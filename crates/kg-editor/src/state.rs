//! Owned application state for one open project canvas.
//!
//! Everything the canvas reads or mutates lives here and is passed by
//! reference to the controller; there are no globals. Mutations are
//! optimistic: the store changes synchronously, then a persistence request
//! is queued in the outbox.

use crate::groups::GroupTabs;
use crate::persist::{Outbox, PersistOutcome, PersistRequest};
use crate::store::{HistoryDiff, ShapeStore};
use kg_core::config::CanvasConfig;
use kg_core::id::EntityId;
use kg_core::model::*;
use kg_core::wire::{DrawingPatch, NodePatch, ProjectSnapshot, WireDrawing};
use kg_core::KnowledgeGraph;

#[derive(Debug, Clone)]
pub struct AppState {
    pub project_id: String,
    pub config: CanvasConfig,
    /// Style applied to newly drawn shapes.
    pub style: ShapeStyle,
    pub shapes: ShapeStore,
    pub nodes: KnowledgeGraph,
    pub groups: GroupTabs,
    pub selection: SelectionSet,
    pub(crate) outbox: Outbox,
    dirty: bool,
}

/// Counts from [`AppState::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub shapes: usize,
    pub nodes: usize,
    pub skipped: usize,
}

impl AppState {
    pub fn new(project_id: impl Into<String>, config: CanvasConfig) -> Self {
        Self {
            project_id: project_id.into(),
            style: config.default_style.clone(),
            shapes: ShapeStore::new(config.history_limit),
            nodes: KnowledgeGraph::new(),
            groups: GroupTabs::default(),
            selection: SelectionSet::new(),
            outbox: Outbox::default(),
            dirty: true,
            config,
        }
    }

    /// Replace everything with a freshly fetched project. Drawings that
    /// fail to parse are skipped and counted.
    pub fn load(&mut self, snapshot: ProjectSnapshot) -> LoadReport {
        self.groups = GroupTabs::new(snapshot.groups);
        let fallback = self.groups.active();

        let mut report = LoadReport {
            nodes: snapshot.nodes.len(),
            ..Default::default()
        };
        self.nodes.set_all(snapshot.nodes, &snapshot.links);

        let mut shapes = Vec::with_capacity(snapshot.drawings.len());
        for drawing in snapshot.drawings {
            match drawing.into_shape(fallback) {
                Ok(shape) => shapes.push(shape),
                Err(e) => {
                    log::warn!("skipping drawing: {e}");
                    report.skipped += 1;
                }
            }
        }
        report.shapes = shapes.len();
        self.shapes.set_all(shapes);
        self.selection.clear();
        self.outbox.clear();
        self.dirty = true;
        log::info!(
            "loaded project {}: {} nodes, {} shapes ({} skipped)",
            self.project_id,
            report.nodes,
            report.shapes,
            report.skipped
        );
        report
    }

    pub fn active_group(&self) -> GroupKey {
        self.groups.active()
    }

    // ─── Redraw ──────────────────────────────────────────────────────────

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a repaint is due; clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // ─── Outbox ──────────────────────────────────────────────────────────

    pub fn take_requests(&mut self) -> Vec<PersistRequest> {
        self.outbox.take()
    }

    pub fn pending_requests(&self) -> &[PersistRequest] {
        self.outbox.pending()
    }

    /// Fold a backend outcome back in. Returns the `(local, server)` id
    /// pair when a create resolved onto a live shape.
    pub fn resolve(&mut self, outcome: PersistOutcome) -> Option<(EntityId, EntityId)> {
        match outcome {
            PersistOutcome::Created {
                local_id,
                server_id,
            } => {
                if !self.outbox.settle_create(local_id) {
                    log::debug!("ignoring stale create outcome for {local_id}");
                    return None;
                }
                if !self.shapes.contains(local_id) {
                    // Deleted while in flight: the server copy is an orphan.
                    log::debug!("create of {local_id} resolved after delete, removing {server_id}");
                    self.shapes.mark_unsaved(local_id);
                    self.outbox.take_edited(local_id);
                    self.outbox.push(PersistRequest::DeleteDrawing { id: server_id });
                    return None;
                }
                self.shapes.swap_id(local_id, server_id);
                self.selection.replace_shape_id(local_id, server_id);
                log::debug!("swapped {local_id} -> {server_id}");
                if self.outbox.take_edited(local_id)
                    && let Some(shape) = self.shapes.get(server_id)
                {
                    let patch = DrawingPatch::full(shape);
                    self.outbox.push(PersistRequest::UpdateDrawing {
                        id: server_id,
                        patch,
                    });
                }
                Some((local_id, server_id))
            }
            PersistOutcome::CreateFailed { local_id, error } => {
                log::warn!("create of {local_id} failed: {error}");
                if !self.outbox.settle_create(local_id) {
                    return None;
                }
                self.shapes.mark_unsaved(local_id);
                self.outbox.take_edited(local_id);
                None
            }
            PersistOutcome::Failed { error } => {
                log::warn!("{error}");
                None
            }
        }
    }

    // ─── Shape mutations ─────────────────────────────────────────────────

    /// Append a new shape and queue its create.
    pub fn create_shape(&mut self, shape: Shape) -> EntityId {
        let id = self.shapes.create(shape);
        self.request_create(id);
        self.dirty = true;
        id
    }

    fn request_create(&mut self, id: EntityId) {
        let Some(shape) = self.shapes.get(id) else {
            return;
        };
        let mut drawing = WireDrawing::from_shape(shape);
        drawing.id = None;
        let request = PersistRequest::CreateDrawing {
            project_id: self.project_id.clone(),
            group_id: shape.group,
            local_id: id,
            drawing,
        };
        self.shapes.set_persistence(id, PersistenceState::InFlight);
        self.outbox.track_create(id);
        self.outbox.push(request);
    }

    /// Queue an update for a shape already changed locally. Shapes still
    /// waiting on their create are remembered and sent in full once the
    /// server id arrives; shapes whose create failed stay local.
    pub fn persist_shape(&mut self, id: EntityId, patch: DrawingPatch) {
        let Some(shape) = self.shapes.get(id) else {
            return;
        };
        match shape.persistence {
            PersistenceState::Persisted => {
                self.outbox.push(PersistRequest::UpdateDrawing { id, patch });
            }
            PersistenceState::InFlight => self.outbox.mark_edited(id),
            PersistenceState::LocalPending => {
                log::debug!("{id} has no backend record, keeping edit local");
            }
        }
    }

    pub fn persist_geometry(&mut self, id: EntityId) {
        if let Some(shape) = self.shapes.get(id) {
            let patch = DrawingPatch::geometry(shape);
            self.persist_shape(id, patch);
        }
    }

    /// Apply a partial update locally and persist it.
    pub fn update_shape(&mut self, id: EntityId, patch: &ShapePatch) -> bool {
        if !self.shapes.update(id, patch) {
            return false;
        }
        self.persist_shape(id, DrawingPatch::from_patch(patch));
        self.dirty = true;
        true
    }

    /// Remove a shape locally and from the backend. No snapshot is taken.
    pub fn delete_shape(&mut self, id: EntityId) -> bool {
        let Some(shape) = self.shapes.delete(id) else {
            return false;
        };
        self.forget_shape(&shape);
        self.selection.remove(EntityRef::Shape(id));
        self.dirty = true;
        true
    }

    /// Backend side of a shape leaving the live array.
    fn forget_shape(&mut self, shape: &Shape) {
        match shape.persistence {
            PersistenceState::Persisted => {
                self.outbox.push(PersistRequest::DeleteDrawing { id: shape.id });
            }
            // An in-flight create is cleaned up when it resolves.
            PersistenceState::InFlight | PersistenceState::LocalPending => {
                self.outbox.take_edited(shape.id);
            }
        }
    }

    /// Push backend requests that make the server match an undo/redo.
    pub(crate) fn reconcile(&mut self, diff: HistoryDiff) {
        for shape in &diff.removed {
            self.forget_shape(shape);
        }
        for shape in &diff.restored {
            if shape.persistence != PersistenceState::InFlight {
                self.request_create(shape.id);
            }
        }
        for shape in &diff.changed {
            self.persist_shape(shape.id, DrawingPatch::full(shape));
        }
        let shapes = &self.shapes;
        self.selection.shapes.retain(|id| shapes.contains(*id));
        self.dirty = true;
    }

    // ─── Node mutations ──────────────────────────────────────────────────

    pub fn persist_node_position(&mut self, id: EntityId) {
        if let Some(node) = self.nodes.get(id) {
            let patch = NodePatch::position(node.position());
            self.outbox.push(PersistRequest::UpdateNode { id, patch });
        }
    }

    /// Apply a node edit (title, color, group) and persist it.
    pub fn update_node(&mut self, id: EntityId, patch: NodePatch) -> bool {
        if !self.nodes.update(id, &patch) {
            return false;
        }
        self.outbox.push(PersistRequest::UpdateNode { id, patch });
        self.dirty = true;
        true
    }

    pub fn delete_node(&mut self, id: EntityId) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }
        self.outbox.push(PersistRequest::DeleteNode { id });
        self.selection.remove(EntityRef::Node(id));
        self.dirty = true;
        true
    }

    /// Mirror positions reported by the layout simulation. Not persisted.
    pub fn sync_node_positions(&mut self, positions: &[(EntityId, Point)]) {
        for (id, p) in positions {
            self.nodes.set_position(*id, *p);
        }
        self.dirty = true;
    }

    pub(crate) fn save_groups(&mut self) {
        self.outbox.push(PersistRequest::SaveGroups {
            project_id: self.project_id.clone(),
            groups: self.groups.groups().to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::PersistError;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    fn app() -> AppState {
        AppState::new("p1", CanvasConfig::default())
    }

    fn rect() -> Shape {
        Shape::new(
            ShapeKind::Rectangle,
            smallvec![Point::new(0.0, 0.0), Point::new(40.0, 40.0)],
            &ShapeStyle::default(),
            0,
        )
    }

    #[test]
    fn create_queues_request_and_marks_in_flight() {
        let mut app = app();
        let id = app.create_shape(rect());
        assert_eq!(app.shapes.get(id).unwrap().persistence, PersistenceState::InFlight);
        let reqs = app.take_requests();
        assert!(matches!(
            reqs.as_slice(),
            [PersistRequest::CreateDrawing { local_id, drawing, .. }]
                if *local_id == id && drawing.id.is_none()
        ));
    }

    #[test]
    fn edits_while_in_flight_follow_the_swap() {
        let mut app = app();
        let local = app.create_shape(rect());
        app.take_requests();
        app.update_shape(
            local,
            &ShapePatch {
                color: Some("#F00".into()),
                ..Default::default()
            },
        );
        assert!(app.take_requests().is_empty());

        let server = EntityId::intern("srv-1");
        app.resolve(PersistOutcome::Created {
            local_id: local,
            server_id: server,
        });
        let reqs = app.take_requests();
        match reqs.as_slice() {
            [PersistRequest::UpdateDrawing { id, patch }] => {
                assert_eq!(*id, server);
                assert_eq!(patch.color.as_deref(), Some("#F00"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn deleted_before_create_resolves_deletes_orphan() {
        let mut app = app();
        let local = app.create_shape(rect());
        app.take_requests();
        assert!(app.delete_shape(local));
        assert!(app.take_requests().is_empty());

        let server = EntityId::intern("srv-orphan");
        assert_eq!(
            app.resolve(PersistOutcome::Created {
                local_id: local,
                server_id: server,
            }),
            None
        );
        assert_eq!(
            app.take_requests(),
            vec![PersistRequest::DeleteDrawing { id: server }]
        );
    }

    #[test]
    fn create_outcome_from_before_reload_is_ignored() {
        let mut app = app();
        let local = app.create_shape(rect());
        app.take_requests();

        let json = r##"{
            "groups": [{"id": "g1", "name": "Main", "color": "#000", "order": 0}],
            "nodes": [],
            "links": [],
            "drawings": [
                {"id": "srv-reloaded", "type": "rectangle",
                 "points": "[{\"x\":0,\"y\":0},{\"x\":40,\"y\":40}]",
                 "color": "#000", "strokeWidth": 2}
            ]
        }"##;
        app.load(ProjectSnapshot::from_json(json).unwrap());

        let server = EntityId::intern("srv-reloaded");
        assert_eq!(
            app.resolve(PersistOutcome::Created {
                local_id: local,
                server_id: server,
            }),
            None
        );
        assert!(app.shapes.contains(server));
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn failed_create_keeps_shape_local() {
        let mut app = app();
        let local = app.create_shape(rect());
        app.resolve(PersistOutcome::CreateFailed {
            local_id: local,
            error: PersistError::rejected("createDrawing", "500"),
        });
        let shape = app.shapes.get(local).unwrap();
        assert_eq!(shape.persistence, PersistenceState::LocalPending);
    }

    #[test]
    fn load_skips_bad_drawings() {
        let json = r##"{
            "groups": [{"id": "g1", "name": "Main", "color": "#000", "order": 3}],
            "nodes": [{"id": "n1", "x": 1, "y": 2, "title": "A", "groupId": 3}],
            "links": [],
            "drawings": [
                {"id": "d1", "type": "pen", "points": "[{\"x\":0,\"y\":0}]", "color": "#000", "strokeWidth": 2},
                {"id": "d2", "type": "blob", "points": "[]", "color": "#000", "strokeWidth": 2}
            ]
        }"##;
        let mut app = app();
        let report = app.load(ProjectSnapshot::from_json(json).unwrap());
        assert_eq!(
            report,
            LoadReport {
                shapes: 1,
                nodes: 1,
                skipped: 1
            }
        );
        assert_eq!(app.active_group(), 3);
        assert_eq!(app.shapes.shapes()[0].group, 3);
        assert!(!app.shapes.can_undo());
    }

    #[test]
    fn redraw_flag_is_consumed() {
        let mut app = app();
        assert!(app.take_redraw());
        assert!(!app.take_redraw());
        app.create_shape(rect());
        assert!(app.take_redraw());
    }
}
