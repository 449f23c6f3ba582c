//! Integration tests: optimistic edits, the outbox, and backend outcomes
//! folded back in through the controller.

use kg_core::config::CanvasConfig;
use kg_core::model::*;
use kg_core::wire::ProjectSnapshot;
use kg_core::EntityId;
use kg_editor::{
    AppState, Backend, CanvasController, InputEvent, Modifiers, PersistError, PersistOutcome,
    PersistRequest, ToolKind,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_SERVER_ID: AtomicUsize = AtomicUsize::new(1);

/// Completes every create on the next poll, either with a fresh server id
/// or with a failure.
#[derive(Default)]
struct FakeBackend {
    sent: Vec<PersistRequest>,
    completed: Vec<PersistOutcome>,
    fail_creates: bool,
}

impl FakeBackend {
    fn failing() -> Self {
        Self {
            fail_creates: true,
            ..Default::default()
        }
    }

    fn ops(&self) -> Vec<&'static str> {
        self.sent.iter().map(|r| r.op()).collect()
    }

    fn last_server_id(&self) -> Option<EntityId> {
        self.completed.iter().rev().find_map(|o| match o {
            PersistOutcome::Created { server_id, .. } => Some(*server_id),
            _ => None,
        })
    }
}

impl Backend for FakeBackend {
    fn dispatch(&mut self, request: PersistRequest) {
        if let PersistRequest::CreateDrawing { local_id, .. } = &request {
            let outcome = if self.fail_creates {
                PersistOutcome::CreateFailed {
                    local_id: *local_id,
                    error: PersistError::rejected("createDrawing", "503 Service Unavailable"),
                }
            } else {
                let n = NEXT_SERVER_ID.fetch_add(1, Ordering::Relaxed);
                PersistOutcome::Created {
                    local_id: *local_id,
                    server_id: EntityId::intern(&format!("srv-{n}")),
                }
            };
            self.completed.push(outcome);
        }
        self.sent.push(request);
    }

    fn poll(&mut self) -> Vec<PersistOutcome> {
        std::mem::take(&mut self.completed)
    }
}

fn setup() -> (CanvasController, AppState) {
    let _ = env_logger::builder().is_test(true).try_init();
    (
        CanvasController::new(),
        AppState::new("proj-1", CanvasConfig::default()),
    )
}

fn draw_rect(c: &mut CanvasController, app: &mut AppState) -> EntityId {
    c.set_tool(app, ToolKind::Rectangle);
    c.handle(app, &InputEvent::pointer_down(0.0, 0.0));
    c.handle(app, &InputEvent::pointer_move(80.0, 60.0));
    c.handle(app, &InputEvent::pointer_up(80.0, 60.0));
    c.set_tool(app, ToolKind::Select);
    app.selection.single_shape().unwrap()
}

#[test]
fn id_swap_keeps_selection_and_history() {
    let (mut c, mut app) = setup();
    let mut backend = FakeBackend::default();
    let local = draw_rect(&mut c, &mut app);
    assert!(local.is_local());

    assert_eq!(c.pump(&mut app, &mut backend), 1);
    let server = backend.last_server_id().unwrap();
    c.pump(&mut app, &mut backend);

    assert_eq!(app.selection.single_shape(), Some(server));
    let shape = app.shapes.get(server).unwrap();
    assert_eq!(shape.persistence, PersistenceState::Persisted);
    assert!(!app.shapes.contains(local));

    // The history copy carries the server id too, so undo deletes the
    // right record.
    assert!(app.undo());
    assert_eq!(
        app.take_requests(),
        vec![PersistRequest::DeleteDrawing { id: server }]
    );
    assert!(app.redo());
    assert_eq!(app.shapes.shapes()[0].id, server);
}

#[test]
fn edits_during_flight_are_sent_after_swap() {
    let (mut c, mut app) = setup();
    let mut backend = FakeBackend::default();
    draw_rect(&mut c, &mut app);
    c.pump(&mut app, &mut backend);

    assert_eq!(app.set_color("#FF0000"), 1);
    assert!(app.pending_requests().is_empty());

    c.pump(&mut app, &mut backend);
    assert_eq!(backend.ops(), vec!["createDrawing", "updateDrawing"]);
    let server = app.selection.single_shape().unwrap();
    match backend.sent.last() {
        Some(PersistRequest::UpdateDrawing { id, patch }) => {
            assert_eq!(*id, server);
            assert_eq!(patch.color.as_deref(), Some("#FF0000"));
            assert!(patch.points.is_some());
        }
        other => panic!("expected a full update, got {other:?}"),
    }
}

#[test]
fn delete_during_flight_removes_orphan() {
    let (mut c, mut app) = setup();
    let mut backend = FakeBackend::default();
    let local = draw_rect(&mut c, &mut app);
    c.pump(&mut app, &mut backend);
    let server = backend.last_server_id().unwrap();

    assert!(c.key_down(&mut app, "Delete", Modifiers::NONE, false));
    assert!(app.pending_requests().is_empty());

    c.pump(&mut app, &mut backend);
    assert_eq!(backend.ops(), vec!["createDrawing", "deleteDrawing"]);
    assert_eq!(
        backend.sent.last(),
        Some(&PersistRequest::DeleteDrawing { id: server })
    );

    // Undo brings back a shape with no backend record, so it is created
    // again from scratch.
    assert!(app.undo());
    assert_eq!(
        app.shapes.get(local).unwrap().persistence,
        PersistenceState::InFlight
    );
    c.pump(&mut app, &mut backend);
    assert_eq!(
        backend.ops(),
        vec!["createDrawing", "deleteDrawing", "createDrawing"]
    );
}

#[test]
fn failed_create_keeps_shape_local() {
    let (mut c, mut app) = setup();
    let mut backend = FakeBackend::failing();
    let local = draw_rect(&mut c, &mut app);
    c.pump(&mut app, &mut backend);
    c.pump(&mut app, &mut backend);

    let shape = app.shapes.get(local).unwrap();
    assert_eq!(shape.persistence, PersistenceState::LocalPending);

    app.set_stroke_width(5.0);
    assert!(app.undo());
    c.pump(&mut app, &mut backend);
    assert_eq!(backend.ops(), vec!["createDrawing"]);
}

#[test]
fn create_request_carries_points_as_json_string() {
    let (mut c, mut app) = setup();
    let local = draw_rect(&mut c, &mut app);
    let reqs = app.take_requests();
    let json = serde_json::to_value(&reqs[0]).unwrap();

    assert_eq!(json["op"], "createDrawing");
    assert_eq!(json["projectId"], "proj-1");
    assert_eq!(json["groupId"], 0);
    assert_eq!(json["localId"], local.as_str());
    assert_eq!(json["drawing"]["type"], "rectangle");
    assert!(json["drawing"].get("id").is_none());
    let points: Vec<serde_json::Value> =
        serde_json::from_str(json["drawing"]["points"].as_str().unwrap()).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1]["x"], 80.0);
}

#[test]
fn tab_edits_save_groups() {
    let (mut c, mut app) = setup();
    let mut backend = FakeBackend::default();
    let key = app.add_group("Ideas", "#F5A623");
    app.rename_group(key, "Backlog").unwrap();
    c.pump(&mut app, &mut backend);

    assert_eq!(backend.ops(), vec!["saveGroups", "saveGroups"]);
    let json = serde_json::to_value(&backend.sent[1]).unwrap();
    assert_eq!(json["groups"][1]["name"], "Backlog");
    assert_eq!(json["groups"][1]["order"], 1);
}

#[test]
fn deleting_a_tab_cascades_to_backend() {
    let (mut c, mut app) = setup();
    let mut backend = FakeBackend::default();
    app.load(ProjectSnapshot::from_json(include_str!("fixtures/project.json")).unwrap());

    app.delete_group(1).unwrap();
    c.pump(&mut app, &mut backend);
    assert_eq!(
        backend.ops(),
        vec!["deleteDrawing", "deleteNode", "saveGroups"]
    );
    assert_eq!(app.groups.len(), 1);
    assert!(!app.nodes.contains(EntityId::intern("n-other-tab")));

    assert!(app.delete_group(0).is_err());
}
