//! Fire-and-forget persistence: requests out, outcomes back.
//!
//! The editor never awaits the backend. Mutations are applied locally
//! first, then described as [`PersistRequest`]s in an outbox. A
//! [`Backend`] ships them off (in the browser: detached futures) and later
//! reports [`PersistOutcome`]s, which the editor folds back in on the UI
//! thread. Requests are unordered and at-most-once; when two updates to
//! the same entity race, whichever lands last wins.

use kg_core::id::EntityId;
use kg_core::model::{Group, GroupKey};
use kg_core::wire::{DrawingPatch, NodePatch, WireDrawing};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PersistRequest {
    /// `local_id` keys the outcome back to the shape awaiting its server id.
    CreateDrawing {
        project_id: String,
        group_id: GroupKey,
        local_id: EntityId,
        drawing: WireDrawing,
    },
    UpdateDrawing {
        id: EntityId,
        patch: DrawingPatch,
    },
    DeleteDrawing {
        id: EntityId,
    },
    UpdateNode {
        id: EntityId,
        patch: NodePatch,
    },
    DeleteNode {
        id: EntityId,
    },
    SaveGroups {
        project_id: String,
        groups: Vec<Group>,
    },
}

impl PersistRequest {
    /// Operation name as the JS backend knows it.
    pub fn op(&self) -> &'static str {
        match self {
            Self::CreateDrawing { .. } => "createDrawing",
            Self::UpdateDrawing { .. } => "updateDrawing",
            Self::DeleteDrawing { .. } => "deleteDrawing",
            Self::UpdateNode { .. } => "updateNode",
            Self::DeleteNode { .. } => "deleteNode",
            Self::SaveGroups { .. } => "saveGroups",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("{op} failed: {message}")]
    Rejected { op: &'static str, message: String },
    #[error("create response carried no id")]
    MissingId,
}

impl PersistError {
    pub fn rejected(op: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            op,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Created {
        local_id: EntityId,
        server_id: EntityId,
    },
    CreateFailed {
        local_id: EntityId,
        error: PersistError,
    },
    /// Any non-create request failed. Logged and dropped.
    Failed { error: PersistError },
}

/// Something that can carry requests to the backend.
pub trait Backend {
    /// Start a request. Must not block; completion arrives via `poll`.
    fn dispatch(&mut self, request: PersistRequest);

    /// Outcomes that completed since the last poll.
    fn poll(&mut self) -> Vec<PersistOutcome>;
}

/// Pending requests, the creates still awaiting an outcome, and the
/// shapes edited while their create was in flight (they get a full update
/// once the server id is known).
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    requests: Vec<PersistRequest>,
    awaiting_create: HashSet<EntityId>,
    edited_in_flight: HashSet<EntityId>,
}

impl Outbox {
    pub fn push(&mut self, request: PersistRequest) {
        log::debug!("queue {}", request.op());
        self.requests.push(request);
    }

    pub fn take(&mut self) -> Vec<PersistRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn pending(&self) -> &[PersistRequest] {
        &self.requests
    }

    /// Record that a create for `id` has been queued.
    pub fn track_create(&mut self, id: EntityId) {
        self.awaiting_create.insert(id);
    }

    /// Whether a create for `id` was outstanding; clears it. Outcomes for
    /// creates issued before the last [`Outbox::clear`] report `false`.
    pub fn settle_create(&mut self, id: EntityId) -> bool {
        self.awaiting_create.remove(&id)
    }

    pub fn mark_edited(&mut self, id: EntityId) {
        self.edited_in_flight.insert(id);
    }

    /// Whether `id` was edited while in flight; clears the mark.
    pub fn take_edited(&mut self, id: EntityId) -> bool {
        self.edited_in_flight.remove(&id)
    }

    pub fn clear(&mut self) {
        self.requests.clear();
        self.awaiting_create.clear();
        self.edited_in_flight.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_json_is_tagged_camel_case() {
        let req = PersistRequest::DeleteDrawing {
            id: EntityId::intern("42"),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["op"], "deleteDrawing");
        assert_eq!(json["id"], "42");

        let req = PersistRequest::SaveGroups {
            project_id: "p1".into(),
            groups: Vec::new(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["op"], "saveGroups");
        assert_eq!(json["projectId"], "p1");
    }

    #[test]
    fn edited_mark_is_taken_once() {
        let mut outbox = Outbox::default();
        let id = EntityId::intern("local_x");
        outbox.mark_edited(id);
        assert!(outbox.take_edited(id));
        assert!(!outbox.take_edited(id));
    }
}
