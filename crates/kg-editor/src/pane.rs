//! Selection pane: a list view over the current selection.
//!
//! The pane owns no state. Entries are rebuilt from the selection on
//! demand, and every pane action writes straight back to it.

use crate::state::AppState;
use kg_core::model::EntityRef;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneEntry {
    pub entity: EntityRef,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AppState {
    /// Selected entities in selection order, nodes first. Ids that no
    /// longer resolve are left out.
    pub fn pane_entries(&self) -> Vec<PaneEntry> {
        self.selection
            .entities()
            .filter_map(|entity| match entity {
                EntityRef::Node(id) => self.nodes.get(id).map(|n| PaneEntry {
                    entity,
                    label: if n.title.trim().is_empty() {
                        "Untitled node".to_string()
                    } else {
                        n.title.clone()
                    },
                    color: n.color.clone(),
                }),
                EntityRef::Shape(id) => self.shapes.get(id).map(|s| PaneEntry {
                    entity,
                    label: s.label(),
                    color: Some(s.color.clone()),
                }),
            })
            .collect()
    }

    /// Narrow the selection to one entry.
    pub fn pane_focus(&mut self, entity: EntityRef) -> bool {
        if !self.selection.contains(entity) {
            return false;
        }
        self.selection.select_only(entity);
        self.mark_dirty();
        true
    }

    /// Drop one entry from the selection without deleting it.
    pub fn pane_remove(&mut self, entity: EntityRef) -> bool {
        let removed = self.selection.remove(entity);
        if removed {
            self.mark_dirty();
        }
        removed
    }

    /// Delete one entry, the same way the Delete key would.
    pub fn pane_delete(&mut self, entity: EntityRef) -> bool {
        if !self.selection.contains(entity) {
            return false;
        }
        let saved = std::mem::take(&mut self.selection);
        self.selection.add(entity);
        let deleted = self.delete_selection();
        self.selection = saved;
        self.selection.remove(entity);
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kg_core::config::CanvasConfig;
    use kg_core::id::EntityId;
    use kg_core::model::*;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    fn setup() -> (AppState, EntityId, EntityId) {
        let mut app = AppState::new("p", CanvasConfig::default());
        let node = EntityId::intern("pane-node");
        app.nodes.insert(Node {
            id: node,
            x: 0.0,
            y: 0.0,
            title: String::new(),
            color: Some("#F00".into()),
            group: 0,
        });
        let shape = app.shapes.create(Shape::new(
            ShapeKind::Circle,
            smallvec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
            &ShapeStyle::default(),
            0,
        ));
        app.selection.add(EntityRef::Shape(shape));
        app.selection.add(EntityRef::Node(node));
        (app, node, shape)
    }

    #[test]
    fn entries_list_nodes_then_shapes() {
        let (app, node, shape) = setup();
        let labels: Vec<(EntityRef, String)> = app
            .pane_entries()
            .into_iter()
            .map(|e| (e.entity, e.label))
            .collect();
        assert_eq!(
            labels,
            vec![
                (EntityRef::Node(node), "Untitled node".to_string()),
                (EntityRef::Shape(shape), "Circle".to_string()),
            ]
        );
    }

    #[test]
    fn focus_and_remove() {
        let (mut app, node, shape) = setup();
        assert!(app.pane_focus(EntityRef::Shape(shape)));
        assert_eq!(app.selection.len(), 1);
        assert!(!app.pane_focus(EntityRef::Node(node)));
        assert!(app.pane_remove(EntityRef::Shape(shape)));
        assert!(app.selection.is_empty());
    }

    #[test]
    fn delete_one_entry_keeps_the_rest_selected() {
        let (mut app, node, shape) = setup();
        assert!(app.pane_delete(EntityRef::Shape(shape)));
        assert!(app.shapes.is_empty());
        assert_eq!(app.selection.nodes, vec![node]);
        assert!(app.shapes.can_undo());
    }
}
