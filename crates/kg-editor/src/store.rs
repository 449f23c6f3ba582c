//! Shape store with whole-array undo/redo snapshots.
//!
//! The store is the single owner of the drawn shapes for a project, in
//! paint order. History works by snapshot: callers push a copy of the
//! whole array right before a gesture or batch mutates it, and undo swaps
//! the live array for the last copy. Every ordinary mutation clears the
//! redo stack.
//!
//! Because snapshots hold copies, an id swap (local → server id) has to be
//! applied to the live array and every snapshot at once, otherwise an undo
//! would resurrect a stale local id.

use kg_core::id::EntityId;
use kg_core::model::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    shapes: Vec<Shape>,
    undo_stack: Vec<Vec<Shape>>,
    redo_stack: Vec<Vec<Shape>>,
    /// Snapshot cap; `None` is unbounded.
    max_depth: Option<usize>,
}

/// What an undo or redo changed, for reconciling the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryDiff {
    /// Present before, gone after.
    pub removed: Vec<Shape>,
    /// Absent before, back after.
    pub restored: Vec<Shape>,
    /// Present on both sides with different content (post-state).
    pub changed: Vec<Shape>,
}

impl HistoryDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.restored.is_empty() && self.changed.is_empty()
    }
}

impl ShapeStore {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            ..Default::default()
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// In-place access for live gestures. The caller is expected to have
    /// pushed a snapshot first.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn in_group(&self, group: GroupKey) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(move |s| s.group == group)
    }

    /// Append a shape on top of the paint order.
    pub fn create(&mut self, shape: Shape) -> EntityId {
        let id = shape.id;
        self.shapes.push(shape);
        self.redo_stack.clear();
        id
    }

    pub fn update(&mut self, id: EntityId, patch: &ShapePatch) -> bool {
        let Some(shape) = self.get_mut(id) else {
            return false;
        };
        patch.apply(shape);
        self.redo_stack.clear();
        true
    }

    /// Overwrite geometry (points, plus kind for text font size) from a
    /// transformed copy, keeping identity and persistence state.
    pub fn set_geometry(&mut self, id: EntityId, from: &Shape) -> bool {
        let Some(shape) = self.get_mut(id) else {
            return false;
        };
        shape.points = from.points.clone();
        shape.kind = from.kind.clone();
        true
    }

    pub fn set_points(&mut self, id: EntityId, points: Points) -> bool {
        match self.get_mut(id) {
            Some(shape) if points.len() >= shape.kind.min_points() => {
                shape.points = points;
                true
            }
            _ => false,
        }
    }

    pub fn delete(&mut self, id: EntityId) -> Option<Shape> {
        let pos = self.shapes.iter().position(|s| s.id == id)?;
        self.redo_stack.clear();
        Some(self.shapes.remove(pos))
    }

    /// Remove every shape of `group`, returning them in paint order.
    pub fn delete_group(&mut self, group: GroupKey) -> Vec<Shape> {
        let (gone, kept): (Vec<Shape>, Vec<Shape>) = std::mem::take(&mut self.shapes)
            .into_iter()
            .partition(|s| s.group == group);
        self.shapes = kept;
        self.redo_stack.clear();
        gone
    }

    /// Replace the whole array (project load). History starts over.
    pub fn set_all(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn set_persistence(&mut self, id: EntityId, state: PersistenceState) -> bool {
        match self.get_mut(id) {
            Some(shape) => {
                shape.persistence = state;
                true
            }
            None => false,
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Record the current array as an undo step.
    pub fn push_undo_snapshot(&mut self) {
        self.undo_stack.push(self.shapes.clone());
        if let Some(max) = self.max_depth
            && self.undo_stack.len() > max
        {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    pub fn undo(&mut self) -> Option<HistoryDiff> {
        let previous = self.undo_stack.pop()?;
        let current = std::mem::replace(&mut self.shapes, previous);
        let diff = diff(&current, &self.shapes);
        self.redo_stack.push(current);
        Some(diff)
    }

    pub fn redo(&mut self) -> Option<HistoryDiff> {
        let next = self.redo_stack.pop()?;
        let current = std::mem::replace(&mut self.shapes, next);
        let diff = diff(&current, &self.shapes);
        self.undo_stack.push(current);
        Some(diff)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    // ─── Identity ────────────────────────────────────────────────────────

    /// Swap `old` for the server-assigned `new` id in the live array and
    /// every snapshot, marking each copy persisted.
    pub fn swap_id(&mut self, old: EntityId, new: EntityId) -> bool {
        let mut found = false;
        for shape in self.all_copies_mut().filter(|s| s.id == old) {
            shape.id = new;
            shape.persistence = PersistenceState::Persisted;
            found = true;
        }
        found
    }

    /// Mark every copy of `id` as having no backend record.
    pub fn mark_unsaved(&mut self, id: EntityId) {
        for shape in self.all_copies_mut().filter(|s| s.id == id) {
            shape.persistence = PersistenceState::LocalPending;
        }
    }

    fn all_copies_mut(&mut self) -> impl Iterator<Item = &mut Shape> {
        self.shapes
            .iter_mut()
            .chain(self.undo_stack.iter_mut().flatten())
            .chain(self.redo_stack.iter_mut().flatten())
    }
}

/// Content equality that ignores persistence bookkeeping.
fn same_content(a: &Shape, b: &Shape) -> bool {
    a.kind == b.kind
        && a.points == b.points
        && a.color == b.color
        && a.stroke_width == b.stroke_width
        && a.stroke_style == b.stroke_style
        && a.group == b.group
}

fn diff(before: &[Shape], after: &[Shape]) -> HistoryDiff {
    let old: HashMap<EntityId, &Shape> = before.iter().map(|s| (s.id, s)).collect();
    let new: HashMap<EntityId, &Shape> = after.iter().map(|s| (s.id, s)).collect();
    let mut out = HistoryDiff::default();
    for shape in before {
        if !new.contains_key(&shape.id) {
            out.removed.push(shape.clone());
        }
    }
    for shape in after {
        match old.get(&shape.id) {
            None => out.restored.push(shape.clone()),
            Some(prev) if !same_content(prev, shape) => out.changed.push(shape.clone()),
            Some(_) => {}
        }
    }
    out
}
