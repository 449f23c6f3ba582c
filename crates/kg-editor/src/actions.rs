//! Discrete editor actions: keyboard commands, toolbar edits, and tab
//! management. Each one snapshots history itself when it touches shapes.

use crate::groups::GroupError;
use crate::state::AppState;
use kg_core::id::EntityId;
use kg_core::model::*;

impl AppState {
    pub fn undo(&mut self) -> bool {
        match self.shapes.undo() {
            Some(diff) => {
                self.reconcile(diff);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.shapes.redo() {
            Some(diff) => {
                self.reconcile(diff);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.selection.clear();
        self.mark_dirty();
        true
    }

    /// Select every node and shape of the active group.
    pub fn select_all(&mut self) {
        let group = self.active_group();
        self.selection.nodes = self.nodes.in_group(group).map(|n| n.id).collect();
        self.selection.shapes = self.shapes.in_group(group).map(|s| s.id).collect();
        self.mark_dirty();
    }

    /// Delete every selected shape and node as one undo step.
    pub fn delete_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let shapes = std::mem::take(&mut self.selection.shapes);
        let nodes = std::mem::take(&mut self.selection.nodes);
        if !shapes.is_empty() {
            self.shapes.push_undo_snapshot();
        }
        for id in shapes {
            self.delete_shape(id);
        }
        for id in nodes {
            self.delete_node(id);
        }
        log::debug!("deleted selection");
        self.mark_dirty();
        true
    }

    /// Replace the text of the single selected text shape.
    pub fn set_text(&mut self, text: &str) -> bool {
        let Some(id) = self.selection.single_shape() else {
            return false;
        };
        if !self.shapes.get(id).is_some_and(|s| s.kind.is_text()) {
            return false;
        }
        self.shapes.push_undo_snapshot();
        self.update_shape(
            id,
            &ShapePatch {
                text: Some(text.to_string()),
                ..Default::default()
            },
        )
    }

    // ─── Style ───────────────────────────────────────────────────────────

    pub fn set_color(&mut self, color: &str) -> usize {
        self.style.color = color.to_string();
        self.restyle_selection(ShapePatch {
            color: Some(color.to_string()),
            ..Default::default()
        })
    }

    pub fn set_stroke_width(&mut self, width: f64) -> usize {
        if !width.is_finite() || width <= 0.0 {
            return 0;
        }
        self.style.stroke_width = width;
        self.restyle_selection(ShapePatch {
            stroke_width: Some(width),
            ..Default::default()
        })
    }

    pub fn set_stroke_style(&mut self, style: StrokeStyle) -> usize {
        self.style.stroke_style = style;
        self.restyle_selection(ShapePatch {
            stroke_style: Some(style),
            ..Default::default()
        })
    }

    pub fn set_font_size(&mut self, size: f64) -> usize {
        if !size.is_finite() || size <= 0.0 {
            return 0;
        }
        self.style.font_size = size;
        self.restyle_selection(ShapePatch {
            font_size: Some(size),
            ..Default::default()
        })
    }

    /// Apply `patch` to every selected shape under one snapshot. Returns
    /// how many shapes changed.
    fn restyle_selection(&mut self, patch: ShapePatch) -> usize {
        let targets: Vec<EntityId> = self
            .selection
            .shapes
            .iter()
            .copied()
            .filter(|id| self.shapes.get(*id).is_some_and(|s| would_change(s, &patch)))
            .collect();
        if targets.is_empty() {
            return 0;
        }
        self.shapes.push_undo_snapshot();
        for id in &targets {
            self.update_shape(*id, &patch);
        }
        targets.len()
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    pub fn add_group(&mut self, name: &str, color: &str) -> GroupKey {
        let key = self.groups.add(name, color);
        self.save_groups();
        self.mark_dirty();
        key
    }

    pub fn rename_group(&mut self, key: GroupKey, name: &str) -> Result<(), GroupError> {
        self.groups.rename(key, name)?;
        self.save_groups();
        self.mark_dirty();
        Ok(())
    }

    pub fn recolor_group(&mut self, key: GroupKey, color: &str) -> Result<(), GroupError> {
        self.groups.recolor(key, color)?;
        self.save_groups();
        self.mark_dirty();
        Ok(())
    }

    pub fn reorder_groups(&mut self, from: usize, to: usize) -> Result<(), GroupError> {
        self.groups.reorder(from, to)?;
        self.save_groups();
        self.mark_dirty();
        Ok(())
    }

    /// Switch tabs. Selection does not carry across groups.
    pub fn set_active_group(&mut self, key: GroupKey) -> Result<(), GroupError> {
        if key == self.active_group() {
            return Ok(());
        }
        self.groups.set_active(key)?;
        self.selection.clear();
        self.mark_dirty();
        Ok(())
    }

    /// Delete a tab and everything in it. Shapes go through the store
    /// first under one snapshot, then nodes, then the tab itself.
    pub fn delete_group(&mut self, key: GroupKey) -> Result<(), GroupError> {
        self.groups.check_removable(key)?;

        if self.shapes.in_group(key).next().is_some() {
            self.shapes.push_undo_snapshot();
        }
        let doomed: Vec<EntityId> = self.shapes.in_group(key).map(|s| s.id).collect();
        for id in doomed {
            self.delete_shape(id);
        }
        let nodes: Vec<EntityId> = self.nodes.in_group(key).map(|n| n.id).collect();
        for id in nodes {
            self.delete_node(id);
        }

        let was_active = self.active_group() == key;
        self.groups.remove(key)?;
        if was_active {
            self.selection.clear();
        }
        self.save_groups();
        self.mark_dirty();
        log::debug!("deleted group {key}");
        Ok(())
    }
}

fn would_change(shape: &Shape, patch: &ShapePatch) -> bool {
    let mut patched = shape.clone();
    patch.apply(&mut patched);
    patched != *shape
}
