//! Group/layer tabs.
//!
//! Tabs partition nodes and shapes. Entities refer to a tab by its
//! `order` key, which is fixed at creation; moving tabs around only
//! changes their position in the list.

use kg_core::id::EntityId;
use kg_core::model::{Group, GroupKey};
use thiserror::Error;

const DEFAULT_NAME: &str = "Main";
const DEFAULT_COLOR: &str = "#6C8EF5";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("the last remaining group cannot be deleted")]
    LastGroup,
    #[error("no group with key {0}")]
    UnknownGroup(GroupKey),
    #[error("tab index {0} is out of range")]
    IndexOutOfRange(usize),
}

#[derive(Debug, Clone)]
pub struct GroupTabs {
    groups: Vec<Group>,
    active: GroupKey,
}

impl Default for GroupTabs {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl GroupTabs {
    /// Tabs in display order. An empty list gets a single default tab so
    /// there is always something active.
    pub fn new(mut groups: Vec<Group>) -> Self {
        if groups.is_empty() {
            groups.push(Group {
                id: EntityId::local(),
                name: DEFAULT_NAME.to_string(),
                color: DEFAULT_COLOR.to_string(),
                order: 0,
            });
        }
        let active = groups[0].order;
        Self { groups, active }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn active(&self) -> GroupKey {
        self.active
    }

    pub fn get(&self, key: GroupKey) -> Option<&Group> {
        self.groups.iter().find(|g| g.order == key)
    }

    pub fn set_active(&mut self, key: GroupKey) -> Result<(), GroupError> {
        self.position(key)?;
        self.active = key;
        Ok(())
    }

    /// Append a tab and return its key.
    pub fn add(&mut self, name: &str, color: &str) -> GroupKey {
        let order = self
            .groups
            .iter()
            .map(|g| g.order)
            .max()
            .map_or(0, |m| m + 1);
        self.groups.push(Group {
            id: EntityId::local(),
            name: name.to_string(),
            color: color.to_string(),
            order,
        });
        order
    }

    pub fn rename(&mut self, key: GroupKey, name: &str) -> Result<(), GroupError> {
        let idx = self.position(key)?;
        self.groups[idx].name = name.to_string();
        Ok(())
    }

    pub fn recolor(&mut self, key: GroupKey, color: &str) -> Result<(), GroupError> {
        let idx = self.position(key)?;
        self.groups[idx].color = color.to_string();
        Ok(())
    }

    /// Drag-and-drop: swap the tabs at `from` and `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), GroupError> {
        for idx in [from, to] {
            if idx >= self.groups.len() {
                return Err(GroupError::IndexOutOfRange(idx));
            }
        }
        self.groups.swap(from, to);
        Ok(())
    }

    /// Check that `key` may be removed without touching anything.
    pub fn check_removable(&self, key: GroupKey) -> Result<(), GroupError> {
        self.position(key)?;
        if self.groups.len() <= 1 {
            return Err(GroupError::LastGroup);
        }
        Ok(())
    }

    /// Remove a tab. If it was active, the first remaining tab becomes
    /// active.
    pub fn remove(&mut self, key: GroupKey) -> Result<Group, GroupError> {
        self.check_removable(key)?;
        let idx = self.position(key)?;
        let removed = self.groups.remove(idx);
        if self.active == key {
            self.active = self.groups[0].order;
        }
        Ok(removed)
    }

    fn position(&self, key: GroupKey) -> Result<usize, GroupError> {
        self.groups
            .iter()
            .position(|g| g.order == key)
            .ok_or(GroupError::UnknownGroup(key))
    }
}
