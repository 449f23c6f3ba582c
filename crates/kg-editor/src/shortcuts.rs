//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Lives in Rust
//! so the bindings are testable without a browser.

use crate::tools::ToolKind;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Tool(ToolKind),
    Undo,
    Redo,
    Delete,
    SelectAll,
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` plays the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// While focus is in a text input only Escape is claimed; everything
    /// else (Backspace, ⌘Z, letters) belongs to the input.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
        in_text_input: bool,
    ) -> Option<ShortcutAction> {
        if in_text_input {
            return (key == "Escape").then_some(ShortcutAction::Deselect);
        }

        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => return Some(ShortcutAction::Delete),
            "Escape" => return Some(ShortcutAction::Deselect),
            _ => {}
        }

        if shift {
            return None;
        }

        let tool = match key {
            "v" | "V" => ToolKind::Select,
            "h" | "H" => ToolKind::Pan,
            "r" | "R" => ToolKind::Rectangle,
            "d" | "D" => ToolKind::Diamond,
            "o" | "O" => ToolKind::Circle,
            "a" | "A" => ToolKind::Arrow,
            "l" | "L" => ToolKind::Line,
            "p" | "P" => ToolKind::Pen,
            "t" | "T" => ToolKind::Text,
            "e" | "E" => ToolKind::Eraser,
            _ => return None,
        };
        Some(ShortcutAction::Tool(tool))
    }
}
