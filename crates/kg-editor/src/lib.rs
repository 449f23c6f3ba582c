pub mod actions;
pub mod controller;
pub mod groups;
pub mod input;
pub mod pane;
pub mod persist;
pub mod shortcuts;
pub mod state;
pub mod store;
pub mod tools;

pub use controller::CanvasController;
pub use groups::{GroupError, GroupTabs};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use pane::PaneEntry;
pub use persist::{Backend, Outbox, PersistError, PersistOutcome, PersistRequest};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use state::{AppState, LoadReport};
pub use store::{HistoryDiff, ShapeStore};
pub use tools::{DrawSession, ToolKind};
