pub mod config;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod model;
pub mod viewport;
pub mod wire;

pub use config::CanvasConfig;
pub use geometry::{Handle, compute_bounds, cursor_for_handle, resize, rotate};
pub use graph::KnowledgeGraph;
pub use id::EntityId;
pub use model::*;
pub use viewport::Viewport;
pub use wire::{DrawingPatch, NodePatch, ProjectSnapshot, WireDrawing, WireError, WireLink};

// Re-export kurbo vector type so downstream crates share one geometry stack.
pub use kurbo::Vec2;
