//! Hit testing and paint-list generation for the drawing canvas.
//!
//! Nothing here touches a real graphics context: hit tests are pure
//! functions over the model, and painting produces [`paint::DrawCmd`]s the
//! host replays onto whatever surface it owns.

pub mod hit;
pub mod paint;

pub use hit::{
    MarqueeHits, handle_at_point, is_near, marquee_hits, node_at_point, shape_at_point,
    shapes_at_point,
};
pub use paint::{DrawCmd, SceneView, paint_scene};
