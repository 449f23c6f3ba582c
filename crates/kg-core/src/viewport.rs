//! Screen ↔ world transform.
//!
//! The force-layout library owns the camera; the host mirrors its zoom and
//! translation here so pointer events can be mapped without a round trip.

use kurbo::{Affine, Point, Vec2};

/// `screen = world * zoom + translate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub translate: Vec2,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(translate: Vec2, zoom: f64) -> Self {
        Self {
            translate,
            zoom: if zoom > 0.0 { zoom } else { 1.0 },
        }
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        self.affine() * p
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        self.affine().inverse() * p
    }

    /// Shift the camera by a screen-space delta.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.translate += screen_delta;
    }

    pub fn affine(&self) -> Affine {
        Affine::translate(self.translate) * Affine::scale(self.zoom)
    }
}
