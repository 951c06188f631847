//! View transform between screen space and grid pixel space.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 8.0;

/// Pan and zoom applied to the grid's pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen position of the grid's pixel origin.
    pub offset: Vec2,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid pixels to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    pub fn screen_to_grid(&self, screen: Point) -> Point {
        self.transform().inverse() * screen
    }

    pub fn grid_to_screen(&self, grid: Point) -> Point {
        self.transform() * grid
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor` keeping `pivot` (screen space) fixed.
    pub fn zoom_at(&mut self, pivot: Point, factor: f64) {
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let anchor = self.screen_to_grid(pivot);
        self.zoom = zoom;
        self.offset += pivot - self.grid_to_screen(anchor);
    }

    /// Apply a pinch step: one pointer moved from `from` to `to` while the
    /// other stayed at `origin`. Degenerate pinches are ignored.
    pub fn apply_scale(&mut self, origin: Point, from: Point, to: Point) {
        let before = (from - origin).hypot();
        let after = (to - origin).hypot();
        if before < f64::EPSILON || !after.is_finite() {
            log::debug!("ignoring degenerate pinch around {origin:?}");
            return;
        }
        self.zoom_at(origin, after / before);
    }

    /// Centre `bounds` (grid pixels) in a viewport, shrinking to fit.
    pub fn fit(&mut self, bounds: Rect, viewport: Size) {
        if bounds.is_zero_area() {
            *self = Self::default();
            return;
        }
        self.zoom = (viewport.width / bounds.width())
            .min(viewport.height / bounds.height())
            .clamp(MIN_ZOOM, MAX_ZOOM);
        let centre = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        self.offset = centre.to_vec2() - bounds.center().to_vec2() * self.zoom;
    }
}
