/// Camera — the active view plus the mouse cursor position.
///
/// The camera owns a `ViewTransform` and a cursor position in NDC
/// ([-1, 1] on both axes, +Y up). The engine does NOT store or manage
/// cameras; the caller drives them and hands one to
/// `VisLosManager::cursor_check`.

use glam::{Vec2, Vec3};
use super::frustum::Frustum;
use super::view_transform::ViewTransform;

#[derive(Debug, Clone)]
pub struct Camera {
    view: ViewTransform,
    cursor: Vec2,
}

impl Camera {
    /// Create a camera. The cursor starts at the screen center.
    pub fn new(view: ViewTransform) -> Self {
        Self { view, cursor: Vec2::ZERO }
    }

    // ===== GETTERS =====

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn position(&self) -> Vec3 {
        self.view.position()
    }

    /// Cursor position in NDC
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Frustum of the current view
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_transform(&self.view)
    }

    // ===== SETTERS =====

    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    /// Set the cursor position in NDC (clamped to the screen)
    pub fn set_cursor(&mut self, ndc: Vec2) {
        self.cursor = ndc.clamp(Vec2::splat(-1.0), Vec2::ONE);
    }

    /// Set the cursor from pixel coordinates (origin top-left)
    pub fn set_cursor_pixels(&mut self, x: f32, y: f32) {
        let w = f32::from(self.view.screen_width().max(1));
        let h = f32::from(self.view.screen_height().max(1));
        self.set_cursor(Vec2::new(x / w * 2.0 - 1.0, 1.0 - y / h * 2.0));
    }

    // ===== RAYS =====

    /// World-space segment under the cursor, `dist` units long.
    ///
    /// Perspective rays start at the eye; orthographic rays start on the
    /// hither plane and run parallel to the view direction.
    pub fn cursor_ray(&self, dist: f32) -> (Vec3, Vec3) {
        if self.view.is_orthogonal() {
            let start = self.view.ndc_to_camera_at_depth(self.cursor, self.view.hither());
            let end = start + Vec3::Z * dist;
            (self.view.camera_to_world_point(start), self.view.camera_to_world_point(end))
        } else {
            let through = self.view.ndc_to_camera_at_depth(self.cursor, 1.0);
            let end = through.normalize_or_zero() * dist;
            (self.view.position(), self.view.camera_to_world_point(end))
        }
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
