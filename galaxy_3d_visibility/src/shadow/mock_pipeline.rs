/// Mock shadow pipeline for tests (no renderer required)
///
/// Records submitted slaves in priority order and hands out increasing
/// identifiers. Visibility comes from a camera frustum unless overridden.

use glam::Vec3;
use crate::bounds::Bounds3;
use crate::camera::{Frustum, ViewTransform};
use super::{ShadowPipeline, ShadowSlave};

/// What the mock kept from a submitted slave
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedSlave {
    pub index: u32,
    pub priority: f32,
    pub power: f32,
    pub width: u32,
    pub height: u32,
    pub world_bounds: Bounds3,
}

#[derive(Debug, Clone)]
pub struct MockShadowPipeline {
    view: ViewTransform,
    frustum: Frustum,
    visible_override: Option<bool>,
    capacity: Option<usize>,
    submitted: Vec<SubmittedSlave>,
    next_index: u32,
}

impl MockShadowPipeline {
    pub fn new(view: ViewTransform) -> Self {
        Self {
            frustum: Frustum::from_view_transform(&view),
            view,
            visible_override: None,
            capacity: None,
            submitted: Vec::new(),
            next_index: 0,
        }
    }

    /// Viewer at `from` looking at `at`, 90 degree field of view
    pub fn looking_at(from: Vec3, at: Vec3) -> Self {
        let mut view = ViewTransform::new();
        let up = if (at - from).normalize_or_zero().cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let (w2c, c2w) = ViewTransform::make_camera(from, at, up);
        view.set_camera_transform(w2c, c2w);
        view.set_fov(std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
        Self::new(view)
    }

    /// Force `test_visible_world` to answer `visible`, or `None` to use the frustum
    pub fn set_visible_override(&mut self, visible: Option<bool>) {
        self.visible_override = visible;
    }

    /// Decline submissions past `capacity` slaves per frame
    pub fn set_capacity(&mut self, capacity: Option<usize>) {
        self.capacity = capacity;
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Submissions so far this frame, lowest priority value first
    pub fn submitted(&self) -> &[SubmittedSlave] {
        &self.submitted
    }

    /// Start a new frame
    pub fn clear(&mut self) {
        self.submitted.clear();
        self.next_index = 0;
    }
}

impl ShadowPipeline for MockShadowPipeline {
    fn view_position_world(&self) -> Vec3 {
        self.view.position()
    }

    fn view_dir_world(&self) -> Vec3 {
        self.view.direction()
    }

    fn test_visible_world(&self, bnd: &Bounds3) -> bool {
        match self.visible_override {
            Some(visible) => visible,
            None => self.frustum.intersects_bounds(bnd),
        }
    }

    fn submit_shadow_slave(&mut self, slave: &ShadowSlave) -> Option<u32> {
        if self.capacity.is_some_and(|cap| self.submitted.len() >= cap) {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;

        let pos = self
            .submitted
            .iter()
            .position(|s| slave.priority() <= s.priority)
            .unwrap_or(self.submitted.len());
        self.submitted.insert(
            pos,
            SubmittedSlave {
                index,
                priority: slave.priority(),
                power: slave.power(),
                width: slave.width(),
                height: slave.height(),
                world_bounds: *slave.world_bounds(),
            },
        );
        Some(index)
    }
}

#[cfg(test)]
#[path = "mock_pipeline_tests.rs"]
mod tests;
