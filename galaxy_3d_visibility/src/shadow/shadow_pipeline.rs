/// Renderer side of shadow casting.
///
/// The shadow master only needs the current view and a place to hand its
/// slaves. Implemented by the rendering backend.

use glam::Vec3;
use crate::bounds::Bounds3;
use super::ShadowSlave;

pub trait ShadowPipeline {
    /// World-space position of the current view
    fn view_position_world(&self) -> Vec3;

    /// World-space direction the current view looks along (unit length)
    fn view_dir_world(&self) -> Vec3;

    /// Whether any part of a world-space box is in the current view
    fn test_visible_world(&self, bnd: &Bounds3) -> bool;

    /// Queue a slave for this frame.
    ///
    /// Returns the identifier the slave is known by for the rest of the
    /// frame, or `None` if the pipeline declined it.
    fn submit_shadow_slave(&mut self, slave: &ShadowSlave) -> Option<u32>;
}
