/// ViewTransform — camera placement plus an orthographic or perspective volume.
///
/// Camera space looks down +Z with +Y up and +X right. The view volume is
/// stored as `min`/`max` triples:
/// - perspective: x/y are tangents of the half angles (extent at z = 1)
/// - orthographic: x/y are camera-space extents
/// - z is always hither (min) and yon (max)
///
/// `camera_to_ndc` maps the volume to x, y in [-1, 1] and z in [0, 1].
/// Perspective matrices carry camera-space z in w.

use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::bounds::Bounds3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    camera_to_world: Mat4,
    world_to_camera: Mat4,
    orthogonal: bool,
    min: Vec3,
    max: Vec3,
    width: u16,
    height: u16,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            camera_to_world: Mat4::IDENTITY,
            world_to_camera: Mat4::IDENTITY,
            orthogonal: false,
            min: Vec3::new(-1.0, -1.0, 1.0),
            max: Vec3::new(1.0, 1.0, 1000.0),
            width: 512,
            height: 512,
        }
    }
}

impl ViewTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a camera looking from `from` toward `at`.
    ///
    /// Returns `(world_to_camera, camera_to_world)`. `up` must not be
    /// parallel to the view direction.
    pub fn make_camera(from: Vec3, at: Vec3, up: Vec3) -> (Mat4, Mat4) {
        let z = (at - from).normalize_or_zero();
        let x = up.cross(z).normalize_or_zero();
        let y = z.cross(x);
        let c2w = Mat4::from_cols(
            x.extend(0.0),
            y.extend(0.0),
            z.extend(0.0),
            from.extend(1.0),
        );
        (c2w.inverse(), c2w)
    }

    // ===== CAMERA =====

    pub fn set_camera_transform(&mut self, world_to_camera: Mat4, camera_to_world: Mat4) {
        self.world_to_camera = world_to_camera;
        self.camera_to_world = camera_to_world;
    }

    pub fn world_to_camera(&self) -> &Mat4 {
        &self.world_to_camera
    }

    pub fn camera_to_world(&self) -> &Mat4 {
        &self.camera_to_world
    }

    pub fn position(&self) -> Vec3 {
        self.camera_to_world.w_axis.truncate()
    }

    /// World-space view direction (+Z of camera space)
    pub fn direction(&self) -> Vec3 {
        self.camera_to_world.z_axis.truncate().normalize_or_zero()
    }

    // ===== VOLUME =====

    pub fn set_orthogonal(&mut self, on: bool) {
        self.orthogonal = on;
    }

    pub fn set_perspective(&mut self, on: bool) {
        self.orthogonal = !on;
    }

    pub fn is_orthogonal(&self) -> bool {
        self.orthogonal
    }

    pub fn is_perspective(&self) -> bool {
        !self.orthogonal
    }

    /// Set the whole volume at once
    pub fn set_view(&mut self, min: Vec3, max: Vec3) {
        self.min = min;
        self.max = max;
    }

    pub fn set_depth(&mut self, hither: f32, yon: f32) {
        self.min.z = hither;
        self.max.z = yon;
    }

    pub fn set_half_width(&mut self, hw: f32) {
        self.min.x = -hw;
        self.max.x = hw;
    }

    pub fn set_half_height(&mut self, hh: f32) {
        self.min.y = -hh;
        self.max.y = hh;
    }

    /// Set the horizontal and vertical field of view (radians)
    pub fn set_fov(&mut self, fov_x: f32, fov_y: f32) {
        self.set_half_width((fov_x * 0.5).tan());
        self.set_half_height((fov_y * 0.5).tan());
    }

    pub fn view_min(&self) -> Vec3 {
        self.min
    }

    pub fn view_max(&self) -> Vec3 {
        self.max
    }

    pub fn hither(&self) -> f32 {
        self.min.z
    }

    pub fn yon(&self) -> f32 {
        self.max.z
    }

    pub fn fov_x(&self) -> f32 {
        self.max.x.atan() - self.min.x.atan()
    }

    pub fn fov_y(&self) -> f32 {
        self.max.y.atan() - self.min.y.atan()
    }

    // ===== RENDER TARGET SIZE =====

    pub fn set_screen_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn screen_width(&self) -> u16 {
        self.width
    }

    pub fn screen_height(&self) -> u16 {
        self.height
    }

    // ===== MATRICES =====

    /// Camera space to normalized device coordinates
    pub fn camera_to_ndc(&self) -> Mat4 {
        let (mn, mx) = (self.min, self.max);
        let sx = 2.0 / (mx.x - mn.x);
        let sy = 2.0 / (mx.y - mn.y);
        let ox = -(mx.x + mn.x) / (mx.x - mn.x);
        let oy = -(mx.y + mn.y) / (mx.y - mn.y);
        let depth = mx.z - mn.z;

        if self.orthogonal {
            Mat4::from_cols(
                Vec4::new(sx, 0.0, 0.0, 0.0),
                Vec4::new(0.0, sy, 0.0, 0.0),
                Vec4::new(0.0, 0.0, 1.0 / depth, 0.0),
                Vec4::new(ox, oy, -mn.z / depth, 1.0),
            )
        } else {
            Mat4::from_cols(
                Vec4::new(sx, 0.0, 0.0, 0.0),
                Vec4::new(0.0, sy, 0.0, 0.0),
                Vec4::new(ox, oy, mx.z / depth, 1.0),
                Vec4::new(0.0, 0.0, -mx.z * mn.z / depth, 0.0),
            )
        }
    }

    pub fn world_to_ndc(&self) -> Mat4 {
        self.camera_to_ndc() * self.world_to_camera
    }

    pub fn world_to_camera_point(&self, p: Vec3) -> Vec3 {
        self.world_to_camera.transform_point3(p)
    }

    pub fn camera_to_world_point(&self, p: Vec3) -> Vec3 {
        self.camera_to_world.transform_point3(p)
    }

    /// Project a camera-space point (with perspective divide)
    pub fn camera_to_ndc_point(&self, p: Vec3) -> Vec3 {
        self.camera_to_ndc().project_point3(p)
    }

    pub fn world_to_ndc_point(&self, p: Vec3) -> Vec3 {
        self.camera_to_ndc_point(self.world_to_camera_point(p))
    }

    /// Camera-space point on the ray through an NDC position, at depth `z`.
    pub fn ndc_to_camera_at_depth(&self, ndc: Vec2, z: f32) -> Vec3 {
        let t = (ndc + Vec2::ONE) * 0.5;
        let x = self.min.x + (self.max.x - self.min.x) * t.x;
        let y = self.min.y + (self.max.y - self.min.y) * t.y;
        if self.orthogonal {
            Vec3::new(x, y, z)
        } else {
            Vec3::new(x * z, y * z, z)
        }
    }

    /// Fit the view volume around a camera-space box.
    ///
    /// Returns false (volume untouched) for empty boxes, or, in
    /// perspective, boxes reaching behind the hither plane.
    pub fn set_projection(&mut self, camera_bnd: &Bounds3) -> bool {
        if !camera_bnd.is_normal() {
            return false;
        }
        let (mn, mx) = (camera_bnd.min(), camera_bnd.max());
        if self.orthogonal {
            self.set_view(mn, mx);
            return true;
        }
        if mn.z <= 0.0 {
            return false;
        }
        // Widest tangent over the near and far faces
        let lo_x = (mn.x / mn.z).min(mn.x / mx.z);
        let hi_x = (mx.x / mn.z).max(mx.x / mx.z);
        let lo_y = (mn.y / mn.z).min(mn.y / mx.z);
        let hi_y = (mx.y / mn.z).max(mx.y / mx.z);
        self.set_view(Vec3::new(lo_x, lo_y, mn.z), Vec3::new(hi_x, hi_y, mx.z));
        true
    }

    /// Same as `set_projection` for a world-space box
    pub fn set_projection_world(&mut self, world_bnd: &Bounds3) -> bool {
        let camera_bnd = world_bnd.transformed(&self.world_to_camera);
        self.set_projection(&camera_bnd)
    }
}

#[cfg(test)]
#[path = "view_transform_tests.rs"]
mod tests;
