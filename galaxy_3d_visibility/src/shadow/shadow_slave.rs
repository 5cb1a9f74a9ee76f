/// ShadowSlave — one light's shadow of one caster, for one frame.
///
/// A slave goes through three states:
/// - `Uninitialized` after `init`
/// - `Bounded` once the master has placed it in light space
/// - `Transformed` once `setup_view_transform` has derived the view
///   volume and the world-to-texture projection
///
/// Directional slaves use an orthographic view fitted to the caster's
/// light-space box. Point and perspective-directional slaves look at the
/// caster through a frustum just wide enough to hold it.

use std::fmt;
use bitflags::bitflags;
use glam::{Mat4, Vec3, Vec4};
use crate::bounds::Bounds3;
use crate::camera::ViewTransform;

/// Nearest allowed hither for perspective shadows
pub const MIN_MIN_Z: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlaveKind {
    #[default]
    Directional,
    /// Directional light cast through a perspective projection
    PerspectiveDirectional,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SlaveState {
    #[default]
    Uninitialized,
    Bounded,
    Transformed,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SlaveFlags: u32 {
        const POSITIONAL           = 0x1;
        const REVERSE_CULL         = 0x2;
        const REVERSE_Z            = 0x4;
        const TWO_SIDED            = 0x8;
        const SELF_SHADOW          = 0x10;
        const CAST_IN_CAMERA_SPACE = 0x20;
        const OBEYS_LIGHT_GROUPS   = 0x40;
        const INCLUDES_CHARS       = 0x80;
    }
}

/// Why a slave could not be set up. The shadow is skipped for the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowSetupError {
    /// The caster's light-space bounds contain NaN
    NanBounds,
    /// The caster's bounds have no extent around the light axis
    EmptyCasterBounds,
    /// No world-to-light transform was set
    NotBounded,
}

impl fmt::Display for ShadowSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowSetupError::NanBounds => write!(f, "NaN in shadow caster bounds"),
            ShadowSetupError::EmptyCasterBounds => write!(f, "Empty shadow caster bounds"),
            ShadowSetupError::NotBounded => write!(f, "Shadow slave has no light transform"),
        }
    }
}

impl std::error::Error for ShadowSetupError {}

#[derive(Debug, Clone)]
pub struct ShadowSlave {
    pub(crate) kind: SlaveKind,
    pub(crate) state: SlaveState,
    pub(crate) flags: SlaveFlags,

    pub(crate) world_to_light: Mat4,
    pub(crate) light_to_world: Mat4,
    pub(crate) world_to_texture: Mat4,
    pub(crate) view: ViewTransform,
    pub(crate) rcv_lut: Mat4,
    pub(crate) cast_lut: Mat4,

    pub(crate) caster_world_bounds: Bounds3,
    pub(crate) world_bounds: Bounds3,

    pub(crate) atten_dist: f32,
    pub(crate) blur_scale: f32,
    pub(crate) power: f32,
    pub(crate) priority: f32,
    pub(crate) width: u32,
    pub(crate) height: u32,

    /// Identifier handed out by the pipeline on submission
    pub(crate) index: Option<u32>,
    /// Slot of this slave's volume in the master's isect pool
    pub(crate) isect: Option<usize>,
}

impl Default for ShadowSlave {
    fn default() -> Self {
        Self {
            kind: SlaveKind::Directional,
            state: SlaveState::Uninitialized,
            flags: SlaveFlags::empty(),
            world_to_light: Mat4::IDENTITY,
            light_to_world: Mat4::IDENTITY,
            world_to_texture: Mat4::IDENTITY,
            view: ViewTransform::default(),
            rcv_lut: Mat4::ZERO,
            cast_lut: Mat4::ZERO,
            caster_world_bounds: Bounds3::empty(),
            world_bounds: Bounds3::empty(),
            atten_dist: 0.0,
            blur_scale: 0.0,
            power: 0.0,
            priority: 0.0,
            width: 0,
            height: 0,
            index: None,
            isect: None,
        }
    }
}

impl ShadowSlave {
    pub fn new(kind: SlaveKind) -> Self {
        let mut slave = Self::default();
        slave.init(kind);
        slave
    }

    /// Reset for reuse as a slave of `kind`.
    ///
    /// Matrices keep their previous values until the next setup.
    pub fn init(&mut self, kind: SlaveKind) {
        self.kind = kind;
        self.state = SlaveState::Uninitialized;
        self.flags = match kind {
            SlaveKind::Directional => SlaveFlags::empty(),
            SlaveKind::PerspectiveDirectional => {
                SlaveFlags::POSITIONAL | SlaveFlags::CAST_IN_CAMERA_SPACE
            }
            SlaveKind::Point => SlaveFlags::POSITIONAL,
        };
        self.caster_world_bounds = Bounds3::empty();
        self.world_bounds = Bounds3::empty();
        self.atten_dist = 0.0;
        self.blur_scale = 0.0;
        self.power = 0.0;
        self.priority = 0.0;
        self.index = None;
        self.isect = None;
    }

    // ===== SETUP =====

    pub fn set_caster_world_bounds(&mut self, bnd: Bounds3) {
        self.caster_world_bounds = bnd;
    }

    /// Place the slave in light space
    pub fn set_world_to_light(&mut self, world_to_light: Mat4, light_to_world: Mat4) {
        self.world_to_light = world_to_light;
        self.light_to_world = light_to_world;
        self.state = self.state.max(SlaveState::Bounded);
    }

    /// Volume the shadow can fall on
    pub fn set_world_bounds(&mut self, bnd: Bounds3) {
        self.world_bounds = bnd;
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Derive the view volume and the world-to-texture projection.
    ///
    /// On error the slave keeps its previous matrices and state.
    pub fn setup_view_transform(&mut self) -> Result<(), ShadowSetupError> {
        if self.state == SlaveState::Uninitialized {
            return Err(ShadowSetupError::NotBounded);
        }
        match self.kind {
            SlaveKind::Directional => self.setup_ortho_view_transform()?,
            SlaveKind::PerspectiveDirectional | SlaveKind::Point => {
                self.setup_persp_view_transform()?
            }
        }
        self.state = SlaveState::Transformed;
        Ok(())
    }

    /// Caster bounds in light space, rejecting NaN anywhere on the way
    pub fn light_space_caster_bounds(&self) -> Result<Bounds3, ShadowSetupError> {
        if self.caster_world_bounds.has_nan() || self.world_to_light.is_nan() {
            return Err(ShadowSetupError::NanBounds);
        }
        let bnd = self.caster_world_bounds.transformed(&self.world_to_light);
        if bnd.has_nan() {
            return Err(ShadowSetupError::NanBounds);
        }
        if !bnd.is_normal() {
            return Err(ShadowSetupError::EmptyCasterBounds);
        }
        Ok(bnd)
    }

    fn setup_ortho_view_transform(&mut self) -> Result<(), ShadowSetupError> {
        let bnd = self.light_space_caster_bounds()?;
        let (mn, mx) = (bnd.min(), bnd.max());
        let far = bnd.center().z + self.atten_dist;

        if !(mx.x > mn.x && mx.y > mn.y && far > mn.z) {
            return Err(ShadowSetupError::EmptyCasterBounds);
        }

        let sx = 1.0 / (mx.x - mn.x);
        let sy = 1.0 / (mx.y - mn.y);
        let sz = 1.0 / (far - mn.z);

        // x: min -> 0, max -> 1. y flips: min -> 1, max -> 0. No texel bias.
        let light_to_texture = Mat4::from_cols(
            Vec4::new(sx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -sy, 0.0, 0.0),
            Vec4::new(0.0, 0.0, sz, 0.0),
            Vec4::new(-mn.x * sx, mx.y * sy, -mn.z * sz, 1.0),
        );

        let mut view = self.view;
        view.set_orthogonal(true);
        view.set_camera_transform(self.world_to_light, self.light_to_world);
        view.set_view(Vec3::new(mn.x, mn.y, mn.z), Vec3::new(mx.x, mx.y, far));
        view.set_screen_size(clamp_u16(self.width), clamp_u16(self.height));

        self.view = view;
        self.world_to_texture = light_to_texture * self.world_to_light;
        Ok(())
    }

    fn setup_persp_view_transform(&mut self) -> Result<(), ShadowSetupError> {
        let bnd = self.light_space_caster_bounds()?;
        let (mn, mx) = (bnd.min(), bnd.max());

        let min_z = mn.z.max(MIN_MIN_Z);
        let max_z = bnd.center().z + self.atten_dist;

        let mut cot_x = cotangent(mn.x, mx.x, min_z)?;
        let mut cot_y = cotangent(mn.y, mx.y, min_z)?;

        let width = self.width.max(1) as f32;
        let height = self.height.max(1) as f32;

        // Offsets ride on the third column so the divide by depth leaves
        // them intact: texel centers land on [0.5/w, 1 - 0.5/w].
        let light_to_texture = Mat4::from_cols(
            Vec4::new(cot_x * 0.5, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -cot_y * 0.5, 0.0, 0.0),
            Vec4::new(0.5 * (1.0 + 1.0 / width), 0.5 * (1.0 + 1.0 / height), 1.0, 1.0),
            Vec4::ZERO,
        );

        // Bring the frustum in by a texel so the clamped border never smears
        cot_x -= cot_x / (width * 0.5);
        cot_y -= cot_y / (height * 0.5);

        let mut view = self.view;
        view.set_perspective(true);
        view.set_camera_transform(self.world_to_light, self.light_to_world);
        view.set_view(
            Vec3::new(-1.0 / cot_x, -1.0 / cot_y, min_z),
            Vec3::new(1.0 / cot_x, 1.0 / cot_y, max_z),
        );
        view.set_screen_size(clamp_u16(self.width), clamp_u16(self.height));

        self.view = view;
        self.world_to_texture = light_to_texture * self.world_to_light;
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn kind(&self) -> SlaveKind {
        self.kind
    }

    pub fn state(&self) -> SlaveState {
        self.state
    }

    pub fn flags(&self) -> SlaveFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: SlaveFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: SlaveFlags, on: bool) {
        self.flags.set(flag, on);
    }

    pub fn is_positional(&self) -> bool {
        self.has_flag(SlaveFlags::POSITIONAL)
    }

    pub fn cast_in_camera_space(&self) -> bool {
        self.has_flag(SlaveFlags::CAST_IN_CAMERA_SPACE)
    }

    pub fn world_to_light(&self) -> &Mat4 {
        &self.world_to_light
    }

    pub fn light_to_world(&self) -> &Mat4 {
        &self.light_to_world
    }

    pub fn world_to_texture(&self) -> &Mat4 {
        &self.world_to_texture
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    /// Receiver depth lookup: world space to LUT coordinate
    pub fn rcv_lut(&self) -> &Mat4 {
        &self.rcv_lut
    }

    /// Caster depth lookup, in light or world space (see `cast_in_camera_space`)
    pub fn cast_lut(&self) -> &Mat4 {
        &self.cast_lut
    }

    pub fn caster_world_bounds(&self) -> &Bounds3 {
        &self.caster_world_bounds
    }

    pub fn world_bounds(&self) -> &Bounds3 {
        &self.world_bounds
    }

    pub fn atten_dist(&self) -> f32 {
        self.atten_dist
    }

    pub fn blur_scale(&self) -> f32 {
        self.blur_scale
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn isect(&self) -> Option<usize> {
        self.isect
    }
}

/// Cotangent of the half angle that holds `[lo, hi]` at depth `z`,
/// using the wider side of the axis.
fn cotangent(lo: f32, hi: f32, z: f32) -> Result<f32, ShadowSetupError> {
    if -lo > hi {
        debug_assert!(lo < 0.0, "empty shadow caster bounds");
        if !(lo < 0.0) {
            return Err(ShadowSetupError::EmptyCasterBounds);
        }
        Ok(-z / lo)
    } else {
        debug_assert!(hi > 0.0, "empty shadow caster bounds");
        if !(hi > 0.0) {
            return Err(ShadowSetupError::EmptyCasterBounds);
        }
        Ok(z / hi)
    }
}

fn clamp_u16(v: u32) -> u16 {
    v.min(u16::MAX as u32) as u16
}

#[cfg(test)]
#[path = "shadow_slave_tests.rs"]
mod tests;
