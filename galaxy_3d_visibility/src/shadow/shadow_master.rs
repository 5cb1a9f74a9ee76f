/// ShadowMaster — turns casters into shadow slaves for one light.
///
/// Every frame the render loop calls `begin_render`, then `on_cast` once per
/// caster. Each accepted caster gets a slave from the master's pool, placed
/// in light space, sized, projected and handed to the pipeline.
///
/// Slaves and their culling volumes live in two `FramePool`s that are
/// released wholesale at `begin_render`; the storage is kept, so a steady
/// scene stops allocating after its first frame.
///
/// # Example
///
/// ```ignore
/// let mut master = ShadowMaster::new(MasterKind::Point, ShadowMasterSettings::default());
/// master.begin_render(&mut light);
/// for caster in &casters {
///     master.on_cast(caster, &mut light, &config, &mut pipeline);
/// }
/// ```

use glam::{Mat4, Vec3};
use crate::bounds::{Bounds3, BoundsIsect};
use crate::camera::ViewTransform;
use crate::utils::FramePool;
use super::{LightInfo, ShadowCaster, ShadowPipeline, ShadowSlave, SlaveFlags, SlaveKind, MIN_MIN_Z};

/// View distance over which a shadow map halves in size
pub const SHIFT_DIST: f32 = 50.0;
/// Smallest shadow map edge
pub const MIN_SHADOW_SIZE: u32 = 32;
/// Largest value `ShadowConfig::max_size` accepts
pub const MAX_GLOBAL_SHADOW_SIZE: u32 = 512;
/// Depth bias added to the caster LUT
pub const SELF_BIAS: f32 = 2.0 / 256.0;

/// Power a shadow is remapped to at the knee
pub const VIS_SHADOW_POWER: f32 = 0.1;
/// Shadows weaker than this are dropped
pub const MIN_SHADOW_POWER: f32 = 0.2;
/// Shadows stronger than this keep their power
pub const KNEE_SHADOW_POWER: f32 = 0.3;

/// Fraction of the max distance kept at quality 0
const MIN_DIST_FRAC: f32 = 0.6;
/// Fade start, as a fraction of the max distance, at quality 0 and 1
const MIN_FADE_FRAC: f32 = 0.9;
const MAX_FADE_FRAC: f32 = 0.75;

/// Squared sine below which an up vector counts as parallel to the view
const MIN_UP_MAG: f32 = 1e-4;
/// Directional lights sit this many caster radii behind the caster
const LIGHT_BACKOFF: f32 = 2.0;

// ============================================================================
// Configuration
// ============================================================================

/// Settings shared by every shadow master
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowConfig {
    max_size: u32,
    max_dist: f32,
    quality: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            max_size: MAX_GLOBAL_SHADOW_SIZE,
            max_dist: 160.0,
            quality: 1.0,
        }
    }
}

impl ShadowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest shadow map edge. Rounded down to a power of two and clamped
    /// to `[MIN_SHADOW_SIZE, MAX_GLOBAL_SHADOW_SIZE]`.
    pub fn set_max_size(&mut self, size: u32) {
        let size = if size == 0 { 0 } else { 1 << (31 - size.leading_zeros()) };
        self.max_size = size.clamp(MIN_SHADOW_SIZE, MAX_GLOBAL_SHADOW_SIZE);
    }

    /// Distance beyond which shadows are gone. 0 or less disables the fade.
    pub fn set_max_dist(&mut self, dist: f32) {
        self.max_dist = dist;
    }

    /// Shadow quality in `[0, 1]`
    pub fn set_quality(&mut self, quality: f32) {
        self.quality = quality.clamp(0.0, 1.0);
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn max_dist(&self) -> f32 {
        self.max_dist
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Quality bucket 0..=3
    pub fn quality_level(&self) -> u8 {
        (self.quality * 3.9) as u8
    }
}

/// Per-light settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMasterSettings {
    /// Distance past the caster over which the shadow fades out
    pub atten_dist: f32,
    /// Distance from the view beyond which this light's shadows are gone
    pub max_dist: f32,
    pub min_dist: f32,
    pub max_size: u32,
    pub min_size: u32,
    pub power: f32,
    /// Every caster shadows itself
    pub self_shadow: bool,
    /// Quality levels (bit per `ShadowConfig::quality_level`) this light casts at
    pub quality_mask: u8,
}

impl Default for ShadowMasterSettings {
    fn default() -> Self {
        Self {
            atten_dist: 0.0,
            max_dist: 0.0,
            min_dist: 0.0,
            max_size: 256,
            min_size: 256,
            power: 1.0,
            self_shadow: false,
            quality_mask: u8::MAX,
        }
    }
}

impl ShadowMasterSettings {
    /// Set the max distance; the fade starts at three quarters of it
    pub fn set_max_dist(&mut self, dist: f32) {
        self.max_dist = dist;
        self.min_dist = dist * 0.75;
    }

    pub fn casts_at_quality(&self, level: u8) -> bool {
        level < 8 && self.quality_mask & (1 << level) != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterKind {
    Directional,
    Point,
}

// ============================================================================
// ShadowMaster
// ============================================================================

#[derive(Debug)]
pub struct ShadowMaster {
    kind: MasterKind,
    settings: ShadowMasterSettings,
    slave_pool: FramePool<ShadowSlave>,
    isect_pool: FramePool<BoundsIsect>,
    /// Up vector of the last light-space camera, kept while it stays usable
    last_up: Vec3,
}

impl ShadowMaster {
    pub fn new(kind: MasterKind, settings: ShadowMasterSettings) -> Self {
        Self {
            kind,
            settings,
            slave_pool: FramePool::new(),
            isect_pool: FramePool::new(),
            last_up: Vec3::Y,
        }
    }

    pub fn kind(&self) -> MasterKind {
        self.kind
    }

    pub fn settings(&self) -> &ShadowMasterSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ShadowMasterSettings {
        &mut self.settings
    }

    pub fn slave(&self, idx: usize) -> Option<&ShadowSlave> {
        self.slave_pool.get(idx)
    }

    /// Slaves alive this frame with their pool indices
    pub fn slaves(&self) -> impl Iterator<Item = (usize, &ShadowSlave)> {
        self.slave_pool.iter_live()
    }

    pub fn slave_count(&self) -> usize {
        self.slave_pool.len()
    }

    /// Culling volume of a slave (see `ShadowSlave::isect`)
    pub fn isect(&self, idx: usize) -> Option<&BoundsIsect> {
        self.isect_pool.get(idx)
    }

    /// Number of slaves ever built
    pub fn slave_capacity(&self) -> usize {
        self.slave_pool.high_water_mark()
    }

    // ===== FRAME =====

    /// Release last frame's slaves and forget which the light owned
    pub fn begin_render(&mut self, light: &mut LightInfo) {
        crate::engine_trace!(
            "galaxy3d::ShadowMaster",
            "Begin render: releasing {} slaves (pool size {})",
            self.slave_pool.len(),
            self.slave_pool.high_water_mark()
        );
        self.slave_pool.reset();
        self.isect_pool.reset();
        light.clear_slave_bits();
    }

    /// Cast `caster`'s shadow from `light`.
    ///
    /// Returns the pool index of the submitted slave, or `None` when the
    /// shadow is skipped this frame.
    pub fn on_cast(
        &mut self,
        caster: &ShadowCaster,
        light: &mut LightInfo,
        config: &ShadowConfig,
        pipeline: &mut dyn ShadowPipeline,
    ) -> Option<usize> {
        if !light.is_visible() || !self.settings.casts_at_quality(config.quality_level()) {
            return None;
        }
        if !caster.has_spans() {
            return None;
        }

        let caster_bnd = self.compute_caster_bounds(caster);
        if !caster_bnd.is_normal() {
            return None;
        }

        let power = remap_power(self.compute_power(caster, light, &caster_bnd))?;
        let idx = self.create_shadow_slave(caster, light, &caster_bnd, power, config, &*pipeline)?;

        let submitted = match self.slave_pool.get(idx) {
            Some(slave) => pipeline.submit_shadow_slave(slave),
            None => None,
        };
        let Some(index) = submitted else {
            crate::engine_trace!("galaxy3d::ShadowMaster", "Pipeline declined shadow slave {}", idx);
            self.recycle_slave(idx);
            return None;
        };

        light.set_slave_bit(index);
        if let Some(slave) = self.slave_pool.get_mut(idx) {
            slave.index = Some(index);
            slave.set_flag(SlaveFlags::OBEYS_LIGHT_GROUPS, light.obeys_light_groups());
            slave.set_flag(SlaveFlags::INCLUDES_CHARS, light.includes_chars());
        }
        Some(idx)
    }

    /// Check out a slave for `caster`, building one only when the pool is
    /// exhausted. The slave comes back initialized.
    pub fn next_slave(&mut self, caster: &ShadowCaster) -> usize {
        let kind = self.slave_kind(caster);
        let idx = self.slave_pool.checkout(|| ShadowSlave::new(kind));
        if let Some(slave) = self.slave_pool.get_mut(idx) {
            slave.init(kind);
        }
        idx
    }

    fn slave_kind(&self, caster: &ShadowCaster) -> SlaveKind {
        match self.kind {
            MasterKind::Point => SlaveKind::Point,
            MasterKind::Directional if caster.perspective() => SlaveKind::PerspectiveDirectional,
            MasterKind::Directional => SlaveKind::Directional,
        }
    }

    fn create_shadow_slave(
        &mut self,
        caster: &ShadowCaster,
        light: &LightInfo,
        caster_bnd: &Bounds3,
        power: f32,
        config: &ShadowConfig,
        pipeline: &dyn ShadowPipeline,
    ) -> Option<usize> {
        let idx = self.next_slave(caster);
        let mut slave = std::mem::take(self.slave_pool.get_mut(idx)?);

        slave.power = power;
        slave.caster_world_bounds = *caster_bnd;
        slave.atten_dist = self.settings.atten_dist * caster.atten_scale();
        slave.blur_scale = caster.blur_scale();
        slave.set_flag(SlaveFlags::SELF_SHADOW, self.settings.self_shadow || caster.self_shadow());

        // Each step reads what the previous ones computed
        self.compute_world_to_light(caster_bnd, light, &mut slave);
        self.compute_bounds(caster_bnd, &mut slave);
        self.compute_width_and_height(caster, config, pipeline, &mut slave);
        let setup = slave.setup_view_transform();
        if setup.is_ok() {
            self.compute_lut(&mut slave);
            self.compute_isect(&mut slave);
        }
        let bail = setup.is_err() || self.last_chance_to_bail(config, pipeline, &mut slave);

        if let Err(e) = setup {
            crate::engine_debug!("galaxy3d::ShadowMaster", "Skipping shadow: {}", e);
        }

        if let Some(pooled) = self.slave_pool.get_mut(idx) {
            *pooled = slave;
        }
        if bail {
            self.recycle_slave(idx);
            return None;
        }
        Some(idx)
    }

    /// Hand a slave and its culling volume back to the pools
    fn recycle_slave(&mut self, idx: usize) {
        if let Some(isect) = self.slave_pool.get(idx).and_then(|s| s.isect) {
            self.isect_pool.recycle(isect);
        }
        self.slave_pool.recycle(idx);
    }

    // ===== COMPUTATIONS =====

    /// Union of the caster's span bounds
    pub fn compute_caster_bounds(&self, caster: &ShadowCaster) -> Bounds3 {
        let mut bnd = Bounds3::empty();
        for span_bnd in caster.span_bounds() {
            bnd.union(span_bnd);
        }
        bnd
    }

    /// Raw shadow power: caster opacity, light strength over the caster,
    /// the master's power and the caster's boost.
    pub fn compute_power(&self, caster: &ShadowCaster, light: &LightInfo, caster_bnd: &Bounds3) -> f32 {
        let mut power = 0.0;
        if !light.is_idle() {
            power = caster.max_opacity() * light.strength(caster_bnd);
        }
        power * self.settings.power * caster.boost()
    }

    /// Place the slave's light-space camera.
    ///
    /// Point and spot lights look from the light at the caster center. Directional
    /// lights look along their direction from behind the caster.
    pub fn compute_world_to_light(&mut self, caster_bnd: &Bounds3, light: &LightInfo, slave: &mut ShadowSlave) {
        let at = caster_bnd.center();
        let from = match self.kind {
            MasterKind::Point => light.position(),
            MasterKind::Directional => {
                at - light.direction() * (caster_bnd.radius() * LIGHT_BACKOFF + MIN_MIN_Z)
            }
        };
        let up = self.pick_up((at - from).normalize_or_zero());
        let (w2l, l2w) = ViewTransform::make_camera(from, at, up);
        slave.set_world_to_light(w2l, l2w);
    }

    fn pick_up(&mut self, dir: Vec3) -> Vec3 {
        if self.last_up.cross(dir).length_squared() < MIN_UP_MAG {
            let mut up = Vec3::Y;
            if up.cross(dir).length_squared() < MIN_UP_MAG {
                up = Vec3::Z;
            }
            self.last_up = up;
        }
        self.last_up
    }

    /// World volume the shadow can fall on: the caster pushed `atten_dist`
    /// past its light-space center. Point lights spread the far face along
    /// the light rays through its corners.
    pub fn compute_bounds(&self, caster_bnd: &Bounds3, slave: &mut ShadowSlave) {
        let mut bnd = *caster_bnd;
        if !caster_bnd.is_normal() {
            slave.set_world_bounds(bnd);
            return;
        }

        let mut light_bnd = caster_bnd.transformed(&slave.world_to_light);
        let (mn, mx) = (light_bnd.min(), light_bnd.max());
        let far = light_bnd.center().z + slave.atten_dist;

        light_bnd.union_point(Vec3::new(mx.x, mx.y, far));

        if self.kind == MasterKind::Point && mx.z > 0.0 {
            let far_z = far.max(mx.z);
            for corner in [
                Vec3::new(mn.x, mn.y, mx.z),
                Vec3::new(mx.x, mn.y, mx.z),
                Vec3::new(mn.x, mx.y, mx.z),
                Vec3::new(mx.x, mx.y, mx.z),
            ] {
                light_bnd.union_point(corner * (far_z / mx.z));
            }
        }

        bnd.union(&light_bnd.transformed(&slave.light_to_world));
        slave.set_world_bounds(bnd);
    }

    /// Shadow map size and priority from the view distance.
    ///
    /// The size starts at the master's `max_size`, halves at low quality
    /// and for `LIMIT_RES` casters, halves again per `SHIFT_DIST` of view
    /// distance, then clamps to `[MIN_SHADOW_SIZE, config.max_size]`.
    pub fn compute_width_and_height(
        &self,
        caster: &ShadowCaster,
        config: &ShadowConfig,
        pipeline: &dyn ShadowPipeline,
        slave: &mut ShadowSlave,
    ) {
        let mut size = self.settings.max_size;
        if config.quality() <= 0.5 {
            size >>= 1;
        }
        if caster.limit_res() {
            size >>= 1;
        }

        let dist = if slave.world_bounds.is_normal() {
            let view_dir = pipeline.view_dir_world();
            let depth = slave.world_bounds.test_plane(view_dir);
            (depth.x - view_dir.dot(pipeline.view_position_world())).max(0.0)
        } else {
            0.0
        };
        slave.priority = dist;

        let shift = (dist / SHIFT_DIST) as u32;
        size = size.checked_shr(shift).unwrap_or(0);
        let size = size.min(config.max_size()).max(MIN_SHADOW_SIZE);
        slave.set_size(size, size);
    }

    /// Depth lookups mapping light-space z from the caster's near face (0)
    /// to `atten_dist` past its center (1).
    pub fn compute_lut(&self, slave: &mut ShadowSlave) {
        let Ok(light_bnd) = slave.light_space_caster_bounds() else { return };
        let farthest = light_bnd.center().z + slave.atten_dist;
        let closest = light_bnd.min().z;
        let range = (farthest - closest).max(f32::EPSILON);

        let mut light_to_lut = Mat4::ZERO;
        light_to_lut.z_axis.x = 1.0 / range;
        light_to_lut.w_axis.x = -closest / range;

        slave.rcv_lut = light_to_lut * slave.world_to_light;

        light_to_lut.w_axis.x += SELF_BIAS;
        slave.cast_lut = if slave.cast_in_camera_space() {
            light_to_lut * slave.world_to_light
        } else {
            light_to_lut
        };
    }

    /// Wrap the slave's world bounds in a pooled culling volume
    pub fn compute_isect(&mut self, slave: &mut ShadowSlave) {
        let idx = self.isect_pool.checkout(BoundsIsect::default);
        if let Some(isect) = self.isect_pool.get_mut(idx) {
            isect.set_bounds(slave.world_bounds);
        }
        slave.isect = Some(idx);
    }

    /// Final visibility and distance fade.
    ///
    /// Returns true when the shadow should be dropped: its volume is out of
    /// view, or it has faded out completely. Otherwise fades the slave's
    /// power between the fade start and the max distance.
    pub fn last_chance_to_bail(
        &self,
        config: &ShadowConfig,
        pipeline: &dyn ShadowPipeline,
        slave: &mut ShadowSlave,
    ) -> bool {
        let wbnd = slave.world_bounds;
        if !pipeline.test_visible_world(&wbnd) {
            return true;
        }

        let global_max = config.max_dist();
        let mut max_dist = if self.settings.max_dist > 0.0 {
            if global_max > 0.0 {
                self.settings.max_dist.min(global_max)
            } else {
                self.settings.max_dist
            }
        } else {
            global_max
        };
        max_dist *= MIN_DIST_FRAC + config.quality() * (1.0 - MIN_DIST_FRAC);

        if max_dist <= 0.0 || !wbnd.is_normal() {
            return false;
        }

        let fade_frac = MIN_FADE_FRAC + config.quality() * (MAX_FADE_FRAC - MIN_FADE_FRAC);
        let min_dist = max_dist * fade_frac;

        let view_pos = pipeline.view_position_world();
        let dir = (wbnd.center() - view_pos).normalize_or_zero();
        let depth = wbnd.test_plane(dir);
        let eye_dist = dir.dot(view_pos);

        let dist = depth.x - eye_dist - min_dist;
        if dist < 0.0 {
            return false;
        }
        let fade = 1.0 - dist / (max_dist - min_dist);
        if fade <= 0.0 {
            return true;
        }
        slave.power *= fade;
        false
    }
}

/// Drop weak shadows and lift those just above the cutoff so they fade in
/// from `VIS_SHADOW_POWER` instead of popping.
fn remap_power(power: f32) -> Option<f32> {
    if power < MIN_SHADOW_POWER {
        return None;
    }
    if power < KNEE_SHADOW_POWER {
        let t = (power - MIN_SHADOW_POWER) / (KNEE_SHADOW_POWER - MIN_SHADOW_POWER);
        debug_assert!((0.0..=1.0).contains(&t), "power interpolation out of range: {}", t);
        return Some(VIS_SHADOW_POWER + t * (KNEE_SHADOW_POWER - VIS_SHADOW_POWER));
    }
    Some(power)
}

#[cfg(test)]
#[path = "shadow_master_tests.rs"]
mod tests;
