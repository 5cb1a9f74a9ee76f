/// Span — one renderable piece of a drawable.
///
/// Geometry is stored in local space as a triangle list. The world bounds
/// are derived from the local vertex bounds through `local_to_world` and
/// kept in sync by `set_transform`.

use bitflags::bitflags;
use glam::{Mat4, Vec3};
use crate::bounds::Bounds3;

/// Geometry category of a span. Only icicles carry triangles that line of
/// sight queries can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Regular indexed triangle geometry
    Icicle,
    /// Particle system quads
    Particle,
    /// Anything else (lines, decals...)
    Other,
}

bitflags! {
    /// Per-span properties
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpanProps: u32 {
        /// Blended spans flagged with this still block line of sight
        const VIS_LOS      = 0x1;
        /// Never receives shadows
        const NO_SHADOW    = 0x2;
        /// Receives shadows even when other rules would skip it
        const FORCE_SHADOW = 0x4;
        /// Excluded from its caster's shadow
        const NO_SHADOW_CAST = 0x8;
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    kind: SpanKind,
    props: SpanProps,
    material_index: usize,
    local_to_world: Mat4,
    world_to_local: Mat4,
    local_bounds: Bounds3,
    world_bounds: Bounds3,
    vertices: Vec<Vec3>,
    indices: Vec<u16>,
}

impl Span {
    /// Create an icicle span from local-space triangles.
    pub fn new(
        vertices: Vec<Vec3>,
        indices: Vec<u16>,
        material_index: usize,
        local_to_world: Mat4,
    ) -> Self {
        let local_bounds = Bounds3::from_points(&vertices);
        Self {
            kind: SpanKind::Icicle,
            props: SpanProps::empty(),
            material_index,
            local_to_world,
            world_to_local: local_to_world.inverse(),
            world_bounds: local_bounds.transformed(&local_to_world),
            local_bounds,
            vertices,
            indices,
        }
    }

    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_props(mut self, props: SpanProps) -> Self {
        self.props = props;
        self
    }

    // ===== GETTERS =====

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    pub fn props(&self) -> SpanProps {
        self.props
    }

    pub fn material_index(&self) -> usize {
        self.material_index
    }

    pub fn local_to_world(&self) -> &Mat4 {
        &self.local_to_world
    }

    pub fn world_to_local(&self) -> &Mat4 {
        &self.world_to_local
    }

    pub fn world_bounds(&self) -> &Bounds3 {
        &self.world_bounds
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space corners of triangle `tri`
    pub fn triangle(&self, tri: usize) -> [Vec3; 3] {
        let i = tri * 3;
        [
            self.vertices[self.indices[i] as usize],
            self.vertices[self.indices[i + 1] as usize],
            self.vertices[self.indices[i + 2] as usize],
        ]
    }

    // ===== SETTERS =====

    pub fn set_props(&mut self, props: SpanProps) {
        self.props = props;
    }

    /// Move the span; the world bounds follow.
    pub fn set_transform(&mut self, local_to_world: Mat4) {
        self.local_to_world = local_to_world;
        self.world_to_local = local_to_world.inverse();
        self.world_bounds = self.local_bounds.transformed(&local_to_world);
    }

    /// Index list is a whole number of triangles and every index is in range
    pub(crate) fn has_valid_indices(&self) -> bool {
        self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < self.vertices.len())
    }
}
