/// Drawable — a batch of spans sharing a material table and a space tree.

use bitflags::bitflags;
use glam::Mat4;
use crate::bounds::{Bounds3, BoundsIsect};
use crate::error::Result;
use super::space_tree::SpaceTree;
use super::span::{Span, SpanKind, SpanProps};

bitflags! {
    /// Material flags relevant to visibility
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        /// Both faces of each triangle are solid
        const TWO_SIDED = 0x1;
        /// Alpha blended; cannot take projected shadows
        const ALPHA_BLEND = 0x2;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Material {
    pub flags: MaterialFlags,
}

impl Material {
    pub fn new(flags: MaterialFlags) -> Self {
        Self { flags }
    }

    pub fn is_two_sided(&self) -> bool {
        self.flags.contains(MaterialFlags::TWO_SIDED)
    }
}

bitflags! {
    /// Drawable-wide properties
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DrawableProps: u32 {
        /// Drawn in the blended pass
        const BLENDED = 0x1;
        /// Moves around freely (avatars, physicals)
        const CHARACTER = 0x2;
    }
}

#[derive(Debug, Clone)]
pub struct Drawable {
    spans: Vec<Span>,
    materials: Vec<Material>,
    props: DrawableProps,
    space_tree: SpaceTree,
}

impl Drawable {
    /// Create a drawable and build its span tree.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if a span references a missing
    /// material or has a malformed index list.
    pub fn new(spans: Vec<Span>, materials: Vec<Material>, props: DrawableProps) -> Result<Self> {
        for (i, span) in spans.iter().enumerate() {
            if span.material_index() >= materials.len() {
                return Err(crate::engine_err!(
                    "galaxy3d::Drawable",
                    "Span {} references material {} but only {} exist",
                    i,
                    span.material_index(),
                    materials.len()
                ));
            }
            if !span.has_valid_indices() {
                return Err(crate::engine_err!(
                    "galaxy3d::Drawable",
                    "Span {} has a malformed triangle index list",
                    i
                ));
            }
        }

        let bounds: Vec<Bounds3> = spans.iter().map(|s| *s.world_bounds()).collect();
        let space_tree = SpaceTree::build(&bounds)?;

        Ok(Self { spans, materials, props, space_tree })
    }

    // ===== GETTERS =====

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn span(&self, idx: usize) -> Option<&Span> {
        self.spans.get(idx)
    }

    pub fn material(&self, idx: usize) -> Option<&Material> {
        self.materials.get(idx)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn props(&self) -> DrawableProps {
        self.props
    }

    pub fn is_blended(&self) -> bool {
        self.props.contains(DrawableProps::BLENDED)
    }

    pub fn space_tree(&self) -> &SpaceTree {
        &self.space_tree
    }

    pub fn world_bounds(&self) -> Bounds3 {
        self.space_tree.world_bounds()
    }

    /// Whether a span can block line of sight.
    ///
    /// Only icicles are tested; blended drawables only offer spans flagged
    /// `VIS_LOS`.
    pub fn accepts_los_span(&self, idx: usize) -> bool {
        let Some(span) = self.spans.get(idx) else { return false };
        if span.kind() != SpanKind::Icicle {
            return false;
        }
        !self.is_blended() || span.props().contains(SpanProps::VIS_LOS)
    }

    /// Whether a span can have shadows projected onto it
    pub fn receives_shadows(&self, idx: usize) -> bool {
        let Some(span) = self.spans.get(idx) else { return false };
        if span.props().contains(SpanProps::NO_SHADOW) {
            return false;
        }
        if span.props().contains(SpanProps::FORCE_SHADOW) {
            return true;
        }
        !self
            .material(span.material_index())
            .is_some_and(|m| m.flags.contains(MaterialFlags::ALPHA_BLEND))
    }

    /// Collect the spans inside a shadow volume that can receive the shadow.
    ///
    /// `out` is cleared first.
    pub fn harvest_shadow_receivers(&self, isect: &BoundsIsect, out: &mut Vec<u16>) {
        out.clear();
        self.space_tree.harvest(isect, out);
        out.retain(|&idx| self.receives_shadows(idx as usize));
    }

    // ===== SETTERS =====

    /// Hide a span from queries (it stays in the tree)
    pub fn set_span_disabled(&mut self, idx: u16, disabled: bool) {
        self.space_tree.set_disabled(idx, disabled);
        self.space_tree.refresh_bounds();
    }

    /// Move one span and refit the tree
    pub fn set_span_transform(&mut self, idx: usize, local_to_world: Mat4) {
        if let Some(span) = self.spans.get_mut(idx) {
            span.set_transform(local_to_world);
            self.space_tree.move_leaf(idx as u16, *span.world_bounds());
            self.space_tree.refresh_bounds();
        }
    }
}

#[cfg(test)]
#[path = "drawable_tests.rs"]
mod tests;
