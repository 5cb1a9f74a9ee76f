/// ShadowCaster — a group of spans that casts one shadow.
///
/// The caster only keeps what the shadow master needs from its spans: their
/// world bounds. Collection from a drawable skips spans flagged
/// `NO_SHADOW_CAST` and spans hidden in the drawable's space tree.

use bitflags::bitflags;
use crate::bounds::Bounds3;
use crate::scene::{Drawable, SpanProps};

bitflags! {
    /// How a caster wants its shadow cast
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CasterFlags: u32 {
        /// Shadow the caster's own spans too
        const SELF_SHADOW = 0x1;
        /// Use a perspective projection under directional lights
        const PERSPECTIVE = 0x2;
        /// Render at half resolution
        const LIMIT_RES   = 0x4;
    }
}

#[derive(Debug, Clone)]
pub struct ShadowCaster {
    span_bounds: Vec<Bounds3>,
    flags: CasterFlags,
    max_opacity: f32,
    atten_scale: f32,
    blur_scale: f32,
    boost: f32,
}

impl Default for ShadowCaster {
    fn default() -> Self {
        Self {
            span_bounds: Vec::new(),
            flags: CasterFlags::empty(),
            max_opacity: 1.0,
            atten_scale: 1.0,
            blur_scale: 0.0,
            boost: 1.0,
        }
    }
}

impl ShadowCaster {
    pub fn new(flags: CasterFlags) -> Self {
        Self { flags, ..Self::default() }
    }

    /// Opacity of the most opaque span, used to fade shadows in and out
    pub fn with_max_opacity(mut self, opacity: f32) -> Self {
        self.max_opacity = opacity;
        self
    }

    /// Scale applied to the master's attenuation distance
    pub fn with_atten_scale(mut self, scale: f32) -> Self {
        self.atten_scale = scale;
        self
    }

    pub fn with_blur_scale(mut self, scale: f32) -> Self {
        self.blur_scale = scale;
        self
    }

    /// Multiplier on the shadow's power
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    // ===== SPANS =====

    pub fn add_span_bounds(&mut self, bnd: Bounds3) {
        self.span_bounds.push(bnd);
    }

    /// Append the casting spans of `drawable`. Returns how many were added.
    pub fn collect_spans(&mut self, drawable: &Drawable) -> usize {
        let before = self.span_bounds.len();
        for (idx, span) in drawable.spans().iter().enumerate() {
            if span.props().contains(SpanProps::NO_SHADOW_CAST)
                || drawable.space_tree().node(idx as u16).is_disabled()
            {
                continue;
            }
            self.span_bounds.push(*span.world_bounds());
        }
        self.span_bounds.len() - before
    }

    pub fn clear_spans(&mut self) {
        self.span_bounds.clear();
    }

    pub fn span_bounds(&self) -> &[Bounds3] {
        &self.span_bounds
    }

    pub fn has_spans(&self) -> bool {
        !self.span_bounds.is_empty()
    }

    // ===== ACCESSORS =====

    pub fn flags(&self) -> CasterFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: CasterFlags) {
        self.flags = flags;
    }

    pub fn self_shadow(&self) -> bool {
        self.flags.contains(CasterFlags::SELF_SHADOW)
    }

    pub fn perspective(&self) -> bool {
        self.flags.contains(CasterFlags::PERSPECTIVE)
    }

    pub fn limit_res(&self) -> bool {
        self.flags.contains(CasterFlags::LIMIT_RES)
    }

    pub fn max_opacity(&self) -> f32 {
        self.max_opacity
    }

    pub fn atten_scale(&self) -> f32 {
        self.atten_scale
    }

    pub fn blur_scale(&self) -> f32 {
        self.blur_scale
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }
}

#[cfg(test)]
#[path = "shadow_caster_tests.rs"]
mod tests;
