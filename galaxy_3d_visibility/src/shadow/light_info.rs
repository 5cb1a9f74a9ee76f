/// LightInfo — the light a shadow master casts for.
///
/// Holds the light's world placement, its strength model and the set of
/// shadow slaves submitted for it this frame (the "slave bits" receivers
/// use to find which shadows they take).

use bitflags::bitflags;
use glam::Vec3;
use rustc_hash::FxHashSet;
use crate::bounds::Bounds3;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LightProps: u32 {
        /// Shadows only fall on the light's include list
        const SHADOW_LIGHT_GROUP = 0x1;
        /// The light has an explicit include list
        const HAS_INCLUDES       = 0x2;
        /// Characters are always included
        const INCLUDES_CHARS     = 0x4;
        /// Not in the current visibility set
        const HIDDEN             = 0x8;
    }
}

/// Half angle of a spot light's full-strength cone
pub const DEFAULT_SPOT_INNER: f32 = std::f32::consts::PI * 0.125;
/// Half angle past which a spot light gives nothing
pub const DEFAULT_SPOT_OUTER: f32 = std::f32::consts::PI * 0.25;

/// Distance falloff of a point or spot light.
///
/// The first non-zero term wins, from quadratic down to the cutoff.
/// Defaults to a plain linear falloff, `strength / dist`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Hard cutoff distance, used only when every other term is zero
    pub cutoff: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self { constant: 0.0, linear: 1.0, quadratic: 0.0, cutoff: 0.0 }
    }
}

impl Attenuation {
    /// No falloff at all
    pub const NONE: Self = Self { constant: 0.0, linear: 0.0, quadratic: 0.0, cutoff: 0.0 };

    fn apply(&self, strength: f32, dist: f32) -> f32 {
        if self.quadratic > 0.0 {
            strength / (self.constant + self.linear * dist + self.quadratic * dist * dist)
        } else if self.linear > 0.0 {
            strength / (self.constant + self.linear * dist)
        } else if self.constant > 0.0 {
            strength / self.constant
        } else if self.cutoff > 0.0 && dist > self.cutoff {
            0.0
        } else {
            strength
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point(Attenuation),
    /// Point falloff narrowed to a cone around the light's direction.
    /// The cosines are of the cone half angles, `cos_inner >= cos_outer`.
    Spot { atten: Attenuation, cos_inner: f32, cos_outer: f32 },
}

#[derive(Debug, Clone)]
pub struct LightInfo {
    kind: LightKind,
    position: Vec3,
    direction: Vec3,
    max_strength: f32,
    props: LightProps,
    slave_bits: FxHashSet<u32>,
}

impl LightInfo {
    /// Directional light shining along `direction`
    pub fn directional(direction: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: direction.normalize_or_zero(),
            max_strength: 1.0,
            props: LightProps::empty(),
            slave_bits: FxHashSet::default(),
        }
    }

    /// Point light at `position`
    pub fn point(position: Vec3, atten: Attenuation) -> Self {
        Self {
            kind: LightKind::Point(atten),
            position,
            direction: Vec3::NEG_Z,
            max_strength: 1.0,
            props: LightProps::empty(),
            slave_bits: FxHashSet::default(),
        }
    }

    /// Spot light at `position` shining along `direction`.
    ///
    /// `inner` and `outer` are cone half angles in radians. Full strength
    /// inside `inner`, fading linearly in cosine to nothing at `outer`.
    pub fn spot(position: Vec3, direction: Vec3, atten: Attenuation, inner: f32, outer: f32) -> Self {
        let outer = outer.max(inner);
        Self {
            kind: LightKind::Spot { atten, cos_inner: inner.cos(), cos_outer: outer.cos() },
            position,
            direction: direction.normalize_or_zero(),
            max_strength: 1.0,
            props: LightProps::empty(),
            slave_bits: FxHashSet::default(),
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.max_strength = strength;
        self
    }

    pub fn with_props(mut self, props: LightProps) -> Self {
        self.props = props;
        self
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.normalize_or_zero();
    }

    pub fn props(&self) -> LightProps {
        self.props
    }

    pub fn has_prop(&self, prop: LightProps) -> bool {
        self.props.contains(prop)
    }

    pub fn set_prop(&mut self, prop: LightProps, on: bool) {
        self.props.set(prop, on);
    }

    /// A light with no strength contributes nothing
    pub fn is_idle(&self) -> bool {
        self.max_strength <= 0.0
    }

    pub fn is_visible(&self) -> bool {
        !self.props.contains(LightProps::HIDDEN)
    }

    /// Strength of the light over a box, 0 when idle
    pub fn strength(&self, bnd: &Bounds3) -> f32 {
        if self.is_idle() {
            return 0.0;
        }
        match self.kind {
            LightKind::Directional => self.max_strength,
            LightKind::Point(atten) => {
                let dist = (bnd.center() - self.position).length();
                atten.apply(self.max_strength, dist)
            }
            LightKind::Spot { atten, cos_inner, cos_outer } => {
                let del = bnd.center() - self.position;
                let strength = atten.apply(self.max_strength, del.length());
                // A box centered on the light sits inside any cone
                let Some(to_box) = del.try_normalize() else {
                    return strength;
                };
                let dot = to_box.dot(self.direction);
                if dot < cos_outer {
                    0.0
                } else if dot < cos_inner {
                    strength * (dot - cos_outer) / (cos_inner - cos_outer)
                } else {
                    strength
                }
            }
        }
    }

    /// Shadows from this light are limited to its light group
    pub fn obeys_light_groups(&self) -> bool {
        self.props.contains(LightProps::SHADOW_LIGHT_GROUP | LightProps::HAS_INCLUDES)
    }

    pub fn includes_chars(&self) -> bool {
        self.props.contains(LightProps::INCLUDES_CHARS)
    }

    // ===== SLAVE BITS =====

    pub fn set_slave_bit(&mut self, index: u32) {
        self.slave_bits.insert(index);
    }

    pub fn has_slave_bit(&self, index: u32) -> bool {
        self.slave_bits.contains(&index)
    }

    pub fn clear_slave_bits(&mut self) {
        self.slave_bits.clear();
    }

    pub fn slave_count(&self) -> usize {
        self.slave_bits.len()
    }
}

#[cfg(test)]
#[path = "light_info_tests.rs"]
mod tests;
