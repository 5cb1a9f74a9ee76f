/// Bounds3 — axis-aligned bounding box with an explicit kind.
///
/// Unlike a bare min/max pair, a `Bounds3` knows whether it is still
/// uninitialized, empty, a normal box, or the whole of space. Unions with
/// an empty or uninitialized box copy the other operand, and nothing can
/// grow a `Full` box.

use glam::{Mat4, Vec2, Vec3};

/// State of a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsKind {
    /// Never set
    Uninitialized,
    /// Explicitly contains nothing
    Empty,
    /// A regular min/max box
    Normal,
    /// Contains all of space
    Full,
}

/// Axis-aligned bounding box.
///
/// Invariant: for `Normal` bounds, `min <= max` componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    kind: BoundsKind,
    min: Vec3,
    max: Vec3,
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self {
            kind: BoundsKind::Uninitialized,
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

impl Bounds3 {
    /// Create a box from its corners.
    ///
    /// If any component of `max` is below the matching component of `min`
    /// the result is `Empty`.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        let kind = if max.cmplt(min).any() {
            BoundsKind::Empty
        } else {
            BoundsKind::Normal
        };
        Self { kind, min, max }
    }

    pub fn empty() -> Self {
        Self { kind: BoundsKind::Empty, min: Vec3::ZERO, max: Vec3::ZERO }
    }

    pub fn full() -> Self {
        Self {
            kind: BoundsKind::Full,
            min: Vec3::splat(f32::NEG_INFINITY),
            max: Vec3::splat(f32::INFINITY),
        }
    }

    /// Tightest box around a set of points (`Empty` for no points)
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bnd = Self::empty();
        for p in points {
            bnd.union_point(*p);
        }
        bnd
    }

    /// Box centered on `center` with half extents `half`
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    pub fn kind(&self) -> BoundsKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, BoundsKind::Empty | BoundsKind::Uninitialized)
    }

    pub fn is_normal(&self) -> bool {
        self.kind == BoundsKind::Normal
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half the diagonal length
    pub fn radius(&self) -> f32 {
        self.size().length() * 0.5
    }

    pub fn has_nan(&self) -> bool {
        self.min.is_nan() || self.max.is_nan()
    }

    /// The eight corners. Bit 0 of the index selects max X, bit 1 max Y,
    /// bit 2 max Z.
    pub fn corners(&self) -> [Vec3; 8] {
        let mut out = [Vec3::ZERO; 8];
        for (i, c) in out.iter_mut().enumerate() {
            *c = Vec3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            );
        }
        out
    }

    /// Grow to include a point
    pub fn union_point(&mut self, p: Vec3) {
        match self.kind {
            BoundsKind::Normal => {
                self.min = self.min.min(p);
                self.max = self.max.max(p);
            }
            BoundsKind::Full => {}
            BoundsKind::Empty | BoundsKind::Uninitialized => {
                self.kind = BoundsKind::Normal;
                self.min = p;
                self.max = p;
            }
        }
    }

    /// Sweep the box along a vector: positive components push the max
    /// face out, the others push the min face.
    pub fn union_vector(&mut self, v: Vec3) {
        if self.kind != BoundsKind::Normal {
            return;
        }
        for i in 0..3 {
            if v[i] > 0.0 {
                self.max[i] += v[i];
            } else {
                self.min[i] += v[i];
            }
        }
    }

    /// Grow to include another box
    pub fn union(&mut self, other: &Bounds3) {
        match (self.kind, other.kind) {
            (BoundsKind::Normal, BoundsKind::Normal) => {
                self.min = self.min.min(other.min);
                self.max = self.max.max(other.max);
            }
            (BoundsKind::Empty | BoundsKind::Uninitialized, _) => {
                *self = *other;
            }
            _ => {}
        }
    }

    /// Transform all eight corners and re-fit a box around them.
    pub fn transformed(&self, m: &Mat4) -> Bounds3 {
        if self.kind != BoundsKind::Normal {
            return *self;
        }
        let corners = self.corners();
        let mut out = Bounds3::empty();
        for c in corners {
            out.union_point(m.transform_point3(c));
        }
        out
    }

    /// Inclusive point containment
    pub fn is_inside(&self, p: Vec3) -> bool {
        match self.kind {
            BoundsKind::Full => true,
            BoundsKind::Normal => p.cmpge(self.min).all() && p.cmple(self.max).all(),
            _ => false,
        }
    }

    /// Min and max of `dot(n, corner)` over the box corners.
    pub fn test_plane(&self, n: Vec3) -> Vec2 {
        debug_assert!(self.kind == BoundsKind::Normal, "test_plane needs a normal box");
        let mut dmin = self.min.dot(n);
        let mut dmax = dmin;
        for i in 0..3 {
            let dd = (self.max[i] - self.min[i]) * n[i];
            if dd < 0.0 {
                dmin += dd;
            } else {
                dmax += dd;
            }
        }
        Vec2::new(dmin, dmax)
    }

    /// Classify `other` against this box.
    ///
    /// Returns -1 when the boxes are disjoint, 1 when this box fully
    /// contains `other`, and 0 when they overlap.
    pub fn test_bound(&self, other: &Bounds3) -> i32 {
        let mut ret = 1;
        for i in 0..3 {
            if self.min[i] > other.max[i] || self.max[i] < other.min[i] {
                return -1;
            }
            if self.max[i] < other.max[i] || self.min[i] > other.min[i] {
                ret = 0;
            }
        }
        ret
    }

    /// Overlap test (touching counts)
    pub fn intersects(&self, other: &Bounds3) -> bool {
        if self.kind == BoundsKind::Full || other.kind == BoundsKind::Full {
            return !self.is_empty() && !other.is_empty();
        }
        self.is_normal() && other.is_normal() && self.test_bound(other) >= 0
    }
}

#[cfg(test)]
#[path = "bounds3_tests.rs"]
mod tests;
