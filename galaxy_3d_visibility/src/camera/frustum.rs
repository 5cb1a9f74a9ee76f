/// Frustum — six clipping planes for visibility tests.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// Planes are extracted from a world-to-NDC matrix whose depth range is
/// [0, 1] (the `ViewTransform` convention).

use glam::{Mat4, Vec3, Vec4};
use crate::bounds::Bounds3;
use super::ViewTransform;

/// Result of a 3-way frustum/box classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// Box is entirely outside the frustum
    Outside,
    /// Box is entirely inside the frustum
    Inside,
    /// Box partially overlaps the frustum
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a world-to-NDC matrix (Gribb & Hartmann,
    /// zero-to-one depth).
    pub fn from_world_to_ndc(m: &Mat4) -> Self {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);

        let mut planes = [
            r3 + r0,
            r3 - r0,
            r3 + r1,
            r3 - r1,
            r2,
            r3 - r2,
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    pub fn from_view_transform(view: &ViewTransform) -> Self {
        Self::from_world_to_ndc(&view.world_to_ndc())
    }

    /// Signed distance of a point to one plane (positive inside)
    pub fn plane_distance(&self, plane: usize, p: Vec3) -> f32 {
        self.planes[plane].dot(p.extend(1.0))
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        (0..6).all(|i| self.plane_distance(i, p) >= 0.0)
    }

    /// Conservative overlap test using the positive vertex of each plane.
    pub fn intersects_bounds(&self, bnd: &Bounds3) -> bool {
        self.classify_bounds(bnd) != FrustumTest::Outside
    }

    /// Classify a box against the frustum (3-way test).
    ///
    /// Empty boxes are outside; `Full` boxes are partial.
    pub fn classify_bounds(&self, bnd: &Bounds3) -> FrustumTest {
        if bnd.is_empty() {
            return FrustumTest::Outside;
        }
        if !bnd.is_normal() {
            return FrustumTest::Partial;
        }
        let (min, max) = (bnd.min(), bnd.max());
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.truncate();

            let p_vertex = Vec3::new(
                if normal.x >= 0.0 { max.x } else { min.x },
                if normal.y >= 0.0 { max.y } else { min.y },
                if normal.z >= 0.0 { max.z } else { min.z },
            );
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            let n_vertex = Vec3::new(
                if normal.x >= 0.0 { min.x } else { max.x },
                if normal.y >= 0.0 { min.y } else { max.y },
                if normal.z >= 0.0 { min.z } else { max.z },
            );
            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
