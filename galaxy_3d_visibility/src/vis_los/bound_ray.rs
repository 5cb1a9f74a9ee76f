/// Ray tests used by the LOS traversal.
///
/// Both tests share one convention: a face is solid from the side where
/// its corners run clockwise. The front normal of a polygon `p0, p1, ...,
/// pn` is `(pn - p0) x (p1 - p0)`, and a point on the plane is inside when
/// `((b - a) x (p - a)) . n <= 0` for every edge `a -> b`.

use glam::Vec3;
use crate::bounds::Bounds3;

/// Rays closer than this (cosine) to a face plane never hit it
pub const PARALLEL_EPSILON: f32 = 1e-3;

/// Box faces as corner indices (see `Bounds3::corners`), clockwise seen
/// from outside.
const BOX_FACES: [[usize; 4]; 6] = [
    [0, 2, 6, 4], // -X
    [1, 5, 7, 3], // +X
    [0, 4, 5, 1], // -Y
    [2, 3, 7, 6], // +Y
    [0, 1, 3, 2], // -Z
    [4, 6, 7, 5], // +Z
];

/// Current query segment.
///
/// `dir` must be unit length; `max_dist` is the distance from `from` to
/// `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LosRay {
    pub from: Vec3,
    pub target: Vec3,
    pub dir: Vec3,
    pub max_dist: f32,
}

impl LosRay {
    /// Segment from `from` to `target`, `None` when it has no length
    pub fn new(from: Vec3, target: Vec3) -> Option<Self> {
        let seg = target - from;
        let max_dist = seg.length();
        if !(max_dist > 0.0) {
            return None;
        }
        Some(Self { from, target, dir: seg / max_dist, max_dist })
    }

    pub fn point_at(&self, dist: f32) -> Vec3 {
        self.from + self.dir * dist
    }
}

/// Distance along the ray to a hit on a planar polygon, if any.
///
/// `two_sided` accepts hits on the back of the face.
fn check_polygon(ray: &LosRay, corners: &[Vec3], two_sided: bool) -> Option<f32> {
    let p0 = corners[0];
    let n = (corners[corners.len() - 1] - p0).cross(corners[1] - p0).normalize_or_zero();

    let dot_norm = ray.dir.dot(n);
    if dot_norm.abs() < PARALLEL_EPSILON {
        return None;
    }
    if dot_norm > 0.0 && !two_sided {
        return None;
    }

    let dist = (p0 - ray.from).dot(n) / dot_norm;
    if dist < 0.0 || dist > ray.max_dist {
        return None;
    }

    let p = ray.point_at(dist);
    for (i, &a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % corners.len()];
        if (b - a).cross(p - a).dot(n) > 0.0 {
            return None;
        }
    }
    Some(dist)
}

/// Closest distance from `ray.from` to `bnd` along the ray.
///
/// Either endpoint inside the box is a hit at distance 0. Otherwise the
/// first front face the segment crosses wins.
pub fn check_bound(bnd: &Bounds3, ray: &LosRay) -> Option<f32> {
    if bnd.is_empty() {
        return None;
    }
    if bnd.is_inside(ray.from) || bnd.is_inside(ray.target) {
        return Some(0.0);
    }
    if !bnd.is_normal() {
        return None;
    }

    let c = bnd.corners();
    BOX_FACES.iter().find_map(|f| {
        check_polygon(ray, &[c[f[0]], c[f[1]], c[f[2]], c[f[3]]], false)
    })
}

/// Distance along the ray to a triangle hit, if any
pub fn check_triangle(ray: &LosRay, tri: &[Vec3; 3], two_sided: bool) -> Option<f32> {
    check_polygon(ray, tri, two_sided)
}

#[cfg(test)]
#[path = "bound_ray_tests.rs"]
mod tests;
