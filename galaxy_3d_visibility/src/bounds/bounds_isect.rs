/// BoundsIsect — a world-space box used as a culling volume.
///
/// Shadow slaves carry one of these so the renderer can harvest the
/// receivers inside the slave's volume. The three-way result lets a
/// hierarchy skip whole subtrees (`Culled`), take whole subtrees without
/// further tests (`Clear`), or keep descending (`Split`).

use glam::Mat4;
use super::Bounds3;

/// Outcome of testing a box against a culling volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeCullResult {
    /// Entirely outside the volume
    Culled,
    /// Entirely inside the volume
    Clear,
    /// Partially inside
    Split,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsIsect {
    local_bounds: Bounds3,
    world_bounds: Bounds3,
}

impl BoundsIsect {
    pub fn new(bnd: Bounds3) -> Self {
        Self { local_bounds: bnd, world_bounds: bnd }
    }

    /// Set the volume; local and world bounds become the same box.
    pub fn set_bounds(&mut self, bnd: Bounds3) {
        self.local_bounds = bnd;
        self.world_bounds = bnd;
    }

    /// Re-derive the world box from the local box
    pub fn set_transform(&mut self, local_to_world: &Mat4) {
        self.world_bounds = self.local_bounds.transformed(local_to_world);
    }

    pub fn world_bounds(&self) -> &Bounds3 {
        &self.world_bounds
    }

    pub fn test(&self, bnd: &Bounds3) -> VolumeCullResult {
        match self.world_bounds.test_bound(bnd) {
            r if r < 0 => VolumeCullResult::Culled,
            r if r > 0 => VolumeCullResult::Clear,
            _ => {
                if bnd.test_bound(&self.world_bounds) < 0 {
                    VolumeCullResult::Culled
                } else {
                    VolumeCullResult::Split
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "bounds_isect_tests.rs"]
mod tests;
