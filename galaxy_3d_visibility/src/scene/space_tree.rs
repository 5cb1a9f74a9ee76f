/// SpaceTree — static binary bounding-volume hierarchy.
///
/// Nodes live in a flat array. The first `num_leaves` nodes are the leaves,
/// in input order, so a leaf's node index is also the index of the item it
/// bounds (span, drawable, scene node). Internal nodes follow, and the root
/// is the last node.
///
/// The tree is built once by median split on the longest axis. Items can
/// then be disabled or moved; `refresh_bounds` propagates those changes up
/// to the root.

use crate::bounds::{Bounds3, BoundsIsect, VolumeCullResult};
use crate::error::Result;

/// Largest number of leaves a tree can index (node indices are u16)
pub const MAX_SPACE_TREE_LEAVES: usize = (u16::MAX as usize + 1) / 2;

#[derive(Debug, Clone)]
pub struct SpaceTreeNode {
    world_bounds: Bounds3,
    /// Child node indices; `None` for leaves
    children: Option<[u16; 2]>,
    disabled: bool,
}

impl SpaceTreeNode {
    pub fn world_bounds(&self) -> &Bounds3 {
        &self.world_bounds
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn children(&self) -> Option<[u16; 2]> {
        self.children
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// Binary BVH over a fixed set of bounds.
#[derive(Debug, Clone, Default)]
pub struct SpaceTree {
    nodes: Vec<SpaceTreeNode>,
    num_leaves: usize,
}

impl SpaceTree {
    /// Build a tree with one leaf per input bound.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if there are more than
    /// `MAX_SPACE_TREE_LEAVES` bounds.
    pub fn build(bounds: &[Bounds3]) -> Result<Self> {
        if bounds.len() > MAX_SPACE_TREE_LEAVES {
            return Err(crate::engine_err!(
                "galaxy3d::SpaceTree",
                "{} leaves exceed the space tree limit of {}",
                bounds.len(),
                MAX_SPACE_TREE_LEAVES
            ));
        }

        let mut nodes: Vec<SpaceTreeNode> = bounds
            .iter()
            .map(|bnd| SpaceTreeNode {
                world_bounds: *bnd,
                children: None,
                disabled: false,
            })
            .collect();
        nodes.reserve(bounds.len().saturating_sub(1));

        if !bounds.is_empty() {
            let mut leaves: Vec<u16> = (0..bounds.len() as u16).collect();
            Self::build_recursive(&mut nodes, &mut leaves);
        }

        Ok(Self { nodes, num_leaves: bounds.len() })
    }

    /// Build the subtree over `leaves`, returning its node index.
    fn build_recursive(nodes: &mut Vec<SpaceTreeNode>, leaves: &mut [u16]) -> u16 {
        if leaves.len() == 1 {
            return leaves[0];
        }

        let mut centers = Bounds3::empty();
        for &leaf in leaves.iter() {
            let bnd = &nodes[leaf as usize].world_bounds;
            if bnd.is_normal() {
                centers.union_point(bnd.center());
            }
        }

        // Split on the axis where the centers spread the most
        let axis = if centers.is_normal() {
            let size = centers.size();
            if size.x >= size.y && size.x >= size.z {
                0
            } else if size.y >= size.z {
                1
            } else {
                2
            }
        } else {
            0
        };

        let key = |leaf: u16| -> f32 {
            let bnd = &nodes[leaf as usize].world_bounds;
            if bnd.is_normal() { bnd.center()[axis] } else { f32::INFINITY }
        };
        leaves.sort_by(|a, b| key(*a).total_cmp(&key(*b)));

        let mid = leaves.len() / 2;
        let (lo, hi) = leaves.split_at_mut(mid);
        let left = Self::build_recursive(nodes, lo);
        let right = Self::build_recursive(nodes, hi);

        let mut world_bounds = nodes[left as usize].world_bounds;
        world_bounds.union(&nodes[right as usize].world_bounds);

        let idx = nodes.len() as u16;
        nodes.push(SpaceTreeNode {
            world_bounds,
            children: Some([left, right]),
            disabled: false,
        });
        idx
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Root node index, `None` for an empty tree
    pub fn root(&self) -> Option<u16> {
        if self.nodes.is_empty() {
            None
        } else {
            Some((self.nodes.len() - 1) as u16)
        }
    }

    pub fn node(&self, idx: u16) -> &SpaceTreeNode {
        &self.nodes[idx as usize]
    }

    /// Bounds of the whole tree
    pub fn world_bounds(&self) -> Bounds3 {
        self.root()
            .map(|r| self.nodes[r as usize].world_bounds)
            .unwrap_or_else(Bounds3::empty)
    }

    /// Enable or disable a leaf. Call `refresh_bounds` afterwards to update
    /// the internal nodes.
    pub fn set_disabled(&mut self, leaf: u16, disabled: bool) {
        debug_assert!((leaf as usize) < self.num_leaves, "not a leaf");
        if let Some(node) = self.nodes.get_mut(leaf as usize) {
            node.disabled = disabled;
        }
    }

    /// Replace a leaf's bounds. Call `refresh_bounds` afterwards.
    pub fn move_leaf(&mut self, leaf: u16, bnd: Bounds3) {
        debug_assert!((leaf as usize) < self.num_leaves, "not a leaf");
        if let Some(node) = self.nodes.get_mut(leaf as usize) {
            node.world_bounds = bnd;
        }
    }

    /// Recompute internal bounds and disabled flags bottom-up.
    ///
    /// An internal node is disabled when both its children are, and its
    /// bounds cover only its enabled children.
    pub fn refresh_bounds(&mut self) {
        // Children always precede their parent in the array
        for idx in self.num_leaves..self.nodes.len() {
            let Some([l, r]) = self.nodes[idx].children else { continue };
            let (left, right) = (&self.nodes[l as usize], &self.nodes[r as usize]);

            let mut bnd = Bounds3::empty();
            if !left.disabled {
                bnd.union(&left.world_bounds);
            }
            if !right.disabled {
                bnd.union(&right.world_bounds);
            }
            let disabled = left.disabled && right.disabled;

            let node = &mut self.nodes[idx];
            node.world_bounds = bnd;
            node.disabled = disabled;
        }
    }

    /// Collect the enabled leaves whose bounds are not culled by `isect`.
    ///
    /// `out` is appended to, not cleared.
    pub fn harvest(&self, isect: &BoundsIsect, out: &mut Vec<u16>) {
        if let Some(root) = self.root() {
            self.harvest_recursive(root, isect, out);
        }
    }

    fn harvest_recursive(&self, idx: u16, isect: &BoundsIsect, out: &mut Vec<u16>) {
        let node = &self.nodes[idx as usize];
        if node.disabled || node.world_bounds.is_empty() {
            return;
        }
        match isect.test(&node.world_bounds) {
            VolumeCullResult::Culled => {}
            VolumeCullResult::Clear => self.harvest_all(idx, out),
            VolumeCullResult::Split => match node.children {
                None => out.push(idx),
                Some([l, r]) => {
                    self.harvest_recursive(l, isect, out);
                    self.harvest_recursive(r, isect, out);
                }
            },
        }
    }

    /// Every enabled leaf under `idx`
    fn harvest_all(&self, idx: u16, out: &mut Vec<u16>) {
        let node = &self.nodes[idx as usize];
        if node.disabled {
            return;
        }
        match node.children {
            None => out.push(idx),
            Some([l, r]) => {
                self.harvest_all(l, out);
                self.harvest_all(r, out);
            }
        }
    }
}

#[cfg(test)]
#[path = "space_tree_tests.rs"]
mod tests;
