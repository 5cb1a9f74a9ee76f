/// PageTreeManager — registry of the scene nodes currently paged in.
///
/// Scene nodes are stored in a `SlotMap` and indexed by a top-level space
/// tree over their world bounds. The tree is rebuilt lazily: any add,
/// remove or move marks it dirty, and `refresh` rebuilds it before the
/// next traversal.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::bounds::Bounds3;
use crate::error::Result;
use super::scene_node::SceneNode;
use super::space_tree::SpaceTree;

new_key_type! {
    /// Stable key for a registered scene node
    pub struct SceneNodeKey;
}

#[derive(Debug, Default)]
pub struct PageTreeManager {
    nodes: SlotMap<SceneNodeKey, SceneNode>,
    /// Leaf index of the top tree → scene node
    leaf_keys: Vec<SceneNodeKey>,
    /// Scene node → leaf index of the top tree
    leaf_of: FxHashMap<SceneNodeKey, u16>,
    disabled: Vec<SceneNodeKey>,
    space_tree: SpaceTree,
    dirty: bool,
}

impl PageTreeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: SceneNode) -> SceneNodeKey {
        let name = node.name().to_string();
        let key = self.nodes.insert(node);
        self.dirty = true;
        crate::engine_debug!("galaxy3d::PageTreeManager", "Scene node '{}' registered", name);
        key
    }

    pub fn remove_node(&mut self, key: SceneNodeKey) -> Option<SceneNode> {
        let node = self.nodes.remove(key)?;
        self.disabled.retain(|k| *k != key);
        self.dirty = true;
        crate::engine_debug!("galaxy3d::PageTreeManager", "Scene node '{}' removed", node.name());
        Some(node)
    }

    pub fn node(&self, key: SceneNodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Mutable access to a node. Marks the top tree dirty since the node's
    /// bounds may change.
    pub fn node_mut(&mut self, key: SceneNodeKey) -> Option<&mut SceneNode> {
        self.dirty = true;
        self.nodes.get_mut(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Hide a whole scene node from traversals
    pub fn set_node_disabled(&mut self, key: SceneNodeKey, disabled: bool) {
        if !self.nodes.contains_key(key) {
            return;
        }
        self.disabled.retain(|k| *k != key);
        if disabled {
            self.disabled.push(key);
        }
        if self.dirty {
            return;
        }
        if let Some(&leaf) = self.leaf_of.get(&key) {
            self.space_tree.set_disabled(leaf, disabled);
            self.space_tree.refresh_bounds();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the top tree if anything changed since the last build.
    /// Stale drawable bounds in each node are pulled in first.
    ///
    /// # Errors
    ///
    /// Propagates the space tree build error when too many nodes are
    /// registered. The tree stays dirty in that case.
    pub fn refresh(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        for node in self.nodes.values_mut() {
            node.refresh_bounds();
        }

        let leaf_keys: Vec<SceneNodeKey> = self.nodes.keys().collect();
        let bounds: Vec<Bounds3> = leaf_keys.iter().map(|k| self.nodes[*k].world_bounds()).collect();
        let mut space_tree = SpaceTree::build(&bounds)?;

        let leaf_of: FxHashMap<SceneNodeKey, u16> = leaf_keys
            .iter()
            .enumerate()
            .map(|(i, k)| (*k, i as u16))
            .collect();

        for key in &self.disabled {
            if let Some(&leaf) = leaf_of.get(key) {
                space_tree.set_disabled(leaf, true);
            }
        }
        space_tree.refresh_bounds();

        crate::engine_trace!(
            "galaxy3d::PageTreeManager",
            "Top space tree rebuilt over {} scene nodes",
            leaf_keys.len()
        );

        self.space_tree = space_tree;
        self.leaf_keys = leaf_keys;
        self.leaf_of = leaf_of;
        self.dirty = false;
        Ok(())
    }

    /// Top-level tree. Only meaningful after `refresh` when dirty.
    pub fn space_tree(&self) -> &SpaceTree {
        &self.space_tree
    }

    /// Scene node behind a top-tree leaf
    pub fn node_for_leaf(&self, leaf: u16) -> Option<&SceneNode> {
        let key = *self.leaf_keys.get(leaf as usize)?;
        self.nodes.get(key)
    }
}

#[cfg(test)]
#[path = "page_tree_manager_tests.rs"]
mod tests;
