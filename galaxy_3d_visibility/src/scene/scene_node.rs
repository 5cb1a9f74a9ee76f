/// SceneNode — a named group of drawables with its own space tree.

use crate::bounds::Bounds3;
use crate::error::Result;
use super::drawable::Drawable;
use super::space_tree::SpaceTree;

#[derive(Debug, Clone)]
pub struct SceneNode {
    name: String,
    drawables: Vec<Drawable>,
    space_tree: SpaceTree,
    /// Drawables handed out mutably whose bounds the tree has not pulled yet
    stale: Vec<usize>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, drawables: Vec<Drawable>) -> Result<Self> {
        let space_tree = Self::build_tree(&drawables)?;
        Ok(Self { name: name.into(), drawables, space_tree, stale: Vec::new() })
    }

    fn build_tree(drawables: &[Drawable]) -> Result<SpaceTree> {
        let bounds: Vec<Bounds3> = drawables.iter().map(|d| d.world_bounds()).collect();
        SpaceTree::build(&bounds)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn drawable(&self, idx: usize) -> Option<&Drawable> {
        self.drawables.get(idx)
    }

    pub fn space_tree(&self) -> &SpaceTree {
        &self.space_tree
    }

    pub fn world_bounds(&self) -> Bounds3 {
        self.space_tree.world_bounds()
    }

    /// Add a drawable and rebuild the node's tree. Disabled flags are reset.
    pub fn add_drawable(&mut self, drawable: Drawable) -> Result<usize> {
        self.drawables.push(drawable);
        self.space_tree = Self::build_tree(&self.drawables)?;
        self.stale.clear();
        Ok(self.drawables.len() - 1)
    }

    pub fn set_drawable_disabled(&mut self, idx: u16, disabled: bool) {
        self.space_tree.set_disabled(idx, disabled);
        self.space_tree.refresh_bounds();
    }

    /// Mutable access to a drawable.
    ///
    /// The drawable is marked stale: its bounds reach the node's tree on
    /// the next `refresh_bounds`, which `PageTreeManager::refresh` runs for
    /// every node before rebuilding.
    pub fn drawable_mut(&mut self, idx: usize) -> Option<&mut Drawable> {
        let drawable = self.drawables.get_mut(idx)?;
        if !self.stale.contains(&idx) {
            self.stale.push(idx);
        }
        Some(drawable)
    }

    /// Whether a drawable was handed out mutably since the last refresh
    pub fn has_stale_bounds(&self) -> bool {
        !self.stale.is_empty()
    }

    /// Pull a drawable's current bounds into the node's tree
    pub fn refresh_drawable_bounds(&mut self, idx: usize) {
        self.stale.retain(|&i| i != idx);
        if let Some(drawable) = self.drawables.get(idx) {
            self.space_tree.move_leaf(idx as u16, drawable.world_bounds());
            self.space_tree.refresh_bounds();
        }
    }

    /// Pull the bounds of every stale drawable into the node's tree
    pub fn refresh_bounds(&mut self) {
        if self.stale.is_empty() {
            return;
        }
        for idx in self.stale.drain(..) {
            if let Some(drawable) = self.drawables.get(idx) {
                self.space_tree.move_leaf(idx as u16, drawable.world_bounds());
            }
        }
        self.space_tree.refresh_bounds();
    }
}

#[cfg(test)]
#[path = "scene_node_tests.rs"]
mod tests;
