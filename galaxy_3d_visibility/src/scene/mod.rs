//! Scene module
//!
//! Geometry the visibility code runs against: spans grouped into
//! drawables, drawables grouped into scene nodes, and the page tree
//! manager registering the scene nodes. Every level is indexed by a
//! `SpaceTree`.

mod drawable;
mod page_tree_manager;
mod scene_node;
mod space_tree;
mod span;

pub use drawable::{Drawable, DrawableProps, Material, MaterialFlags};
pub use page_tree_manager::{PageTreeManager, SceneNodeKey};
pub use scene_node::SceneNode;
pub use space_tree::{SpaceTree, SpaceTreeNode, MAX_SPACE_TREE_LEAVES};
pub use span::{Span, SpanKind, SpanProps};
