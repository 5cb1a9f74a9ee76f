use glam::{Mat4, Vec3};
use crate::scene::{Drawable, DrawableProps, Material, SceneNode, Span};
use super::*;

fn node_at(name: &str, x: f32) -> SceneNode {
    let span = Span::new(
        vec![Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
        vec![0, 1, 2],
        0,
        Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
    );
    let drawable = Drawable::new(vec![span], vec![Material::default()], DrawableProps::empty()).unwrap();
    SceneNode::new(name, vec![drawable]).unwrap()
}

#[test]
fn test_new_is_empty_and_clean() {
    let mut mgr = PageTreeManager::new();
    assert_eq!(mgr.node_count(), 0);
    assert!(!mgr.is_dirty());
    mgr.refresh().unwrap();
    assert!(mgr.space_tree().is_empty());
}

#[test]
fn test_add_marks_dirty_and_refresh_builds() {
    let mut mgr = PageTreeManager::new();
    let a = mgr.add_node(node_at("a", 0.0));
    let b = mgr.add_node(node_at("b", 20.0));
    assert!(mgr.is_dirty());

    mgr.refresh().unwrap();
    assert!(!mgr.is_dirty());
    assert_eq!(mgr.space_tree().num_leaves(), 2);

    let names: Vec<&str> = (0..2).filter_map(|leaf| mgr.node_for_leaf(leaf)).map(|n| n.name()).collect();
    assert!(names.contains(&"a") && names.contains(&"b"));
    assert_eq!(mgr.node(a).unwrap().name(), "a");
    assert_eq!(mgr.node(b).unwrap().name(), "b");
    assert_eq!(mgr.space_tree().world_bounds().max().x, 21.0);
}

#[test]
fn test_remove_node() {
    let mut mgr = PageTreeManager::new();
    let a = mgr.add_node(node_at("a", 0.0));
    let _b = mgr.add_node(node_at("b", 20.0));
    mgr.refresh().unwrap();

    let removed = mgr.remove_node(a).unwrap();
    assert_eq!(removed.name(), "a");
    assert!(mgr.node(a).is_none());
    assert!(mgr.remove_node(a).is_none());

    mgr.refresh().unwrap();
    assert_eq!(mgr.space_tree().num_leaves(), 1);
    assert_eq!(mgr.space_tree().world_bounds().min().x, 19.0);
}

#[test]
fn test_disable_node_before_and_after_refresh() {
    let mut mgr = PageTreeManager::new();
    let a = mgr.add_node(node_at("a", 0.0));
    let b = mgr.add_node(node_at("b", 20.0));

    // Disabled while dirty: applied on rebuild
    mgr.set_node_disabled(b, true);
    mgr.refresh().unwrap();
    assert_eq!(mgr.space_tree().world_bounds().max().x, 1.0);

    // Disabled while clean: applied directly
    mgr.set_node_disabled(b, false);
    mgr.set_node_disabled(a, true);
    assert!(!mgr.is_dirty());
    assert_eq!(mgr.space_tree().world_bounds().min().x, 19.0);
}

#[test]
fn test_node_mut_marks_dirty() {
    let mut mgr = PageTreeManager::new();
    let a = mgr.add_node(node_at("a", 0.0));
    mgr.refresh().unwrap();

    {
        let node = mgr.node_mut(a).unwrap();
        node.drawable_mut(0).unwrap().set_span_transform(0, Mat4::from_translation(Vec3::new(50.0, 0.0, 0.0)));
        node.refresh_drawable_bounds(0);
    }
    assert!(mgr.is_dirty());
    mgr.refresh().unwrap();
    assert_eq!(mgr.space_tree().world_bounds().max().x, 51.0);
}

#[test]
fn test_refresh_pulls_stale_drawable_bounds() {
    let mut mgr = PageTreeManager::new();
    let a = mgr.add_node(node_at("a", 0.0));
    mgr.refresh().unwrap();

    mgr.node_mut(a)
        .unwrap()
        .drawable_mut(0)
        .unwrap()
        .set_span_transform(0, Mat4::from_translation(Vec3::new(50.0, 0.0, 0.0)));
    assert!(mgr.node(a).unwrap().has_stale_bounds());

    mgr.refresh().unwrap();
    assert!(!mgr.node(a).unwrap().has_stale_bounds());
    assert_eq!(mgr.node(a).unwrap().world_bounds().max().x, 51.0);
    assert_eq!(mgr.space_tree().world_bounds().max().x, 51.0);
}
