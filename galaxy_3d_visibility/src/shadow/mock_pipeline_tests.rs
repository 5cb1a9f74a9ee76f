use glam::Vec3;
use crate::bounds::Bounds3;
use crate::shadow::{ShadowSlave, SlaveKind};
use super::*;

fn slave_with_priority(priority: f32) -> ShadowSlave {
    let mut slave = ShadowSlave::new(SlaveKind::Directional);
    slave.priority = priority;
    slave
}

#[test]
fn test_view_queries() {
    let pipe = MockShadowPipeline::looking_at(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO);
    assert!((pipe.view_position_world() - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-5);
    assert!((pipe.view_dir_world() - Vec3::Z).length() < 1e-5);
}

#[test]
fn test_looking_straight_down() {
    let pipe = MockShadowPipeline::looking_at(Vec3::new(0.0, 50.0, 0.0), Vec3::ZERO);
    assert!((pipe.view_dir_world() - Vec3::NEG_Y).length() < 1e-5);
}

#[test]
fn test_visibility_from_frustum() {
    let pipe = MockShadowPipeline::looking_at(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO);
    let ahead = Bounds3::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
    let behind = Bounds3::from_center_half_extents(Vec3::new(0.0, 0.0, -30.0), Vec3::ONE);
    assert!(pipe.test_visible_world(&ahead));
    assert!(!pipe.test_visible_world(&behind));
}

#[test]
fn test_visibility_override() {
    let mut pipe = MockShadowPipeline::looking_at(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO);
    let behind = Bounds3::from_center_half_extents(Vec3::new(0.0, 0.0, -30.0), Vec3::ONE);
    pipe.set_visible_override(Some(true));
    assert!(pipe.test_visible_world(&behind));
    pipe.set_visible_override(Some(false));
    assert!(!pipe.test_visible_world(&Bounds3::full()));
}

#[test]
fn test_submissions_sorted_by_priority() {
    let mut pipe = MockShadowPipeline::looking_at(Vec3::ZERO, Vec3::Z);
    assert_eq!(pipe.submit_shadow_slave(&slave_with_priority(30.0)), Some(0));
    assert_eq!(pipe.submit_shadow_slave(&slave_with_priority(10.0)), Some(1));
    assert_eq!(pipe.submit_shadow_slave(&slave_with_priority(20.0)), Some(2));

    let order: Vec<u32> = pipe.submitted().iter().map(|s| s.index).collect();
    assert_eq!(order, vec![1, 2, 0]);
}

#[test]
fn test_capacity_and_clear() {
    let mut pipe = MockShadowPipeline::looking_at(Vec3::ZERO, Vec3::Z);
    pipe.set_capacity(Some(1));
    assert_eq!(pipe.submit_shadow_slave(&slave_with_priority(1.0)), Some(0));
    assert_eq!(pipe.submit_shadow_slave(&slave_with_priority(2.0)), None);
    assert_eq!(pipe.submitted().len(), 1);

    pipe.clear();
    assert!(pipe.submitted().is_empty());
    assert_eq!(pipe.submit_shadow_slave(&slave_with_priority(2.0)), Some(0));
}
