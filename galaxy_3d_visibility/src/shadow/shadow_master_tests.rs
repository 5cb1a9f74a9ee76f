use glam::{Vec3, Vec4};
use crate::bounds::Bounds3;
use crate::shadow::{
    Attenuation, CasterFlags, LightInfo, LightProps, MockShadowPipeline, ShadowCaster, SlaveState,
    DEFAULT_SPOT_INNER, DEFAULT_SPOT_OUTER,
};
use super::*;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn unit_box() -> Bounds3 {
    Bounds3::new(Vec3::splat(-1.0), Vec3::ONE)
}

fn caster(flags: CasterFlags) -> ShadowCaster {
    let mut caster = ShadowCaster::new(flags);
    caster.add_span_bounds(Bounds3::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(0.0, 1.0, 1.0)));
    caster.add_span_bounds(Bounds3::new(Vec3::new(0.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)));
    caster
}

fn settings(atten: f32) -> ShadowMasterSettings {
    ShadowMasterSettings { atten_dist: atten, ..Default::default() }
}

fn sun() -> LightInfo {
    LightInfo::directional(Vec3::NEG_Y)
}

fn visible_pipeline() -> MockShadowPipeline {
    let mut pipe = MockShadowPipeline::looking_at(Vec3::new(0.0, 0.0, -20.0), Vec3::ZERO);
    pipe.set_visible_override(Some(true));
    pipe
}

fn assert_near(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
}

fn lut_x(m: &Mat4, p: Vec3) -> f32 {
    (*m * p.extend(1.0)).x
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = ShadowConfig::default();
    assert_eq!(config.max_size(), 512);
    assert_eq!(config.max_dist(), 160.0);
    assert_eq!(config.quality(), 1.0);
    assert_eq!(config.quality_level(), 3);
}

#[test]
fn test_config_max_size_power_of_two_and_clamped() {
    let mut config = ShadowConfig::new();
    config.set_max_size(300);
    assert_eq!(config.max_size(), 256);
    config.set_max_size(64);
    assert_eq!(config.max_size(), 64);
    config.set_max_size(4096);
    assert_eq!(config.max_size(), 512);
    config.set_max_size(10);
    assert_eq!(config.max_size(), 32);
    config.set_max_size(0);
    assert_eq!(config.max_size(), 32);
}

#[test]
fn test_config_quality_clamped() {
    let mut config = ShadowConfig::new();
    config.set_quality(2.0);
    assert_eq!(config.quality(), 1.0);
    config.set_quality(-1.0);
    assert_eq!(config.quality(), 0.0);
    assert_eq!(config.quality_level(), 0);
    config.set_quality(0.5);
    assert_eq!(config.quality_level(), 1);
}

#[test]
fn test_settings_defaults_and_max_dist() {
    let mut s = ShadowMasterSettings::default();
    assert_eq!(s.max_size, 256);
    assert_eq!(s.min_size, 256);
    assert_eq!(s.power, 1.0);
    assert_eq!(s.atten_dist, 0.0);
    s.set_max_dist(100.0);
    assert_eq!(s.min_dist, 75.0);
    assert!(s.casts_at_quality(3));
    s.quality_mask = 0b1100;
    assert!(!s.casts_at_quality(1));
    assert!(s.casts_at_quality(2));
}

// ============================================================================
// Power
// ============================================================================

#[test]
fn test_remap_power() {
    assert_eq!(remap_power(0.1), None);
    assert_near(remap_power(0.2).unwrap(), VIS_SHADOW_POWER);
    assert_near(remap_power(0.25).unwrap(), 0.2);
    assert_eq!(remap_power(0.5), Some(0.5));
}

#[test]
fn test_compute_power() {
    let mut s = settings(0.0);
    s.power = 2.0;
    let master = ShadowMaster::new(MasterKind::Directional, s);
    let c = ShadowCaster::new(CasterFlags::empty()).with_max_opacity(0.5).with_boost(1.5);

    let light = sun().with_strength(0.8);
    assert_near(master.compute_power(&c, &light, &unit_box()), 1.2);

    let idle = sun().with_strength(0.0);
    assert_eq!(master.compute_power(&c, &idle, &unit_box()), 0.0);
}

#[test]
fn test_compute_caster_bounds() {
    let master = ShadowMaster::new(MasterKind::Directional, settings(0.0));
    let bnd = master.compute_caster_bounds(&caster(CasterFlags::empty()));
    assert_eq!(bnd, unit_box());
    assert!(master.compute_caster_bounds(&ShadowCaster::default()).is_empty());
}

// ============================================================================
// Light space
// ============================================================================

#[test]
fn test_directional_world_to_light_looks_along_light() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut slave = ShadowSlave::new(SlaveKind::Directional);
    master.compute_world_to_light(&unit_box(), &sun(), &mut slave);

    assert_eq!(slave.state(), SlaveState::Bounded);
    let center = slave.world_to_light().transform_point3(Vec3::ZERO);
    assert!(center.x.abs() < 1e-4 && center.y.abs() < 1e-4 && center.z > 0.0);
    // Lower points are farther from a light shining down
    let below = slave.world_to_light().transform_point3(Vec3::NEG_Y);
    assert_near(below.z, center.z + 1.0);
    // Up fell back past Y to Z
    assert_eq!(master.last_up, Vec3::Z);
}

#[test]
fn test_point_world_to_light_looks_from_light() {
    let mut master = ShadowMaster::new(MasterKind::Point, settings(10.0));
    let mut slave = ShadowSlave::new(SlaveKind::Point);
    let light = LightInfo::point(Vec3::new(10.0, 0.0, 0.0), Default::default());
    master.compute_world_to_light(&unit_box(), &light, &mut slave);

    let center = slave.world_to_light().transform_point3(Vec3::ZERO);
    assert!(center.x.abs() < 1e-4 && center.y.abs() < 1e-4);
    assert_near(center.z, 10.0);
    assert_eq!(master.last_up, Vec3::Y);
    let light_pos = slave.world_to_light().transform_point3(light.position());
    assert!(light_pos.length() < 1e-4);
}

#[test]
fn test_directional_bounds_extend_past_center() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut slave = ShadowSlave::new(SlaveKind::Directional);
    slave.atten_dist = 10.0;
    master.compute_world_to_light(&unit_box(), &sun(), &mut slave);
    master.compute_bounds(&unit_box(), &mut slave);

    let wb = slave.world_bounds();
    assert_near(wb.min().y, -10.0);
    assert_near(wb.max().y, 1.0);
    assert_near(wb.min().x, -1.0);
    assert_near(wb.max().x, 1.0);
    assert_near(wb.min().z, -1.0);
}

#[test]
fn test_point_bounds_spread_with_distance() {
    let mut master = ShadowMaster::new(MasterKind::Point, settings(10.0));
    let mut slave = ShadowSlave::new(SlaveKind::Point);
    slave.atten_dist = 10.0;
    let light = LightInfo::point(Vec3::new(0.0, 10.0, 0.0), Default::default());
    master.compute_world_to_light(&unit_box(), &light, &mut slave);
    master.compute_bounds(&unit_box(), &mut slave);

    // Far face at 20 from the light, corners pushed out by 20 / 11
    let wb = slave.world_bounds();
    let spread = 20.0 / 11.0;
    assert_near(wb.min().y, -10.0);
    assert_near(wb.min().x, -spread);
    assert_near(wb.max().z, spread);
    assert!(wb.test_bound(&unit_box()) > 0);
}

// ============================================================================
// Size / LUT / isect
// ============================================================================

fn sized_slave(master: &ShadowMaster, caster: &ShadowCaster, config: &ShadowConfig, view_z: f32) -> ShadowSlave {
    let pipe = MockShadowPipeline::looking_at(Vec3::new(0.0, 0.0, view_z), Vec3::ZERO);
    let mut slave = ShadowSlave::new(SlaveKind::Directional);
    slave.set_world_bounds(unit_box());
    master.compute_width_and_height(caster, config, &pipe, &mut slave);
    slave
}

#[test]
fn test_width_and_height() {
    let master = ShadowMaster::new(MasterKind::Directional, settings(0.0));
    let plain = ShadowCaster::default();
    let limited = ShadowCaster::new(CasterFlags::LIMIT_RES);
    let mut config = ShadowConfig::new();

    let slave = sized_slave(&master, &plain, &config, -20.0);
    assert_eq!((slave.width(), slave.height()), (256, 256));
    assert_near(slave.priority(), 19.0);

    assert_eq!(sized_slave(&master, &limited, &config, -20.0).width(), 128);
    // One halving per 50 units of view distance
    assert_eq!(sized_slave(&master, &plain, &config, -120.0).width(), 64);
    assert_eq!(sized_slave(&master, &plain, &config, -10_000.0).width(), MIN_SHADOW_SIZE);

    config.set_quality(0.5);
    assert_eq!(sized_slave(&master, &limited, &config, -20.0).width(), 64);

    config.set_quality(1.0);
    config.set_max_size(64);
    assert_eq!(sized_slave(&master, &plain, &config, -20.0).width(), 64);
}

#[test]
fn test_priority_never_negative() {
    let master = ShadowMaster::new(MasterKind::Directional, settings(0.0));
    // Viewer inside the bounds
    let slave = sized_slave(&master, &ShadowCaster::default(), &ShadowConfig::new(), 0.5);
    assert_eq!(slave.priority(), 0.0);
}

#[test]
fn test_lut_maps_near_face_to_far_plane() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut slave = ShadowSlave::new(SlaveKind::Directional);
    slave.atten_dist = 10.0;
    slave.set_caster_world_bounds(unit_box());
    master.compute_world_to_light(&unit_box(), &sun(), &mut slave);
    master.compute_lut(&mut slave);

    // Near face at world y = 1, far plane 10 below the center
    assert_near(lut_x(slave.rcv_lut(), Vec3::new(0.0, 1.0, 0.0)), 0.0);
    assert_near(lut_x(slave.rcv_lut(), Vec3::new(0.3, -10.0, 0.2)), 1.0);

    // Caster LUT works on light space and carries the bias
    let near_light = slave.world_to_light().transform_point3(Vec3::new(0.0, 1.0, 0.0));
    assert_near(lut_x(slave.cast_lut(), near_light), SELF_BIAS);
    assert_eq!(slave.rcv_lut().row(1), Vec4::ZERO);
}

#[test]
fn test_lut_in_camera_space_for_perspective_directional() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut slave = ShadowSlave::new(SlaveKind::PerspectiveDirectional);
    slave.atten_dist = 10.0;
    slave.set_caster_world_bounds(unit_box());
    master.compute_world_to_light(&unit_box(), &sun(), &mut slave);
    master.compute_lut(&mut slave);

    let p = Vec3::new(0.0, 1.0, 0.0);
    assert_near(lut_x(slave.cast_lut(), p), lut_x(slave.rcv_lut(), p) + SELF_BIAS);
}

#[test]
fn test_compute_isect() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(0.0));
    let mut slave = ShadowSlave::new(SlaveKind::Directional);
    slave.set_world_bounds(unit_box());
    master.compute_isect(&mut slave);

    let idx = slave.isect().unwrap();
    assert_eq!(*master.isect(idx).unwrap().world_bounds(), unit_box());
}

// ============================================================================
// Last chance
// ============================================================================

fn bail_at(master: &ShadowMaster, config: &ShadowConfig, view_z: f32) -> (bool, f32) {
    let mut pipe = MockShadowPipeline::looking_at(Vec3::new(0.0, 0.0, view_z), Vec3::ZERO);
    pipe.set_visible_override(Some(true));
    let mut slave = ShadowSlave::new(SlaveKind::Directional);
    slave.set_world_bounds(unit_box());
    slave.power = 1.0;
    let bail = master.last_chance_to_bail(config, &pipe, &mut slave);
    (bail, slave.power())
}

#[test]
fn test_bail_when_not_visible() {
    let master = ShadowMaster::new(MasterKind::Directional, settings(0.0));
    let mut pipe = visible_pipeline();
    pipe.set_visible_override(Some(false));
    let mut slave = ShadowSlave::new(SlaveKind::Directional);
    slave.set_world_bounds(unit_box());
    assert!(master.last_chance_to_bail(&ShadowConfig::new(), &pipe, &mut slave));
}

#[test]
fn test_fade_between_min_and_max_dist() {
    let master = ShadowMaster::new(MasterKind::Directional, settings(0.0));
    let config = ShadowConfig::new();

    // Max 160, fade starts at 120
    assert_eq!(bail_at(&master, &config, -20.0), (false, 1.0));
    let (bail, power) = bail_at(&master, &config, -141.0);
    assert!(!bail);
    assert_near(power, 0.5);
    assert!(bail_at(&master, &config, -200.0).0);
}

#[test]
fn test_master_max_dist_wins_when_closer() {
    let mut s = settings(0.0);
    s.max_dist = 100.0;
    let master = ShadowMaster::new(MasterKind::Directional, s);
    // Max 100, fade starts at 75
    let (bail, power) = bail_at(&master, &ShadowConfig::new(), -88.5);
    assert!(!bail);
    assert_near(power, 0.5);
}

#[test]
fn test_low_quality_shortens_range() {
    let master = ShadowMaster::new(MasterKind::Directional, settings(0.0));
    let mut config = ShadowConfig::new();
    config.set_quality(0.0);
    // Max 96, fade starts at 86.4
    assert_eq!(bail_at(&master, &config, -80.0), (false, 1.0));
    assert!(bail_at(&master, &config, -100.0).0);
}

#[test]
fn test_no_max_dist_never_fades() {
    let master = ShadowMaster::new(MasterKind::Directional, settings(0.0));
    let mut config = ShadowConfig::new();
    config.set_max_dist(0.0);
    assert_eq!(bail_at(&master, &config, -10_000.0), (false, 1.0));
}

// ============================================================================
// Full cast
// ============================================================================

#[test]
fn test_on_cast_submits_slave() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut light = sun().with_props(LightProps::INCLUDES_CHARS);
    let mut pipe = visible_pipeline();
    let config = ShadowConfig::new();

    master.begin_render(&mut light);
    let idx = master.on_cast(&caster(CasterFlags::SELF_SHADOW), &mut light, &config, &mut pipe).unwrap();

    let slave = master.slave(idx).unwrap();
    assert_eq!(slave.state(), SlaveState::Transformed);
    assert_eq!(slave.kind(), SlaveKind::Directional);
    assert_eq!(slave.index(), Some(0));
    assert!(slave.has_flag(SlaveFlags::SELF_SHADOW));
    assert!(slave.has_flag(SlaveFlags::INCLUDES_CHARS));
    assert!(!slave.has_flag(SlaveFlags::OBEYS_LIGHT_GROUPS));
    assert_eq!(slave.atten_dist(), 10.0);
    assert!(slave.isect().is_some());
    assert!(light.has_slave_bit(0));
    assert_eq!(pipe.submitted().len(), 1);
}

#[test]
fn test_perspective_caster_under_directional_light() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut light = sun();
    let mut pipe = visible_pipeline();

    let idx = master
        .on_cast(&caster(CasterFlags::PERSPECTIVE), &mut light, &ShadowConfig::new(), &mut pipe)
        .unwrap();
    let slave = master.slave(idx).unwrap();
    assert_eq!(slave.kind(), SlaveKind::PerspectiveDirectional);
    assert!(slave.view().is_perspective());
    assert!(slave.cast_in_camera_space());
}

#[test]
fn test_point_master_cast() {
    let mut master = ShadowMaster::new(MasterKind::Point, settings(10.0));
    let mut light = LightInfo::point(Vec3::new(0.0, 10.0, 0.0), Attenuation::NONE);
    let mut pipe = visible_pipeline();

    let idx = master
        .on_cast(&caster(CasterFlags::empty()), &mut light, &ShadowConfig::new(), &mut pipe)
        .unwrap();
    let slave = master.slave(idx).unwrap();
    assert_eq!(slave.kind(), SlaveKind::Point);
    assert!(slave.is_positional());
    assert!(slave.view().hither() >= 1.0);
}

#[test]
fn test_spot_master_casts_inside_cone_only() {
    let mut master = ShadowMaster::new(MasterKind::Point, settings(10.0));
    let mut pipe = visible_pipeline();
    let config = ShadowConfig::new();
    let spot = |dir: Vec3| {
        LightInfo::spot(Vec3::new(0.0, 10.0, 0.0), dir, Attenuation::NONE, DEFAULT_SPOT_INNER, DEFAULT_SPOT_OUTER)
    };

    // Aimed at the caster
    let mut light = spot(Vec3::NEG_Y);
    let idx = master.on_cast(&caster(CasterFlags::empty()), &mut light, &config, &mut pipe).unwrap();
    let slave = master.slave(idx).unwrap();
    assert_eq!(slave.kind(), SlaveKind::Point);
    assert!(slave.power() > 0.0);
    assert_eq!(light.slave_count(), 1);

    // Aimed away, the caster is outside the cone
    let mut light = spot(Vec3::Y);
    assert!(master.on_cast(&caster(CasterFlags::empty()), &mut light, &config, &mut pipe).is_none());
    assert_eq!(light.slave_count(), 0);
    assert_eq!(master.slave_count(), 1);
}

#[test]
fn test_on_cast_gates() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut pipe = visible_pipeline();
    let config = ShadowConfig::new();

    // No spans
    let mut light = sun();
    assert!(master.on_cast(&ShadowCaster::default(), &mut light, &config, &mut pipe).is_none());

    // Too weak
    let faint = caster(CasterFlags::empty()).with_max_opacity(0.1);
    assert!(master.on_cast(&faint, &mut light, &config, &mut pipe).is_none());

    // Hidden light
    let mut hidden = sun().with_props(LightProps::HIDDEN);
    assert!(master.on_cast(&caster(CasterFlags::empty()), &mut hidden, &config, &mut pipe).is_none());

    // Quality level not cast by this light
    master.settings_mut().quality_mask = 0b0001;
    assert!(master.on_cast(&caster(CasterFlags::empty()), &mut light, &config, &mut pipe).is_none());

    assert_eq!(master.slave_count(), 0);
    assert!(pipe.submitted().is_empty());
}

#[test]
fn test_on_cast_faint_power_remapped() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut light = sun();
    let mut pipe = visible_pipeline();
    let c = caster(CasterFlags::empty()).with_max_opacity(0.25);

    let idx = master.on_cast(&c, &mut light, &ShadowConfig::new(), &mut pipe).unwrap();
    assert_near(master.slave(idx).unwrap().power(), 0.2);
}

#[test]
fn test_declined_slave_is_recycled() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut light = sun();
    let mut pipe = visible_pipeline();
    pipe.set_capacity(Some(1));
    let config = ShadowConfig::new();

    assert_eq!(master.on_cast(&caster(CasterFlags::empty()), &mut light, &config, &mut pipe), Some(0));
    assert_eq!(master.on_cast(&caster(CasterFlags::empty()), &mut light, &config, &mut pipe), None);
    assert_eq!(master.slave_count(), 1);
    assert_eq!(light.slave_count(), 1);

    // The declined slot is handed out again
    pipe.set_capacity(None);
    assert_eq!(master.on_cast(&caster(CasterFlags::empty()), &mut light, &config, &mut pipe), Some(1));
    assert_eq!(master.slave_capacity(), 2);
}

#[test]
fn test_invisible_shadow_is_recycled() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut light = sun();
    let mut pipe = visible_pipeline();
    pipe.set_visible_override(Some(false));

    assert!(master.on_cast(&caster(CasterFlags::empty()), &mut light, &ShadowConfig::new(), &mut pipe).is_none());
    assert_eq!(master.slave_count(), 0);
    assert!(master.isect(0).is_none());
}

#[test]
fn test_nan_caster_skipped() {
    let mut master = ShadowMaster::new(MasterKind::Point, settings(10.0));
    let mut light = LightInfo::point(Vec3::new(0.0, 10.0, 0.0), Attenuation::NONE);
    let mut pipe = visible_pipeline();

    let mut c = ShadowCaster::default();
    c.add_span_bounds(Bounds3::new(Vec3::new(f32::NAN, -1.0, -1.0), Vec3::ONE));
    assert!(master.on_cast(&c, &mut light, &ShadowConfig::new(), &mut pipe).is_none());
    assert_eq!(master.slave_count(), 0);
}

#[test]
fn test_begin_render_reuses_pool() {
    let mut master = ShadowMaster::new(MasterKind::Directional, settings(10.0));
    let mut light = sun();
    let mut pipe = visible_pipeline();
    let config = ShadowConfig::new();

    for _ in 0..3 {
        master.begin_render(&mut light);
        pipe.clear();
        for _ in 0..3 {
            master.on_cast(&caster(CasterFlags::empty()), &mut light, &config, &mut pipe).unwrap();
        }
        assert_eq!(master.slave_count(), 3);
        assert_eq!(light.slave_count(), 3);
    }
    assert_eq!(master.slave_capacity(), 3);

    master.begin_render(&mut light);
    assert_eq!(master.slave_count(), 0);
    assert_eq!(light.slave_count(), 0);
    assert_eq!(master.slaves().count(), 0);
}
