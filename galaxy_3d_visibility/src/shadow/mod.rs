//! Shadow module
//!
//! Per-frame shadow casting. A `ShadowMaster` sits on a light and turns
//! each `ShadowCaster` it is handed into a `ShadowSlave`: a light-space
//! view, a texture projection, depth lookups and a culling volume, ready
//! for the render pipeline. Slaves are pooled per frame and released by
//! `ShadowMaster::begin_render`.

mod light_info;
mod mock_pipeline;
mod shadow_caster;
mod shadow_master;
mod shadow_pipeline;
mod shadow_slave;

pub use light_info::{
    Attenuation, LightInfo, LightKind, LightProps, DEFAULT_SPOT_INNER, DEFAULT_SPOT_OUTER,
};
pub use mock_pipeline::{MockShadowPipeline, SubmittedSlave};
pub use shadow_caster::{CasterFlags, ShadowCaster};
pub use shadow_master::{
    MasterKind, ShadowConfig, ShadowMaster, ShadowMasterSettings,
    KNEE_SHADOW_POWER, MAX_GLOBAL_SHADOW_SIZE, MIN_SHADOW_POWER, MIN_SHADOW_SIZE,
    SELF_BIAS, SHIFT_DIST, VIS_SHADOW_POWER,
};
pub use shadow_pipeline::ShadowPipeline;
pub use shadow_slave::{
    ShadowSetupError, ShadowSlave, SlaveFlags, SlaveKind, SlaveState, MIN_MIN_Z,
};
