//! Bounds module — axis-aligned bounds and the bounds-based intersection volume.
//!
//! `Bounds3` is the world-space box used by every other subsystem: space
//! tree nodes, spans, drawables, shadow slaves. `BoundsIsect` is the volume
//! a shadow slave hands to the renderer to harvest its receivers.

mod bounds3;
mod bounds_isect;

pub use bounds3::{Bounds3, BoundsKind};
pub use bounds_isect::{BoundsIsect, VolumeCullResult};
