//! Line-of-sight module
//!
//! Ray queries against the registered scene: picking under the cursor and
//! camera line of sight. `VisLosManager` walks the space trees front to
//! back with a shrinking maximum distance; `bound_ray` holds the box and
//! triangle tests it runs at each level.

mod bound_ray;
mod vis_los_manager;

pub use bound_ray::{check_bound, check_triangle, LosRay, PARALLEL_EPSILON};
pub use vis_los_manager::{SpaceHit, VisHit, VisLosManager, CURSOR_RAY_DIST};
