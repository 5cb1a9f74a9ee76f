//! Camera module — view transforms, frustums, and the active camera.
//!
//! `ViewTransform` is shared by the cursor camera and by shadow slaves,
//! which build an orthographic or perspective light view with it.

mod camera;
mod frustum;
mod view_transform;

pub use camera::Camera;
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use view_transform::ViewTransform;
