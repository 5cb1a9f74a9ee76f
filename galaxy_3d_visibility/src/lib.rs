/*!
# Galaxy 3D Visibility

Line-of-sight queries and shadow casting for the Galaxy 3D engine.

The crate works on a scene of spans (triangle batches) grouped into
drawables and scene nodes, each level indexed by a bounding-box space tree.
It does not render anything: the render pipeline is reached through the
`ShadowPipeline` trait.

## Architecture

- **VisLosManager**: Ray queries against the registered scene (cursor picking, line of sight)
- **PageTreeManager**: Registry of scene nodes and their space tree
- **ShadowMaster**: Per-light shadow casting, one `ShadowSlave` per caster per frame
- **ShadowSlave**: Light-space view, texture projection and depth lookups of one shadow
- **Engine**: Global singleton holding the logger and the line-of-sight manager
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod bounds;
pub mod camera;
pub mod scene;
pub mod shadow;
pub mod utils;
pub mod vis_los;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod bounds {
        pub use crate::bounds::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod shadow {
        pub use crate::shadow::*;
    }

    pub mod vis_los {
        pub use crate::vis_los::*;
    }
}

// Re-export math library at crate root
pub use glam;
