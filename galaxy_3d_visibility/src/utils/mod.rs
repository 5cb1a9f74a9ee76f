//! Small containers shared by the visibility subsystems.

mod frame_pool;

pub use frame_pool::FramePool;
