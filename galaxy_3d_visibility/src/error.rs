//! Error types for the Galaxy3D visibility crate
//!
//! This module defines the engine-level error type used by the singleton
//! manager and the scene registry. Per-frame failures (skipped shadows,
//! missed picks) are not errors at this level: they are reported through
//! `Option` or `ShadowSetupError` by the subsystems themselves.

use std::fmt;

/// Result type for Galaxy3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Invalid resource (scene node, drawable, span, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, LOS manager, subsystems)
    InitializationFailed(String),

    /// A shared lock was poisoned by a panicking holder
    LockPoisoned(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::LockPoisoned(msg) => write!(f, "Lock poisoned: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Build an `Error::InvalidResource` and log it at ERROR severity.
///
/// # Example
///
/// ```ignore
/// let span = drawable.span(idx)
///     .ok_or_else(|| engine_err!("galaxy3d::Drawable", "Span index {} out of range", idx))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::InvalidResource(message)
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
