/// Galaxy3D Engine - Singleton manager for the visibility subsystems
///
/// This module provides global singleton management for the line-of-sight
/// manager and the logger. It uses thread-safe static storage with RwLock for
/// safe concurrent access.

use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use crate::vis_los::VisLosManager;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Shared LOS manager (picking, camera line of sight)
    vis_los_manager: RwLock<Option<Arc<Mutex<VisLosManager>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            vis_los_manager: RwLock::new(None),
        }
    }
}

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::new())))
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// Owns the shared `VisLosManager` and the global logger.
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_visibility::galaxy3d::Engine;
/// use galaxy_3d_visibility::glam::Vec3;
///
/// Engine::initialize()?;
/// Engine::create_vis_los_manager()?;
///
/// let los = Engine::vis_los_manager()?;
/// let hit = los.lock().unwrap().check(Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0));
///
/// Engine::shutdown();
/// # Ok::<(), galaxy_3d_visibility::galaxy3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Log an engine error before returning it (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("galaxy3d::Engine", "Initialization failed: {}", msg);
            }
            Error::LockPoisoned(msg) => {
                crate::engine_error!("galaxy3d::Engine", "Lock poisoned: {}", msg);
            }
            _ => {
                crate::engine_error!("galaxy3d::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))
    }

    /// Initialize the engine
    ///
    /// Must be called once before creating any subsystem. Idempotent.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Shutdown the engine and destroy all singletons
    ///
    /// Outstanding `Arc` handles stay valid until dropped.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut los) = state.vis_los_manager.write() {
                *los = None;
            }
        }
    }

    // ===== VIS LOS MANAGER API =====

    /// Create and register the LOS manager singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A LOS manager already exists
    /// - The manager lock is poisoned
    pub fn create_vis_los_manager() -> Result<()> {
        let state = Self::state()?;

        let mut lock = state.vis_los_manager.write()
            .map_err(|_| Self::log_and_return_error(
                Error::LockPoisoned("VisLosManager lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed("VisLosManager already exists. Call Engine::destroy_vis_los_manager() first.".to_string())
            ));
        }

        *lock = Some(Arc::new(Mutex::new(VisLosManager::new())));

        crate::engine_info!("galaxy3d::Engine", "VisLosManager singleton created successfully");

        Ok(())
    }

    /// Get the LOS manager singleton
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized or the manager has
    /// not been created.
    pub fn vis_los_manager() -> Result<Arc<Mutex<VisLosManager>>> {
        let state = Self::state()?;

        let lock = state.vis_los_manager.read()
            .map_err(|_| Self::log_and_return_error(
                Error::LockPoisoned("VisLosManager lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("VisLosManager not created. Call Engine::create_vis_los_manager() first.".to_string())
            ))
    }

    /// Destroy the LOS manager singleton
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized
    pub fn destroy_vis_los_manager() -> Result<()> {
        let state = Self::state()?;

        let mut lock = state.vis_los_manager.write()
            .map_err(|_| Self::log_and_return_error(
                Error::LockPoisoned("VisLosManager lock poisoned".to_string())
            ))?;

        *lock = None;

        crate::engine_info!("galaxy3d::Engine", "VisLosManager singleton destroyed");

        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut los) = state.vis_los_manager.write() {
                *los = None;
            }
        }
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use galaxy_3d_visibility::galaxy3d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger, Info and above)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger::new());
        }
    }

    /// Whether the current logger keeps entries of `severity`
    pub fn log_enabled(severity: LogSeverity) -> bool {
        match logger_lock().read() {
            Ok(lock) => lock.enabled(severity),
            Err(_) => false,
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
