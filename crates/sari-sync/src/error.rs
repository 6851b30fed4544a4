//! # Store Error Types
//!
//! Error types for store operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Store Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Domain      │  │ Local (fatal)   │  │   Remote (advisory)     │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core           │  │  LocalPersist.  │  │  Remote                 │ │
//! │  │  (validation,   │  │  (sqlx / JSON   │  │  MirrorStopped          │ │
//! │  │   not found,    │  │   payloads)     │  │                         │ │
//! │  │   stock)        │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                               │
//! │  │  Configuration  │  │       I/O       │                               │
//! │  │                 │  │                 │                               │
//! │  │  InvalidConfig  │  │  Io             │                               │
//! │  │  ConfigLoad/Save│  │                 │                               │
//! │  └─────────────────┘  └─────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations only ever fail with `Core` or `LocalPersistence`. Remote
//! failures during a mutation become a `Notice`, never an error.

use thiserror::Error;

use sari_core::{CoreError, ValidationError};
use sari_db::DbError;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// The operation was rejected before any change was staged.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// The local write failed. The live ledger was not changed.
    ///
    /// ## When This Occurs
    /// - Database file is read-only or the disk is full
    /// - Database locked by another process past the busy timeout
    /// - A stored payload no longer decodes at startup
    #[error("Local persistence failed: {0}")]
    LocalPersistence(#[from] DbError),

    /// The remote document store failed.
    ///
    /// ## When This Occurs
    /// - Only from explicit remote calls (`Store::flush_mirror`, hydration)
    /// - Mutations report remote trouble as `Notice::SavedLocallyOnly`
    #[error("Remote mirror failed: {0}")]
    Remote(String),

    /// The mirror task is no longer running.
    #[error("Mirror task stopped")]
    MirrorStopped,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid store configuration.
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // I/O Errors
    // =========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Core(CoreError::Validation(err))
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::ConfigSaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Remote(format!("Invalid remote document: {}", err))
    }
}

// =============================================================================
// Error Classification
// =============================================================================

impl StoreError {
    /// Returns true if the input was rejected by validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Core(CoreError::Validation(_)))
    }

    /// Returns true if a referenced product or sale does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Core(err) if err.is_not_found())
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidConfig(_)
                | StoreError::ConfigLoadFailed(_)
                | StoreError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if the failure came from the remote mirror.
    pub fn is_remote(&self) -> bool {
        matches!(self, StoreError::Remote(_) | StoreError::MirrorStopped)
    }
}
