//! Error types for the Settlement Reconciliation Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during settlement processing,
//! plus the non-fatal [`LinkError`] record used by the partial-success
//! load-linking policy.

use thiserror::Error;
use uuid::Uuid;

/// The main error type for the Settlement Reconciliation Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use settlement_engine::error::EngineError;
///
/// let error = EngineError::DriverNotFound {
///     driver_id: "drv_404".to_string(),
/// };
/// assert_eq!(error.to_string(), "Driver not found: drv_404");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced driver does not exist in the registry.
    #[error("Driver not found: {driver_id}")]
    DriverNotFound {
        /// The driver id that could not be resolved.
        driver_id: String,
    },

    /// The referenced settlement does not exist in the store.
    #[error("Settlement not found: {settlement_id}")]
    SettlementNotFound {
        /// The settlement id that could not be resolved.
        settlement_id: Uuid,
    },

    /// The referenced load does not exist in the ledger.
    #[error("Load not found: {load_id}")]
    LoadNotFound {
        /// The load id that could not be resolved.
        load_id: String,
    },

    /// A request failed validation before any state was touched.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field or input that failed validation.
        field: String,
        /// A description of what made the input invalid.
        message: String,
    },

    /// No prior settlement with deductions exists to clone from.
    #[error("No previous settlement with deductions found for driver {driver_id}")]
    NoPriorDeductions {
        /// The driver whose history was searched.
        driver_id: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse or validation error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

/// A non-fatal failure while propagating a settlement backref to one load.
///
/// Commit, update, and delete treat the settlement record as authoritative:
/// a failed per-load backref write is recorded as a `LinkError` and returned
/// to the caller as a warning instead of aborting the operation. The
/// reconciliation sweep ([`crate::engine::ReconciliationEngine::repair_links`])
/// picks up any stragglers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkError {
    /// The load whose backref could not be written.
    pub load_id: String,
    /// The settlement the link operation was acting for.
    pub settlement_id: Uuid,
    /// A description of the failure.
    pub reason: String,
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to link load '{}' to settlement {}: {}",
            self.load_id, self.settlement_id, self.reason
        )
    }
}
