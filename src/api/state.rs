//! Application state for the Settlement Reconciliation Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::calculation::PercentageSplitPolicy;
use crate::engine::ReconciliationEngine;

/// Shared application state.
///
/// The engine is mutable (commits, edits, deletes), so unlike a read-only
/// configuration it sits behind an async `RwLock`; queries take read locks
/// and mutations take the write lock.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<RwLock<ReconciliationEngine<PercentageSplitPolicy>>>,
}

impl AppState {
    /// Creates a new application state wrapping the given engine.
    pub fn new(engine: ReconciliationEngine<PercentageSplitPolicy>) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    /// Returns the shared engine handle.
    pub fn engine(&self) -> &Arc<RwLock<ReconciliationEngine<PercentageSplitPolicy>>> {
        &self.engine
    }
}
