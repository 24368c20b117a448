//! In-memory collections backing the Settlement Reconciliation Engine.
//!
//! The [`LoadLedger`] holds completed loads and their settlement linkage;
//! the [`SettlementStore`] holds committed settlements. Both preserve
//! insertion order so query tie-breaking is stable.

mod loads;
mod settlements;

pub use loads::{DateOrder, LoadLedger};
pub use settlements::{SettlementFilter, SettlementSort, SettlementStore};
