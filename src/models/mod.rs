//! Core data models for the Settlement Reconciliation Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod adjustment;
mod driver;
mod load;
mod settlement;

pub use adjustment::{AdditionalPayItem, CategoryKey, DeductionItem};
pub(crate) use adjustment::{collect_adjustments, merge_adjustment};
pub use driver::{CompensationModel, Driver};
pub use load::{Load, LoadStatus};
pub use settlement::{
    PaySnapshot, Settlement, SettlementPeriod, SettlementStatus, SettlementType,
};
