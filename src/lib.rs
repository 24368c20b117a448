//! Driver Settlement Reconciliation Engine.
//!
//! This crate selects a driver's unpaid completed loads for a pay period,
//! computes gross pay, applies deductions and additional-pay adjustments,
//! produces a net-pay figure, and maintains an exclusive linkage between
//! loads and the settlement that paid them.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
