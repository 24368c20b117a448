//! Calculation logic for the Settlement Reconciliation Engine.
//!
//! This module contains the pay-policy contract and the pure functions for
//! deriving a load's driver pay, building per-load pay snapshots, and
//! computing draft settlement totals.

mod pay;
mod totals;

pub use pay::{PayPolicy, PercentageSplitPolicy, build_pay_snapshot, load_driver_pay};
pub use totals::{DraftTotals, compute_totals, net_pay};
