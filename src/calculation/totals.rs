//! Draft settlement totals.
//!
//! Pure computation over a selected set of loads and the merged adjustment
//! maps. Totals are always computed whole from current inputs; callers must
//! re-run this whenever the selection or either adjustment list changes
//! rather than patching a previous result.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CategoryKey, Driver, Load};

use super::pay::{PayPolicy, load_driver_pay};

/// The aggregate figures for a draft or committed settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTotals {
    /// Load-derived pay plus additional pay.
    pub gross_pay: Decimal,
    /// Sum of all deduction amounts.
    pub total_deductions: Decimal,
    /// Gross pay minus total deductions, floored at zero.
    pub net_pay: Decimal,
    /// Total miles across the selected loads.
    pub total_miles: Decimal,
}

/// Net pay: gross minus deductions, floored at zero. Arithmetic never
/// raises; an underwater settlement nets to zero.
pub fn net_pay(gross_pay: Decimal, total_deductions: Decimal) -> Decimal {
    (gross_pay - total_deductions).max(Decimal::ZERO)
}

/// Computes settlement totals for a selected set of loads.
///
/// `gross_pay` is the sum of each selected load's driver pay (see
/// [`load_driver_pay`]) plus every additional-pay amount; `total_deductions`
/// is the sum of the deduction map; `net_pay` is clamped at zero. No side
/// effects.
pub fn compute_totals<P: PayPolicy + ?Sized>(
    selected: &[&Load],
    driver: &Driver,
    policy: &P,
    deductions: &BTreeMap<CategoryKey, Decimal>,
    additional_pay: &BTreeMap<CategoryKey, Decimal>,
) -> DraftTotals {
    let load_pay: Decimal = selected
        .iter()
        .map(|load| load_driver_pay(load, driver, policy))
        .sum();
    let additional: Decimal = additional_pay.values().copied().sum();
    let gross_pay = load_pay + additional;
    let total_deductions: Decimal = deductions.values().copied().sum();

    DraftTotals {
        gross_pay,
        total_deductions,
        net_pay: net_pay(gross_pay, total_deductions),
        total_miles: selected.iter().map(|load| load.miles).sum(),
    }
}
