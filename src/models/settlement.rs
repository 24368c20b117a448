//! Settlement model and related types.
//!
//! A [`Settlement`] is the committed record produced by the reconciliation
//! engine: the loads it paid, a per-load pay snapshot, the merged deduction
//! and additional-pay maps, and the derived aggregate figures.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::adjustment::CategoryKey;

/// Whether a settlement pays a driver or a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementType {
    /// A driver settlement (the kind this engine produces).
    Driver,
    /// A dispatcher settlement, reserved for host systems that pay both.
    Dispatcher,
}

/// Advisory payment status.
///
/// The engine sets [`SettlementStatus::Pending`] at commit and never
/// transitions it; `Paid` exists for host systems that record payment
/// confirmation themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Committed, payment not confirmed.
    Pending,
    /// Payment confirmed by the host system.
    Paid,
}

/// The per-load pay breakdown captured when a load is settled.
///
/// `dispatch_fee` is carried for statement rendering only; it is never part
/// of the gross-pay sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaySnapshot {
    /// Base pay for the load.
    pub base_pay: Decimal,
    /// Detention pay.
    pub detention: Decimal,
    /// Short-pay / truck-order-not-used fee.
    pub tonu: Decimal,
    /// Layover pay.
    pub layover: Decimal,
    /// Dispatch fee shown on the settlement document.
    pub dispatch_fee: Decimal,
}

impl PaySnapshot {
    /// The driver-pay total for this load: base + detention + tonu + layover.
    pub fn pay_total(&self) -> Decimal {
        self.base_pay + self.detention + self.tonu + self.layover
    }
}

/// The inclusive date range a settlement covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPeriod {
    /// The start date of the period (inclusive).
    pub start: NaiveDate,
    /// The end date of the period (inclusive).
    pub end: NaiveDate,
    /// Display label for statements (e.g., "Jan 01, 2024 - Jan 31, 2024").
    pub label: String,
}

impl SettlementPeriod {
    /// Creates a period with a derived display label.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use settlement_engine::models::SettlementPeriod;
    ///
    /// let period = SettlementPeriod::new(
    ///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    /// );
    /// assert_eq!(period.label, "Jan 01, 2024 - Jan 31, 2024");
    /// assert!(period.contains(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
    /// ```
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let label = format!(
            "{} - {}",
            start.format("%b %d, %Y"),
            end.format("%b %d, %Y")
        );
        Self { start, end, label }
    }

    /// Checks if a date falls within this period, inclusive of both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// A committed driver settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Unique identifier, assigned at commit.
    pub id: Uuid,
    /// Generated human-facing settlement number (unique per engine).
    pub number: String,
    /// Whether this settlement pays a driver or a dispatcher.
    pub settlement_type: SettlementType,
    /// The driver being paid.
    pub driver_id: String,
    /// Driver display name snapshotted at commit time.
    pub driver_name: String,
    /// The period the settlement covers.
    pub period: SettlementPeriod,
    /// The loads this settlement pays, in selection order.
    pub load_ids: Vec<String>,
    /// Per-load pay snapshot, keyed by load id.
    pub pay_snapshots: BTreeMap<String, PaySnapshot>,
    /// Merged deduction map: normalized category -> cumulative amount.
    pub deductions: BTreeMap<CategoryKey, Decimal>,
    /// Merged additional-pay map: normalized category -> cumulative amount.
    pub additional_pay: BTreeMap<CategoryKey, Decimal>,
    /// Total driver earnings before deductions.
    pub gross_pay: Decimal,
    /// Sum of all deduction amounts.
    pub total_deductions: Decimal,
    /// Gross pay minus total deductions, floored at zero.
    pub net_pay: Decimal,
    /// Total miles across the settled loads.
    pub total_miles: Decimal,
    /// Free-text operator notes.
    pub notes: String,
    /// The date the settlement is paid on.
    pub paid_on: NaiveDate,
    /// When the settlement was committed.
    pub created_at: DateTime<Utc>,
    /// Advisory payment status.
    pub status: SettlementStatus,
}

impl Settlement {
    /// Rebuilds `gross_pay`, `total_deductions`, and `net_pay` from the full
    /// current snapshot and map contents.
    ///
    /// Aggregates are always re-derived whole rather than patched by deltas,
    /// so repeated adjustment cycles cannot drift.
    pub fn recompute_totals(&mut self) {
        let load_pay: Decimal = self
            .load_ids
            .iter()
            .filter_map(|id| self.pay_snapshots.get(id))
            .map(PaySnapshot::pay_total)
            .sum();
        let additional: Decimal = self.additional_pay.values().copied().sum();
        self.gross_pay = load_pay + additional;
        self.total_deductions = self.deductions.values().copied().sum();
        self.net_pay = (self.gross_pay - self.total_deductions).max(Decimal::ZERO);
    }
}
