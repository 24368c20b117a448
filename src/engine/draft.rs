//! Draft settlement composition.
//!
//! A [`SettlementBuilder`] is the in-memory, uncommitted stage of the
//! settlement lifecycle: an operator picks loads from the eligible set and
//! enters adjustments while watching running totals. Nothing here touches
//! the ledger or the store; totals are recomputed whole from the current
//! selection and adjustment lists on every call.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calculation::{DraftTotals, PayPolicy, compute_totals};
use crate::error::EngineResult;
use crate::models::{
    AdditionalPayItem, DeductionItem, Driver, Load, SettlementPeriod,
};

use super::reconcile::SettlementInput;

/// Composes a draft settlement for one driver and period.
#[derive(Debug, Clone)]
pub struct SettlementBuilder {
    driver: Driver,
    period: SettlementPeriod,
    selected: Vec<Load>,
    deductions: Vec<DeductionItem>,
    additional_pay: Vec<AdditionalPayItem>,
    paid_on: NaiveDate,
    notes: String,
}

impl SettlementBuilder {
    /// Starts an empty draft. The paid-on date defaults to the period end.
    pub fn new(driver: Driver, period: SettlementPeriod) -> Self {
        let paid_on = period.end;
        Self {
            driver,
            period,
            selected: Vec::new(),
            deductions: Vec::new(),
            additional_pay: Vec::new(),
            paid_on,
            notes: String::new(),
        }
    }

    /// Adds a load to the selection. Selecting the same load id twice is a
    /// no-op so double-clicks cannot double-pay a load.
    pub fn select_load(&mut self, load: Load) {
        if !self.selected.iter().any(|l| l.id == load.id) {
            self.selected.push(load);
        }
    }

    /// Removes a load from the selection by id.
    pub fn deselect_load(&mut self, load_id: &str) {
        self.selected.retain(|l| l.id != load_id);
    }

    /// Appends a deduction line.
    pub fn add_deduction(&mut self, item: DeductionItem) {
        self.deductions.push(item);
    }

    /// Appends an additional-pay line.
    pub fn add_additional_pay(&mut self, item: AdditionalPayItem) {
        self.additional_pay.push(item);
    }

    /// Sets the paid-on date.
    pub fn paid_on(&mut self, date: NaiveDate) {
        self.paid_on = date;
    }

    /// Sets the operator notes.
    pub fn notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// The ids of the currently selected loads, in selection order.
    pub fn selected_load_ids(&self) -> Vec<String> {
        self.selected.iter().map(|l| l.id.clone()).collect()
    }

    /// Sum of miles across the current selection.
    pub fn selected_miles(&self) -> Decimal {
        self.selected.iter().map(|l| l.miles).sum()
    }

    /// Computes the draft's running totals from the full current selection
    /// and adjustment lists.
    ///
    /// Fails with a validation error when an adjustment category is empty
    /// or an amount is negative.
    pub fn totals<P: PayPolicy + ?Sized>(&self, policy: &P) -> EngineResult<DraftTotals> {
        let input = self.to_input();
        let deductions = input.deduction_map()?;
        let additional_pay = input.additional_pay_map()?;
        let selected: Vec<&Load> = self.selected.iter().collect();
        Ok(compute_totals(
            &selected,
            &self.driver,
            policy,
            &deductions,
            &additional_pay,
        ))
    }

    /// Converts the draft into the commit input consumed by
    /// [`super::ReconciliationEngine::commit`].
    pub fn to_input(&self) -> SettlementInput {
        SettlementInput {
            driver_id: self.driver.id.clone(),
            period_start: self.period.start,
            period_end: self.period.end,
            load_ids: self.selected_load_ids(),
            deductions: self.deductions.clone(),
            additional_pay: self.additional_pay.clone(),
            paid_on: self.paid_on,
            notes: self.notes.clone(),
        }
    }
}
