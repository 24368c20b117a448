//! The reconciliation engine: the committed settlement lifecycle.
//!
//! Orchestrates load-ledger queries, pay-policy calls, and settlement-store
//! mutations. Commit, update, and delete move a settlement between its
//! lifecycle states (draft, committed, deleted) and keep the load backrefs
//! aligned with the settlement's own load list; the settlement record is
//! authoritative when a per-load backref write fails.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{PayPolicy, PercentageSplitPolicy, build_pay_snapshot, compute_totals};
use crate::error::{EngineError, EngineResult, LinkError};
use crate::ledger::{DateOrder, LoadLedger, SettlementFilter, SettlementSort, SettlementStore};
use crate::models::{
    AdditionalPayItem, CategoryKey, DeductionItem, Driver, Load, PaySnapshot, Settlement,
    SettlementPeriod, SettlementStatus, SettlementType, collect_adjustments, merge_adjustment,
};

/// The caller-supplied contents of a settlement, used by both commit and
/// update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementInput {
    /// The driver being settled.
    pub driver_id: String,
    /// Period start (inclusive).
    pub period_start: NaiveDate,
    /// Period end (inclusive).
    pub period_end: NaiveDate,
    /// The selected loads, in selection order.
    pub load_ids: Vec<String>,
    /// Operator-entered deduction lines.
    #[serde(default)]
    pub deductions: Vec<DeductionItem>,
    /// Operator-entered additional-pay lines.
    #[serde(default)]
    pub additional_pay: Vec<AdditionalPayItem>,
    /// The date the settlement is paid on.
    pub paid_on: NaiveDate,
    /// Free-text operator notes.
    #[serde(default)]
    pub notes: String,
}

impl SettlementInput {
    /// Normalizes the deduction lines into a merged category map.
    pub fn deduction_map(&self) -> EngineResult<BTreeMap<CategoryKey, Decimal>> {
        collect_adjustments(
            "deductions",
            self.deductions
                .iter()
                .map(|item| (item.category.as_str(), item.amount)),
        )
    }

    /// Normalizes the additional-pay lines into a merged category map.
    pub fn additional_pay_map(&self) -> EngineResult<BTreeMap<CategoryKey, Decimal>> {
        collect_adjustments(
            "additional_pay",
            self.additional_pay
                .iter()
                .map(|item| (item.category.as_str(), item.amount)),
        )
    }

    /// The selection with repeated ids collapsed, first occurrence wins.
    /// A load id appearing twice in the request body must not pay the load
    /// twice; re-selecting is a no-op, as in `SettlementBuilder::select_load`.
    fn selected_load_ids(&self) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(self.load_ids.len());
        for load_id in &self.load_ids {
            if !unique.contains(load_id) {
                unique.push(load_id.clone());
            }
        }
        unique
    }

    fn validate(&self) -> EngineResult<()> {
        if self.period_start > self.period_end {
            return Err(EngineError::validation(
                "period",
                "period start must not be after period end",
            ));
        }
        if self.load_ids.is_empty() {
            return Err(EngineError::validation(
                "load_ids",
                "at least one load must be selected",
            ));
        }
        Ok(())
    }
}

/// The result of a commit or update: the settlement plus any non-fatal
/// link-propagation failures for the operator to reconcile.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// The committed settlement.
    pub settlement: Settlement,
    /// Per-load backref writes that failed (partial-success policy).
    pub warnings: Vec<LinkError>,
}

/// Year-to-date aggregates for one driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtdSummary {
    /// The driver aggregated.
    pub driver_id: String,
    /// The calendar year aggregated.
    pub year: i32,
    /// Sum of gross pay across the year's settlements.
    pub gross_ytd: Decimal,
    /// Per-category deduction totals across the year's settlements.
    pub deductions_by_category_ytd: BTreeMap<CategoryKey, Decimal>,
    /// Sum of all deductions across the year's settlements.
    pub total_deductions_ytd: Decimal,
    /// Gross minus deductions; unlike per-settlement net pay this is not
    /// floored at zero.
    pub net_ytd: Decimal,
}

/// One load/settlement pair flagged by the link audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The load side of the pair.
    pub load_id: String,
    /// The settlement side of the pair.
    pub settlement_id: Uuid,
}

/// Report from the load-link consistency sweep.
///
/// The settlement's own load list is authoritative; each bucket names a way
/// the ledger backrefs can disagree with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAuditReport {
    /// Loads pointing at a settlement that is gone or does not list them.
    pub stale_backrefs: Vec<LinkRecord>,
    /// Listed loads whose backref is absent or points elsewhere.
    pub missing_backrefs: Vec<LinkRecord>,
    /// Listed loads that no longer exist in the ledger (not repairable).
    pub missing_loads: Vec<LinkRecord>,
}

impl LinkAuditReport {
    /// Returns true when ledger backrefs and settlement listings agree.
    pub fn is_consistent(&self) -> bool {
        self.stale_backrefs.is_empty()
            && self.missing_backrefs.is_empty()
            && self.missing_loads.is_empty()
    }
}

/// Orchestrates the settlement lifecycle over the ledger and store.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine<P: PayPolicy = PercentageSplitPolicy> {
    drivers: HashMap<String, Driver>,
    ledger: LoadLedger,
    store: SettlementStore,
    policy: P,
    next_sequence: u32,
}

impl<P: PayPolicy> ReconciliationEngine<P> {
    /// Creates an empty engine backed by the given pay policy.
    pub fn new(policy: P) -> Self {
        Self {
            drivers: HashMap::new(),
            ledger: LoadLedger::new(),
            store: SettlementStore::new(),
            policy,
            next_sequence: 0,
        }
    }

    /// Registers (or replaces) a driver from the external registry.
    pub fn register_driver(&mut self, driver: Driver) {
        self.drivers.insert(driver.id.clone(), driver);
    }

    /// Looks up a registered driver.
    pub fn driver(&self, driver_id: &str) -> EngineResult<&Driver> {
        self.drivers
            .get(driver_id)
            .ok_or_else(|| EngineError::DriverNotFound {
                driver_id: driver_id.to_string(),
            })
    }

    /// Inserts or replaces a load from the upstream dispatch pipeline.
    pub fn upsert_load(&mut self, load: Load) {
        self.ledger.upsert(load);
    }

    /// Removes a load from the ledger.
    pub fn remove_load(&mut self, load_id: &str) -> EngineResult<Load> {
        self.ledger.remove(load_id)
    }

    /// Read access to the load ledger.
    pub fn ledger(&self) -> &LoadLedger {
        &self.ledger
    }

    /// The engine's pay policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Lists committed settlements matching `filter`, sorted per `sort`.
    pub fn list_settlements(
        &self,
        filter: &SettlementFilter,
        sort: SettlementSort,
    ) -> Vec<Settlement> {
        self.store.list(filter, sort)
    }

    /// Looks up one committed settlement.
    pub fn get_settlement(&self, settlement_id: Uuid) -> EngineResult<&Settlement> {
        self.store.get(settlement_id)
    }

    /// Finds the loads selectable for a new or edited settlement.
    ///
    /// When `editing` names an existing settlement, loads already claimed by
    /// it stay selectable; loads claimed by any other settlement never
    /// appear.
    pub fn find_eligible_loads(
        &self,
        driver_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        editing: Option<Uuid>,
        order: DateOrder,
    ) -> EngineResult<Vec<Load>> {
        self.driver(driver_id)?;
        match editing {
            Some(settlement_id) => {
                let settlement = self.store.get(settlement_id)?;
                Ok(self.ledger.find_eligible(
                    driver_id,
                    start,
                    end,
                    Some((settlement_id, &settlement.load_ids)),
                    order,
                ))
            }
            None => Ok(self.ledger.find_eligible(driver_id, start, end, None, order)),
        }
    }

    /// Commits a new settlement.
    ///
    /// Validates the input, computes totals and per-load pay snapshots,
    /// persists the settlement, then links every selected load to it. The
    /// settlement write is authoritative: individual link failures are
    /// returned as warnings, never rolled back.
    pub fn commit(&mut self, input: SettlementInput) -> EngineResult<CommitOutcome> {
        let driver = self.driver(&input.driver_id)?.clone();
        input.validate()?;
        let deductions = input.deduction_map()?;
        let additional_pay = input.additional_pay_map()?;
        let load_ids = input.selected_load_ids();

        let (pay_snapshots, totals) =
            self.resolve_selection(&load_ids, &driver, &deductions, &additional_pay, None)?;

        let id = Uuid::new_v4();
        let number = self.allocate_number(input.paid_on.year());
        let settlement = Settlement {
            id,
            number: number.clone(),
            settlement_type: SettlementType::Driver,
            driver_id: driver.id.clone(),
            driver_name: driver.name.clone(),
            period: SettlementPeriod::new(input.period_start, input.period_end),
            load_ids: load_ids.clone(),
            pay_snapshots,
            deductions,
            additional_pay,
            gross_pay: totals.gross_pay,
            total_deductions: totals.total_deductions,
            net_pay: totals.net_pay,
            total_miles: totals.total_miles,
            notes: input.notes.clone(),
            paid_on: input.paid_on,
            created_at: Utc::now(),
            status: SettlementStatus::Pending,
        };
        self.store.insert(settlement.clone());

        let warnings = self.link_all(id, &load_ids);
        info!(
            settlement_id = %id,
            number = %number,
            driver_id = %driver.id,
            loads = load_ids.len(),
            gross_pay = %settlement.gross_pay,
            net_pay = %settlement.net_pay,
            link_failures = warnings.len(),
            "Committed settlement"
        );

        Ok(CommitOutcome { settlement, warnings })
    }

    /// Applies a full edit to a committed settlement.
    ///
    /// Aggregates are recomputed from the complete new selection, never from
    /// a diff. Load links are reconciled unlink-then-link: loads dropped
    /// from the selection are released before the new selection is linked.
    pub fn update(
        &mut self,
        settlement_id: Uuid,
        input: SettlementInput,
    ) -> EngineResult<CommitOutcome> {
        let old_load_ids = self.store.get(settlement_id)?.load_ids.clone();
        let driver = self.driver(&input.driver_id)?.clone();
        input.validate()?;
        let deductions = input.deduction_map()?;
        let additional_pay = input.additional_pay_map()?;
        let load_ids = input.selected_load_ids();

        let (pay_snapshots, totals) = self.resolve_selection(
            &load_ids,
            &driver,
            &deductions,
            &additional_pay,
            Some(settlement_id),
        )?;

        {
            let settlement = self.store.get_mut(settlement_id)?;
            settlement.driver_id = driver.id.clone();
            settlement.driver_name = driver.name.clone();
            settlement.period = SettlementPeriod::new(input.period_start, input.period_end);
            settlement.load_ids = load_ids.clone();
            settlement.pay_snapshots = pay_snapshots;
            settlement.deductions = deductions;
            settlement.additional_pay = additional_pay;
            settlement.total_miles = totals.total_miles;
            settlement.paid_on = input.paid_on;
            settlement.notes = input.notes.clone();
            settlement.recompute_totals();
        }

        let released: Vec<String> = old_load_ids
            .iter()
            .filter(|id| !load_ids.contains(id))
            .cloned()
            .collect();
        let mut warnings = self.unlink_all(settlement_id, &released);
        warnings.extend(self.link_all(settlement_id, &load_ids));

        let settlement = self.store.get(settlement_id)?.clone();
        info!(
            settlement_id = %settlement_id,
            driver_id = %driver.id,
            loads = settlement.load_ids.len(),
            released = released.len(),
            gross_pay = %settlement.gross_pay,
            link_failures = warnings.len(),
            "Updated settlement"
        );

        Ok(CommitOutcome { settlement, warnings })
    }

    /// Merges one deduction into a committed settlement at the normalized
    /// category key and re-derives the aggregates from the full maps.
    pub fn add_deduction(
        &mut self,
        settlement_id: Uuid,
        category: &str,
        amount: Decimal,
    ) -> EngineResult<Settlement> {
        let key = Self::adjustment_key(category, amount)?;
        let settlement = self.store.get_mut(settlement_id)?;
        merge_adjustment(&mut settlement.deductions, key.clone(), amount);
        settlement.recompute_totals();
        info!(
            settlement_id = %settlement_id,
            category = %key,
            amount = %amount,
            net_pay = %settlement.net_pay,
            "Added deduction"
        );
        Ok(settlement.clone())
    }

    /// Merges one additional-pay item into a committed settlement at the
    /// normalized category key and re-derives the aggregates.
    pub fn add_additional_pay(
        &mut self,
        settlement_id: Uuid,
        category: &str,
        amount: Decimal,
    ) -> EngineResult<Settlement> {
        let key = Self::adjustment_key(category, amount)?;
        let settlement = self.store.get_mut(settlement_id)?;
        merge_adjustment(&mut settlement.additional_pay, key.clone(), amount);
        settlement.recompute_totals();
        info!(
            settlement_id = %settlement_id,
            category = %key,
            amount = %amount,
            gross_pay = %settlement.gross_pay,
            "Added additional pay"
        );
        Ok(settlement.clone())
    }

    /// Copies the deduction map of the driver's most recent other settlement
    /// into the target, merging additively per category.
    ///
    /// Exactly the most recent other settlement is inspected; the operation
    /// fails when the driver has no other settlement or that settlement has
    /// no deductions.
    pub fn clone_previous_deductions(&mut self, settlement_id: Uuid) -> EngineResult<Settlement> {
        let driver_id = self.store.get(settlement_id)?.driver_id.clone();
        let previous = self
            .store
            .latest_for_driver_excluding(&driver_id, settlement_id)
            .ok_or_else(|| EngineError::NoPriorDeductions {
                driver_id: driver_id.clone(),
            })?;
        if previous.deductions.is_empty() {
            return Err(EngineError::NoPriorDeductions { driver_id });
        }
        let cloned = previous.deductions.clone();
        let source_number = previous.number.clone();

        let settlement = self.store.get_mut(settlement_id)?;
        for (key, amount) in cloned {
            merge_adjustment(&mut settlement.deductions, key, amount);
        }
        settlement.recompute_totals();
        info!(
            settlement_id = %settlement_id,
            source = %source_number,
            total_deductions = %settlement.total_deductions,
            "Cloned deductions from previous settlement"
        );
        Ok(settlement.clone())
    }

    /// Deletes a committed settlement, releasing every load it had claimed.
    ///
    /// Unlinking is best-effort: failures are collected and returned while
    /// the remaining loads are still released and the settlement is removed.
    pub fn delete(&mut self, settlement_id: Uuid) -> EngineResult<Vec<LinkError>> {
        let load_ids = self.store.get(settlement_id)?.load_ids.clone();
        let warnings = self.unlink_all(settlement_id, &load_ids);
        self.store.remove(settlement_id)?;
        info!(
            settlement_id = %settlement_id,
            released = load_ids.len(),
            link_failures = warnings.len(),
            "Deleted settlement"
        );
        Ok(warnings)
    }

    /// Aggregates a driver's settlements for one calendar year, by paid-on
    /// date. Read-only.
    pub fn ytd_summary(&self, driver_id: &str, year: i32) -> YtdSummary {
        let mut deductions_by_category_ytd: BTreeMap<CategoryKey, Decimal> = BTreeMap::new();
        let mut gross_ytd = Decimal::ZERO;
        for settlement in self
            .store
            .iter()
            .filter(|s| s.driver_id == driver_id && s.paid_on.year() == year)
        {
            gross_ytd += settlement.gross_pay;
            for (key, amount) in &settlement.deductions {
                *deductions_by_category_ytd
                    .entry(key.clone())
                    .or_insert(Decimal::ZERO) += *amount;
            }
        }
        let total_deductions_ytd: Decimal = deductions_by_category_ytd.values().copied().sum();
        YtdSummary {
            driver_id: driver_id.to_string(),
            year,
            gross_ytd,
            deductions_by_category_ytd,
            total_deductions_ytd,
            net_ytd: gross_ytd - total_deductions_ytd,
        }
    }

    /// Sweeps ledger backrefs against settlement load lists and reports
    /// every disagreement, without changing anything.
    pub fn audit_links(&self) -> LinkAuditReport {
        let mut report = LinkAuditReport::default();
        for load in self.ledger.iter() {
            if let Some(settlement_id) = load.settlement_id {
                let listed = self
                    .store
                    .get(settlement_id)
                    .map(|s| s.load_ids.contains(&load.id))
                    .unwrap_or(false);
                if !listed {
                    report.stale_backrefs.push(LinkRecord {
                        load_id: load.id.clone(),
                        settlement_id,
                    });
                }
            }
        }
        for settlement in self.store.iter() {
            for load_id in &settlement.load_ids {
                match self.ledger.get(load_id) {
                    None => report.missing_loads.push(LinkRecord {
                        load_id: load_id.clone(),
                        settlement_id: settlement.id,
                    }),
                    Some(load) if load.settlement_id != Some(settlement.id) => {
                        report.missing_backrefs.push(LinkRecord {
                            load_id: load_id.clone(),
                            settlement_id: settlement.id,
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        report
    }

    /// Runs [`Self::audit_links`] and applies the settlement-is-authoritative
    /// fix: stale backrefs are cleared and missing backrefs are written.
    /// Returns the report of what was found (missing loads stay unfixable).
    pub fn repair_links(&mut self) -> LinkAuditReport {
        let report = self.audit_links();
        for record in &report.stale_backrefs {
            if self.ledger.unlink(&record.load_id).is_ok() {
                warn!(
                    load_id = %record.load_id,
                    settlement_id = %record.settlement_id,
                    "Cleared stale settlement backref"
                );
            }
        }
        for record in &report.missing_backrefs {
            if self.ledger.link(&record.load_id, record.settlement_id).is_ok() {
                warn!(
                    load_id = %record.load_id,
                    settlement_id = %record.settlement_id,
                    "Restored missing settlement backref"
                );
            }
        }
        report
    }

    /// Resolves and guards a load selection, producing the per-load pay
    /// snapshots and the draft totals.
    ///
    /// Exclusivity guard: a load linked to a settlement other than
    /// `editing` cannot be claimed. A load assigned to a different driver
    /// or in a non-settleable status is rejected outright; period
    /// containment is left to the operator, who may deliberately sweep in
    /// a straggler from an adjacent period.
    fn resolve_selection(
        &self,
        load_ids: &[String],
        driver: &Driver,
        deductions: &BTreeMap<CategoryKey, Decimal>,
        additional_pay: &BTreeMap<CategoryKey, Decimal>,
        editing: Option<Uuid>,
    ) -> EngineResult<(BTreeMap<String, PaySnapshot>, crate::calculation::DraftTotals)> {
        let mut selected: Vec<&Load> = Vec::with_capacity(load_ids.len());
        for load_id in load_ids {
            let load = self
                .ledger
                .get(load_id)
                .ok_or_else(|| EngineError::LoadNotFound {
                    load_id: load_id.clone(),
                })?;
            if load.driver_id.as_deref() != Some(driver.id.as_str()) {
                return Err(EngineError::validation(
                    "load_ids",
                    format!(
                        "load '{}' is not assigned to driver '{}'",
                        load_id, driver.id
                    ),
                ));
            }
            if !load.is_settleable() {
                return Err(EngineError::validation(
                    "load_ids",
                    format!("load '{}' is not in a settleable status", load_id),
                ));
            }
            if let Some(linked) = load.settlement_id {
                if Some(linked) != editing {
                    return Err(EngineError::validation(
                        "load_ids",
                        format!(
                            "load '{}' is already linked to settlement {}",
                            load_id, linked
                        ),
                    ));
                }
            }
            selected.push(load);
        }

        let pay_snapshots: BTreeMap<String, PaySnapshot> = selected
            .iter()
            .map(|load| {
                (
                    load.id.clone(),
                    build_pay_snapshot(load, driver, &self.policy),
                )
            })
            .collect();
        let totals = compute_totals(&selected, driver, &self.policy, deductions, additional_pay);
        Ok((pay_snapshots, totals))
    }

    fn adjustment_key(category: &str, amount: Decimal) -> EngineResult<CategoryKey> {
        let key = CategoryKey::new(category)
            .ok_or_else(|| EngineError::validation("category", "category must not be empty"))?;
        if amount <= Decimal::ZERO {
            return Err(EngineError::validation(
                "amount",
                "amount must be greater than zero",
            ));
        }
        Ok(key)
    }

    fn allocate_number(&mut self, year: i32) -> String {
        self.next_sequence += 1;
        format!("SET-{}-{:04}", year, self.next_sequence)
    }

    fn link_all(&mut self, settlement_id: Uuid, load_ids: &[String]) -> Vec<LinkError> {
        let mut warnings = Vec::new();
        for load_id in load_ids {
            if let Err(err) = self.ledger.link(load_id, settlement_id) {
                warn!(
                    settlement_id = %settlement_id,
                    load_id = %load_id,
                    error = %err,
                    "Failed to propagate settlement link"
                );
                warnings.push(LinkError {
                    load_id: load_id.clone(),
                    settlement_id,
                    reason: err.to_string(),
                });
            }
        }
        warnings
    }

    fn unlink_all(&mut self, settlement_id: Uuid, load_ids: &[String]) -> Vec<LinkError> {
        let mut warnings = Vec::new();
        for load_id in load_ids {
            if let Err(err) = self.ledger.unlink(load_id) {
                warn!(
                    settlement_id = %settlement_id,
                    load_id = %load_id,
                    error = %err,
                    "Failed to clear settlement link"
                );
                warnings.push(LinkError {
                    load_id: load_id.clone(),
                    settlement_id,
                    reason: err.to_string(),
                });
            }
        }
        warnings
    }
}
