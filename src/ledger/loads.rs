//! The load ledger: completed loads and their settlement linkage.
//!
//! The central query is [`LoadLedger::find_eligible`], which gathers the
//! loads a settlement may claim for a driver and period while enforcing
//! exclusivity: a load already linked to a different settlement is never
//! offered, but loads linked to the settlement currently being edited
//! remain selectable for it.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::Load;

/// Sort direction for eligible-load results, by effective date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    /// Earliest effective date first.
    #[default]
    Ascending,
    /// Latest effective date first.
    Descending,
}

/// The set of loads known to the engine, in upstream insertion order.
#[derive(Debug, Clone, Default)]
pub struct LoadLedger {
    loads: Vec<Load>,
}

impl LoadLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of loads in the ledger.
    pub fn len(&self) -> usize {
        self.loads.len()
    }

    /// Returns true when the ledger holds no loads.
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Inserts a load, replacing any existing load with the same id.
    ///
    /// Replacement keeps the original position so query tie-breaking stays
    /// stable across upstream re-imports.
    pub fn upsert(&mut self, load: Load) {
        match self.loads.iter_mut().find(|l| l.id == load.id) {
            Some(existing) => *existing = load,
            None => self.loads.push(load),
        }
    }

    /// Removes a load from the ledger.
    pub fn remove(&mut self, load_id: &str) -> EngineResult<Load> {
        let index = self
            .loads
            .iter()
            .position(|l| l.id == load_id)
            .ok_or_else(|| EngineError::LoadNotFound {
                load_id: load_id.to_string(),
            })?;
        Ok(self.loads.remove(index))
    }

    /// Looks up a load by id.
    pub fn get(&self, load_id: &str) -> Option<&Load> {
        self.loads.iter().find(|l| l.id == load_id)
    }

    /// Iterates over all loads in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Load> {
        self.loads.iter()
    }

    /// Finds the loads a settlement may claim for a driver and period.
    ///
    /// A load qualifies when all of the following hold:
    /// 1. it is assigned to `driver_id`;
    /// 2. its status is delivered or completed;
    /// 3. *bypass*: if it is already claimed by the settlement being edited
    ///    (`editing`), it is included regardless of rules 4-5;
    /// 4. it is not linked to any other settlement (exclusivity);
    /// 5. its effective date parses and falls within `[start, end]`
    ///    inclusive; loads with unparsable dates are excluded.
    ///
    /// Results are sorted by effective date in the requested order; ties
    /// keep ledger insertion order.
    pub fn find_eligible(
        &self,
        driver_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        editing: Option<(Uuid, &[String])>,
        order: DateOrder,
    ) -> Vec<Load> {
        let mut eligible: Vec<&Load> = self
            .loads
            .iter()
            .filter(|load| {
                if load.driver_id.as_deref() != Some(driver_id) || !load.is_settleable() {
                    return false;
                }
                if let Some((_, editing_load_ids)) = editing {
                    if editing_load_ids.iter().any(|id| *id == load.id) {
                        return true;
                    }
                }
                match load.settlement_id {
                    Some(linked) if Some(linked) != editing.map(|(id, _)| id) => return false,
                    _ => {}
                }
                match load.effective_date() {
                    Some(date) => date >= start && date <= end,
                    None => false,
                }
            })
            .collect();

        // Undated loads can only appear via the editing bypass; keep them
        // after dated ones in ascending order.
        eligible.sort_by(|a, b| {
            let ka = a.effective_date().unwrap_or(NaiveDate::MAX);
            let kb = b.effective_date().unwrap_or(NaiveDate::MAX);
            match order {
                DateOrder::Ascending => ka.cmp(&kb),
                DateOrder::Descending => kb.cmp(&ka),
            }
        });

        eligible.into_iter().cloned().collect()
    }

    /// Sets a load's settlement backref.
    pub fn link(&mut self, load_id: &str, settlement_id: Uuid) -> EngineResult<()> {
        let load = self
            .loads
            .iter_mut()
            .find(|l| l.id == load_id)
            .ok_or_else(|| EngineError::LoadNotFound {
                load_id: load_id.to_string(),
            })?;
        load.settlement_id = Some(settlement_id);
        Ok(())
    }

    /// Clears a load's settlement backref.
    pub fn unlink(&mut self, load_id: &str) -> EngineResult<()> {
        let load = self
            .loads
            .iter_mut()
            .find(|l| l.id == load_id)
            .ok_or_else(|| EngineError::LoadNotFound {
                load_id: load_id.to_string(),
            })?;
        load.settlement_id = None;
        Ok(())
    }
}
