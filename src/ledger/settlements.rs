//! The committed settlement collection.

use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Settlement, SettlementType};

/// Filter for [`SettlementStore::list`]. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementFilter {
    /// Restrict to one driver.
    pub driver_id: Option<String>,
    /// Restrict to one settlement type.
    pub settlement_type: Option<SettlementType>,
}

/// Sort order for [`SettlementStore::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlementSort {
    /// Most recent paid-on date first (creation time breaks ties).
    #[default]
    PaidOnDescending,
    /// Earliest paid-on date first.
    PaidOnAscending,
    /// Most recently created first.
    CreatedDescending,
}

/// The committed settlements, in commit order.
#[derive(Debug, Clone, Default)]
pub struct SettlementStore {
    settlements: Vec<Settlement>,
}

impl SettlementStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of settlements in the store.
    pub fn len(&self) -> usize {
        self.settlements.len()
    }

    /// Returns true when the store is empty.
    pub fn is_empty(&self) -> bool {
        self.settlements.is_empty()
    }

    /// Adds a committed settlement.
    pub fn insert(&mut self, settlement: Settlement) {
        self.settlements.push(settlement);
    }

    /// Looks up a settlement by id.
    pub fn get(&self, id: Uuid) -> EngineResult<&Settlement> {
        self.settlements
            .iter()
            .find(|s| s.id == id)
            .ok_or(EngineError::SettlementNotFound { settlement_id: id })
    }

    /// Looks up a settlement by id for mutation.
    pub fn get_mut(&mut self, id: Uuid) -> EngineResult<&mut Settlement> {
        self.settlements
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(EngineError::SettlementNotFound { settlement_id: id })
    }

    /// Removes a settlement from the store.
    pub fn remove(&mut self, id: Uuid) -> EngineResult<Settlement> {
        let index = self
            .settlements
            .iter()
            .position(|s| s.id == id)
            .ok_or(EngineError::SettlementNotFound { settlement_id: id })?;
        Ok(self.settlements.remove(index))
    }

    /// Iterates over all settlements in commit order.
    pub fn iter(&self) -> impl Iterator<Item = &Settlement> {
        self.settlements.iter()
    }

    /// Lists settlements matching `filter`, sorted per `sort`.
    pub fn list(&self, filter: &SettlementFilter, sort: SettlementSort) -> Vec<Settlement> {
        let mut matched: Vec<&Settlement> = self
            .settlements
            .iter()
            .filter(|s| {
                filter
                    .driver_id
                    .as_deref()
                    .is_none_or(|driver| s.driver_id == driver)
                    && filter
                        .settlement_type
                        .is_none_or(|kind| s.settlement_type == kind)
            })
            .collect();

        match sort {
            SettlementSort::PaidOnDescending => {
                matched.sort_by(|a, b| {
                    (b.paid_on, b.created_at).cmp(&(a.paid_on, a.created_at))
                });
            }
            SettlementSort::PaidOnAscending => {
                matched.sort_by(|a, b| {
                    (a.paid_on, a.created_at).cmp(&(b.paid_on, b.created_at))
                });
            }
            SettlementSort::CreatedDescending => {
                matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }

        matched.into_iter().cloned().collect()
    }

    /// The driver's most recent settlement other than `exclude`, by paid-on
    /// date (creation time breaks ties). Used when cloning deductions from
    /// the previous settlement.
    pub fn latest_for_driver_excluding(
        &self,
        driver_id: &str,
        exclude: Uuid,
    ) -> Option<&Settlement> {
        self.settlements
            .iter()
            .filter(|s| s.driver_id == driver_id && s.id != exclude)
            .max_by_key(|s| (s.paid_on, s.created_at))
    }
}
