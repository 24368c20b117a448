//! Deduction and additional-pay adjustment items.
//!
//! Operators enter adjustments as free-text categories with optional memos.
//! For storage the category is normalized into a [`CategoryKey`] and amounts
//! sharing a key are merged additively; the raw category text and memo exist
//! only on the transient input items, never in the persisted maps.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A normalized adjustment-category map key.
///
/// Normalization lowercases the category and strips all whitespace, so
/// "Fuel Advance", "fuel advance", and "FUELADVANCE" all collapse to the
/// same key.
///
/// # Examples
///
/// ```
/// use settlement_engine::models::CategoryKey;
///
/// let key = CategoryKey::new("Fuel Advance").unwrap();
/// assert_eq!(key.as_str(), "fueladvance");
/// assert!(CategoryKey::new("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(String);

impl CategoryKey {
    /// Normalizes a free-text category into a key.
    ///
    /// Returns `None` when the category is empty after normalization.
    pub fn new(category: &str) -> Option<Self> {
        let normalized: String = category
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        if normalized.is_empty() {
            None
        } else {
            Some(CategoryKey(normalized))
        }
    }

    /// Returns the normalized key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An operator-entered deduction line, prior to normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionItem {
    /// Free-text category (e.g., "Fuel Advance", "Tolls").
    pub category: String,
    /// Optional memo; informational only, never persisted into the map.
    #[serde(default)]
    pub memo: Option<String>,
    /// Non-negative deduction amount.
    pub amount: Decimal,
}

/// An operator-entered additional-pay line, prior to normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalPayItem {
    /// Free-text category (e.g., "Bonus", "Safety Award").
    pub category: String,
    /// Optional memo; informational only, never persisted into the map.
    #[serde(default)]
    pub memo: Option<String>,
    /// Non-negative additional-pay amount.
    pub amount: Decimal,
}

/// Merges one adjustment into a category map, summing at the normalized key.
pub(crate) fn merge_adjustment(
    map: &mut BTreeMap<CategoryKey, Decimal>,
    key: CategoryKey,
    amount: Decimal,
) {
    *map.entry(key).or_insert(Decimal::ZERO) += amount;
}

/// Normalizes a list of `(category, amount)` pairs into a category map,
/// merging duplicate keys additively.
///
/// Fails with a validation error when any category normalizes to empty or
/// any amount is negative.
pub(crate) fn collect_adjustments<'a, I>(
    field: &str,
    items: I,
) -> EngineResult<BTreeMap<CategoryKey, Decimal>>
where
    I: IntoIterator<Item = (&'a str, Decimal)>,
{
    let mut map = BTreeMap::new();
    for (category, amount) in items {
        let key = CategoryKey::new(category).ok_or_else(|| {
            EngineError::validation(field, "category must not be empty")
        })?;
        if amount < Decimal::ZERO {
            return Err(EngineError::validation(
                field,
                format!("amount for '{}' must not be negative", key),
            ));
        }
        merge_adjustment(&mut map, key, amount);
    }
    Ok(map)
}
