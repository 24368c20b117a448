//! Configuration types for the default pay policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::CompensationModel;

/// Default pay percentages for the percentage-split pay policy.
///
/// Percentages are expressed as 0-100 values and validated on load. A
/// driver's own `pay_percentage` override always wins over these defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Default percentage of the load rate paid to company drivers.
    pub company_pay_percentage: Decimal,
    /// Default percentage of the load rate paid to owner-operators.
    pub owner_operator_pay_percentage: Decimal,
}

impl PolicyConfig {
    /// Returns the default percentage for a compensation model.
    pub fn percentage_for(&self, model: CompensationModel) -> Decimal {
        match model {
            CompensationModel::Company => self.company_pay_percentage,
            CompensationModel::OwnerOperator => self.owner_operator_pay_percentage,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            company_pay_percentage: Decimal::new(25, 0),
            owner_operator_pay_percentage: Decimal::new(88, 0),
        }
    }
}
