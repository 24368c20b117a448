//! Driver model and related types.
//!
//! This module defines the Driver struct and CompensationModel enum for
//! representing drivers referenced by the settlement engine. Drivers are
//! owned by an external registry; the engine reads them, never mutates them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a driver is compensated for completed loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationModel {
    /// Company driver paid a percentage of the load rate set by fleet policy.
    Company,
    /// Owner-operator paid the bulk of the load rate less fleet fees.
    OwnerOperator,
}

/// A driver as seen by the settlement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Unique identifier for the driver, owned by the external registry.
    pub id: String,
    /// Display name, snapshotted onto settlements at commit time.
    pub name: String,
    /// The driver's compensation arrangement.
    pub compensation: CompensationModel,
    /// Optional per-driver pay percentage override (0-100). When absent,
    /// the policy configuration default for the compensation model applies.
    #[serde(default)]
    pub pay_percentage: Option<Decimal>,
}

impl Driver {
    /// Returns true if the driver is an owner-operator.
    ///
    /// # Examples
    ///
    /// ```
    /// use settlement_engine::models::{CompensationModel, Driver};
    ///
    /// let driver = Driver {
    ///     id: "drv_001".to_string(),
    ///     name: "J. Harlan".to_string(),
    ///     compensation: CompensationModel::OwnerOperator,
    ///     pay_percentage: None,
    /// };
    /// assert!(driver.is_owner_operator());
    /// ```
    pub fn is_owner_operator(&self) -> bool {
        self.compensation == CompensationModel::OwnerOperator
    }
}
