//! Configuration loading for the pay policy.
//!
//! Loads a [`PolicyConfig`] from a YAML file and validates that every
//! percentage is within 0-100.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};

use super::types::PolicyConfig;

impl PolicyConfig {
    /// Loads a policy configuration from a YAML file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use settlement_engine::config::PolicyConfig;
    ///
    /// let config = PolicyConfig::from_yaml_file("./config/policy.yaml")?;
    /// # Ok::<(), settlement_engine::error::EngineError>(())
    /// ```
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let config: PolicyConfig =
            serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
                path: path_str.clone(),
                message: e.to_string(),
            })?;

        config.validate(&path_str)?;
        Ok(config)
    }

    fn validate(&self, path: &str) -> EngineResult<()> {
        for (name, value) in [
            ("company_pay_percentage", self.company_pay_percentage),
            (
                "owner_operator_pay_percentage",
                self.owner_operator_pay_percentage,
            ),
        ] {
            if value < Decimal::ZERO || value > Decimal::new(100, 0) {
                return Err(EngineError::ConfigParseError {
                    path: path.to_string(),
                    message: format!("{} must be between 0 and 100, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}
