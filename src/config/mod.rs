//! Pay-policy configuration for the Settlement Reconciliation Engine.
//!
//! This module provides the [`PolicyConfig`] consumed by the default
//! percentage-split pay policy, loadable from a YAML file.
//!
//! # Example
//!
//! ```no_run
//! use settlement_engine::config::PolicyConfig;
//!
//! let config = PolicyConfig::from_yaml_file("./config/policy.yaml").unwrap();
//! println!("Company split: {}%", config.company_pay_percentage);
//! ```

mod loader;
mod types;

pub use types::PolicyConfig;
