//! Pay-policy contract and per-load driver pay derivation.
//!
//! Driver pay for a load follows a strict two-path rule: when the load
//! carries precomputed driver-pay components they always win, and the pay
//! policy is bypassed entirely; otherwise the policy derives base pay and the
//! load-level detention/layover/short-pay amounts are added on top.

use rust_decimal::Decimal;

use crate::config::PolicyConfig;
use crate::models::{Driver, Load, PaySnapshot};

/// Maps a completed load and a driver to the driver's base share of the load.
///
/// Supplied by the host system; [`PercentageSplitPolicy`] is the default
/// implementation. Implementations must be pure.
pub trait PayPolicy {
    /// Computes the driver's base pay for the load.
    fn compute_pay(&self, load: &Load, driver: &Driver) -> Decimal;
}

/// The default pay policy: a percentage split of the load's linehaul rate.
///
/// The percentage comes from the driver's own `pay_percentage` override when
/// present, otherwise from the [`PolicyConfig`] default for the driver's
/// compensation model.
#[derive(Debug, Clone, Default)]
pub struct PercentageSplitPolicy {
    config: PolicyConfig,
}

impl PercentageSplitPolicy {
    /// Creates a policy backed by the given configuration.
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }
}

impl PayPolicy for PercentageSplitPolicy {
    fn compute_pay(&self, load: &Load, driver: &Driver) -> Decimal {
        let percentage = driver
            .pay_percentage
            .unwrap_or_else(|| self.config.percentage_for(driver.compensation));
        (load.rate * percentage / Decimal::new(100, 0)).round_dp(2)
    }
}

/// Builds the pay snapshot captured onto a settlement for one load.
///
/// Precomputed per-load pay wins over policy-derived pay: when
/// `driver_base_pay` is present the policy is never consulted and the
/// precomputed detention/layover components are used; otherwise base pay
/// comes from the policy and detention/layover from the load-level amounts.
/// Absent components are zero on both paths.
pub fn build_pay_snapshot<P: PayPolicy + ?Sized>(
    load: &Load,
    driver: &Driver,
    policy: &P,
) -> PaySnapshot {
    let dispatch_fee = load.dispatch_fee.unwrap_or(Decimal::ZERO);
    let tonu = load.short_pay_fee.unwrap_or(Decimal::ZERO);
    match load.driver_base_pay {
        Some(base_pay) => PaySnapshot {
            base_pay,
            detention: load.driver_detention_pay.unwrap_or(Decimal::ZERO),
            tonu,
            layover: load.driver_layover_pay.unwrap_or(Decimal::ZERO),
            dispatch_fee,
        },
        None => PaySnapshot {
            base_pay: policy.compute_pay(load, driver),
            detention: load.detention_amount.unwrap_or(Decimal::ZERO),
            tonu,
            layover: load.layover_amount.unwrap_or(Decimal::ZERO),
            dispatch_fee,
        },
    }
}

/// The driver's total pay for one load: base + detention + tonu + layover.
pub fn load_driver_pay<P: PayPolicy + ?Sized>(
    load: &Load,
    driver: &Driver,
    policy: &P,
) -> Decimal {
    build_pay_snapshot(load, driver, policy).pay_total()
}
