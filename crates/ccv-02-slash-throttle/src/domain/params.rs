//! Throttle parameters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::fraction::ReplenishFraction;
use crate::error::{ThrottleError, ThrottleResult};

/// Parameters governing the slash meter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleParams {
    /// Fraction of total bonded power replenished per period; also the cap
    /// on the meter.
    pub replenish_fraction: ReplenishFraction,
    /// Wall-clock duration between replenishment ticks.
    pub replenish_period: Duration,
}

impl Default for ThrottleParams {
    fn default() -> Self {
        Self {
            replenish_fraction: ReplenishFraction::parse("0.05")
                .expect("default replenish fraction is valid"),
            replenish_period: Duration::from_secs(3600),
        }
    }
}

impl ThrottleParams {
    /// Build params from a decimal fraction string and a period.
    pub fn new(replenish_fraction: &str, replenish_period: Duration) -> ThrottleResult<Self> {
        let params = Self {
            replenish_fraction: ReplenishFraction::parse(replenish_fraction)?,
            replenish_period,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> ThrottleResult<()> {
        if self.replenish_period.is_zero() {
            return Err(ThrottleError::InvalidParam {
                reason: "replenish period must be positive".to_string(),
            });
        }
        Ok(())
    }
}
