//! The replenish fraction as an exact rational.
//!
//! Parameters arrive as decimal strings ("0.05"). Parsing them into a
//! numerator/denominator pair keeps allowance arithmetic exact: floating
//! point would make the allowance non-deterministic across architectures,
//! which is unacceptable inside consensus.

use serde::{Deserialize, Serialize};

use crate::error::{ThrottleError, ThrottleResult};

const MAX_DECIMAL_PLACES: usize = 18;

/// A fraction in (0, 1], parsed from a decimal string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishFraction {
    numerator: u64,
    denominator: u64,
}

impl ReplenishFraction {
    /// Parse a decimal string such as `"0.05"`, `"0.5"`, or `"1.0"`.
    ///
    /// Fractions outside (0, 1] are rejected: zero would make the allowance
    /// floor carry the entire mechanism, and a fraction above one would let a
    /// single period jail more than the whole validator set.
    pub fn parse(s: &str) -> ThrottleResult<Self> {
        let invalid = |reason: &str| ThrottleError::InvalidParam {
            reason: format!("replenish fraction {s:?}: {reason}"),
        };

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("empty"));
        }
        if frac_part.len() > MAX_DECIMAL_PLACES {
            return Err(invalid("too many decimal places"));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("not a decimal number"));
        }

        let int_value: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("integer part overflow"))?
        };
        let frac_value: u64 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid("fraction part overflow"))?
        };

        let denominator = 10u64.pow(frac_part.len() as u32);
        let numerator = int_value
            .checked_mul(denominator)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(|| invalid("overflow"))?;

        if numerator == 0 {
            return Err(invalid("must be greater than zero"));
        }
        if numerator > denominator {
            return Err(invalid("must not exceed 1"));
        }

        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// The slash allowance for a given total bonded power:
    /// `max(1, floor(fraction * total_power))`.
    ///
    /// The floor of 1 keeps the meter serviceable on chains whose total
    /// power is smaller than the fraction's granularity.
    pub fn allowance_for(&self, total_power: i64) -> i64 {
        if total_power <= 0 {
            return 1;
        }
        let scaled = (total_power as i128 * self.numerator as i128) / self.denominator as i128;
        (scaled as i64).max(1)
    }
}
