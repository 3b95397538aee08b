use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const USD_CURRENCY_CODE: &str = "USD";
pub const USD_CURRENCY_CODE_LOWER: &str = "usd";

//--------------------------------------        Cents         --------------------------------------------------------

/// A monetary amount in minor currency units. Amounts are exact integers, so equality comparisons are safe.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {} is too large to convert to Cents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Payment providers report amounts as floating point numbers of major units. The conversion is only accepted when
/// the value lands exactly on a cent boundary.
impl TryFrom<f64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(CentsConversionError(format!("Value {value} is not a finite amount")));
        }
        let scaled = value * 100.0;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 {
            return Err(CentsConversionError(format!("Value {value} has sub-cent precision")));
        }
        if rounded >= i64::MAX as f64 || rounded <= i64::MIN as f64 {
            return Err(CentsConversionError(format!("Value {value} is too large to convert to Cents")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(rounded as i64))
    }
}

/// Prints the amount as major units with exactly two decimal places, e.g. `5000 => "50.00"`. This is the format
/// hosted payment pages expect, so `to_string()` is wire-safe.
impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Parses decimal amount strings ("49", "49.5", "49.99"). Sub-cent precision is rejected rather than rounded.
impl FromStr for Cents {
    type Err = CentsConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (sign, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, trimmed),
        };
        let mut parts = digits.split('.');
        let whole = parts
            .next()
            .filter(|w| !w.is_empty())
            .ok_or_else(|| CentsConversionError(format!("Invalid amount: {trimmed}")))?
            .parse::<i64>()
            .map_err(|e| CentsConversionError(format!("Invalid amount: {trimmed}. {e}.")))?;
        let frac = parts.next();
        if parts.next().is_some() {
            return Err(CentsConversionError(format!("Invalid amount: {trimmed}")));
        }
        let cents = match frac {
            None => 0,
            Some(d) if d.is_empty() || d.len() > 2 || !d.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(CentsConversionError(format!("Amounts carry at most two decimal places: {trimmed}")));
            },
            Some(d) => {
                let v = d.parse::<i64>().map_err(|e| CentsConversionError(format!("Invalid amount: {trimmed}. {e}.")))?;
                if d.len() == 1 {
                    v * 10
                } else {
                    v
                }
            },
        };
        let total = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .ok_or_else(|| CentsConversionError(format!("Value {trimmed} is too large to convert to Cents")))?;
        Ok(Self(sign * total))
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_major(units: i64) -> Self {
        Self(units * 100)
    }
}
