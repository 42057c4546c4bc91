use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------        Cents         --------------------------------------------------------

/// A monetary amount in minor currency units (分). All order totals and notification amounts are
/// stored and compared in this form, so the two gateways' wire formats (one reports yuan as a
/// decimal string, the other reports integer cents) meet on common ground.
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
pub struct MoneyConversionError(String);

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
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Cents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}¥{}.{:02}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_yuan(yuan: i64) -> Self {
        Self(yuan * 100)
    }

    /// Parses a decimal yuan amount ("99.00", "0.5", "1350") into cents. Anything that is not a
    /// plain decimal number with at most two fraction digits is rejected, since a truncated or
    /// mangled amount must never be compared against an order total.
    pub fn from_yuan_str(s: &str) -> Result<Self, MoneyConversionError> {
        let s = s.trim();
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(MoneyConversionError(format!("'{s}' is not a decimal amount")));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyConversionError(format!("'{s}' is not a decimal amount")));
        }
        if frac.len() > 2 {
            return Err(MoneyConversionError(format!("'{s}' has sub-cent precision")));
        }
        let whole = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().map_err(|e| MoneyConversionError(format!("'{s}': {e}")))?
        };
        let frac = if frac.is_empty() {
            0
        } else {
            frac.parse::<i64>().map_err(|e| MoneyConversionError(format!("'{s}': {e}")))? *
                10i64.pow(2 - frac.len() as u32)
        };
        whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .and_then(|v| v.checked_mul(sign))
            .map(Self)
            .ok_or_else(|| MoneyConversionError(format!("Value {s} is too large to convert to Cents")))
    }
}
