//! Minor-unit money representation.
//!
//! Amounts enter the crate as `rust_decimal::Decimal` values and leave it as
//! zero-padded integers counting minor currency units (cents). Conversion
//! truncates toward zero and never rounds, so `MinorUnits::from_amount(a)`
//! always equals `floor(a * 100)` for non-negative `a`.

use crate::error::{BatchError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

/// Integer count of minor currency units.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use rust_decimal::Decimal;
/// use batch_file_generator::MinorUnits;
///
/// let amount = Decimal::from_str("250.005").unwrap();
/// let minor = MinorUnits::from_amount("trnAmt", amount).unwrap();
/// assert_eq!(minor.value(), 25000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MinorUnits(u64);

impl MinorUnits {
    /// Number of minor units per major unit.
    pub const PER_UNIT: u64 = 100;

    /// Zero value.
    pub const ZERO: Self = MinorUnits(0);

    /// Largest count that fits an 18-digit amount field.
    pub const MAX: Self = MinorUnits(999_999_999_999_999_999);

    /// Wraps a raw minor-unit count.
    pub const fn new(value: u64) -> Self {
        MinorUnits(value)
    }

    /// Converts a decimal amount to minor units by truncation.
    ///
    /// `field` names the amount in error messages. Negative amounts are
    /// rejected because the layout reserves no sign position; amounts above
    /// [`MinorUnits::MAX`] fail with `AmountOverflow`.
    pub fn from_amount(field: &'static str, amount: Decimal) -> Result<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(BatchError::NegativeAmount { field, amount });
        }

        amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|scaled| scaled.trunc())
            .and_then(|scaled| scaled.to_u64())
            .filter(|&units| units <= Self::MAX.0)
            .map(MinorUnits)
            .ok_or(BatchError::AmountOverflow { field, amount })
    }

    /// Raw minor-unit count.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Reconstructs the decimal amount (`minor / 100`, two decimal places).
    pub fn to_amount(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), 2)
    }

    /// Adds two counts, returning `None` when the sum exceeds
    /// [`MinorUnits::MAX`].
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0
            .checked_add(rhs.0)
            .filter(|&sum| sum <= Self::MAX.0)
            .map(MinorUnits)
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
