//! Running totals for trailer reconciliation.
//!
//! Maintains the invariant: `total_sum == debit_sum + credit_sum` at all times.

use crate::error::{BatchError, Result};
use crate::money::MinorUnits;
use crate::record::OperationType;
use rust_decimal::Decimal;

/// Accumulator of the transaction amounts written to one batch file.
///
/// # Invariants
///
/// - `total_sum == debit_sum + credit_sum` after every update
/// - `count` equals the number of transaction lines recorded
///
/// Amounts are the truncated minor units that appear in the detail lines,
/// so the trailer built from these totals always matches a re-sum of the
/// file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunningTotals {
    count: u64,
    debit_sum: MinorUnits,
    credit_sum: MinorUnits,
    total_sum: MinorUnits,
}

impl RunningTotals {
    /// Largest count that fits the 15-digit record count field.
    pub const MAX_COUNT: u64 = 999_999_999_999_999;

    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one written transaction line.
    ///
    /// The update is all-or-nothing: when the count or any sum would exceed
    /// its trailer field, no field changes.
    pub fn record(&mut self, operation: OperationType, amount: MinorUnits) -> Result<()> {
        let overflow = |field: &'static str| BatchError::AmountOverflow {
            field,
            amount: amount.to_amount(),
        };

        let count = self
            .count
            .checked_add(1)
            .filter(|&count| count <= Self::MAX_COUNT)
            .ok_or_else(|| BatchError::AmountOverflow {
                field: "TotalRec",
                amount: Decimal::from(self.count),
            })?;
        let total_sum = self
            .total_sum
            .checked_add(amount)
            .ok_or_else(|| overflow("TotalSum"))?;
        let (debit_sum, credit_sum) = match operation {
            OperationType::Debit => (
                self.debit_sum
                    .checked_add(amount)
                    .ok_or_else(|| overflow("TotalDebitSum"))?,
                self.credit_sum,
            ),
            OperationType::Credit => (
                self.debit_sum,
                self.credit_sum
                    .checked_add(amount)
                    .ok_or_else(|| overflow("TotalCreditSum"))?,
            ),
        };

        self.count = count;
        self.debit_sum = debit_sum;
        self.credit_sum = credit_sum;
        self.total_sum = total_sum;
        Ok(())
    }

    /// Number of transaction lines recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn debit_sum(&self) -> MinorUnits {
        self.debit_sum
    }

    pub fn credit_sum(&self) -> MinorUnits {
        self.credit_sum
    }

    /// `debit_sum + credit_sum`.
    pub fn total_sum(&self) -> MinorUnits {
        self.total_sum
    }
}
