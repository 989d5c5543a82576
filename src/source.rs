//! Record sources: where transaction classifications and amounts come from.
//!
//! The generator only needs a stream of debit/credit flags, amounts, fees and
//! identifier entropy. `RandomSource` draws them from a `rand` RNG;
//! `FixtureSource` replays a fixed list so reconciliation can be tested with
//! known values.

use crate::error::{BatchError, Result};
use crate::record::{OperationType, RecordEntropy};
use csv::{ReaderBuilder, Trim};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

/// Scale used when drawing random amounts (4 decimal places).
const AMOUNT_SCALE: u32 = 4;

/// Fee range in units of `10^-AMOUNT_SCALE`: `[10, 50)`.
const FEE_RANGE: std::ops::Range<i64> = 100_000..500_000;

/// One transaction as the generator will encode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTransaction {
    pub operation: OperationType,
    pub amount: Decimal,
    pub fee: Decimal,
}

/// Supplier of per-record business values.
pub trait RecordSource {
    /// Returns `true` for a debit, with probability `debit_ratio`.
    fn next_is_debit(&mut self, debit_ratio: f64) -> bool;

    /// Transaction amount around `base_amount`.
    ///
    /// Fails with `InvalidConfig` when `base_amount` is too large to draw
    /// from.
    fn next_amount(&mut self, base_amount: Decimal) -> Result<Decimal>;

    /// Fee amount.
    fn next_fee(&mut self) -> Decimal;

    /// Entropy for the identifiers of the next transaction.
    fn next_entropy(&mut self) -> RecordEntropy;

    /// Draws the classification, amount and fee of the next transaction.
    fn next_planned(
        &mut self,
        debit_ratio: f64,
        base_amount: Decimal,
    ) -> Result<PlannedTransaction> {
        let operation = if self.next_is_debit(debit_ratio) {
            OperationType::Debit
        } else {
            OperationType::Credit
        };
        Ok(PlannedTransaction {
            operation,
            amount: self.next_amount(base_amount)?,
            fee: self.next_fee(),
        })
    }
}

/// Random values in the ranges of the production extract generator.
///
/// - amount: uniform in `[0.5 * base, 1.5 * base)`
/// - fee: uniform in `[10, 50)`
pub struct RandomSource<R: Rng = StdRng> {
    rng: R,
}

impl<R: Rng> RandomSource<R> {
    pub fn new(rng: R) -> Self {
        RandomSource { rng }
    }
}

impl RandomSource<StdRng> {
    /// Reproducible source: the same seed yields the same file body.
    pub fn seeded(seed: u64) -> Self {
        RandomSource::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        RandomSource::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RecordSource for RandomSource<R> {
    fn next_is_debit(&mut self, debit_ratio: f64) -> bool {
        self.rng.gen::<f64>() < debit_ratio
    }

    fn next_amount(&mut self, base_amount: Decimal) -> Result<Decimal> {
        let out_of_range = || {
            BatchError::InvalidConfig(format!("base amount {} is out of range", base_amount))
        };

        let scaled = base_amount
            .checked_mul(Decimal::from(10_i64.pow(AMOUNT_SCALE)))
            .and_then(|scaled| scaled.trunc().to_i64())
            .ok_or_else(out_of_range)?;
        let low = scaled / 2;
        let high = scaled.checked_add(scaled / 2).ok_or_else(out_of_range)?;
        if high <= low {
            return Ok(Decimal::ZERO);
        }
        Ok(Decimal::new(self.rng.gen_range(low..high), AMOUNT_SCALE))
    }

    fn next_fee(&mut self) -> Decimal {
        Decimal::new(self.rng.gen_range(FEE_RANGE), AMOUNT_SCALE)
    }

    fn next_entropy(&mut self) -> RecordEntropy {
        RecordEntropy {
            src_seq: self.rng.gen_range(1000..=9999),
            rq_seq: self.rng.gen_range(100_000..=999_999),
            narrative_seq: self.rng.gen_range(1000..=9999),
            account_id: self.rng.gen_range(1_000_000_000..=9_999_999_999),
            auth_user: self.rng.gen_range(100_000..=999_999),
        }
    }
}

/// Replays a fixed list of transactions, ignoring ratio and base amount.
///
/// Each stream (classification, amount, fee) has its own cursor and cycles
/// when the list is exhausted. Entropy is derived from a counter so output
/// is fully deterministic.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    planned: Vec<PlannedTransaction>,
    op_cursor: usize,
    amount_cursor: usize,
    fee_cursor: usize,
    sequence: u64,
}

/// Raw fixture row as read from CSV: `type,amount,fee`.
#[derive(Debug, Deserialize)]
struct FixtureRow {
    #[serde(rename = "type")]
    op_type: String,
    amount: String,
    fee: Option<String>,
}

impl FixtureSource {
    pub fn new(planned: Vec<PlannedTransaction>) -> Self {
        FixtureSource {
            planned,
            ..Default::default()
        }
    }

    /// Loads fixture transactions from CSV with a `type,amount,fee` header.
    ///
    /// `type` accepts `DR`, `CR`, `debit` or `credit`; a missing fee is zero.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut planned = Vec::new();
        for (row_idx, result) in csv_reader.deserialize::<FixtureRow>().enumerate() {
            let row = row_idx + 2; // 1-indexed, accounting for header row
            let record = result?;

            let operation = OperationType::from_str(&record.op_type).map_err(|e| {
                BatchError::InvalidRecord {
                    row,
                    message: e.to_string(),
                }
            })?;
            let amount = parse_decimal(&record.amount, row, "amount")?;
            let fee = match record.fee.as_deref().map(str::trim) {
                Some(fee) if !fee.is_empty() => parse_decimal(fee, row, "fee")?,
                _ => Decimal::ZERO,
            };

            planned.push(PlannedTransaction {
                operation,
                amount,
                fee,
            });
        }

        debug!("Loaded {} fixture transactions", planned.len());
        Ok(FixtureSource::new(planned))
    }

    /// Number of distinct planned transactions.
    pub fn len(&self) -> usize {
        self.planned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planned.is_empty()
    }

    fn at(&self, cursor: usize) -> Option<&PlannedTransaction> {
        if self.planned.is_empty() {
            None
        } else {
            self.planned.get(cursor % self.planned.len())
        }
    }
}

fn parse_decimal(value: &str, row: usize, column: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim()).map_err(|e| BatchError::InvalidRecord {
        row,
        message: format!("invalid {} {:?}: {}", column, value, e),
    })
}

impl RecordSource for FixtureSource {
    fn next_is_debit(&mut self, _debit_ratio: f64) -> bool {
        let is_debit = self
            .at(self.op_cursor)
            .map(|p| p.operation == OperationType::Debit)
            .unwrap_or(false);
        self.op_cursor += 1;
        is_debit
    }

    fn next_amount(&mut self, _base_amount: Decimal) -> Result<Decimal> {
        let amount = self.at(self.amount_cursor).map(|p| p.amount).unwrap_or_default();
        self.amount_cursor += 1;
        Ok(amount)
    }

    fn next_fee(&mut self) -> Decimal {
        let fee = self.at(self.fee_cursor).map(|p| p.fee).unwrap_or_default();
        self.fee_cursor += 1;
        fee
    }

    fn next_entropy(&mut self) -> RecordEntropy {
        self.sequence += 1;
        let n = self.sequence;
        RecordEntropy {
            src_seq: (1000 + n % 9000) as u16,
            rq_seq: (100_000 + n % 900_000) as u32,
            narrative_seq: (1000 + n % 9000) as u16,
            account_id: 1_000_000_000 + n,
            auth_user: (100_000 + n % 900_000) as u32,
        }
    }
}
