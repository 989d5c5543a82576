//! Generator configuration.
//!
//! Defaults reproduce the production extract: 60% debits, amounts around
//! 1000, source application `494`, file type `AcctInf`, sequence `000001`.
//! Every value can be overridden through `BATCH_*` environment variables.

use crate::error::{BatchError, Result};
use crate::record::{HeaderRecord, DATE_FORMAT};
use crate::totals::RunningTotals;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

/// Largest accepted base amount. Drawn amounts stay below `1.5 * base`, so
/// every amount fits both the sampling range and the 18-digit amount field.
pub const MAX_BASE_AMOUNT: i64 = 100_000_000_000_000;

/// Values written to the header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderConfig {
    pub source_app_id: String,
    pub file_type: String,
    pub sequence_number: String,
    /// Fixed business date; the generation date when `None`.
    pub business_date: Option<NaiveDate>,
    /// Fixed system timestamp; the generation time when `None`.
    pub system_timestamp: Option<NaiveDateTime>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        HeaderConfig {
            source_app_id: "494".to_string(),
            file_type: "AcctInf".to_string(),
            sequence_number: "000001".to_string(),
            business_date: None,
            system_timestamp: None,
        }
    }
}

impl HeaderConfig {
    /// Builds the header record, filling unset dates from `now`.
    pub fn header_record(&self, now: NaiveDateTime) -> HeaderRecord {
        HeaderRecord {
            system_timestamp: self.system_timestamp.unwrap_or(now),
            business_date: self.business_date.unwrap_or_else(|| now.date()),
            source_app_id: self.source_app_id.clone(),
            file_type: self.file_type.clone(),
            sequence_number: self.sequence_number.clone(),
        }
    }
}

/// Parameters of one file-generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Number of transaction records between header and trailer.
    pub record_count: u64,
    /// Probability that a transaction is a debit, in `[0, 1]`.
    pub debit_ratio: f64,
    /// Centre of the transaction amount range.
    pub base_amount: Decimal,
    /// Seed for the random source; fresh entropy when `None`.
    pub seed: Option<u64>,
    pub header: HeaderConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            record_count: 0,
            debit_ratio: 0.6,
            base_amount: Decimal::new(1000, 0),
            seed: None,
            header: HeaderConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Default configuration with the given record count.
    pub fn with_count(record_count: u64) -> Self {
        GeneratorConfig {
            record_count,
            ..Default::default()
        }
    }

    /// Reads overrides from the process environment.
    ///
    /// - `BATCH_DEBIT_RATIO`, `BATCH_BASE_AMOUNT`, `BATCH_SEED`
    /// - `BATCH_SOURCE_APP_ID`, `BATCH_FILE_TYPE`, `BATCH_SEQUENCE_NUMBER`
    /// - `BATCH_BUSINESS_DATE` (`YYYY-MM-DD`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`GeneratorConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = GeneratorConfig::default();

        if let Some(value) = lookup("BATCH_DEBIT_RATIO") {
            config.debit_ratio = parse_var("BATCH_DEBIT_RATIO", &value)?;
        }
        if let Some(value) = lookup("BATCH_BASE_AMOUNT") {
            config.base_amount = parse_var("BATCH_BASE_AMOUNT", &value)?;
        }
        if let Some(value) = lookup("BATCH_SEED") {
            config.seed = Some(parse_var("BATCH_SEED", &value)?);
        }
        if let Some(value) = lookup("BATCH_SOURCE_APP_ID") {
            config.header.source_app_id = value;
        }
        if let Some(value) = lookup("BATCH_FILE_TYPE") {
            config.header.file_type = value;
        }
        if let Some(value) = lookup("BATCH_SEQUENCE_NUMBER") {
            config.header.sequence_number = value;
        }
        if let Some(value) = lookup("BATCH_BUSINESS_DATE") {
            let date = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
                BatchError::InvalidConfig(format!("BATCH_BUSINESS_DATE={:?}: {}", value, e))
            })?;
            config.header.business_date = Some(date);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks ranges that the record source relies on.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.debit_ratio) {
            return Err(BatchError::InvalidConfig(format!(
                "debit ratio {} is outside [0, 1]",
                self.debit_ratio
            )));
        }
        if self.base_amount.is_sign_negative() && !self.base_amount.is_zero() {
            return Err(BatchError::InvalidConfig(format!(
                "base amount {} is negative",
                self.base_amount
            )));
        }
        if self.base_amount > Decimal::from(MAX_BASE_AMOUNT) {
            return Err(BatchError::InvalidConfig(format!(
                "base amount {} exceeds {}",
                self.base_amount, MAX_BASE_AMOUNT
            )));
        }
        if self.record_count > RunningTotals::MAX_COUNT {
            return Err(BatchError::InvalidConfig(format!(
                "record count {} exceeds {}",
                self.record_count,
                RunningTotals::MAX_COUNT
            )));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| BatchError::InvalidConfig(format!("{}={:?}: {}", key, value, e)))
}
