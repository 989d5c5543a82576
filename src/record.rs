//! Logical records of a batch file and their fixed-width encodings.

use crate::error::Result;
use crate::layout::{RecordKind, HEADER_TAG, TRAILER_TAG};
use crate::money::MinorUnits;
use crate::totals::RunningTotals;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Business date format used in header and transaction fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// System timestamp format used in the header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const SRC_UID_PREFIX: &str = "500022223455123_5hu12e2";
const OPERATION_CODE: &str = "01";
const SUB_OPERATION_CODE: &str = "0001";
const USER_ID: &str = "K0999999";
const TERMINAL_ID: &str = "A04CIS01";
const CONCEPT1: &str = "Transaction for testing";
const SVC_BRANCH_ID: &str = "9180";
const AUTH_LEVEL: &str = "001";
const USE_SVC_BRANCH: &str = "N";
const ICA: &str = "001";

/// Debit or credit classification of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// Encoded as `DR`.
    Debit,
    /// Encoded as `CR`.
    Credit,
}

impl OperationType {
    /// Two-letter code written to the `OperationType` field.
    pub fn code(&self) -> &'static str {
        match self {
            OperationType::Debit => "DR",
            OperationType::Credit => "CR",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Returned when a string is neither an operation code nor its name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown operation type {0:?}, expected DR, CR, debit or credit")]
pub struct UnknownOperationType(pub String);

impl FromStr for OperationType {
    type Err = UnknownOperationType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dr" | "debit" => Ok(OperationType::Debit),
            "cr" | "credit" => Ok(OperationType::Credit),
            _ => Err(UnknownOperationType(s.to_string())),
        }
    }
}

/// First line of a batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub system_timestamp: NaiveDateTime,
    pub business_date: NaiveDate,
    pub source_app_id: String,
    pub file_type: String,
    /// Written as text, left-aligned; the codec does not zero-pad it.
    pub sequence_number: String,
}

impl HeaderRecord {
    pub fn encode(&self) -> String {
        encode_header(
            self.business_date,
            self.system_timestamp,
            &self.source_app_id,
            &self.file_type,
            &self.sequence_number,
        )
    }
}

/// Encodes a header line.
pub fn encode_header(
    business_date: NaiveDate,
    system_timestamp: NaiveDateTime,
    source_app_id: &str,
    file_type: &str,
    sequence_number: &str,
) -> String {
    let system_ts = system_timestamp.format(TIMESTAMP_FORMAT).to_string();
    let business_dt = business_date.format(DATE_FORMAT).to_string();

    RecordKind::Header.encode(&[
        HEADER_TAG,
        &system_ts,
        &business_dt,
        source_app_id,
        file_type,
        sequence_number,
        "",
    ])
}

/// Caller-supplied entropy for the generated identifiers of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordEntropy {
    /// Suffix of the source UID (4 digits).
    pub src_seq: u16,
    /// Suffix of the request UID (6 digits).
    pub rq_seq: u32,
    /// Suffix of the second narrative field.
    pub narrative_seq: u16,
    /// Account identifier (10 digits).
    pub account_id: u64,
    /// Suffix of the authorising user id.
    pub auth_user: u32,
}

/// Per-file values shared by every transaction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionContext {
    business_date: String,
    compact_date: String,
}

impl TransactionContext {
    pub fn new(business_date: NaiveDate) -> Self {
        TransactionContext {
            business_date: business_date.format(DATE_FORMAT).to_string(),
            compact_date: business_date.format("%Y%m%d").to_string(),
        }
    }
}

/// One transaction detail line.
///
/// Immutable once built; amounts are already truncated to minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    operation: OperationType,
    src_uid: String,
    rq_uid: String,
    value_date: String,
    concept2: String,
    account_id: u64,
    trn_amt: MinorUnits,
    fee_amt: MinorUnits,
    auth_user_id: String,
}

impl TransactionRecord {
    /// Builds a transaction, converting both amounts to minor units.
    ///
    /// Fails with `NegativeAmount` or `AmountOverflow` if either amount cannot
    /// be encoded.
    pub fn new(
        operation: OperationType,
        trn_amt: Decimal,
        fee_amt: Decimal,
        entropy: RecordEntropy,
        context: &TransactionContext,
    ) -> Result<Self> {
        let trn_amt = MinorUnits::from_amount("TrnAmt", trn_amt)?;
        let fee_amt = MinorUnits::from_amount("FeeAmt", fee_amt)?;

        Ok(TransactionRecord {
            operation,
            src_uid: format!("{}{:04}", SRC_UID_PREFIX, entropy.src_seq),
            rq_uid: format!("494_{}_{:06}", context.compact_date, entropy.rq_seq),
            value_date: context.business_date.clone(),
            concept2: format!("TEST{}", entropy.narrative_seq),
            account_id: entropy.account_id,
            trn_amt,
            fee_amt,
            auth_user_id: format!("KB{}", entropy.auth_user),
        })
    }

    pub fn operation(&self) -> OperationType {
        self.operation
    }

    pub fn trn_minor(&self) -> MinorUnits {
        self.trn_amt
    }

    pub fn fee_minor(&self) -> MinorUnits {
        self.fee_amt
    }

    pub fn src_uid(&self) -> &str {
        &self.src_uid
    }

    pub fn rq_uid(&self) -> &str {
        &self.rq_uid
    }

    pub fn encode(&self) -> String {
        let account_id = self.account_id.to_string();
        let trn_amt = self.trn_amt.to_string();
        let fee_amt = self.fee_amt.to_string();

        RecordKind::Transaction.encode(&[
            &self.src_uid,
            &self.rq_uid,
            self.operation.code(),
            OPERATION_CODE,
            SUB_OPERATION_CODE,
            USER_ID,
            TERMINAL_ID,
            &self.value_date,
            CONCEPT1,
            &self.concept2,
            &account_id,
            &trn_amt,
            &fee_amt,
            SVC_BRANCH_ID,
            &self.auth_user_id,
            AUTH_LEVEL,
            &self.value_date,
            USE_SVC_BRANCH,
            ICA,
            "",
        ])
    }
}

/// Encodes a transaction line without touching any running totals.
pub fn encode_transaction(
    operation: OperationType,
    trn_amt: Decimal,
    fee_amt: Decimal,
    entropy: RecordEntropy,
    context: &TransactionContext,
) -> Result<String> {
    TransactionRecord::new(operation, trn_amt, fee_amt, entropy, context).map(|r| r.encode())
}

/// Last line of a batch file, derived entirely from `RunningTotals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailerRecord {
    pub record_count: u64,
    pub total_sum: MinorUnits,
    pub total_debit: MinorUnits,
    pub total_credit: MinorUnits,
}

impl TrailerRecord {
    pub fn from_totals(totals: &RunningTotals) -> Self {
        TrailerRecord {
            record_count: totals.count(),
            total_sum: totals.total_sum(),
            total_debit: totals.debit_sum(),
            total_credit: totals.credit_sum(),
        }
    }

    pub fn encode(&self) -> String {
        RecordKind::Trailer.encode(&[
            TRAILER_TAG,
            &self.record_count.to_string(),
            &self.total_sum.to_string(),
            &self.total_debit.to_string(),
            &self.total_credit.to_string(),
            "",
        ])
    }
}

/// Encodes the trailer line for the given totals.
pub fn encode_trailer(totals: &RunningTotals) -> String {
    TrailerRecord::from_totals(totals).encode()
}
