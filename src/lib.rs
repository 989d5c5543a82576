//! # Batch File Generator
//!
//! Produces fixed-width bank batch files: one header record, any number of
//! transaction detail records and one trailer record whose totals reconcile
//! with the details.
//!
//! ## Design Principles
//!
//! - **Positional layout**: every field has a fixed offset and width; lines
//!   of every record kind are exactly 550 bytes
//! - **Minor units**: amounts are encoded as truncated integer cents via
//!   `rust_decimal`, never rounded
//! - **Reconciled trailer**: totals are accumulated from the amounts actually
//!   written, so `debit + credit == total` and the count matches the details
//! - **Strict ordering**: a session rejects any out-of-sequence write
//!
//! ## Example
//!
//! ```no_run
//! use batch_file_generator::{generate_file, GeneratorConfig, RandomSource};
//! use std::path::Path;
//!
//! let config = GeneratorConfig::with_count(10_000);
//! let mut source = RandomSource::from_entropy();
//! let report = generate_file(Path::new("out.txt"), &config, &mut source).unwrap();
//! println!("{} records", report.records());
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod layout;
pub mod money;
pub mod record;
pub mod session;
pub mod source;
pub mod totals;
pub mod verify;

pub use config::{GeneratorConfig, HeaderConfig};
pub use error::{BatchError, Result};
pub use generator::{default_file_name, generate, generate_file, GenerationReport};
pub use layout::{FieldSpec, RecordKind};
pub use money::MinorUnits;
pub use record::{
    encode_header, encode_trailer, encode_transaction, HeaderRecord, OperationType,
    RecordEntropy, TrailerRecord, TransactionContext, TransactionRecord,
};
pub use session::{BatchFileSession, SessionState};
pub use source::{FixtureSource, PlannedTransaction, RandomSource, RecordSource};
pub use totals::RunningTotals;
pub use verify::{verify, FileSummary};
