//! Batch file session: the codec state machine.
//!
//! A session owns the sink and the running totals of exactly one file and
//! enforces the record order `header → transaction* → trailer`. Totals are
//! updated only after a transaction line has been written, so the trailer
//! always describes the lines actually produced.

use crate::error::{BatchError, Result};
use crate::record::{HeaderRecord, TrailerRecord, TransactionRecord};
use crate::totals::RunningTotals;
use log::{debug, warn};
use std::fmt;
use std::io::{BufWriter, Write};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    HeaderWritten,
    TransactionWritten,
    TrailerWritten,
    Closed,
    /// A write failed; the session accepts no further calls.
    Failed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not started",
            SessionState::HeaderWritten => "header written",
            SessionState::TransactionWritten => "transaction written",
            SessionState::TrailerWritten => "trailer written",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Writes one batch file to a sink.
///
/// # Example
///
/// ```
/// use batch_file_generator::{BatchFileSession, SessionState};
///
/// let mut session = BatchFileSession::new(Vec::<u8>::new());
/// assert_eq!(session.state(), SessionState::NotStarted);
/// assert!(session.write_trailer().is_err());
/// ```
pub struct BatchFileSession<W: Write> {
    sink: BufWriter<W>,
    state: SessionState,
    totals: RunningTotals,
}

impl<W: Write> BatchFileSession<W> {
    /// Creates a session writing to `sink`.
    pub fn new(sink: W) -> Self {
        BatchFileSession {
            sink: BufWriter::new(sink),
            state: SessionState::NotStarted,
            totals: RunningTotals::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Totals of the transaction lines written so far.
    pub fn totals(&self) -> &RunningTotals {
        &self.totals
    }

    /// Writes the header line. Must be the first call.
    pub fn write_header(&mut self, header: &HeaderRecord) -> Result<()> {
        self.expect(&[SessionState::NotStarted], "write header")?;
        self.write_line(&header.encode())?;
        self.state = SessionState::HeaderWritten;
        debug!(
            "Header written for business date {} (seq {})",
            header.business_date, header.sequence_number
        );
        Ok(())
    }

    /// Writes one transaction line and adds its amount to the totals.
    pub fn write_transaction(&mut self, transaction: &TransactionRecord) -> Result<()> {
        self.expect(
            &[SessionState::HeaderWritten, SessionState::TransactionWritten],
            "write transaction",
        )?;

        let mut totals = self.totals;
        if let Err(e) = totals.record(transaction.operation(), transaction.trn_minor()) {
            self.state = SessionState::Failed;
            return Err(e);
        }

        self.write_line(&transaction.encode())?;
        self.totals = totals;
        self.state = SessionState::TransactionWritten;
        Ok(())
    }

    /// Writes the trailer line built from the final totals.
    pub fn write_trailer(&mut self) -> Result<TrailerRecord> {
        self.expect(
            &[SessionState::HeaderWritten, SessionState::TransactionWritten],
            "write trailer",
        )?;

        let trailer = TrailerRecord::from_totals(&self.totals);
        self.write_line(&trailer.encode())?;
        self.state = SessionState::TrailerWritten;
        debug!(
            "Trailer written: {} records, debit {}, credit {}, total {}",
            trailer.record_count, trailer.total_debit, trailer.total_credit, trailer.total_sum
        );
        Ok(trailer)
    }

    /// Flushes the sink and hands it back. Only valid after the trailer.
    pub fn finish(mut self) -> Result<W> {
        self.expect(&[SessionState::TrailerWritten], "finish")?;
        self.state = SessionState::Closed;
        self.sink
            .into_inner()
            .map_err(|e| BatchError::Io(e.into_error()))
    }

    fn expect(&self, allowed: &[SessionState], action: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        warn!("Rejected {} in state {}", action, self.state);
        Err(BatchError::OutOfSequence {
            state: self.state.name(),
            action,
        })
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let result = self
            .sink
            .write_all(line.as_bytes())
            .and_then(|_| self.sink.write_all(b"\n"));
        if let Err(e) = result {
            self.state = SessionState::Failed;
            return Err(e.into());
        }
        Ok(())
    }
}
