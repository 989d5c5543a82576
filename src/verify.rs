//! Reconciliation check for generated batch files.
//!
//! Reads a file back, slices every line with the published field widths and
//! confirms that the trailer agrees with the detail records. A file without
//! a terminal trailer is reported as incomplete.

use crate::error::{BatchError, Result};
use crate::layout::RecordKind;
use crate::money::MinorUnits;
use crate::record::OperationType;
use crate::totals::RunningTotals;
use log::debug;
use std::io::BufRead;

/// Totals recomputed from the detail lines of a verified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSummary {
    pub transactions: u64,
    pub debit_sum: MinorUnits,
    pub credit_sum: MinorUnits,
    pub total_sum: MinorUnits,
}

/// Verifies structure and trailer totals of a batch file.
pub fn verify<R: BufRead>(reader: R) -> Result<FileSummary> {
    let mut totals = RunningTotals::new();
    let mut trailer_line = None;
    let mut line_no = 0;

    for line in reader.lines() {
        let line = line?;
        line_no += 1;

        if let Some(at) = trailer_line {
            return Err(BatchError::Reconciliation(format!(
                "line {} follows the trailer at line {}",
                line_no, at
            )));
        }

        let kind = RecordKind::classify(&line);
        if line_no == 1 {
            if kind != RecordKind::Header {
                return Err(malformed(kind, line_no, "first line is not a header"));
            }
            split(kind, &line, line_no)?;
            continue;
        }

        match kind {
            RecordKind::Header => {
                return Err(malformed(kind, line_no, "header after the first line"));
            }
            RecordKind::Transaction => {
                let fields = split(kind, &line, line_no)?;
                let operation = field(kind, &fields, "OperationType")
                    .parse::<OperationType>()
                    .map_err(|e| malformed(kind, line_no, &e.to_string()))?;
                let amount = parse_number(kind, &fields, "TrnAmt", line_no)?;
                totals.record(operation, MinorUnits::new(amount))?;
            }
            RecordKind::Trailer => {
                let fields = split(kind, &line, line_no)?;
                check_trailer(&fields, &totals, line_no)?;
                trailer_line = Some(line_no);
            }
        }
    }

    if line_no == 0 {
        return Err(BatchError::Incomplete("file is empty".to_string()));
    }
    if trailer_line.is_none() {
        return Err(BatchError::Incomplete(format!(
            "no trailer after {} transaction lines",
            totals.count()
        )));
    }

    debug!("Verified {} transaction lines", totals.count());
    Ok(FileSummary {
        transactions: totals.count(),
        debit_sum: totals.debit_sum(),
        credit_sum: totals.credit_sum(),
        total_sum: totals.total_sum(),
    })
}

fn check_trailer(fields: &[&str], totals: &RunningTotals, line_no: usize) -> Result<()> {
    let kind = RecordKind::Trailer;
    let count = parse_number(kind, fields, "TotalRec", line_no)?;
    let total = parse_number(kind, fields, "TotalSum", line_no)?;
    let debit = parse_number(kind, fields, "TotalDebitSum", line_no)?;
    let credit = parse_number(kind, fields, "TotalCreditSum", line_no)?;

    let checks = [
        ("record count", count, totals.count()),
        ("debit sum", debit, totals.debit_sum().value()),
        ("credit sum", credit, totals.credit_sum().value()),
        ("total sum", total, totals.total_sum().value()),
    ];
    for (name, declared, actual) in checks {
        if declared != actual {
            return Err(BatchError::Reconciliation(format!(
                "trailer {} is {}, detail lines give {}",
                name, declared, actual
            )));
        }
    }

    if debit.checked_add(credit) != Some(total) {
        return Err(BatchError::Reconciliation(format!(
            "trailer debit {} + credit {} != total {}",
            debit, credit, total
        )));
    }
    Ok(())
}

fn split<'a>(kind: RecordKind, line: &'a str, line_no: usize) -> Result<Vec<&'a str>> {
    kind.split(line).map_err(|e| match e {
        BatchError::MalformedLine { kind, message } => BatchError::MalformedLine {
            kind,
            message: format!("line {}: {}", line_no, message),
        },
        other => other,
    })
}

fn field<'a>(kind: RecordKind, fields: &[&'a str], name: &str) -> &'a str {
    kind.position(name).and_then(|i| fields.get(i).copied()).unwrap_or("")
}

fn parse_number(kind: RecordKind, fields: &[&str], name: &str, line_no: usize) -> Result<u64> {
    let value = field(kind, fields, name);
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(
            kind,
            line_no,
            &format!("field {} is not numeric: {:?}", name, value),
        ));
    }
    value
        .parse()
        .map_err(|e| malformed(kind, line_no, &format!("field {}: {}", name, e)))
}

fn malformed(kind: RecordKind, line_no: usize, message: &str) -> BatchError {
    BatchError::MalformedLine {
        kind: kind.name(),
        message: format!("line {}: {}", line_no, message),
    }
}
