//! File generation: drives a `BatchFileSession` from a `RecordSource`.
//!
//! Lines reach the sink in strict order: header, transactions in generation
//! order, trailer. When writing to a path, the file only appears under its
//! final name once the trailer has been written and flushed.

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::record::{TrailerRecord, TransactionContext, TransactionRecord};
use crate::session::BatchFileSession;
use crate::source::RecordSource;
use chrono::Local;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Prefix of the default output file name.
pub const FILE_NAME_PREFIX: &str = "SHARC.EDCMP.FCS3D01.RETAIL.DEBIT.TCB_";

/// Suffix of the in-progress file while generation runs.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Outcome of one generation run.
#[derive(Debug, Clone, Copy)]
pub struct GenerationReport {
    pub trailer: TrailerRecord,
    pub elapsed: Duration,
}

impl GenerationReport {
    /// Transaction records written.
    pub fn records(&self) -> u64 {
        self.trailer.record_count
    }

    /// Throughput of the run; zero when no time elapsed.
    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Default file name for a run of `record_count` transactions.
pub fn default_file_name(record_count: u64) -> String {
    format!("{}{}", FILE_NAME_PREFIX, record_count)
}

/// Writes a complete batch file to `sink` and returns the sink with a report.
pub fn generate<W, S>(
    sink: W,
    config: &GeneratorConfig,
    source: &mut S,
) -> Result<(W, GenerationReport)>
where
    W: Write,
    S: RecordSource + ?Sized,
{
    config.validate()?;
    let start = Instant::now();

    let header = config.header.header_record(Local::now().naive_local());
    let context = TransactionContext::new(header.business_date);

    let mut session = BatchFileSession::new(sink);
    session.write_header(&header)?;

    for i in 0..config.record_count {
        let planned = source.next_planned(config.debit_ratio, config.base_amount)?;
        let transaction = TransactionRecord::new(
            planned.operation,
            planned.amount,
            planned.fee,
            source.next_entropy(),
            &context,
        )?;
        session.write_transaction(&transaction)?;

        if (i + 1) % 100_000 == 0 {
            debug!("{} of {} transactions written", i + 1, config.record_count);
        }
    }

    let trailer = session.write_trailer()?;
    let sink = session.finish()?;

    Ok((
        sink,
        GenerationReport {
            trailer,
            elapsed: start.elapsed(),
        },
    ))
}

/// Writes a complete batch file to `path`.
///
/// Output goes to `<path>.partial` first and is renamed once complete. On
/// any error the partial file is removed and the error returned.
pub fn generate_file<S>(
    path: &Path,
    config: &GeneratorConfig,
    source: &mut S,
) -> Result<GenerationReport>
where
    S: RecordSource + ?Sized,
{
    let partial = partial_path(path);

    let result = write_partial(&partial, config, source).and_then(|report| {
        fs::rename(&partial, path)?;
        Ok(report)
    });

    match result {
        Ok(report) => {
            info!(
                "Generated {} with {} records in {:.2}s",
                path.display(),
                report.records(),
                report.elapsed.as_secs_f64()
            );
            Ok(report)
        }
        Err(e) => {
            if partial.exists() {
                if let Err(remove_err) = fs::remove_file(&partial) {
                    warn!(
                        "Failed to remove partial file {}: {}",
                        partial.display(),
                        remove_err
                    );
                }
            }
            Err(e)
        }
    }
}

fn write_partial<S>(
    partial: &Path,
    config: &GeneratorConfig,
    source: &mut S,
) -> Result<GenerationReport>
where
    S: RecordSource + ?Sized,
{
    let file = File::create(partial)?;
    let (file, report) = generate(file, config, source)?;
    file.sync_all()?;
    Ok(report)
}

/// Path of the in-progress file for `path`.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
