//! Batch File Generator CLI
//!
//! Writes one fixed-width batch file per requested record count and prints
//! the time taken for each.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- 10000 100000
//! cargo run -- --output-dir out --fixture transactions.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `BATCH_*`: Generator overrides, see `GeneratorConfig::from_env`

use batch_file_generator::{
    default_file_name, generate_file, BatchError, FixtureSource, GeneratorConfig, RandomSource,
    RecordSource, Result,
};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

struct Args {
    output_dir: PathBuf,
    fixture: Option<PathBuf>,
    counts: Vec<u64>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        output_dir: PathBuf::from("."),
        fixture: None,
        counts: Vec::new(),
    };

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--output-dir" => {
                let dir = iter.next().ok_or(BatchError::MissingArgument)?;
                args.output_dir = PathBuf::from(dir);
            }
            "--fixture" => {
                let path = iter.next().ok_or(BatchError::MissingArgument)?;
                args.fixture = Some(PathBuf::from(path));
            }
            count => {
                let count = count.parse().map_err(|_| {
                    BatchError::InvalidConfig(format!("record count {:?} is not a number", count))
                })?;
                args.counts.push(count);
            }
        }
    }

    Ok(args)
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let base = GeneratorConfig::from_env()?;

    let fixture = match &args.fixture {
        Some(path) => Some(FixtureSource::from_csv(BufReader::new(File::open(path)?))?),
        None => None,
    };

    let counts = match (&fixture, args.counts.is_empty()) {
        (_, false) => args.counts,
        (Some(fixture), true) => vec![fixture.len() as u64],
        (None, true) => return Err(BatchError::MissingArgument),
    };

    println!("{:<10} {:<15} {}", "Records", "Time (seconds)", "Speed (records/sec)");
    println!("{}", "-".repeat(50));

    for count in counts {
        let config = GeneratorConfig {
            record_count: count,
            ..base.clone()
        };
        let path = args.output_dir.join(default_file_name(count));
        let mut source = new_source(fixture.as_ref(), base.seed);
        let report = generate_file(&path, &config, source.as_mut())?;
        println!(
            "{:<10} {:<15.2} {:.2}",
            report.records(),
            report.elapsed.as_secs_f64(),
            report.records_per_second()
        );
    }

    println!("{}", "-".repeat(50));
    Ok(())
}

/// Fresh source for one file, so every file starts from the same state.
fn new_source(fixture: Option<&FixtureSource>, seed: Option<u64>) -> Box<dyn RecordSource> {
    match (fixture, seed) {
        (Some(fixture), _) => Box::new(fixture.clone()),
        (None, Some(seed)) => Box::new(RandomSource::seeded(seed)),
        (None, None) => Box::new(RandomSource::from_entropy()),
    }
}
