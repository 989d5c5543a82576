//! Edge case and property tests for the batch file codec.
//!
//! Every check recomputes totals from the raw fixed-width lines rather than
//! trusting the generator's own report.

use batch_file_generator::{
    encode_trailer, generate, generate_file, verify, BatchError, BatchFileSession, FixtureSource,
    GeneratorConfig, HeaderRecord, MinorUnits, OperationType, PlannedTransaction, RandomSource,
    RecordEntropy, RecordKind, RunningTotals, SessionState, TransactionContext, TransactionRecord,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::thread;
use tempfile::TempDir;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn business_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn config(count: u64) -> GeneratorConfig {
    let mut config = GeneratorConfig::with_count(count);
    config.header.business_date = Some(business_date());
    config.header.system_timestamp = business_date().and_hms_opt(23, 59, 59);
    config
}

fn generate_text(count: u64, seed: u64) -> String {
    let mut source = RandomSource::seeded(seed);
    let (bytes, _) = generate(Vec::<u8>::new(), &config(count), &mut source).unwrap();
    String::from_utf8(bytes).unwrap()
}

/// Independently parsed trailer and detail sums of a generated file.
struct Parsed {
    details: u64,
    debit: u64,
    credit: u64,
    trailer_count: u64,
    trailer_total: u64,
    trailer_debit: u64,
    trailer_credit: u64,
}

fn parse(text: &str) -> Parsed {
    let lines: Vec<&str> = text.lines().collect();
    let (first, rest) = lines.split_first().unwrap();
    let (last, details) = rest.split_last().unwrap();
    assert!(first.starts_with("H01"));
    assert!(last.starts_with("T01"));

    let mut debit = 0;
    let mut credit = 0;
    for line in details {
        let amount: u64 = line[231..249].parse().unwrap();
        match &line[87..89] {
            "DR" => debit += amount,
            "CR" => credit += amount,
            other => panic!("unexpected operation type {}", other),
        }
    }

    Parsed {
        details: details.len() as u64,
        debit,
        credit,
        trailer_count: last[3..18].parse().unwrap(),
        trailer_total: last[18..36].parse().unwrap(),
        trailer_debit: last[36..54].parse().unwrap(),
        trailer_credit: last[54..72].parse().unwrap(),
    }
}

// ==================== RECONCILIATION ====================

#[test]
fn test_trailer_matches_detail_lines_for_many_seeds() {
    for seed in 0..20 {
        let parsed = parse(&generate_text(200, seed));
        assert_eq!(parsed.trailer_count, parsed.details);
        assert_eq!(parsed.trailer_debit, parsed.debit);
        assert_eq!(parsed.trailer_credit, parsed.credit);
        assert_eq!(parsed.trailer_debit + parsed.trailer_credit, parsed.trailer_total);
    }
}

#[test]
fn test_debit_ratio_extremes() {
    let mut all_debit = config(50);
    all_debit.debit_ratio = 1.0;
    let (bytes, report) =
        generate(Vec::<u8>::new(), &all_debit, &mut RandomSource::seeded(5)).unwrap();
    assert!(report.trailer.total_credit.is_zero());
    assert_eq!(parse(&String::from_utf8(bytes).unwrap()).credit, 0);

    let mut all_credit = config(50);
    all_credit.debit_ratio = 0.0;
    let (_, report) =
        generate(Vec::<u8>::new(), &all_credit, &mut RandomSource::seeded(5)).unwrap();
    assert!(report.trailer.total_debit.is_zero());
}

#[test]
fn test_end_to_end_three_transactions() {
    let mut source = FixtureSource::new(vec![
        PlannedTransaction {
            operation: OperationType::Debit,
            amount: dec("100.00"),
            fee: dec("10.00"),
        },
        PlannedTransaction {
            operation: OperationType::Credit,
            amount: dec("250.005"),
            fee: dec("5.00"),
        },
        PlannedTransaction {
            operation: OperationType::Debit,
            amount: dec("0.001"),
            fee: dec("1.00"),
        },
    ]);

    let (bytes, _) = generate(Vec::<u8>::new(), &config(3), &mut source).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(&lines[1][231..249], "000000000000010000");
    assert_eq!(&lines[2][231..249], "000000000000025000");
    assert_eq!(&lines[3][231..249], "000000000000000000");
    assert_eq!(&lines[1][249..267], "000000000000001000");

    let parsed = parse(&text);
    assert_eq!(parsed.trailer_count, 3);
    assert_eq!(parsed.trailer_debit, 10000);
    assert_eq!(parsed.trailer_credit, 25000);
    assert_eq!(parsed.trailer_total, 35000);
}

#[test]
fn test_sub_cent_amounts_never_accumulate() {
    // 1000 debits of 0.009 each: every line encodes 0, so the trailer is 0
    // even though the decimal sum is 9.00.
    let mut source = FixtureSource::new(vec![PlannedTransaction {
        operation: OperationType::Debit,
        amount: dec("0.009"),
        fee: dec("0"),
    }]);
    let (_, report) = generate(Vec::<u8>::new(), &config(1000), &mut source).unwrap();
    assert_eq!(report.records(), 1000);
    assert!(report.trailer.total_sum.is_zero());
}

// ==================== FIXED WIDTH ====================

#[test]
fn test_every_line_has_fixed_width() {
    let text = generate_text(500, 77);
    for (i, line) in text.lines().enumerate() {
        let kind = RecordKind::classify(line);
        assert_eq!(line.len(), kind.line_width(), "line {} ({})", i + 1, kind.name());
    }
    assert!(text.ends_with('\n'));
}

#[test]
fn test_overlong_header_values_truncated() {
    let header = HeaderRecord {
        system_timestamp: business_date().and_hms_opt(1, 2, 3).unwrap(),
        business_date: business_date(),
        source_app_id: "TOO-LONG-APP".to_string(),
        file_type: "AccountInformation".to_string(),
        sequence_number: "1234567890".to_string(),
    };
    let line = header.encode();
    assert_eq!(line.len(), 550);
    let fields = RecordKind::Header.split(&line).unwrap();
    assert_eq!(fields[3], "TOO-L");
    assert_eq!(fields[4], "AccountI");
    assert_eq!(fields[5], "123456");

    // deterministic
    assert_eq!(header.encode(), line);
}

#[test]
fn test_split_round_trip_is_byte_exact() {
    let text = generate_text(20, 3);
    for line in text.lines() {
        let kind = RecordKind::classify(line);
        let fields = kind.split(line).unwrap();
        assert_eq!(fields.len(), kind.fields().len());
        for (value, spec) in fields.iter().zip(kind.fields()) {
            assert_eq!(value.len(), spec.width);
        }
        assert_eq!(fields.concat(), line);
    }
}

// ==================== MONEY ====================

#[test]
fn test_truncation_matches_floor() {
    let samples = [
        "0", "0.001", "0.01", "0.015", "0.999", "1", "12.345", "99.995", "250.005",
        "1499.9999", "123456789.129",
    ];
    for s in samples {
        let amount = dec(s);
        let minor = MinorUnits::from_amount("TrnAmt", amount).unwrap();
        let expected = (amount * Decimal::ONE_HUNDRED).floor() / Decimal::ONE_HUNDRED;
        assert_eq!(minor.to_amount(), expected, "amount {}", s);
    }
}

#[test]
fn test_negative_amount_rejected_before_write() {
    let now = business_date().and_hms_opt(0, 0, 0).unwrap();
    let mut session = BatchFileSession::new(Vec::<u8>::new());
    session
        .write_header(&config(0).header.header_record(now))
        .unwrap();

    let result = TransactionRecord::new(
        OperationType::Debit,
        dec("-0.50"),
        dec("1"),
        RecordEntropy::default(),
        &TransactionContext::new(business_date()),
    );
    assert!(matches!(result, Err(BatchError::NegativeAmount { .. })));
    assert_eq!(session.totals().count(), 0);
}

#[test]
fn test_largest_amount_fills_the_field() {
    let mut source = FixtureSource::new(vec![PlannedTransaction {
        operation: OperationType::Credit,
        amount: dec("9999999999999999.99"),
        fee: dec("0"),
    }]);
    let (bytes, report) = generate(Vec::<u8>::new(), &config(1), &mut source).unwrap();
    assert_eq!(report.trailer.total_credit, MinorUnits::MAX);

    let text = String::from_utf8(bytes).unwrap();
    let parsed = parse(&text);
    assert_eq!(parsed.credit, MinorUnits::MAX.value());
    assert_eq!(parsed.trailer_total, MinorUnits::MAX.value());
    assert!(verify(text.as_bytes()).is_ok());
}

#[test]
fn test_amount_wider_than_field_rejected() {
    let mut source = FixtureSource::new(vec![PlannedTransaction {
        operation: OperationType::Credit,
        amount: dec("12345678901234567.89"),
        fee: dec("0"),
    }]);
    assert!(matches!(
        generate(Vec::<u8>::new(), &config(1), &mut source),
        Err(BatchError::AmountOverflow { field: "TrnAmt", .. })
    ));
}

#[test]
fn test_total_wider_than_field_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("batch.txt");
    let mut source = FixtureSource::new(vec![PlannedTransaction {
        operation: OperationType::Credit,
        amount: dec("6000000000000000.00"),
        fee: dec("0"),
    }]);

    let result = generate_file(&path, &config(2), &mut source);
    assert!(matches!(result, Err(BatchError::AmountOverflow { .. })));
    assert!(!path.exists());
    assert!(!dir.path().join("batch.txt.partial").exists());
}

// ==================== STATE MACHINE ====================

#[test]
fn test_trailer_before_any_transaction_is_zero() {
    let line = encode_trailer(&RunningTotals::new());
    assert_eq!(line.len(), 550);
    assert_eq!(&line[0..3], "T01");
    assert_eq!(&line[3..72], "0".repeat(69));
    assert!(line[72..].chars().all(|c| c == ' '));
}

#[test]
fn test_session_rejects_out_of_order_calls() {
    let header = config(0)
        .header
        .header_record(business_date().and_hms_opt(0, 0, 0).unwrap());
    let tx = TransactionRecord::new(
        OperationType::Credit,
        dec("1"),
        dec("0"),
        RecordEntropy::default(),
        &TransactionContext::new(business_date()),
    )
    .unwrap();

    let mut session = BatchFileSession::new(Vec::<u8>::new());
    assert!(matches!(
        session.write_transaction(&tx),
        Err(BatchError::OutOfSequence { .. })
    ));
    assert!(session.write_trailer().is_err());

    session.write_header(&header).unwrap();
    session.write_transaction(&tx).unwrap();
    session.write_trailer().unwrap();
    assert_eq!(session.state(), SessionState::TrailerWritten);

    assert!(session.write_transaction(&tx).is_err());
    assert_eq!(session.totals().count(), 1);
}

// ==================== FILES ====================

#[test]
fn test_generate_file_writes_final_name_only() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("batch.txt");

    let report = generate_file(&path, &config(10), &mut RandomSource::seeded(1)).unwrap();
    assert_eq!(report.records(), 10);
    assert!(path.exists());
    assert!(!dir.path().join("batch.txt.partial").exists());

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 12);
}

#[test]
fn test_generate_file_failure_removes_partial() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("batch.txt");
    let mut source = FixtureSource::new(vec![
        PlannedTransaction {
            operation: OperationType::Debit,
            amount: dec("5"),
            fee: dec("0"),
        },
        PlannedTransaction {
            operation: OperationType::Credit,
            amount: dec("-5"),
            fee: dec("0"),
        },
    ]);

    let result = generate_file(&path, &config(2), &mut source);
    assert!(matches!(result, Err(BatchError::NegativeAmount { .. })));
    assert!(!path.exists());
    assert!(!dir.path().join("batch.txt.partial").exists());
}

#[test]
fn test_generate_file_missing_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("batch.txt");
    assert!(matches!(
        generate_file(&path, &config(1), &mut RandomSource::seeded(1)),
        Err(BatchError::Io(_))
    ));
}

// ==================== CONCURRENCY ====================

#[test]
fn test_independent_sessions_in_parallel() {
    let handles: Vec<_> = (0..4u64)
        .map(|seed| {
            thread::spawn(move || {
                let count = 100 * (seed + 1);
                let mut source = RandomSource::seeded(seed);
                let (bytes, report) =
                    generate(Vec::<u8>::new(), &config(count), &mut source).unwrap();
                (count, String::from_utf8(bytes).unwrap(), report.trailer.total_sum)
            })
        })
        .collect();

    for handle in handles {
        let (count, text, total) = handle.join().unwrap();
        let parsed = parse(&text);
        assert_eq!(parsed.trailer_count, count);
        assert_eq!(parsed.trailer_total, total.value());
    }
}
