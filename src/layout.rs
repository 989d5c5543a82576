//! Fixed-width field layout for the three record kinds.
//!
//! Every record is a single line whose fields occupy fixed offsets. Text
//! fields are left-aligned and space-padded; numeric fields are right-aligned
//! and zero-padded. Values wider than their field are cut on the right so the
//! line length never changes.
//!
//! All three kinds share a line width of 550 bytes in this layout.

use crate::error::{BatchError, Result};
use log::warn;

/// Horizontal alignment of a value inside its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Semantic type of a field's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, left-aligned, space-padded.
    Text,
    /// Plain integer, right-aligned, zero-padded.
    ZeroPadded,
    /// Implied-decimal amount in minor units, right-aligned, zero-padded.
    MinorUnits,
}

/// Position and encoding of one field within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub width: usize,
    pub align: Align,
    pub pad: char,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Left-aligned, space-padded text field.
    pub const fn text(name: &'static str, width: usize) -> Self {
        FieldSpec {
            name,
            width,
            align: Align::Left,
            pad: ' ',
            kind: FieldKind::Text,
        }
    }

    /// Right-aligned, zero-padded integer field.
    pub const fn zero_padded(name: &'static str, width: usize) -> Self {
        FieldSpec {
            name,
            width,
            align: Align::Right,
            pad: '0',
            kind: FieldKind::ZeroPadded,
        }
    }

    /// Right-aligned, zero-padded minor-unit amount field.
    pub const fn minor_units(name: &'static str, width: usize) -> Self {
        FieldSpec {
            name,
            width,
            align: Align::Right,
            pad: '0',
            kind: FieldKind::MinorUnits,
        }
    }

    /// Appends `value` to `out`, padded or truncated to exactly `width` bytes.
    ///
    /// Non-ASCII characters are replaced with `?` so that character and byte
    /// widths agree.
    pub fn encode_into(&self, value: &str, out: &mut String) {
        let mut written = 0;
        let mut body = String::with_capacity(self.width);
        for c in value.chars() {
            if written == self.width {
                warn!(
                    "Value {:?} exceeds width {} of field {}, truncated",
                    value, self.width, self.name
                );
                break;
            }
            body.push(if c.is_ascii() { c } else { '?' });
            written += 1;
        }

        let padding = self.width - written;
        match self.align {
            Align::Left => {
                out.push_str(&body);
                out.extend(std::iter::repeat(self.pad).take(padding));
            }
            Align::Right => {
                out.extend(std::iter::repeat(self.pad).take(padding));
                out.push_str(&body);
            }
        }
    }

    /// Encodes `value` into a new string of exactly `width` bytes.
    pub fn encode(&self, value: &str) -> String {
        let mut out = String::with_capacity(self.width);
        self.encode_into(value, &mut out);
        out
    }
}

/// Header record: `H01` tag, timestamps and file identification.
pub const HEADER_FIELDS: [FieldSpec; 7] = [
    FieldSpec::text("RecType", 3),
    FieldSpec::text("SysDt", 33),
    FieldSpec::text("BusinessDt", 10),
    FieldSpec::text("SrcAppId", 5),
    FieldSpec::text("FileType", 8),
    FieldSpec::text("FileSeqNum", 6),
    FieldSpec::text("Filler", 485),
];

/// Transaction detail record. Untagged; identified by position in the file.
pub const TRANSACTION_FIELDS: [FieldSpec; 20] = [
    FieldSpec::text("SrcUID", 40),
    FieldSpec::text("RqUID", 47),
    FieldSpec::text("OperationType", 2),
    FieldSpec::text("OperationCode", 2),
    FieldSpec::text("SubOperationCode", 4),
    FieldSpec::text("UserId", 8),
    FieldSpec::text("TerminalId", 8),
    FieldSpec::text("ValueDt", 10),
    FieldSpec::text("Concept1", 45),
    FieldSpec::text("Concept2", 55),
    FieldSpec::zero_padded("AcctId", 10),
    FieldSpec::minor_units("TrnAmt", 18),
    FieldSpec::minor_units("FeeAmt", 18),
    FieldSpec::text("SvcBranchId", 4),
    FieldSpec::text("AuthUserId", 15),
    FieldSpec::text("AuthLevel", 3),
    FieldSpec::text("ExtAcctDt", 10),
    FieldSpec::text("UseSvcBranch", 1),
    FieldSpec::text("ICA", 3),
    FieldSpec::text("Filler", 247),
];

/// Trailer record: `T01` tag, record count and reconciled totals.
pub const TRAILER_FIELDS: [FieldSpec; 6] = [
    FieldSpec::text("RecType", 3),
    FieldSpec::zero_padded("TotalRec", 15),
    FieldSpec::minor_units("TotalSum", 18),
    FieldSpec::minor_units("TotalDebitSum", 18),
    FieldSpec::minor_units("TotalCreditSum", 18),
    FieldSpec::text("Filler", 478),
];

/// Record type tag of the header line.
pub const HEADER_TAG: &str = "H01";

/// Record type tag of the trailer line.
pub const TRAILER_TAG: &str = "T01";

/// The three record kinds of a batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Header,
    Transaction,
    Trailer,
}

impl RecordKind {
    /// Ordered field layout of this kind.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            RecordKind::Header => &HEADER_FIELDS,
            RecordKind::Transaction => &TRANSACTION_FIELDS,
            RecordKind::Trailer => &TRAILER_FIELDS,
        }
    }

    /// Lowercase name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::Header => "header",
            RecordKind::Transaction => "transaction",
            RecordKind::Trailer => "trailer",
        }
    }

    /// Total line width in bytes, excluding the newline.
    pub fn line_width(&self) -> usize {
        self.fields().iter().map(|f| f.width).sum()
    }

    /// Index of the named field.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }

    /// Classifies a line by its leading record tag.
    ///
    /// Transaction lines carry no tag, so anything that is not a header or
    /// trailer is treated as a transaction.
    pub fn classify(line: &str) -> RecordKind {
        if line.starts_with(HEADER_TAG) {
            RecordKind::Header
        } else if line.starts_with(TRAILER_TAG) {
            RecordKind::Trailer
        } else {
            RecordKind::Transaction
        }
    }

    /// Encodes one value per field into a fixed-width line.
    pub fn encode(&self, values: &[&str]) -> String {
        let fields = self.fields();
        debug_assert_eq!(
            values.len(),
            fields.len(),
            "{} record expects {} values",
            self.name(),
            fields.len()
        );

        let mut line = String::with_capacity(self.line_width());
        for (spec, value) in fields.iter().zip(values) {
            spec.encode_into(value, &mut line);
        }
        line
    }

    /// Slices a line back into its padded field strings.
    pub fn split<'a>(&self, line: &'a str) -> Result<Vec<&'a str>> {
        if line.len() != self.line_width() {
            return Err(BatchError::MalformedLine {
                kind: self.name(),
                message: format!(
                    "expected {} bytes, found {}",
                    self.line_width(),
                    line.len()
                ),
            });
        }

        let mut offset = 0;
        let mut values = Vec::with_capacity(self.fields().len());
        for spec in self.fields() {
            let end = offset + spec.width;
            let value = line
                .get(offset..end)
                .ok_or_else(|| BatchError::MalformedLine {
                    kind: self.name(),
                    message: format!("field {} is not valid ASCII", spec.name),
                })?;
            values.push(value);
            offset = end;
        }
        Ok(values)
    }
}
