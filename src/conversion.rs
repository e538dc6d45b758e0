//! Field rewriting for Satispay exports.
//!
//! Every data row gets its date turned into `day/month/year`, its amount
//! switched to a period decimal separator and its description stripped of
//! commas. The header row is passed through untouched.

use crate::error::{Error, Result};
use crate::types::{TabularRecordSet, AMOUNT_FIELD, DATE_FIELD, DESCRIPTION_FIELD, MIN_FIELDS};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Month abbreviations as they appear in exports.
///
/// The scan in [`format_date`] starts at index 1, so "Gen" never matches.
pub const MONTHS: [&str; 12] = [
    "Gen", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Rewrite a textual date such as `15 Mar 2023 at 10:00` into `15/3/2023`.
///
/// Returns an empty string when no month abbreviation is found.
pub fn format_date(date: &str) -> String {
    let Some((index, month)) = MONTHS
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, m)| date.contains(**m))
    else {
        return String::new();
    };

    let mut formatted = date.replace(*month, &format!("/{}/", index + 1));
    if let Some(cut) = formatted.find("at") {
        formatted.truncate(cut);
    }
    formatted.replace(' ', "")
}

/// `" 1,50  "` becomes `"1.50"`.
pub fn normalize_amount(amount: &str) -> String {
    amount.replace(',', ".").trim().to_string()
}

/// Replace commas so the description can't be mistaken for two fields.
pub fn sanitize_description(description: &str) -> String {
    description.replace(',', ".")
}

impl TabularRecordSet {
    /// Apply the field rewrites to every data row.
    ///
    /// Fails on the first row shorter than [`MIN_FIELDS`]; rows before it
    /// may already be rewritten, so the set should be discarded on error.
    pub fn normalize(&mut self) -> Result<()> {
        for (row, fields) in self.data_rows_mut() {
            if fields.len() < MIN_FIELDS {
                return Err(Error::ShortRow {
                    row,
                    fields: fields.len(),
                    expected: MIN_FIELDS,
                });
            }

            fields[DATE_FIELD] = format_date(&fields[DATE_FIELD]);
            fields[AMOUNT_FIELD] = normalize_amount(&fields[AMOUNT_FIELD]);
            fields[DESCRIPTION_FIELD] = sanitize_description(&fields[DESCRIPTION_FIELD]);
            debug!(row, fields = ?fields, "converted row");
        }
        Ok(())
    }
}

/// Convert an in-memory export.
pub fn transform_bytes(input: &[u8]) -> Result<Vec<u8>> {
    let mut reader = input;
    let mut set = TabularRecordSet::from_read(&mut reader)?;
    set.normalize()?;
    debug!(rows = set.data_len(), "converted export");
    set.to_bytes()
}

/// Convert `input` and write the result to `output`.
///
/// Nothing reaches `output` unless the whole input converted.
pub fn transform<R: Read, W: Write>(mut input: R, mut output: W) -> Result<()> {
    let mut raw = Vec::new();
    input.read_to_end(&mut raw)?;

    let converted = transform_bytes(&raw)?;
    output
        .write_all(&converted)
        .and_then(|_| output.flush())
        .map_err(|e| Error::Write(e.to_string()))
}

/// Convert `input` into a new file at `path`.
///
/// The file is created only after a successful conversion.
pub fn convert_to_file(input: &[u8], path: &Path) -> Result<()> {
    let converted = transform_bytes(input)?;
    fs::write(path, converted).map_err(|e| Error::Write(format!("{}: {}", path.display(), e)))
}
