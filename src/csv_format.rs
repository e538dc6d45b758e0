//! CSV reader and writer for transaction exports.
//!
//! Rows are kept as plain strings: the export layout is positional and no
//! column is looked up by name.

use crate::error::{Error, Result};
use crate::types::TabularRecordSet;
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use std::io::{Read, Write};

impl TabularRecordSet {
    /// Parse a record set from any source implementing `Read`.
    ///
    /// The header is read as an ordinary row. A row whose field count
    /// differs from the first one is rejected, as is any quoting error
    /// reported by [`check_quotes`].
    ///
    /// # Examples
    ///
    /// ```
    /// use satispay_csv_bot::TabularRecordSet;
    ///
    /// let mut input = "a,b\n1,\"2,5\"\n".as_bytes();
    /// let set = TabularRecordSet::from_read(&mut input)?;
    /// assert_eq!(set.rows[1][1], "2,5");
    /// # Ok::<(), satispay_csv_bot::Error>(())
    /// ```
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        check_quotes(&raw)?;

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .from_reader(raw.as_slice());

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(TabularRecordSet { rows })
    }

    /// Write the record set to any destination implementing `Write`.
    ///
    /// Fields are quoted only when they contain a delimiter, a quote or a
    /// line break. Any failure of the destination is reported as
    /// [`Error::Write`].
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);

        for row in &self.rows {
            csv_writer
                .write_record(row)
                .map_err(|e| Error::Write(e.to_string()))?;
        }

        csv_writer
            .flush()
            .map_err(|e| Error::Write(e.to_string()))?;
        Ok(())
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }
}

/// Strict quoting rules the `csv` reader does not enforce.
///
/// A quote may only open a field, a quoted field must be closed before the
/// end of input, and a closing quote must be followed by a delimiter or a
/// line break.
pub fn check_quotes(input: &[u8]) -> Result<()> {
    let mut line = 1;
    let mut field_start = true;
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'"' if field_start => {
                let opened = line;
                i += 1;
                loop {
                    match input.get(i) {
                        None => {
                            return Err(Error::Parse(format!(
                                "line {}: unterminated quoted field",
                                opened
                            )))
                        }
                        Some(b'"') if input.get(i + 1) == Some(&b'"') => i += 2,
                        Some(b'"') => break,
                        Some(b'\n') => {
                            line += 1;
                            i += 1;
                        }
                        Some(_) => i += 1,
                    }
                }
                // i sits on the closing quote
                match input.get(i + 1) {
                    None | Some(b',') | Some(b'\n') | Some(b'\r') => {}
                    Some(_) => {
                        return Err(Error::Parse(format!(
                            "line {}: extraneous \" after quoted field",
                            line
                        )))
                    }
                }
                field_start = false;
            }
            b'"' => {
                return Err(Error::Parse(format!(
                    "line {}: bare \" in non-quoted field",
                    line
                )))
            }
            b',' => field_start = true,
            b'\n' => {
                line += 1;
                field_start = true;
            }
            b'\r' => {}
            _ => field_start = false,
        }
        i += 1;
    }

    Ok(())
}
