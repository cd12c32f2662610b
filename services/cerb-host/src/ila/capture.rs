//! Validated parse of an ILA CSV capture
//!
//! Vivado exports ILA waveforms as comma-separated text:
//!
//! ```text
//! Sample in Buffer,Sample in Window,TRIGGER,rfdc_adc_m00_axis_tdata[127:0]  <- names
//! Radix - UNSIGNED,UNSIGNED,UNSIGNED,HEX                                    <- ignored
//! 0,0,1,00000000000000003FFF0000C0010000
//! ...
//! ```
//!
//! Everything structural is checked here, so the numeric decode never sees
//! a malformed row.

use std::io::BufRead;

use tracing::debug;

use super::error::{FormatReason, IlaError};
use crate::config::DecoderConfig;

/// Substring identifying the AXI-Stream data-bus column
const DATA_COLUMN_TAG: &str = "tdata";

/// One captured bus cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRow {
    /// 1-based line number in the capture text
    pub line: usize,

    /// Raw hex payload, MSB first, a whole number of rail words
    pub data_field: String,
}

impl CaptureRow {
    /// Validate one data line and extract its payload
    pub fn parse(
        line: usize,
        text: &str,
        data_column: usize,
        config: &DecoderConfig,
    ) -> Result<Self, IlaError> {
        let field = text
            .split(',')
            .nth(data_column)
            .map(|field| field.trim_end_matches('\r'))
            .ok_or_else(|| IlaError::Format {
                line,
                column: data_column,
                content: text.to_string(),
                reason: FormatReason::MissingField,
            })?;

        let reject = |reason| IlaError::Format {
            line,
            column: data_column,
            content: field.to_string(),
            reason,
        };

        if let Some(c) = field.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(reject(FormatReason::NonHex(c)));
        }

        let word_chars = config.word_chars();
        if field.len() % word_chars != 0 {
            return Err(reject(FormatReason::PartialWord {
                len: field.len(),
                word_chars,
            }));
        }

        let found = field.len() / word_chars;
        let expected = config.words_per_row();
        if found < expected {
            return Err(reject(FormatReason::TooFewWords { expected, found }));
        }

        Ok(Self {
            line,
            data_field: field.to_string(),
        })
    }

    /// Rail words in on-wire (left to right) order
    pub fn words(&self, word_chars: usize) -> impl DoubleEndedIterator<Item = &str> + '_ {
        // Payload is ASCII hex, so byte offsets are char boundaries
        (0..self.data_field.len())
            .step_by(word_chars)
            .map(move |start| &self.data_field[start..start + word_chars])
    }
}

/// A fully validated capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    /// Column names from header row 1
    pub columns: Vec<String>,

    /// Index of the data-bus column
    pub data_column: usize,

    /// Data rows in capture order
    pub rows: Vec<CaptureRow>,
}

impl CaptureFile {
    /// Name of the data-bus column
    pub fn data_column_name(&self) -> &str {
        &self.columns[self.data_column]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Index of the first column whose name contains "tdata", ignoring case
pub fn find_data_column<S: AsRef<str>>(columns: &[S]) -> Option<usize> {
    columns
        .iter()
        .position(|name| name.as_ref().to_lowercase().contains(DATA_COLUMN_TAG))
}

/// Parse and validate a capture without decoding any samples
pub fn parse_capture<R: BufRead>(
    reader: R,
    config: &DecoderConfig,
) -> Result<CaptureFile, IlaError> {
    config.validate()?;

    let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));

    let header = next_header(&mut lines, 1)?;
    let columns: Vec<String> = header.split(',').map(|s| s.trim().to_string()).collect();
    let data_column = match find_data_column(&columns) {
        Some(idx) => idx,
        None => return Err(IlaError::NoDataColumn { columns }),
    };
    debug!(
        "Data-bus column {} ({:?}) of {}",
        data_column,
        columns[data_column],
        columns.len()
    );

    // Vendor radix row
    next_header(&mut lines, 2)?;

    let mut rows = Vec::new();
    for (line, text) in lines {
        let text = text.map_err(|e| IlaError::io(None, e))?;
        if text.trim().is_empty() {
            continue;
        }
        rows.push(CaptureRow::parse(line, &text, data_column, config)?);
    }

    Ok(CaptureFile {
        columns,
        data_column,
        rows,
    })
}

fn next_header<I>(lines: &mut I, row: usize) -> Result<String, IlaError>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    match lines.next() {
        Some((_, Ok(text))) => Ok(text),
        Some((_, Err(e))) => Err(IlaError::io(None, e)),
        None => Err(IlaError::MissingHeader { row }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Sample in Buffer,Sample in Window,TRIGGER,m_axis_tdata[63:0]\n\
                          Radix - UNSIGNED,UNSIGNED,UNSIGNED,HEX\n";

    fn parse(text: &str) -> Result<CaptureFile, IlaError> {
        parse_capture(text.as_bytes(), &DecoderConfig::default())
    }

    #[test]
    fn test_find_data_column_case_insensitive() {
        assert_eq!(find_data_column(&["x", "TDATA"]), Some(1));
        assert_eq!(find_data_column(&["tdata"]), Some(0));
        assert_eq!(find_data_column(&["a", "b", "m_axis_tdata"]), Some(2));
        assert_eq!(find_data_column(&["tvalid", "tready"]), None);
    }

    #[test]
    fn test_first_matching_column_wins() {
        let text = "s_axis_tdata,m_axis_tdata\nHEX,HEX\n00000000000000000000000000000000,zz\n";
        let capture = parse(text).unwrap();
        assert_eq!(capture.data_column, 0);
        assert_eq!(capture.data_column_name(), "s_axis_tdata");
        assert_eq!(capture.len(), 1);
    }

    #[test]
    fn test_missing_data_column() {
        let text = "Sample in Buffer,TRIGGER\nUNSIGNED,UNSIGNED\n0,1\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, IlaError::NoDataColumn { ref columns } if columns.len() == 2));
        assert!(err.is_format());
    }

    #[test]
    fn test_missing_headers() {
        assert!(matches!(parse(""), Err(IlaError::MissingHeader { row: 1 })));
        assert!(matches!(
            parse("tdata\n"),
            Err(IlaError::MissingHeader { row: 2 })
        ));
    }

    #[test]
    fn test_header_only_capture_is_empty() {
        let capture = parse(HEADER).unwrap();
        assert!(capture.is_empty());
        assert_eq!(capture.data_column, 3);
    }

    #[test]
    fn test_rows_keep_line_numbers_and_skip_blank_lines() {
        let text = format!(
            "{HEADER}0,0,1,{a}\r\n\n1,1,0,{b}\n",
            a = "0".repeat(32),
            b = "F".repeat(32)
        );
        let capture = parse(&text).unwrap();
        assert_eq!(capture.len(), 2);
        assert_eq!(capture.rows[0].line, 3);
        assert_eq!(capture.rows[1].line, 5);
        assert_eq!(capture.rows[1].data_field, "F".repeat(32));
    }

    #[test]
    fn test_partial_word_rejected_with_line() {
        let text = format!("{HEADER}0,0,1,{}\n", "0".repeat(31));
        match parse(&text) {
            Err(IlaError::Format {
                line,
                column,
                reason,
                ..
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, 3);
                assert_eq!(
                    reason,
                    FormatReason::PartialWord {
                        len: 31,
                        word_chars: 4
                    }
                );
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_row_rejected() {
        let text = format!("{HEADER}0,0,1,{}\n", "0".repeat(12));
        match parse(&text) {
            Err(IlaError::Format { reason, .. }) => assert_eq!(
                reason,
                FormatReason::TooFewWords {
                    expected: 4,
                    found: 3
                }
            ),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_hex_rejected() {
        let text = format!(
            "{HEADER}0,0,1,{}\n1,1,0,00g1{}\n",
            "0".repeat(32),
            "0".repeat(28)
        );
        match parse(&text) {
            Err(IlaError::Format {
                line,
                content,
                reason,
                ..
            }) => {
                assert_eq!(line, 4);
                assert!(content.starts_with("00g1"));
                assert_eq!(reason, FormatReason::NonHex('g'));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_padded_field_rejected() {
        let text = format!("{HEADER}0,0,1, {} \n", "0".repeat(32));
        match parse(&text) {
            Err(IlaError::Format { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(reason, FormatReason::NonHex(' '));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_wide_bus_row_accepted() {
        let text = format!("{HEADER}0,0,1,{}\n", "0".repeat(28));
        let capture = parse(&text).unwrap();
        assert_eq!(capture.rows[0].data_field.len(), 28);
    }

    #[test]
    fn test_missing_field_rejected() {
        let text = format!("{HEADER}0,0\n");
        assert!(matches!(
            parse(&text),
            Err(IlaError::Format {
                reason: FormatReason::MissingField,
                ..
            })
        ));
    }

    #[test]
    fn test_words_split_left_to_right() {
        let row = CaptureRow {
            line: 3,
            data_field: "0001000200030004".to_string(),
        };
        let words: Vec<&str> = row.words(4).collect();
        assert_eq!(words, ["0001", "0002", "0003", "0004"]);
    }
}
