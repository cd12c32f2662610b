//! ILA rail-word unpacking
//!
//! Each bus cycle carries `samples_per_cycle` complex samples as
//! `2 * samples_per_cycle` signed big-endian rail words. The ILA prints the
//! most recent rail word first, so the words of a row are reversed before
//! pairing them into I/Q samples:
//!
//! ```text
//! on wire:   0001 0002 0003 0004
//! reversed:  0004 0003 0002 0001
//! samples:   (4 + 3i) (2 + 1i)
//! ```
//!
//! When the probed bus is wider than one cycle of samples, only the first
//! `2 * samples_per_cycle` words after reversal are used; the leading
//! on-wire words belong to lanes this decoder does not unpack.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rustfft::num_complex::Complex64;
use tracing::{debug, info};

use super::capture::{parse_capture, CaptureFile, CaptureRow};
use super::error::{FormatReason, IlaError};
use crate::config::DecoderConfig;

/// Decode an ILA capture into complex samples
///
/// Either every row decodes and the full waveform is returned, or the first
/// malformed row aborts the call.
pub fn decode<R: BufRead>(reader: R, config: &DecoderConfig) -> Result<Vec<Complex64>, IlaError> {
    let capture = parse_capture(reader, config)?;
    decode_capture(&capture, config)
}

/// Open and decode an ILA capture file
pub fn decode_file<P: AsRef<Path>>(
    path: P,
    config: &DecoderConfig,
) -> Result<Vec<Complex64>, IlaError> {
    let path = path.as_ref();
    info!("Reading ILA capture {}", path.display());

    let file = File::open(path).map_err(|e| IlaError::io(Some(path.to_path_buf()), e))?;
    let capture = parse_capture(BufReader::new(file), config).map_err(|e| e.with_path(path))?;
    let samples = decode_capture(&capture, config)?;

    info!(
        "Decoded {} samples from {} rows of {:?}",
        samples.len(),
        capture.len(),
        capture.data_column_name()
    );
    Ok(samples)
}

/// Decode the rows of an already validated capture
pub fn decode_capture(
    capture: &CaptureFile,
    config: &DecoderConfig,
) -> Result<Vec<Complex64>, IlaError> {
    config.validate()?;

    let mut samples = Vec::with_capacity(capture.len() * config.samples_per_cycle);
    for row in &capture.rows {
        decode_row(row, capture.data_column, config, &mut samples)?;
    }
    debug!("Unpacked {} rows", capture.len());
    Ok(samples)
}

/// Decode one bus cycle, appending its samples in chronological order
fn decode_row(
    row: &CaptureRow,
    column: usize,
    config: &DecoderConfig,
    out: &mut Vec<Complex64>,
) -> Result<(), IlaError> {
    let bits = config.data_width_bits;
    let word_chars = config.word_chars();
    let reject = |reason| IlaError::Format {
        line: row.line,
        column,
        content: row.data_field.clone(),
        reason,
    };

    // Rows built by hand skip the capture parser's checks
    if let Some(c) = row.data_field.chars().find(|c| !c.is_ascii()) {
        return Err(reject(FormatReason::NonHex(c)));
    }
    if row.data_field.len() % word_chars != 0 {
        return Err(reject(FormatReason::PartialWord {
            len: row.data_field.len(),
            word_chars,
        }));
    }
    let found = row.data_field.len() / word_chars;
    let expected = config.words_per_row();
    if found < expected {
        return Err(reject(FormatReason::TooFewWords { expected, found }));
    }

    let values = row
        .words(word_chars)
        .rev()
        .take(config.words_per_row())
        .map(|word| decode_word(word, bits).map(|v| normalize(v, bits)))
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| reject(hex_reason(e, row.data_field.len(), word_chars)))?;

    out.extend(
        values
            .chunks_exact(2)
            .map(|pair| Complex64::new(pair[0], pair[1])),
    );
    Ok(())
}

fn hex_reason(err: hex::FromHexError, len: usize, word_chars: usize) -> FormatReason {
    match err {
        hex::FromHexError::InvalidHexCharacter { c, .. } => FormatReason::NonHex(c),
        _ => FormatReason::PartialWord { len, word_chars },
    }
}

/// Decode one big-endian two's-complement rail word of `bits` bits
pub fn decode_word(word: &str, bits: u32) -> Result<i32, hex::FromHexError> {
    let bytes = hex::decode(word)?;
    if bits == 0 || bits > 32 || bytes.len() * 8 != bits as usize {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let raw = bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
    let shift = 32 - bits;
    Ok(((raw << shift) as i32) >> shift)
}

/// Scale a signed rail value into [-1, 1)
pub fn normalize(value: i32, bits: u32) -> f64 {
    value as f64 / (1u64 << (bits - 1)) as f64
}

/// Quantize a normalized value into a `bits`-wide hex rail word
pub fn encode_word(value: f64, bits: u32) -> String {
    let full_scale = (1i64 << (bits - 1)) as f64;
    let max = (1i64 << (bits - 1)) - 1;
    let min = -(1i64 << (bits - 1));
    let fixed = ((value * full_scale).round() as i64).clamp(min, max);
    let mask = (1u64 << bits) - 1;
    format!(
        "{:0width$X}",
        fixed as u64 & mask,
        width = bits as usize / 4
    )
}

/// Build the on-wire hex field for one bus cycle of samples
pub fn encode_row(samples: &[Complex64], bits: u32) -> String {
    let words: Vec<String> = samples
        .iter()
        .flat_map(|s| [encode_word(s.re, bits), encode_word(s.im, bits)])
        .collect();
    words.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Sample in Buffer,Sample in Window,TRIGGER,rfdc_adc_m00_axis_tdata[63:0]\n\
                          Radix - UNSIGNED,UNSIGNED,UNSIGNED,HEX\n";

    fn capture_text(fields: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for (i, field) in fields.iter().enumerate() {
            text.push_str(&format!("{i},{i},0,{field}\n"));
        }
        text
    }

    #[test]
    fn test_decode_word_boundaries() {
        assert_eq!(decode_word("0000", 16).unwrap(), 0);
        assert_eq!(decode_word("7FFF", 16).unwrap(), 32767);
        assert_eq!(decode_word("8000", 16).unwrap(), -32768);
        assert_eq!(decode_word("FFFF", 16).unwrap(), -1);
        assert_eq!(decode_word("ffff", 16).unwrap(), -1);
        assert_eq!(decode_word("80000000", 32).unwrap(), i32::MIN);
        assert_eq!(decode_word("FF", 8).unwrap(), -1);
        assert!(decode_word("FF", 16).is_err());
    }

    #[test]
    fn test_normalized_boundaries() {
        assert_eq!(normalize(decode_word("0000", 16).unwrap(), 16), 0.0);
        assert_eq!(normalize(decode_word("7FFF", 16).unwrap(), 16), 32767.0 / 32768.0);
        assert_eq!(normalize(decode_word("8000", 16).unwrap(), 16), -1.0);
        assert_eq!(normalize(decode_word("FFFF", 16).unwrap(), 16), -1.0 / 32768.0);
    }

    // The reversal below is tied to the RFDC ILA export format: the most
    // recent rail word is printed first. A different capture tool version
    // would need its own ordering test.
    #[test]
    fn test_row_words_reversed_before_pairing() {
        let row = CaptureRow {
            line: 3,
            data_field: "0001000200030004".to_string(),
        };
        let raw: Vec<i32> = row
            .words(4)
            .rev()
            .map(|w| decode_word(w, 16).unwrap())
            .collect();
        assert_eq!(raw, [4, 3, 2, 1]);

        let text = capture_text(&["0001000200030004"]);
        let samples = decode(text.as_bytes(), &DecoderConfig::default()).unwrap();
        let scale = 32768.0;
        assert_eq!(
            samples,
            [
                Complex64::new(4.0 / scale, 3.0 / scale),
                Complex64::new(2.0 / scale, 1.0 / scale)
            ]
        );
    }

    #[test]
    fn test_single_row_capture_yields_two_samples() {
        // 128-bit tdata: the trailing on-wire words hold this cycle's samples
        let text = capture_text(&["7FFF8000FFFF00000001000200030004"]);
        let samples = decode(text.as_bytes(), &DecoderConfig::default()).unwrap();
        let scale = 32768.0;
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], Complex64::new(4.0 / scale, 3.0 / scale));
        assert_eq!(samples[1], Complex64::new(2.0 / scale, 1.0 / scale));
    }

    #[test]
    fn test_four_samples_per_cycle() {
        let text = capture_text(&["7FFF8000FFFF00000001000200030004"]);
        let config = DecoderConfig {
            samples_per_cycle: 4,
            ..Default::default()
        };
        let samples = decode(text.as_bytes(), &config).unwrap();
        let scale = 32768.0;
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[2], Complex64::new(0.0, -1.0 / scale));
        assert_eq!(samples[3], Complex64::new(-1.0, 32767.0 / scale));
    }

    #[test]
    fn test_sample_count_is_rows_times_samples_per_cycle() {
        let rows = ["0".repeat(16), "F".repeat(32), "7FFF".repeat(4)];
        let fields: Vec<&str> = rows.iter().map(String::as_str).collect();
        let text = capture_text(&fields);
        let samples = decode(text.as_bytes(), &DecoderConfig::default()).unwrap();
        assert_eq!(samples.len(), 2 * rows.len());
        assert!(samples
            .iter()
            .all(|s| (-1.0..1.0).contains(&s.re) && (-1.0..1.0).contains(&s.im)));
    }

    #[test]
    fn test_32_bit_rails() {
        let text = capture_text(&["00000001FFFFFFFF8000000000000000"]);
        let config = DecoderConfig {
            data_width_bits: 32,
            ..Default::default()
        };
        let samples = decode(text.as_bytes(), &config).unwrap();
        let scale = 2f64.powi(31);
        assert_eq!(samples[0], Complex64::new(0.0, -1.0));
        assert_eq!(samples[1], Complex64::new(-1.0 / scale, 1.0 / scale));
    }

    #[test]
    fn test_malformed_row_returns_no_samples() {
        let good = "0".repeat(16);
        let text = capture_text(&[&good, &good, "00000"]);
        match decode(text.as_bytes(), &DecoderConfig::default()) {
            Err(IlaError::Format { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_hand_built_row_is_checked() {
        let capture = CaptureFile {
            columns: vec!["tdata".to_string()],
            data_column: 0,
            rows: vec![CaptureRow {
                line: 7,
                data_field: "00010002000300g4".to_string(),
            }],
        };
        match decode_capture(&capture, &DecoderConfig::default()) {
            Err(IlaError::Format { line, reason, .. }) => {
                assert_eq!(line, 7);
                assert_eq!(reason, FormatReason::NonHex('g'));
            }
            other => panic!("expected format error, got {other:?}"),
        }

        let short = CaptureFile {
            rows: vec![CaptureRow {
                line: 9,
                data_field: "00010002".to_string(),
            }],
            ..capture
        };
        match decode_capture(&short, &DecoderConfig::default()) {
            Err(IlaError::Format { line, reason, .. }) => {
                assert_eq!(line, 9);
                assert_eq!(
                    reason,
                    FormatReason::TooFewWords {
                        expected: 4,
                        found: 2
                    }
                );
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_round_trip() {
        let bits = 16;
        for sample in [
            Complex64::new(0.5, -0.25),
            Complex64::new(-1.0, 32767.0 / 32768.0),
            Complex64::new(0.0, -1.0 / 32768.0),
        ] {
            let pair = [sample, Complex64::new(0.125, 0.0)];
            let field = encode_row(&pair, bits);
            assert_eq!(field.len(), 16);
            let text = capture_text(&[&field]);
            let decoded = decode(text.as_bytes(), &DecoderConfig::default()).unwrap();
            for (got, want) in decoded.iter().zip(pair.iter()) {
                assert!((got - want).norm() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_encode_word_saturates() {
        assert_eq!(encode_word(1.0, 16), "7FFF");
        assert_eq!(encode_word(-1.0, 16), "8000");
        assert_eq!(encode_word(-2.0, 16), "8000");
        assert_eq!(encode_word(-1.0 / 32768.0, 16), "FFFF");
    }

    #[test]
    fn test_decode_file_missing_is_resource_error() {
        let err = decode_file("/nonexistent/rfdc_adc_ila_data.csv", &DecoderConfig::default())
            .unwrap_err();
        assert!(matches!(err, IlaError::Resource { path: Some(_), .. }));
        assert!(!err.is_format());
    }

    #[test]
    fn test_decode_file_reads_capture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            capture_text(&["0001000200030004"]).as_bytes(),
        )
        .unwrap();
        let samples = decode_file(file.path(), &DecoderConfig::default()).unwrap();
        assert_eq!(samples.len(), 2);
    }
}
