//! `.cfile` waveform files
//!
//! Raw interleaved little-endian `f32` I/Q pairs, 8 bytes per sample, as
//! written by `rx_samples_to_file` (numpy `complex64`).

use std::path::Path;

use rustfft::num_complex::{Complex32, Complex64};

use super::AcquireError;

const BYTES_PER_SAMPLE: usize = 8;

/// Parse interleaved little-endian `f32` I/Q bytes
pub fn parse_cfile(bytes: &[u8]) -> Result<Vec<Complex32>, AcquireError> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(AcquireError::Truncated { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|chunk| {
            let re = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let im = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            Complex32::new(re, im)
        })
        .collect())
}

/// Read a `.cfile` and widen its samples to `f64`
pub fn read_cfile(path: &Path) -> Result<Vec<Complex64>, AcquireError> {
    let bytes = std::fs::read(path).map_err(|source| AcquireError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_cfile(&bytes)?
        .into_iter()
        .map(|s| Complex64::new(s.re as f64, s.im as f64))
        .collect())
}

/// Serialize samples in `.cfile` layout
pub fn to_cfile_bytes(samples: &[Complex32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for s in samples {
        bytes.extend_from_slice(&s.re.to_le_bytes());
        bytes.extend_from_slice(&s.im.to_le_bytes());
    }
    bytes
}
