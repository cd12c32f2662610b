//! Centred power spectrum of a complex waveform

use rustfft::{num_complex::Complex64, FftPlanner};
use serde::Serialize;

/// Added to the magnitude before the log so empty bins stay finite
const DB_FLOOR: f64 = 1e-10;

/// Power spectrum with DC in the middle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spectrum {
    /// Bin centre frequencies in Hz, ascending
    pub frequency_hz: Vec<f64>,

    /// `20 log10(|X[k]| / N)` per bin
    pub power_db: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.power_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power_db.is_empty()
    }

    /// Strongest bin as `(frequency_hz, power_db)`
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.power_db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &p)| (self.frequency_hz[i], p))
    }
}

/// FFT the whole waveform, normalize by its length and centre DC
pub fn power_spectrum(samples: &[Complex64], sample_rate_hz: f64) -> Spectrum {
    let n = samples.len();
    if n == 0 {
        return Spectrum::default();
    }

    let mut buffer = samples.to_vec();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

    let scale = 1.0 / n as f64;
    let power_db = fft_shift(&buffer)
        .into_iter()
        .map(|x| 20.0 * ((x * scale).norm() + DB_FLOOR).log10())
        .collect();

    let half = (n / 2) as f64;
    let frequency_hz = (0..n)
        .map(|i| (i as f64 - half) * sample_rate_hz / n as f64)
        .collect();

    Spectrum {
        frequency_hz,
        power_db,
    }
}

/// Move the zero-frequency bin to the centre (odd lengths match numpy)
pub fn fft_shift<T: Clone>(spectrum: &[T]) -> Vec<T> {
    let n = spectrum.len();
    let mid = n - n / 2;
    let mut shifted = Vec::with_capacity(n);
    shifted.extend_from_slice(&spectrum[mid..]);
    shifted.extend_from_slice(&spectrum[..mid]);
    shifted
}
