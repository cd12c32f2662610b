//! Waveform presentation
//!
//! A [`Visualizer`] receives a decoded or acquired waveform together with its
//! sample rate. Plot rendering is left to external tools; the visualizers
//! here summarize to the log or export the traces and spectrum as JSON.

pub mod spectrum;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use rustfft::num_complex::Complex64;
use serde::Serialize;
use tracing::info;

pub use spectrum::{power_spectrum, Spectrum};

/// Samples shown in the time-domain traces by default
pub const DEFAULT_TRACE_LEN: usize = 1000;

/// Consumer of a complete waveform
pub trait Visualizer {
    fn render(&mut self, samples: &[Complex64], sample_rate_hz: f64) -> Result<()>;
}

/// Peak and RMS of the real and imaginary traces
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TraceStats {
    pub samples: usize,
    pub peak_re: f64,
    pub peak_im: f64,
    pub rms_re: f64,
    pub rms_im: f64,
}

impl TraceStats {
    pub fn from_samples(samples: &[Complex64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let (mut peak_re, mut peak_im, mut sum_re, mut sum_im) = (0f64, 0f64, 0f64, 0f64);
        for s in samples {
            peak_re = peak_re.max(s.re.abs());
            peak_im = peak_im.max(s.im.abs());
            sum_re += s.re * s.re;
            sum_im += s.im * s.im;
        }
        Self {
            samples: samples.len(),
            peak_re,
            peak_im,
            rms_re: (sum_re / n).sqrt(),
            rms_im: (sum_im / n).sqrt(),
        }
    }
}

/// Leading slice of the waveform shown as time-domain traces
fn trace(samples: &[Complex64], len: usize) -> &[Complex64] {
    &samples[..len.min(samples.len())]
}

/// Logs trace statistics and the spectral peak
#[derive(Debug, Clone)]
pub struct LogVisualizer {
    pub trace_len: usize,
}

impl Default for LogVisualizer {
    fn default() -> Self {
        Self {
            trace_len: DEFAULT_TRACE_LEN,
        }
    }
}

impl Visualizer for LogVisualizer {
    fn render(&mut self, samples: &[Complex64], sample_rate_hz: f64) -> Result<()> {
        let stats = TraceStats::from_samples(trace(samples, self.trace_len));
        info!("Complex waveform: {} samples", samples.len());
        info!(
            "  Real trace ({} samples): peak {:.5}, rms {:.5}",
            stats.samples, stats.peak_re, stats.rms_re
        );
        info!(
            "  Imag trace ({} samples): peak {:.5}, rms {:.5}",
            stats.samples, stats.peak_im, stats.rms_im
        );

        if let Some((freq, power)) = power_spectrum(samples, sample_rate_hz).peak() {
            info!(
                "  Spectrum peak: {:.3} MHz at {:.1} dB",
                freq / 1e6,
                power
            );
        }
        Ok(())
    }
}

/// Waveform export document
#[derive(Debug, Serialize)]
struct WaveformExport {
    generated_at: String,
    sample_rate_hz: f64,
    samples: usize,
    stats: TraceStats,
    real: Vec<f64>,
    imag: Vec<f64>,
    #[serde(flatten)]
    spectrum: Spectrum,
}

/// Writes traces and power spectrum to a JSON file for external plotting
#[derive(Debug, Clone)]
pub struct JsonExporter {
    pub path: PathBuf,
    pub trace_len: usize,
}

impl JsonExporter {
    pub fn new(path: PathBuf, trace_len: usize) -> Self {
        Self { path, trace_len }
    }
}

impl Visualizer for JsonExporter {
    fn render(&mut self, samples: &[Complex64], sample_rate_hz: f64) -> Result<()> {
        let shown = trace(samples, self.trace_len);
        let export = WaveformExport {
            generated_at: Utc::now().to_rfc3339(),
            sample_rate_hz,
            samples: samples.len(),
            stats: TraceStats::from_samples(shown),
            real: shown.iter().map(|s| s.re).collect(),
            imag: shown.iter().map(|s| s.im).collect(),
            spectrum: power_spectrum(samples, sample_rate_hz),
        };

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &export)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        info!("Exported waveform to {}", self.path.display());
        Ok(())
    }
}
