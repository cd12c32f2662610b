//! Remote IQ sample acquisition
//!
//! Runs `rx_samples_to_file` on the board, pulls the waveform file back,
//! cleans up both copies and returns the samples.

pub mod cfile;

use std::path::PathBuf;

use chrono::Utc;
use rustfft::num_complex::Complex64;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{AcquireConfig, MAX_NSAMPS};
use crate::remote::{RemoteError, RemoteShell};

pub use cfile::{parse_cfile, read_cfile};

/// Marker `rx_samples_to_file` prints on success
const DONE_MARKER: &str = "Done";

/// Acquisition failures
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("failed to acquire samples: `{command}` returned {output:?}")]
    CommandFailed { command: String, output: String },

    #[error("failed to retrieve {remote}")]
    RetrieveFailed { remote: String },

    #[error("waveform file length {len} is not a whole number of complex64 samples")]
    Truncated { len: usize },

    #[error("requested {requested} samples, must be between 1 and {}", MAX_NSAMPS)]
    InvalidSampleCount { requested: usize },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Command line that starts a capture on the board
pub fn capture_command(config: &AcquireConfig) -> String {
    format!(
        "{} --file={} --nsamps={} --cwgen-freq={} --cwgen-ampl={}",
        config.remote_exe,
        config.file_name,
        config.nsamps,
        config.cwgen_freq_hz,
        config.cwgen_ampl_scale
    )
}

/// Capture samples on the board and bring them back
pub async fn request_samples<S: RemoteShell>(
    shell: &S,
    config: &AcquireConfig,
) -> Result<Vec<Complex64>, AcquireError> {
    if config.nsamps == 0 || config.nsamps > MAX_NSAMPS {
        return Err(AcquireError::InvalidSampleCount {
            requested: config.nsamps,
        });
    }

    let started = Utc::now();
    let command = capture_command(config);
    info!("Requesting {} samples", config.nsamps);
    debug!("Capture command: {}", command);

    let output = shell.run(&command, config.capture_timeout).await?;
    if !output.contains(DONE_MARKER) {
        return Err(AcquireError::CommandFailed { command, output });
    }

    let remote = format!("{}/{}", shell.pwd().await?, config.file_name);
    let local = config.local_dir.join(&config.file_name);
    info!("Retrieving {} -> {}", remote, local.display());

    let retrieved = shell.get_file(&remote, &local).await?;
    if let Err(e) = shell.remove(&remote).await {
        warn!("Failed to remove {} on the board: {}", remote, e);
    }
    if !retrieved {
        return Err(AcquireError::RetrieveFailed { remote });
    }

    let samples = read_cfile(&local);
    if !config.keep_local {
        if let Err(e) = std::fs::remove_file(&local) {
            warn!("Failed to remove {}: {}", local.display(), e);
        }
    }
    let samples = samples?;

    info!(
        "Acquired {} samples in {} ms",
        samples.len(),
        (Utc::now() - started).num_milliseconds()
    );
    Ok(samples)
}
