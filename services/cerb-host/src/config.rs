//! Configuration with documented defaults and environment overrides

use std::path::PathBuf;
use std::time::Duration;

use crate::ila::IlaError;

/// Default ILA capture sample rate (RFDC AXI-Stream clock x samples per cycle)
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 500e6;

/// Default rail width in bits
pub const DEFAULT_DATA_WIDTH_BITS: u32 = 16;

/// Default complex samples per captured bus cycle
pub const DEFAULT_SAMPLES_PER_CYCLE: usize = 2;

/// Most samples `rx_samples_to_file` will produce in one capture
pub const MAX_NSAMPS: usize = 1 << 20;

/// ILA decoder parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Sample rate of the decoded waveform in Hz
    pub sample_rate_hz: f64,

    /// Width of one rail word in bits (16 in every observed capture)
    pub data_width_bits: u32,

    /// Complex samples packed into one bus cycle
    pub samples_per_cycle: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            data_width_bits: DEFAULT_DATA_WIDTH_BITS,
            samples_per_cycle: DEFAULT_SAMPLES_PER_CYCLE,
        }
    }
}

impl DecoderConfig {
    /// Load decoder configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sample_rate_hz: env_parse("CERB_SAMPLE_RATE_HZ").unwrap_or(defaults.sample_rate_hz),
            data_width_bits: env_parse("CERB_DATA_WIDTH_BITS").unwrap_or(defaults.data_width_bits),
            samples_per_cycle: env_parse("CERB_SAMPLES_PER_CYCLE")
                .unwrap_or(defaults.samples_per_cycle),
        }
    }

    /// Reject parameter combinations the decoder cannot honour
    pub fn validate(&self) -> Result<(), IlaError> {
        if self.data_width_bits == 0 || self.data_width_bits % 8 != 0 || self.data_width_bits > 32 {
            return Err(IlaError::Config(format!(
                "data width must be 8, 16, 24 or 32 bits, got {}",
                self.data_width_bits
            )));
        }
        if self.samples_per_cycle == 0 {
            return Err(IlaError::Config(
                "samples per cycle must be at least 1".to_string(),
            ));
        }
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(IlaError::Config(format!(
                "sample rate must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        Ok(())
    }

    /// Hex characters per rail word
    pub fn word_chars(&self) -> usize {
        self.data_width_bits as usize / 4
    }

    /// Rail words per bus cycle (I and Q for every sample)
    pub fn words_per_row(&self) -> usize {
        self.samples_per_cycle * 2
    }

    /// Shortest hex field holding one bus cycle of samples
    pub fn min_row_chars(&self) -> usize {
        self.words_per_row() * self.word_chars()
    }
}

/// Remote shell connection settings
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Board address
    pub host: String,

    /// Login user
    pub user: String,

    /// Login password; `None` relies on key-based authentication
    pub password: Option<String>,

    /// Default timeout for a single remote command
    pub command_timeout: Duration,

    /// Prefix prepended to every remote command (e.g. `sudo `)
    pub command_prefix: String,

    /// `ssh` client executable
    pub ssh_path: PathBuf,

    /// `scp` client executable
    pub scp_path: PathBuf,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "10.21.154.71".to_string(),
            user: "root".to_string(),
            password: Some("root".to_string()),
            command_timeout: Duration::from_secs(2),
            command_prefix: String::new(),
            ssh_path: PathBuf::from("ssh"),
            scp_path: PathBuf::from("scp"),
        }
    }
}

impl RemoteConfig {
    /// Load remote configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("CERB_HOST").unwrap_or(defaults.host),
            user: std::env::var("CERB_USER").unwrap_or(defaults.user),
            // An empty CERB_PASSWORD selects key-based authentication
            password: match std::env::var("CERB_PASSWORD") {
                Ok(p) if p.is_empty() => None,
                Ok(p) => Some(p),
                Err(_) => defaults.password,
            },
            command_timeout: env_parse("CERB_TIMEOUT_SECS")
                .map(Duration::from_secs_f64)
                .unwrap_or(defaults.command_timeout),
            command_prefix: std::env::var("CERB_CMD_PREFIX").unwrap_or(defaults.command_prefix),
            ssh_path: std::env::var("CERB_SSH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ssh_path),
            scp_path: std::env::var("CERB_SCP")
                .map(PathBuf::from)
                .unwrap_or(defaults.scp_path),
        }
    }

    /// `user@host` destination string
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// Sample acquisition settings
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Executable started on the board
    pub remote_exe: String,

    /// Waveform file name written in the remote working directory
    pub file_name: String,

    /// Requested number of complex samples
    pub nsamps: usize,

    /// CW generator baseband frequency
    pub cwgen_freq_hz: f64,

    /// CW generator power-of-2 amplitude scale
    pub cwgen_ampl_scale: u32,

    /// Timeout for the capture command (outlasts the default command timeout)
    pub capture_timeout: Duration,

    /// Local directory the waveform file is fetched into
    pub local_dir: PathBuf,

    /// Keep the fetched file instead of deleting it after loading
    pub keep_local: bool,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            remote_exe: "rx_samples_to_file".to_string(),
            file_name: "rx_samples_to_file.cfile".to_string(),
            nsamps: 1 << 16,
            cwgen_freq_hz: 50e6,
            cwgen_ampl_scale: 0,
            capture_timeout: Duration::from_secs(30),
            local_dir: std::env::temp_dir(),
            keep_local: false,
        }
    }
}

impl AcquireConfig {
    /// Load acquisition configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            remote_exe: std::env::var("CERB_REMOTE_EXE").unwrap_or(defaults.remote_exe),
            file_name: std::env::var("CERB_REMOTE_FILE").unwrap_or(defaults.file_name),
            nsamps: env_parse("CERB_NSAMPS").unwrap_or(defaults.nsamps),
            cwgen_freq_hz: env_parse("CERB_CWGEN_FREQ_HZ").unwrap_or(defaults.cwgen_freq_hz),
            cwgen_ampl_scale: env_parse("CERB_CWGEN_AMPL").unwrap_or(defaults.cwgen_ampl_scale),
            capture_timeout: env_parse("CERB_CAPTURE_TIMEOUT_SECS")
                .map(Duration::from_secs_f64)
                .unwrap_or(defaults.capture_timeout),
            local_dir: std::env::var("CERB_LOCAL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_dir),
            keep_local: defaults.keep_local,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
