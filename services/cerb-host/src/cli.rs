//! Command line arguments

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use crate::config::{AcquireConfig, DecoderConfig, RemoteConfig};
use crate::viz::DEFAULT_TRACE_LEN;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less output (-q warnings only, -qq errors only)
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "verbose")]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode an RFDC ILA CSV export into IQ samples
    Ila(IlaArgs),
    /// Capture IQ samples on the board and fetch them
    Acquire(AcquireArgs),
}

/// Presentation options shared by both subcommands
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Samples shown in the time-domain traces
    #[arg(long, default_value_t = DEFAULT_TRACE_LEN)]
    pub trace_len: usize,

    /// Write traces and power spectrum as JSON
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct IlaArgs {
    /// ILA CSV export (e.g. rfdc_adc_ila_data.csv)
    pub file: PathBuf,

    /// Waveform sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Rail word width in bits
    #[arg(long)]
    pub data_width: Option<u32>,

    /// Complex samples per captured bus cycle
    #[arg(long)]
    pub samples_per_cycle: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl IlaArgs {
    /// Environment configuration with command line overrides applied
    pub fn decoder_config(&self) -> DecoderConfig {
        let env = DecoderConfig::from_env();
        DecoderConfig {
            sample_rate_hz: self.sample_rate.unwrap_or(env.sample_rate_hz),
            data_width_bits: self.data_width.unwrap_or(env.data_width_bits),
            samples_per_cycle: self.samples_per_cycle.unwrap_or(env.samples_per_cycle),
        }
    }
}

#[derive(Args, Debug)]
pub struct AcquireArgs {
    /// Board address
    #[arg(long)]
    pub host: Option<String>,

    /// Login user
    #[arg(long)]
    pub user: Option<String>,

    /// Login password (empty for key-based auth)
    #[arg(long)]
    pub password: Option<String>,

    /// Requested number of complex samples
    #[arg(short, long)]
    pub nsamps: Option<usize>,

    /// CW generator baseband frequency in Hz
    #[arg(long)]
    pub cwgen_freq: Option<f64>,

    /// CW generator power-of-2 amplitude scale
    #[arg(long)]
    pub cwgen_ampl: Option<u32>,

    /// Capture command timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<f64>,

    /// Sample rate used for the spectrum axis in Hz
    #[arg(long, default_value_t = crate::config::DEFAULT_SAMPLE_RATE_HZ)]
    pub sample_rate: f64,

    /// Keep the fetched waveform file
    #[arg(long)]
    pub keep_local: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl AcquireArgs {
    /// Environment configuration with command line overrides applied
    pub fn remote_config(&self) -> RemoteConfig {
        let mut config = RemoteConfig::from_env();
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = (!password.is_empty()).then(|| password.clone());
        }
        config
    }

    pub fn acquire_config(&self) -> AcquireConfig {
        let mut config = AcquireConfig::from_env();
        if let Some(nsamps) = self.nsamps {
            config.nsamps = nsamps;
        }
        if let Some(freq) = self.cwgen_freq {
            config.cwgen_freq_hz = freq;
        }
        if let Some(ampl) = self.cwgen_ampl {
            config.cwgen_ampl_scale = ampl;
        }
        if let Some(secs) = self.timeout_secs {
            config.capture_timeout = std::time::Duration::from_secs_f64(secs);
        }
        config.keep_local = self.keep_local;
        config
    }
}

impl Cli {
    /// Log level selected by -v/-q
    pub fn level_filter(&self) -> LevelFilter {
        match (self.verbose, self.quiet) {
            (0, 0) => LevelFilter::INFO,
            (1, _) => LevelFilter::DEBUG,
            (v, _) if v >= 2 => LevelFilter::TRACE,
            (_, 1) => LevelFilter::WARN,
            _ => LevelFilter::ERROR,
        }
    }
}
