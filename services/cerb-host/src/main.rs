//! cerb-host - ILA trace decoding and remote IQ capture for Cerberus

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cerb_host::cli::{AcquireArgs, Cli, Command, IlaArgs, OutputArgs};
use cerb_host::remote::SshShell;
use cerb_host::viz::{JsonExporter, LogVisualizer, Visualizer};
use cerb_host::{acquire, ila, Complex64};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides -v/-q
    let filter = EnvFilter::builder()
        .with_default_directive(cli.level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Command::Ila(args) => run_ila(args),
        Command::Acquire(args) => run_acquire(args).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_ila(args: IlaArgs) -> Result<()> {
    let config = args.decoder_config();
    info!("ILA decode configuration:");
    info!("  Sample rate: {} MHz", config.sample_rate_hz / 1e6);
    info!("  Data width: {} bits", config.data_width_bits);
    info!("  Samples per cycle: {}", config.samples_per_cycle);

    let samples = ila::decode_file(&args.file, &config)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;

    present(&samples, config.sample_rate_hz, &args.output)
}

async fn run_acquire(args: AcquireArgs) -> Result<()> {
    let remote = args.remote_config();
    let config = args.acquire_config();

    info!("Acquisition configuration:");
    info!("  Board: {}", remote.destination());
    info!("  Samples: {}", config.nsamps);
    info!("  CW generator: {} MHz, scale {}", config.cwgen_freq_hz / 1e6, config.cwgen_ampl_scale);

    let shell = SshShell::new(remote);
    let samples = acquire::request_samples(&shell, &config)
        .await
        .context("Sample acquisition failed")?;

    // The acquisition script plots the whole capture
    let output = OutputArgs {
        trace_len: args.output.trace_len.max(samples.len()),
        export: args.output.export,
    };
    present(&samples, args.sample_rate, &output)
}

fn present(samples: &[Complex64], sample_rate_hz: f64, output: &OutputArgs) -> Result<()> {
    LogVisualizer {
        trace_len: output.trace_len,
    }
    .render(samples, sample_rate_hz)?;

    if let Some(path) = &output.export {
        JsonExporter::new(path.clone(), output.trace_len).render(samples, sample_rate_hz)?;
    }
    Ok(())
}
