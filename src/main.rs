//! Batch sweep: every waveform × frequency × amplitude, logged to CSV.
//!
//! ```bash
//! signal-sweep --address 192.168.1.20:5025
//! signal-sweep --config sweep.toml --settle-ms 500
//! signal-sweep --backend mock --log-file dry_run.csv
//! ```
//!
//! The default `visa` backend needs a build with `--features visa`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use signal_sweep::cli::{BACKEND_HELP, CommonArgs};
use signal_sweep::{Bench, Waveform, WaveformSamples, run_sweep};

/// Window simulated for the final setting, in seconds.
const PLOT_DURATION_S: f64 = 1e-2;
const PLOT_POINTS: usize = 1000;

#[derive(Parser)]
#[command(name = "signal-sweep")]
#[command(about = "Sweep a waveform generator and log measured voltage", long_about = None)]
#[command(after_help = BACKEND_HELP)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Where the simulated waveform of the final setting is written
    #[arg(long, default_value = "simulated_waveform.csv")]
    plot_file: PathBuf,

    /// Also open a window with the simulated waveform
    #[cfg(feature = "gui")]
    #[arg(long)]
    show_plot: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.common.load_config()?;

    let mut bench = Bench::open(&config).context("Failed to set up the instrument")?;

    let results = run_sweep(
        &mut bench.session,
        &config.parameter_space(),
        config.settle_time(),
        &bench.log,
    )?;
    info!("Results saved to {}", config.log_file.display());

    // The final setting is always drawn as a sine, titled with its own shape
    let Some(last) = results.last() else {
        return Ok(());
    };
    let title = last.plot_title();
    info!("Test complete. {} ({} Vpp)", title, last.config.amplitude_vpp);
    let samples = WaveformSamples::generate(
        Waveform::Sine,
        last.config.frequency_hz,
        last.config.amplitude_vpp,
        0.0,
        PLOT_DURATION_S,
        PLOT_POINTS,
    );
    samples
        .write_csv(&cli.plot_file)
        .with_context(|| format!("Failed to write {}", cli.plot_file.display()))?;
    info!("{} saved to {}", title, cli.plot_file.display());

    #[cfg(feature = "gui")]
    if cli.show_plot {
        use signal_sweep::plot::{TimeAxis, show_window};
        show_window(title, samples, TimeAxis::Seconds)?;
    }

    Ok(())
}
