//! Single-shot test form.
//!
//! The instrument is opened before the window is created; without one the
//! process exits with an error and no form is shown.

mod form;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use eframe::egui;
use log::info;

use signal_sweep::cli::{BACKEND_HELP, CommonArgs};
use signal_sweep::{Bench, TrialRunner};

use form::SignalTestForm;

#[derive(Parser)]
#[command(name = "signal-sweep-gui")]
#[command(about = "Run single waveform generator tests from a form", long_about = None)]
#[command(after_help = BACKEND_HELP)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.common.load_config()?;

    let bench = Bench::open(&config).context("Failed to set up the instrument")?;
    info!("Logging trials to {}", bench.log.path().display());
    let identity = bench.identity;
    let runner = TrialRunner::new(bench.session, bench.log, config.settle_time());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([450.0, 380.0])
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native(
        "Smart Signal Test Framework",
        options,
        Box::new(move |_cc| Ok(Box::new(SignalTestForm::new(identity, runner)))),
    )
    .map_err(|e| anyhow!("GUI error: {}", e))
}
