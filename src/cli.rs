//! Command line options shared by the batch and form binaries.

use std::path::PathBuf;

use clap::Args;
use log::info;

use crate::config::{SessionBackend, SweepConfig};
use crate::error::Result;

/// Appended to `--help` of both binaries.
pub const BACKEND_HELP: &str = "\
Without --backend or --address the visa backend is used, which is only
available in builds with `--features visa` (it links the system VISA library).
Other builds fail at startup unless given --address HOST:PORT (tcp) or
--backend mock.";

#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Instrument session backend [default: visa, or tcp when --address is given]
    #[arg(long, value_enum)]
    pub backend: Option<SessionBackend>,

    /// host:port of a socket-server instrument (tcp backend)
    #[arg(long)]
    pub address: Option<String>,

    /// VISA resource or resource filter (visa backend)
    #[arg(long)]
    pub resource: Option<String>,

    /// CSV file trial results are appended to
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Wait after applying a configuration, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,
}

impl CommonArgs {
    /// The configuration file (or defaults) with command line overrides applied.
    pub fn load_config(&self) -> Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                SweepConfig::load(path)?
            }
            None => SweepConfig::default(),
        };

        if let Some(backend) = self.backend {
            config.instrument.backend = backend;
        }
        if let Some(address) = &self.address {
            config.instrument.address = Some(address.clone());
            // An address alone implies the socket backend
            if self.backend.is_none() {
                config.instrument.backend = SessionBackend::Tcp;
            }
        }
        if let Some(resource) = &self.resource {
            config.instrument.resource = resource.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = log_file.clone();
        }
        if let Some(settle_ms) = self.settle_ms {
            config.settle_time_ms = settle_ms;
        }

        config.validate()?;
        Ok(config)
    }
}
