//! Automated signal testing for SCPI waveform generators.
//!
//! A sweep walks every (waveform, frequency, amplitude) combination of a
//! [`ParameterSpace`], applies it to an [`InstrumentSession`], waits for the
//! output to settle, reads back a DC voltage and appends one row per trial to
//! a CSV log. The same trial logic backs the single-shot desktop form (feature
//! `gui`), which runs trials on a [`TrialRunner`].

pub mod bench;
pub mod cli;
pub mod config;
pub mod error;
pub mod experiment;
pub mod runner;
pub mod session;
pub mod trial_log;
pub mod validation;
pub mod waveform;

#[cfg(feature = "gui")]
pub mod plot;

pub use bench::Bench;
pub use config::{InstrumentConfig, ParameterSpace, SessionBackend, SweepConfig};
pub use error::{Error, Result};
pub use experiment::{Measurement, TestConfiguration, TrialResult, run_sweep, run_trial};
pub use runner::TrialRunner;
pub use session::{InstrumentSession, MockSession};
pub use trial_log::TrialLog;
pub use waveform::{Waveform, WaveformSamples};
