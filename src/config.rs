//! Sweep configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or none at all) reproduces the stock routine:
//!
//! ```toml
//! waveforms = ["SIN", "SQU", "TRI"]
//! amplitudes_vpp = [1.0, 2.0, 3.0]
//! settle_time_ms = 1000
//! log_file = "smart_signal_log.csv"
//!
//! [frequency]
//! start_hz = 1000.0
//! stop_hz = 5000.0
//! step_hz = 1000.0
//!
//! [instrument]
//! backend = "tcp"
//! address = "192.168.1.20:5025"
//! timeout_ms = 5000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::experiment::TestConfiguration;
use crate::waveform::Waveform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Visa,
    Tcp,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub backend: SessionBackend,
    /// VISA resource or resource filter; the first match is opened.
    pub resource: String,
    /// `host:port` for the tcp backend.
    pub address: Option<String>,
    pub timeout_ms: u64,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        InstrumentConfig {
            backend: SessionBackend::Visa,
            resource: "?*INSTR".to_string(),
            address: None,
            timeout_ms: 5000,
        }
    }
}

/// Most frequency points a single range may expand to.
pub const MAX_FREQUENCY_POINTS: usize = 1_000_000;

/// Inclusive frequency range walked with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub start_hz: f64,
    pub stop_hz: f64,
    pub step_hz: f64,
}

impl Default for FrequencyRange {
    fn default() -> Self {
        FrequencyRange {
            start_hz: 1000.0,
            stop_hz: 5000.0,
            step_hz: 1000.0,
        }
    }
}

impl FrequencyRange {
    /// Number of frequencies visited, `stop_hz` included when it lies on a step.
    ///
    /// Zero for a range that does not pass validation.
    pub fn num_points(&self) -> usize {
        self.checked_num_points().unwrap_or(0)
    }

    fn checked_num_points(&self) -> Option<usize> {
        // Tolerate rounding so e.g. 0.1..=0.3 step 0.1 still yields three points
        let steps = ((self.stop_hz - self.start_hz) / self.step_hz + 1e-9).floor();
        if steps.is_finite() && steps >= 0.0 && steps < MAX_FREQUENCY_POINTS as f64 {
            Some(steps as usize + 1)
        } else {
            None
        }
    }

    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.num_points()).map(move |i| self.start_hz + i as f64 * self.step_hz)
    }

    fn validate(&self) -> Result<()> {
        if !(self.start_hz > 0.0) {
            return Err(Error::Config("frequency start must be positive".to_string()));
        }
        if !(self.step_hz > 0.0) {
            return Err(Error::Config("frequency step must be positive".to_string()));
        }
        if !(self.stop_hz >= self.start_hz) {
            return Err(Error::Config(format!(
                "frequency stop ({} Hz) is below start ({} Hz)",
                self.stop_hz, self.start_hz
            )));
        }
        if self.checked_num_points().is_none() {
            return Err(Error::Config(format!(
                "frequency range {} to {} Hz in {} Hz steps exceeds {} points",
                self.start_hz, self.stop_hz, self.step_hz, MAX_FREQUENCY_POINTS
            )));
        }
        Ok(())
    }
}

/// Waveform list × frequency range × amplitude list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpace {
    pub waveforms: Vec<Waveform>,
    pub frequency: FrequencyRange,
    pub amplitudes_vpp: Vec<f64>,
}

impl ParameterSpace {
    /// Number of configurations, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.waveforms
            .len()
            .saturating_mul(self.frequency.num_points())
            .saturating_mul(self.amplitudes_vpp.len())
    }

    /// Every configuration exactly once: waveform outer, frequency middle,
    /// amplitude inner.
    pub fn configurations(&self) -> impl Iterator<Item = TestConfiguration> + '_ {
        self.waveforms.iter().flat_map(move |&waveform| {
            self.frequency.frequencies().flat_map(move |frequency_hz| {
                self.amplitudes_vpp
                    .iter()
                    .map(move |&amplitude_vpp| TestConfiguration {
                        waveform,
                        frequency_hz,
                        amplitude_vpp,
                    })
            })
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.waveforms.is_empty() {
            return Err(Error::Config("at least one waveform is required".to_string()));
        }
        if self.amplitudes_vpp.is_empty() {
            return Err(Error::Config("at least one amplitude is required".to_string()));
        }
        if let Some(a) = self
            .amplitudes_vpp
            .iter()
            .find(|a| !(**a > 0.0 && a.is_finite()))
        {
            return Err(Error::Config(format!("amplitude must be positive, got {}", a)));
        }
        self.frequency.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub waveforms: Vec<Waveform>,
    pub frequency: FrequencyRange,
    pub amplitudes_vpp: Vec<f64>,
    /// Wait after applying a configuration, before measuring.
    pub settle_time_ms: u64,
    pub log_file: PathBuf,
    pub instrument: InstrumentConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            waveforms: Waveform::ALL.to_vec(),
            frequency: FrequencyRange::default(),
            amplitudes_vpp: vec![1.0, 2.0, 3.0],
            settle_time_ms: 1000,
            log_file: PathBuf::from("smart_signal_log.csv"),
            instrument: InstrumentConfig::default(),
        }
    }
}

impl SweepConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SweepConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_time_ms)
    }

    pub fn parameter_space(&self) -> ParameterSpace {
        ParameterSpace {
            waveforms: self.waveforms.clone(),
            frequency: self.frequency,
            amplitudes_vpp: self.amplitudes_vpp.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.parameter_space().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn frequency_stop_is_inclusive() {
        let range = FrequencyRange {
            start_hz: 1000.0,
            stop_hz: 5000.0,
            step_hz: 1000.0,
        };
        let visited: Vec<f64> = range.frequencies().collect();
        assert_eq!(visited, vec![1000.0, 2000.0, 3000.0, 4000.0, 5000.0]);
    }

    #[test]
    fn stop_off_step_is_not_visited() {
        let range = FrequencyRange {
            start_hz: 1000.0,
            stop_hz: 4500.0,
            step_hz: 1000.0,
        };
        assert_eq!(range.frequencies().last(), Some(4000.0));
    }

    #[test]
    fn fractional_step_keeps_last_point() {
        let range = FrequencyRange {
            start_hz: 0.1,
            stop_hz: 0.3,
            step_hz: 0.1,
        };
        assert_eq!(range.num_points(), 3);
    }

    #[test]
    fn enumeration_order_is_waveform_frequency_amplitude() {
        let space = ParameterSpace {
            waveforms: vec![Waveform::Sine, Waveform::Square],
            frequency: FrequencyRange {
                start_hz: 10.0,
                stop_hz: 20.0,
                step_hz: 10.0,
            },
            amplitudes_vpp: vec![1.0, 2.0],
        };
        let order: Vec<(Waveform, f64, f64)> = space
            .configurations()
            .map(|c| (c.waveform, c.frequency_hz, c.amplitude_vpp))
            .collect();
        assert_eq!(
            order,
            vec![
                (Waveform::Sine, 10.0, 1.0),
                (Waveform::Sine, 10.0, 2.0),
                (Waveform::Sine, 20.0, 1.0),
                (Waveform::Sine, 20.0, 2.0),
                (Waveform::Square, 10.0, 1.0),
                (Waveform::Square, 10.0, 2.0),
                (Waveform::Square, 20.0, 1.0),
                (Waveform::Square, 20.0, 2.0),
            ]
        );
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = SweepConfig::from_toml_str("").unwrap();
        assert_eq!(config, SweepConfig::default());
        assert_eq!(config.parameter_space().len(), 45);
        assert_eq!(config.settle_time(), Duration::from_secs(1));
    }

    #[test]
    fn parses_full_file() {
        let config = SweepConfig::from_toml_str(
            r#"
            waveforms = ["SIN", "triangle"]
            amplitudes_vpp = [0.5]
            settle_time_ms = 20
            log_file = "out.csv"

            [frequency]
            start_hz = 100.0
            stop_hz = 300.0
            step_hz = 100.0

            [instrument]
            backend = "tcp"
            address = "10.0.0.2:5025"
            "#,
        )
        .unwrap();
        assert_eq!(config.waveforms, vec![Waveform::Sine, Waveform::Triangle]);
        assert_eq!(config.instrument.backend, SessionBackend::Tcp);
        assert_eq!(config.instrument.address.as_deref(), Some("10.0.0.2:5025"));
        assert_eq!(config.instrument.timeout_ms, 5000);
        assert_eq!(config.parameter_space().len(), 6);
    }

    #[test]
    fn rejects_invalid_spaces() {
        assert!(SweepConfig::from_toml_str("waveforms = []").is_err());
        assert!(SweepConfig::from_toml_str("amplitudes_vpp = [1.0, -2.0]").is_err());
        assert!(
            SweepConfig::from_toml_str(
                "[frequency]\nstart_hz = 5000.0\nstop_hz = 1000.0\nstep_hz = 1000.0"
            )
            .is_err()
        );
        assert!(
            SweepConfig::from_toml_str(
                "[frequency]\nstart_hz = 1000.0\nstop_hz = 2000.0\nstep_hz = 0.0"
            )
            .is_err()
        );
        assert!(matches!(
            SweepConfig::from_toml_str("waveforms = [\"RAMP\"]"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn rejects_ranges_too_large_to_enumerate() {
        for range in [
            "[frequency]\nstart_hz = 1.0\nstop_hz = 1e20\nstep_hz = 1.0",
            "[frequency]\nstart_hz = 1.0\nstop_hz = 1e300\nstep_hz = 1e-300",
            "[frequency]\nstart_hz = 1.0\nstop_hz = inf\nstep_hz = 1.0",
        ] {
            assert!(
                matches!(SweepConfig::from_toml_str(range), Err(Error::Config(_))),
                "{}",
                range
            );
        }
        assert!(SweepConfig::from_toml_str("amplitudes_vpp = [inf]").is_err());
    }

    #[test]
    fn largest_allowed_range_is_counted_exactly() {
        let range = FrequencyRange {
            start_hz: 1.0,
            stop_hz: MAX_FREQUENCY_POINTS as f64,
            step_hz: 1.0,
        };
        assert!(range.validate().is_ok());
        assert_eq!(range.num_points(), MAX_FREQUENCY_POINTS);

        let too_wide = FrequencyRange {
            stop_hz: MAX_FREQUENCY_POINTS as f64 + 1.0,
            ..range
        };
        assert!(too_wide.validate().is_err());
        assert_eq!(too_wide.num_points(), 0);
    }

    proptest! {
        #[test]
        fn every_combination_visited_once(
            n_wave in 1usize..=3,
            n_freq in 1usize..8,
            amps in proptest::collection::hash_set(1u32..100, 1..6),
        ) {
            let space = ParameterSpace {
                waveforms: Waveform::ALL[..n_wave].to_vec(),
                frequency: FrequencyRange {
                    start_hz: 100.0,
                    stop_hz: 100.0 * n_freq as f64,
                    step_hz: 100.0,
                },
                amplitudes_vpp: amps.iter().map(|a| *a as f64 / 10.0).collect(),
            };
            let visited: Vec<_> = space
                .configurations()
                .map(|c| (c.waveform, c.frequency_hz.to_bits(), c.amplitude_vpp.to_bits()))
                .collect();
            let unique: HashSet<_> = visited.iter().cloned().collect();
            prop_assert_eq!(visited.len(), n_wave * n_freq * amps.len());
            prop_assert_eq!(unique.len(), visited.len());
            prop_assert_eq!(space.len(), visited.len());
        }
    }
}
