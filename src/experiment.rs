use std::fmt;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{info, warn};

use crate::config::ParameterSpace;
use crate::error::Result;
use crate::session::InstrumentSession;
use crate::trial_log::TrialLog;
use crate::waveform::Waveform;

/// Query used to read back the output level after settling.
pub const MEASURE_QUERY: &str = "MEAS:VOLT:DC?";

/// One (waveform, frequency, amplitude) setting applied to the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestConfiguration {
    pub waveform: Waveform,
    pub frequency_hz: f64,
    pub amplitude_vpp: f64,
}

impl TestConfiguration {
    /// Commands that apply this configuration, in the order they are sent.
    pub fn commands(&self) -> [String; 3] {
        [
            format!("FUNC {}", self.waveform.to_command_value()),
            format!("FREQ {}", self.frequency_hz),
            format!("VOLT {}", self.amplitude_vpp),
        ]
    }
}

impl fmt::Display for TestConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Freq: {} Hz | Amp: {} Vpp",
            self.waveform, self.frequency_hz, self.amplitude_vpp
        )
    }
}

/// Outcome of the measurement query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Volts(f64),
    Unavailable,
}

impl Measurement {
    /// Interpret a query result. Failed queries and non-numeric replies are
    /// both `Unavailable`.
    pub fn from_reply(reply: Result<String>) -> Self {
        match reply {
            Ok(text) => match text.trim().parse::<f64>() {
                Ok(volts) if volts.is_finite() => Measurement::Volts(volts),
                _ => {
                    warn!("Malformed voltage reply: {:?}", text.trim());
                    Measurement::Unavailable
                }
            },
            Err(err) => {
                warn!("Voltage read not supported: {}", err);
                Measurement::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Measurement::Volts(_))
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Volts(v) => write!(f, "{}", v),
            Measurement::Unavailable => f.write_str("N/A"),
        }
    }
}

/// A completed trial, as written to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub timestamp: DateTime<Local>,
    pub config: TestConfiguration,
    pub measurement: Measurement,
}

impl TrialResult {
    /// Stamps the result with the current wall-clock time.
    pub fn now(config: TestConfiguration, measurement: Measurement) -> Self {
        TrialResult {
            timestamp: Local::now(),
            config,
            measurement,
        }
    }

    /// Heading of the batch run's simulated plot.
    ///
    /// Names this trial's shape even though the batch plot always draws a
    /// sine.
    pub fn plot_title(&self) -> String {
        format!(
            "Simulated {} Wave at {} Hz",
            self.config.waveform, self.config.frequency_hz
        )
    }
}

/// Send the three configuration commands, shape first. Replies are not read.
pub fn apply_configuration<S: InstrumentSession + ?Sized>(
    session: &mut S,
    config: &TestConfiguration,
) -> Result<()> {
    for command in config.commands() {
        session.write(&command)?;
    }
    Ok(())
}

/// Issue one DC voltage query.
pub fn measure_dc_voltage<S: InstrumentSession + ?Sized>(session: &mut S) -> Measurement {
    Measurement::from_reply(session.query(MEASURE_QUERY))
}

/// Walks `space` in order and logs one row per configuration.
///
/// An invalid `space` is rejected before any command is sent.
/// A failed measurement is recorded as [`Measurement::Unavailable`] and the
/// sweep carries on. A failed configuration write, or a failed log append,
/// aborts the sweep with that error.
pub fn run_sweep<S: InstrumentSession + ?Sized>(
    session: &mut S,
    space: &ParameterSpace,
    settle_time: Duration,
    log: &TrialLog,
) -> Result<Vec<TrialResult>> {
    space.validate()?;
    info!("Starting sweep with {} configurations", space.len());
    let mut results = Vec::new();

    for config in space.configurations() {
        info!("Setting {}", config);
        apply_configuration(session, &config)?;

        // Wait for the output to stabilize
        thread::sleep(settle_time);

        let measurement = measure_dc_voltage(session);
        if let Measurement::Volts(v) = measurement {
            info!("Measured Voltage: {} V", v);
        }

        let result = TrialResult::now(config, measurement);
        log.append(&result)?;
        results.push(result);
    }

    info!(
        "Sweep complete: {} trials, {} measured",
        results.len(),
        results.iter().filter(|r| r.measurement.is_available()).count()
    );
    Ok(results)
}

/// Runs a single trial and logs it.
///
/// Unlike [`run_sweep`], any session fault during the trial (including a
/// failed configuration write) is recorded as `Unavailable`. Only a failed
/// log append is returned as an error.
pub fn run_trial<S: InstrumentSession + ?Sized>(
    session: &mut S,
    config: &TestConfiguration,
    settle_time: Duration,
    log: &TrialLog,
) -> Result<TrialResult> {
    info!("Running trial: {}", config);
    let measurement = match apply_configuration(session, config) {
        Ok(()) => {
            thread::sleep(settle_time);
            measure_dc_voltage(session)
        }
        Err(err) => {
            warn!("Trial aborted: {}", err);
            Measurement::Unavailable
        }
    };

    let result = TrialResult::now(*config, measurement);
    log.append(&result)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn commands_use_shape_tokens_and_plain_numbers() {
        let config = TestConfiguration {
            waveform: Waveform::Square,
            frequency_hz: 1000.0,
            amplitude_vpp: 2.5,
        };
        assert_eq!(config.commands(), ["FUNC SQU", "FREQ 1000", "VOLT 2.5"]);
    }

    #[test]
    fn reply_parsing() {
        assert_eq!(
            Measurement::from_reply(Ok("+1.234000E+00\n".to_string())),
            Measurement::Volts(1.234)
        );
        assert_eq!(
            Measurement::from_reply(Ok("-0.5".to_string())),
            Measurement::Volts(-0.5)
        );
        assert_eq!(
            Measurement::from_reply(Ok("garbage".to_string())),
            Measurement::Unavailable
        );
        assert_eq!(
            Measurement::from_reply(Ok("9.9E+37 NaN".to_string())),
            Measurement::Unavailable
        );
        assert_eq!(
            Measurement::from_reply(Err(Error::Session("timeout".to_string()))),
            Measurement::Unavailable
        );
    }

    #[test]
    fn unavailable_renders_as_na() {
        assert_eq!(Measurement::Unavailable.to_string(), "N/A");
        assert_eq!(Measurement::Volts(0.25).to_string(), "0.25");
        assert!(!Measurement::Unavailable.is_available());
    }

    #[test]
    fn plot_title_names_the_trial_shape() {
        let result = TrialResult::now(
            TestConfiguration {
                waveform: Waveform::Triangle,
                frequency_hz: 5000.0,
                amplitude_vpp: 3.0,
            },
            Measurement::Unavailable,
        );
        assert_eq!(result.plot_title(), "Simulated TRI Wave at 5000 Hz");
    }
}
