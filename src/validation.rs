//! Validation of single-trial form input.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::experiment::TestConfiguration;
use crate::waveform::Waveform;

pub const FREQUENCY_RANGE_HZ: RangeInclusive<f64> = 10.0..=1_000_000.0;
pub const AMPLITUDE_RANGE_VPP: RangeInclusive<f64> = 0.1..=10.0;

/// Parse and range-check the form fields.
///
/// Frequency must be a whole number of hertz, amplitude any decimal number of
/// volts peak-to-peak. Nothing is sent to the instrument from here; a
/// rejected input means no trial and no log row.
pub fn validate_inputs(
    waveform: Waveform,
    frequency: &str,
    amplitude: &str,
) -> Result<TestConfiguration> {
    let (Ok(frequency_hz), Ok(amplitude_vpp)) = (
        frequency.trim().parse::<i64>(),
        amplitude.trim().parse::<f64>(),
    ) else {
        return Err(Error::invalid_input(
            "Invalid Input",
            "Please enter valid numeric values.",
        ));
    };

    check_ranges(TestConfiguration {
        waveform,
        frequency_hz: frequency_hz as f64,
        amplitude_vpp,
    })
}

/// Range-check an already numeric configuration.
pub fn check_ranges(config: TestConfiguration) -> Result<TestConfiguration> {
    if !FREQUENCY_RANGE_HZ.contains(&config.frequency_hz) {
        return Err(Error::invalid_input(
            "Frequency Out of Range",
            format!(
                "Frequency must be between {} Hz and {} Hz.",
                FREQUENCY_RANGE_HZ.start(),
                FREQUENCY_RANGE_HZ.end()
            ),
        ));
    }
    if !AMPLITUDE_RANGE_VPP.contains(&config.amplitude_vpp) {
        return Err(Error::invalid_input(
            "Amplitude Out of Range",
            format!(
                "Amplitude must be between {} Vpp and {} Vpp.",
                AMPLITUDE_RANGE_VPP.start(),
                AMPLITUDE_RANGE_VPP.end()
            ),
        ));
    }
    Ok(config)
}
