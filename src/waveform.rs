//! Waveform shapes and the simulated sample generator used for plotting.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Waveform {
    #[serde(rename = "SIN", alias = "SINE", alias = "sin", alias = "sine")]
    Sine,
    #[serde(rename = "SQU", alias = "SQUARE", alias = "squ", alias = "square")]
    Square,
    #[serde(rename = "TRI", alias = "TRIANGLE", alias = "tri", alias = "triangle")]
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 3] = [Waveform::Sine, Waveform::Square, Waveform::Triangle];

    /// Shape token accepted by `FUNC`.
    pub fn to_command_value(&self) -> &'static str {
        match self {
            Waveform::Sine => "SIN",
            Waveform::Square => "SQU",
            Waveform::Triangle => "TRI",
        }
    }

    /// Value of the shape at time `t` for the given frequency and peak amplitude.
    pub fn sample(&self, frequency_hz: f64, peak: f64, t: f64) -> f64 {
        let phase = (2.0 * PI * frequency_hz * t).sin();
        match self {
            Waveform::Sine => peak * phase,
            Waveform::Square => peak * sign(phase),
            Waveform::Triangle => peak * (2.0 / PI) * phase.asin(),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_command_value())
    }
}

// `f64::signum` maps 0.0 to 1.0; a square wave sampled at a zero crossing is 0.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `count` evenly spaced points from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count).map(|i| start + i as f64 * step).collect()
        }
    }
}

/// Simulated output of the generator over a time window.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSamples {
    pub waveform: Waveform,
    pub frequency_hz: f64,
    /// Peak amplitude, half of the configured peak-to-peak value.
    pub peak: f64,
    pub time: Vec<f64>,
    pub amplitude: Vec<f64>,
}

impl WaveformSamples {
    /// Samples `waveform` at `count` points in `[start, stop]` seconds.
    ///
    /// `amplitude_vpp` is the peak-to-peak value the generator is configured
    /// with; the samples swing between `-amplitude_vpp / 2` and
    /// `+amplitude_vpp / 2`.
    pub fn generate(
        waveform: Waveform,
        frequency_hz: f64,
        amplitude_vpp: f64,
        start: f64,
        stop: f64,
        count: usize,
    ) -> Self {
        let peak = amplitude_vpp / 2.0;
        let time = linspace(start, stop, count);
        let amplitude = time
            .iter()
            .map(|&t| waveform.sample(frequency_hz, peak, t))
            .collect();

        WaveformSamples {
            waveform,
            frequency_hz,
            peak,
            time,
            amplitude,
        }
    }

    /// (time, amplitude) pairs with time multiplied by `time_scale`.
    pub fn points(&self, time_scale: f64) -> Vec<[f64; 2]> {
        self.time
            .iter()
            .zip(&self.amplitude)
            .map(|(&t, &y)| [t * time_scale, y])
            .collect()
    }

    /// Writes the samples as a two-column CSV file.
    pub fn write_csv<P: AsRef<std::path::Path>>(&self, path: P) -> crate::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["Time (s)", "Amplitude (V)"])?;
        for (t, y) in self.time.iter().zip(&self.amplitude) {
            writer.write_record([t.to_string(), y.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}
