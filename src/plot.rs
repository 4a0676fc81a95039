//! Plot of simulated waveform samples, embedded or in its own window.

use eframe::egui;
use egui_plot::{Line, Plot, PlotPoints};

use crate::error::{Error, Result};
use crate::waveform::WaveformSamples;

/// Unit for the horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeAxis {
    Seconds,
    Milliseconds,
}

impl TimeAxis {
    fn scale(&self) -> f64 {
        match self {
            TimeAxis::Seconds => 1.0,
            TimeAxis::Milliseconds => 1e3,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TimeAxis::Seconds => "Time (s)",
            TimeAxis::Milliseconds => "Time (ms)",
        }
    }
}

/// Heading of the form's plot window.
pub fn title(samples: &WaveformSamples) -> String {
    format!(
        "Simulated {} Waveform at {} Hz",
        samples.waveform, samples.frequency_hz
    )
}

/// Draws the samples into `ui`.
pub fn draw(ui: &mut egui::Ui, samples: &WaveformSamples, axis: TimeAxis) {
    let line = Line::new(PlotPoints::from(samples.points(axis.scale())));
    Plot::new("simulated_waveform")
        .view_aspect(2.0)
        .x_axis_label(axis.label())
        .y_axis_label("Amplitude (V)")
        .show(ui, |plot_ui| plot_ui.line(line));
}

struct PlotWindow {
    title: String,
    samples: WaveformSamples,
    axis: TimeAxis,
}

impl eframe::App for PlotWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(&self.title);
            draw(ui, &self.samples, self.axis);
        });
    }
}

/// Opens a window titled `title` showing the samples and blocks until it is
/// closed.
pub fn show_window(title: String, samples: WaveformSamples, axis: TimeAxis) -> Result<()> {
    let app_name = title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native(
        &app_name,
        options,
        Box::new(move |_cc| {
            Ok(Box::new(PlotWindow {
                title,
                samples,
                axis,
            }))
        }),
    )
    .map_err(|e| Error::Gui(e.to_string()))
}
