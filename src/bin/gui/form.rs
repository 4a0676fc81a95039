use std::time::Duration;

use eframe::egui::{self, Color32};

use signal_sweep::plot::{self, TimeAxis};
use signal_sweep::session::BoxedSession;
use signal_sweep::validation::{AMPLITUDE_RANGE_VPP, FREQUENCY_RANGE_HZ};
use signal_sweep::{TestConfiguration, TrialRunner, Waveform, WaveformSamples};

/// Window simulated by the plot button, in seconds.
const PLOT_DURATION_S: f64 = 1e-3;
const PLOT_POINTS: usize = 1000;

pub struct SignalTestForm {
    identity: String,
    runner: TrialRunner<BoxedSession>,

    waveform: Waveform,
    frequency: String,
    amplitude: String,

    output: String,
    error: Option<String>,

    // Parameters of the last completed trial, used by the plot
    last: TestConfiguration,
    show_plot: bool,
}

impl SignalTestForm {
    pub fn new(identity: String, runner: TrialRunner<BoxedSession>) -> Self {
        SignalTestForm {
            identity,
            runner,
            waveform: Waveform::Sine,
            frequency: "1000".to_string(),
            amplitude: "1.0".to_string(),
            output: String::new(),
            error: None,
            last: TestConfiguration {
                waveform: Waveform::Sine,
                frequency_hz: 1000.0,
                amplitude_vpp: 1.0,
            },
            show_plot: false,
        }
    }

    fn start_test(&mut self) {
        self.error = None;
        if let Err(err) = self
            .runner
            .submit_inputs(self.waveform, &self.frequency, &self.amplitude)
        {
            self.error = Some(err.to_string());
        }
    }

    fn collect_result(&mut self) {
        match self.runner.poll() {
            Some(Ok(result)) => {
                self.output = format!("Test Complete: Measured Voltage = {} V", result.measurement);
                self.last = result.config;
            }
            Some(Err(err)) => {
                log::error!("Trial failed: {}", err);
                self.error = Some(err.to_string());
            }
            None => {}
        }
    }
}

impl eframe::App for SignalTestForm {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_result();
        let busy = self.runner.is_busy();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.colored_label(
                    Color32::LIGHT_BLUE,
                    format!("Connected Instrument: {}", self.identity),
                );
                ui.add_space(8.0);

                ui.label("Select Waveform:");
                egui::ComboBox::from_id_salt("waveform")
                    .selected_text(self.waveform.to_string())
                    .show_ui(ui, |ui| {
                        for waveform in Waveform::ALL {
                            let label = waveform.to_command_value();
                            ui.selectable_value(&mut self.waveform, waveform, label);
                        }
                    });
                ui.add_space(4.0);

                ui.label(format!(
                    "Frequency (Hz) [{} - {}]:",
                    FREQUENCY_RANGE_HZ.start(),
                    FREQUENCY_RANGE_HZ.end()
                ));
                ui.text_edit_singleline(&mut self.frequency);
                ui.add_space(4.0);

                ui.label(format!(
                    "Amplitude (Vpp) [{} - {}]:",
                    AMPLITUDE_RANGE_VPP.start(),
                    AMPLITUDE_RANGE_VPP.end()
                ));
                ui.text_edit_singleline(&mut self.amplitude);
                ui.add_space(8.0);

                if ui.add_enabled(!busy, egui::Button::new("Start Test")).clicked() {
                    self.start_test();
                }
                if busy {
                    ui.spinner();
                }

                if let Some(error) = &self.error {
                    ui.colored_label(Color32::RED, error);
                }
                ui.colored_label(Color32::GREEN, &self.output);
                ui.add_space(8.0);

                if ui.button("Show Simulated Waveform Plot").clicked() {
                    self.show_plot = true;
                }
            });
        });

        if self.show_plot {
            let samples = WaveformSamples::generate(
                self.last.waveform,
                self.last.frequency_hz,
                self.last.amplitude_vpp,
                0.0,
                PLOT_DURATION_S,
                PLOT_POINTS,
            );
            egui::Window::new(plot::title(&samples))
                .id(egui::Id::new("simulated_waveform_window"))
                .open(&mut self.show_plot)
                .default_size([600.0, 320.0])
                .show(ctx, |ui| plot::draw(ui, &samples, TimeAxis::Milliseconds));
        }

        if self.runner.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}
