//! Diagnostics panel
//!
//! Live internals: frame rate, amplitude, particles, devices, requests and
//! the in-app log.

use crate::integration::setup::MicrophoneStatus;
use crate::speech::RecognitionPhase;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, ScrollArea};

pub struct DebugPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> DebugPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("Diagnostics").strong().color(self.theme.text_primary));

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                RichText::new(format!("{:.1} FPS", self.state.debug_info.fps))
                                    .size(12.0)
                                    .family(egui::FontFamily::Monospace)
                                    .color(self.fps_color()),
                            );
                        });
                    });

                    ui.separator();

                    let info = &self.state.debug_info;
                    egui::Grid::new("debug_stats")
                        .num_columns(2)
                        .spacing([20.0, 4.0])
                        .show(ui, |ui| {
                            self.stat_row(ui, "Amplitude", &format!("{:.1}", info.amplitude));
                            self.stat_row(ui, "Particles", &self.state.particles.len().to_string());
                            self.stat_row(ui, "Microphone", &self.microphone_status());
                            self.stat_row(ui, "Recognition", self.recognition_status());
                            self.stat_row(ui, "Transcription", &info.transcription_status);
                            self.stat_row(ui, "Speaking", if self.state.is_speaking() { "yes" } else { "no" });
                            self.stat_row(ui, "Messages", &self.state.session.storage().len().to_string());
                            self.stat_row(ui, "In flight", &self.state.session.pending_requests().to_string());
                            self.stat_row(ui, "Latency", &info.backend_latency);
                        });

                    ui.add_space(self.theme.spacing_sm);
                    ui.separator();

                    ui.label(
                        RichText::new("Recent Logs")
                            .size(12.0)
                            .strong()
                            .color(self.theme.text_secondary),
                    );

                    ScrollArea::vertical()
                        .id_salt("debug_logs")
                        .max_height(160.0)
                        .auto_shrink([false, false])
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            if info.log_messages.is_empty() {
                                ui.label(
                                    RichText::new("No log messages")
                                        .size(11.0)
                                        .color(self.theme.text_muted)
                                        .italics(),
                                );
                            }
                            for msg in &info.log_messages {
                                ui.label(
                                    RichText::new(msg)
                                        .size(11.0)
                                        .family(egui::FontFamily::Monospace)
                                        .color(self.theme.text_muted),
                                );
                            }
                        });
                });
            });
    }

    fn stat_row(&self, ui: &mut egui::Ui, label: &str, value: &str) {
        ui.label(RichText::new(label).size(12.0).color(self.theme.text_muted));

        let display_value = if value.is_empty() { "-" } else { value };
        ui.label(
            RichText::new(display_value)
                .size(12.0)
                .family(egui::FontFamily::Monospace)
                .color(self.theme.text_primary),
        );

        ui.end_row();
    }

    fn microphone_status(&self) -> String {
        match &self.state.audio.microphone {
            MicrophoneStatus::Live => "live".to_string(),
            MicrophoneStatus::Disabled => "disabled".to_string(),
            MicrophoneStatus::Unavailable(reason) => format!("unavailable ({})", reason),
        }
    }

    fn recognition_status(&self) -> &'static str {
        if !self.state.audio.speech_input.is_available() {
            return "unsupported";
        }
        match self.state.recognition_phase() {
            RecognitionPhase::Idle => "idle",
            RecognitionPhase::Listening => "listening",
            RecognitionPhase::Transcribing => "transcribing",
        }
    }

    fn fps_color(&self) -> egui::Color32 {
        let fps = self.state.debug_info.fps;
        if fps >= 55.0 {
            self.theme.success
        } else if fps >= 30.0 {
            self.theme.warning
        } else {
            self.theme.error
        }
    }
}
