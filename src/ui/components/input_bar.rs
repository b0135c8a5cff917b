//! Input bar component
//!
//! Language and mode selectors, the message box, the send button and the
//! microphone button.

use crate::backend::QueryMode;
use crate::speech::{Language, RecognitionPhase};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                self.show_language_selector(ui);
                self.show_mode_selector(ui);
            });

            ui.add_space(self.theme.spacing_sm);

            ui.horizontal(|ui| {
                self.show_mic_button(ui);
                self.show_text_input(ui);
                self.show_send_button(ui);
            });
        });
    }

    fn show_language_selector(&mut self, ui: &mut egui::Ui) {
        let mut language = self.state.session.language();

        let response = egui::ComboBox::from_id_salt("language_selector")
            .selected_text(language.label())
            .show_ui(ui, |ui| {
                for option in Language::all() {
                    ui.selectable_value(&mut language, *option, option.label());
                }
            })
            .response;
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::ComboBox, true, "Language")
        });

        if language != self.state.session.language() {
            self.state.session.set_language(language);
            self.state
                .debug_info
                .add_log(format!("Language set to {}", language.tag()));
        }
    }

    fn show_mode_selector(&mut self, ui: &mut egui::Ui) {
        let mut mode = self.state.session.mode();

        let response = egui::ComboBox::from_id_salt("mode_selector")
            .selected_text(mode.label())
            .show_ui(ui, |ui| {
                for option in QueryMode::all() {
                    ui.selectable_value(&mut mode, *option, option.label());
                }
            })
            .response;
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::ComboBox, true, "Mode"));

        if mode != self.state.session.mode() {
            self.state.session.set_mode(mode);
        }
    }

    fn show_mic_button(&mut self, ui: &mut egui::Ui) {
        let phase = self.state.recognition_phase();
        let available = self.state.audio.speech_input.is_available();

        let (icon, tooltip, color) = match phase {
            RecognitionPhase::Idle if available => ("🎤", "Speak (right-click to cancel)", self.theme.text_secondary),
            RecognitionPhase::Idle => ("🎤", "Voice input unavailable", self.theme.text_muted),
            RecognitionPhase::Listening => ("⏺", "Listening... (right-click to cancel)", self.theme.listening),
            RecognitionPhase::Transcribing => ("⏳", "Transcribing...", self.theme.warning),
        };

        let mut button = egui::Button::new(RichText::new(icon).size(20.0).color(color))
            .min_size(Vec2::splat(44.0))
            .rounding(self.theme.button_rounding);
        if phase == RecognitionPhase::Listening {
            button = button.fill(self.theme.listening.gamma_multiply(0.2));
        }

        let enabled = phase != RecognitionPhase::Transcribing;
        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, "Start voice input")
        });

        let button_rect = response.rect;

        if response.clicked() && phase == RecognitionPhase::Idle {
            self.state.start_voice_input();
        }
        if response.secondary_clicked() {
            self.state.cancel_voice_input();
        }
        response.on_hover_text(tooltip);

        if phase == RecognitionPhase::Listening {
            let t = ui.ctx().input(|i| i.time);
            let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;
            let radius = button_rect.width() / 2.0 + 2.0 + pulse * 3.0;

            ui.painter().circle_stroke(
                button_rect.center(),
                radius,
                egui::Stroke::new(2.0 * pulse, self.theme.listening.gamma_multiply(1.0 - pulse * 0.5)),
            );
            ui.ctx().request_repaint();
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let available_width = ui.available_width() - 56.0;

        let text_edit = egui::TextEdit::singleline(self.state.session.draft_mut())
            .hint_text("Type a message...")
            .desired_width(available_width)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0))
            .id(egui::Id::new("message_input"));

        let response = ui.add(text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Message input")
        });

        // Single-line edits give up focus on Enter
        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.submit_draft();
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let can_send = !self.state.session.draft().trim().is_empty();

        let fill = if can_send {
            self.theme.primary
        } else {
            self.theme.text_muted
        };
        let button = egui::Button::new(RichText::new("➤").size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(44.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add_enabled(can_send, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, can_send, "Send message")
        });

        if response.clicked() {
            self.state.submit_draft();
        }
        response.on_hover_text("Send message (Enter)");
    }
}
