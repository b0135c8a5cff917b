//! Message list component
//!
//! The conversation history as chat bubbles, oldest first.

use crate::messages::{ChatMessage, Role};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, Color32, RichText};

pub struct MessageList<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let messages = self.state.session.messages();
        let pending = self.state.session.pending_requests();

        egui::ScrollArea::vertical()
            .id_salt("message_list")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(self.theme.spacing_sm);

                if messages.is_empty() && pending == 0 {
                    self.show_empty_state(ui);
                } else {
                    for message in &messages {
                        self.show_message(ui, message);
                        ui.add_space(self.theme.spacing_sm);
                    }
                    if pending > 0 {
                        self.show_typing_indicator(ui);
                    }
                }

                ui.add_space(self.theme.spacing_sm);
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(self.theme.spacing_lg * 2.0);
            ui.label(
                RichText::new("No messages yet...")
                    .size(14.0)
                    .italics()
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_message(&self, ui: &mut egui::Ui, message: &ChatMessage) {
        let is_user = message.role() == Role::User;
        let metadata = message.metadata();

        let bubble_color = match (is_user, metadata.is_error) {
            (true, _) => self.theme.user_bubble,
            (false, true) => self.theme.error_bubble,
            (false, false) => self.theme.bot_bubble,
        };
        let align = if is_user { Align::RIGHT } else { Align::LEFT };

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            let sender = match (is_user, metadata.from_speech) {
                (true, true) => "You 🎤",
                (true, false) => "You",
                (false, _) => "Bot",
            };
            ui.label(RichText::new(sender).size(12.0).color(self.theme.text_muted));

            let max_width = ui.available_width() * 0.8;

            egui::Frame::none()
                .fill(bubble_color)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);

                    let label = ui.label(RichText::new(message.content()).color(Color32::WHITE));
                    let accessible = if is_user {
                        format!("User message: {}", message.content())
                    } else {
                        format!("Bot reply: {}", message.content())
                    };
                    label.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &accessible)
                    });
                });

            let mut footer = message.timestamp().with_timezone(&chrono::Local).format("%H:%M").to_string();
            if let Some(ms) = metadata.latency_ms {
                footer.push_str(&format!(" · {}ms", ms));
            }
            ui.label(RichText::new(footer).size(10.0).color(self.theme.text_muted));
        });
    }

    fn show_typing_indicator(&self, ui: &mut egui::Ui) {
        ui.with_layout(egui::Layout::top_down(Align::LEFT), |ui| {
            egui::Frame::none()
                .fill(self.theme.bot_bubble)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let t = ui.ctx().input(|i| i.time);
                        for i in 0..3 {
                            let alpha = ((t * 3.0 + i as f64 * 0.5).sin() * 0.5 + 0.5) as f32;
                            ui.label(
                                RichText::new("●")
                                    .size(10.0)
                                    .color(self.theme.text_muted.gamma_multiply(alpha)),
                            );
                        }
                    });
                });
        });
        ui.ctx().request_repaint();
    }
}
