//! Theme and styling
//!
//! Colors, roundings and spacing shared by every component.

use egui::{Color32, Rounding, Stroke, Visuals};

#[derive(Clone, Debug)]
pub struct Theme {
    /// Accent used for buttons and the speaking glow
    pub primary: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,

    /// Window background behind the particles
    pub background: Color32,
    /// Translucent chat panel painted over the particles
    pub panel: Color32,
    pub panel_stroke: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    pub user_bubble: Color32,
    pub bot_bubble: Color32,
    pub error_bubble: Color32,

    /// Microphone button while listening
    pub listening: Color32,

    pub button_rounding: Rounding,
    pub card_rounding: Rounding,
    pub bubble_rounding: Rounding,

    pub spacing: f32,
    pub spacing_lg: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(99, 102, 241),
            success: Color32::from_rgb(34, 197, 94),
            warning: Color32::from_rgb(234, 179, 8),
            error: Color32::from_rgb(239, 68, 68),

            background: Color32::from_rgb(8, 10, 20),
            panel: Color32::from_rgba_unmultiplied(255, 255, 255, 18),
            panel_stroke: Color32::from_rgba_unmultiplied(255, 255, 255, 40),
            bg_secondary: Color32::from_rgb(31, 41, 55),
            bg_tertiary: Color32::from_rgb(55, 65, 81),

            text_primary: Color32::from_rgb(249, 250, 251),
            text_secondary: Color32::from_rgb(209, 213, 219),
            text_muted: Color32::from_rgb(156, 163, 175),

            user_bubble: Color32::from_rgba_unmultiplied(99, 102, 241, 200),
            bot_bubble: Color32::from_rgba_unmultiplied(55, 65, 81, 200),
            error_bubble: Color32::from_rgba_unmultiplied(127, 29, 29, 200),

            listening: Color32::from_rgb(239, 68, 68),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(16.0),
            bubble_rounding: Rounding::same(12.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    /// Glow stroke drawn around the chat panel while a reply is spoken
    pub fn speaking_glow(&self, pulse: f32) -> Stroke {
        Stroke::new(2.0 + 3.0 * pulse, self.primary.gamma_multiply(0.4 + 0.6 * pulse))
    }

    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.background;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_tertiary.gamma_multiply(0.6);

        visuals.widgets.noninteractive.bg_fill = self.bg_secondary;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);

        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.weak_bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);

        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.widgets.active.bg_fill = self.primary;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);

        visuals.hyperlink_color = self.primary;
        visuals.window_rounding = self.card_rounding;
        visuals.menu_rounding = self.button_rounding;

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(self.spacing_sm, self.spacing_sm);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        ctx.set_style(style);
    }
}
