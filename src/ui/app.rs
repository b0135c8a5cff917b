//! Main application struct and eframe integration

use crate::ui::components::{DebugPanel, InputBar, MessageList, ParticleCanvas};
use crate::ui::state::{AppState, NoticeKind};
use crate::ui::theme::Theme;
use crate::visual::anchor_from_panel;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::time::Instant;
use tracing::info;

/// Widest the chat panel grows
const CHAT_MAX_WIDTH: f32 = 640.0;

pub struct StudioApp {
    state: AppState,
    theme: Theme,
    last_frame_time: Instant,
    initialized: bool,
}

impl StudioApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        let app = Self::with_state(state);
        app.theme.apply(&cc.egui_ctx);
        app
    }

    /// App without a native window, as used by the UI tests
    pub fn with_state(state: AppState) -> Self {
        Self {
            state,
            theme: Theme::dark(),
            last_frame_time: Instant::now(),
            initialized: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        info!("Speech Studio UI initialized");
        self.state.debug_info.add_log("UI initialized");
        self.initialized = true;
    }

    /// Tick the state and draw one frame
    pub fn run_frame(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f64();
        self.last_frame_time = now;
        self.state.record_frame(delta);

        self.initialize();

        let time = ctx.input(|i| i.time);
        self.state.tick(time);

        self.show_header(ctx);
        self.show_debug_panel(ctx);
        self.show_content(ctx);

        // Particles move every frame
        ctx.request_repaint();
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.background).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Speech Studio")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let response = ui.button("🔍").on_hover_text("Toggle diagnostics");
                        response.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Toggle diagnostics")
                        });
                        if response.clicked() {
                            self.state.show_debug_panel = !self.state.show_debug_panel;
                        }

                        ui.label(
                            RichText::new(format!("{:.0} FPS", self.state.debug_info.fps))
                                .size(11.0)
                                .family(egui::FontFamily::Monospace)
                                .color(self.theme.text_muted),
                        );
                    });
                });
            });
    }

    fn show_debug_panel(&mut self, ctx: &egui::Context) {
        if !self.state.show_debug_panel {
            return;
        }

        SidePanel::right("debug_panel")
            .resizable(true)
            .default_width(300.0)
            .min_width(250.0)
            .max_width(500.0)
            .frame(egui::Frame::none().fill(self.theme.background).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                DebugPanel::new(&self.state, &self.theme).show(ui);
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        let viewport_height = ctx.screen_rect().height();

        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.background))
            .show(ctx, |ui| {
                ParticleCanvas::new(&self.state.particles).paint(ui.painter(), ui.max_rect());

                self.show_notice(ui);

                let width = ui.available_width().min(CHAT_MAX_WIDTH);
                let height = (ui.available_height() - self.theme.spacing * 2.0).max(0.0);

                let panel = ui.vertical_centered(|ui| {
                    egui::Frame::none()
                        .fill(self.theme.panel)
                        .stroke(egui::Stroke::new(1.0, self.theme.panel_stroke))
                        .rounding(self.theme.card_rounding)
                        .inner_margin(self.theme.spacing)
                        .show(ui, |ui| {
                            ui.set_width(width - self.theme.spacing * 2.0);
                            ui.set_height(height - self.theme.spacing * 2.0);
                            self.show_chat(ui);
                        })
                        .response
                        .rect
                });
                let panel_rect = panel.inner;

                if self.state.is_speaking() {
                    let t = ui.ctx().input(|i| i.time);
                    let pulse = ((t * 2.0).sin() * 0.5 + 0.5) as f32;
                    ui.painter().rect_stroke(
                        panel_rect.expand(2.0),
                        self.theme.card_rounding,
                        self.theme.speaking_glow(pulse),
                    );
                }

                self.state
                    .update_particle_anchor(anchor_from_panel(panel_rect.bottom(), viewport_height));
            });
    }

    fn show_chat(&mut self, ui: &mut egui::Ui) {
        ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
            InputBar::new(&mut self.state, &self.theme).show(ui);
            ui.separator();
            ui.with_layout(egui::Layout::top_down(egui::Align::LEFT), |ui| {
                MessageList::new(&self.state, &self.theme).show(ui);
            });
        });
    }

    fn show_notice(&mut self, ui: &mut egui::Ui) {
        let Some(notice) = self.state.notice.clone() else {
            return;
        };

        let color = match notice.kind {
            NoticeKind::Info => self.theme.text_secondary,
            NoticeKind::Warning => self.theme.warning,
        };

        ui.vertical_centered(|ui| {
            egui::Frame::none()
                .fill(self.theme.bg_secondary)
                .rounding(self.theme.button_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 6.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let label = ui.label(RichText::new(&notice.text).color(color));
                        label.widget_info(|| {
                            egui::WidgetInfo::labeled(
                                egui::WidgetType::Label,
                                true,
                                format!("Notice: {}", notice.text),
                            )
                        });

                        let dismiss = ui.small_button("✕");
                        dismiss.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "Dismiss notice")
                        });
                        if dismiss.clicked() {
                            self.state.dismiss_notice();
                        }
                    });
                });
        });
        ui.add_space(self.theme.spacing_sm);
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.run_frame(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Speech Studio shutting down");
        self.state.shutdown();
    }
}
