//! Desktop user interface built on eframe

pub mod app;
pub mod components;
pub mod state;
pub mod theme;

pub use app::StudioApp;
pub use state::{AppState, DebugInfo, Notice, NoticeKind};
pub use theme::Theme;

use crate::integration::config::StudioConfig;

/// Open the window and run until it is closed
pub fn run(config: &StudioConfig, state: AppState) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.ui.window_width, config.ui.window_height])
            .with_min_inner_size([480.0, 400.0])
            .with_title("Speech Studio"),
        ..Default::default()
    };

    eframe::run_native(
        "Speech Studio",
        options,
        Box::new(|cc| Ok(Box::new(StudioApp::new(cc, state)))),
    )
}
