pub mod debug_panel;
pub mod input_bar;
pub mod message_list;
pub mod particle_canvas;

pub use debug_panel::DebugPanel;
pub use input_bar::InputBar;
pub use message_list::MessageList;
pub use particle_canvas::ParticleCanvas;
