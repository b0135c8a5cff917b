//! Configuration and start-up wiring

pub mod config;
pub mod setup;

pub use config::StudioConfig;
pub use setup::{build_audio_stack, AudioStack, MicrophoneStatus};
