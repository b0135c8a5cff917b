pub mod audio;
pub mod backend;
pub mod integration;
pub mod messages;
pub mod speech;
pub mod ui;
pub mod utils;
pub mod visual;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StudioError {
    #[error("Microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    #[error("Unsupported recognition language: {0}")]
    UnsupportedLanguage(String),

    #[error("A recognition session is already active")]
    RecognitionBusy,

    #[error("Recognition error: {0}")]
    RecognitionError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for StudioError {
    fn from(e: std::io::Error) -> Self {
        StudioError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(e: reqwest::Error) -> Self {
        StudioError::BackendError(e.to_string())
    }
}

impl StudioError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The rest of the UI keeps working without a microphone
            StudioError::MicrophoneUnavailable(_) => true,
            StudioError::UnsupportedCapability(_) => true,
            StudioError::UnsupportedLanguage(_) => true,
            StudioError::RecognitionBusy => true,
            StudioError::RecognitionError(_) => true,
            StudioError::SynthesisError(_) => true,
            StudioError::BackendError(_) => true,
            StudioError::AudioProcessingError(_) => true,
            // These need user intervention
            StudioError::AudioDeviceError(_) => false,
            StudioError::ModelLoadError(_) => false,
            StudioError::ConfigError(_) => false,
            StudioError::IOError(_) => false,
            StudioError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            StudioError::MicrophoneUnavailable(_) => {
                "Allow microphone access for live particle effects.".to_string()
            }
            StudioError::UnsupportedCapability(_) => {
                "Speech recognition not supported.".to_string()
            }
            StudioError::UnsupportedLanguage(tag) => {
                format!("Speech recognition is not available for {}.", tag)
            }
            StudioError::RecognitionBusy => "Already listening.".to_string(),
            StudioError::RecognitionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            StudioError::SynthesisError(_) => {
                "Text-to-speech failed. The reply is shown as text.".to_string()
            }
            StudioError::BackendError(_) => "❌ Backend error".to_string(),
            StudioError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            StudioError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            StudioError::ModelLoadError(_) => {
                "Failed to load a speech model. Please verify model files are present.".to_string()
            }
            StudioError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            StudioError::IOError(_) => "File system error occurred.".to_string(),
            StudioError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
