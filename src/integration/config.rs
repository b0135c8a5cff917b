//! Application configuration
//!
//! Loaded from TOML. Every section and field has a default, so an empty
//! file (or no file at all) gives a working text-only setup against the
//! local backend.

use crate::audio::amplitude::DEFAULT_FFT_SIZE;
use crate::audio::vad::EndpointConfig;
use crate::backend::{QueryMode, DEFAULT_BACKEND_URL};
use crate::speech::{Language, VoiceModelConfig};
use crate::visual::ParticleConfig;
use crate::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub mode: QueryMode,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: 30,
            mode: QueryMode::Single,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Open the microphone and speakers
    pub enabled: bool,
    /// Transform size of the amplitude analyser
    pub fft_size: usize,
    /// Seconds of microphone audio kept for the analyser
    pub buffer_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fft_size: DEFAULT_FFT_SIZE,
            buffer_secs: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub language: Language,
    /// Whisper ggml model; recognition is off without it
    pub whisper_model: Option<PathBuf>,
    pub whisper_threads: i32,
    /// VITS voices; synthesis is off when empty
    pub voices: Vec<VoiceModelConfig>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: Language::EnUs,
            whisper_model: None,
            whisper_threads: 4,
            voices: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Silero speech probability that counts as speech
    pub speech_threshold: f32,
    pub silence_ms: u32,
    pub min_speech_ms: u32,
    pub max_utterance_secs: f32,
    pub no_speech_timeout_secs: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        let endpoint = EndpointConfig::default();
        Self {
            speech_threshold: endpoint.speech_threshold,
            silence_ms: endpoint.silence_ms,
            min_speech_ms: endpoint.min_speech_ms,
            max_utterance_secs: endpoint.max_utterance_secs,
            no_speech_timeout_secs: endpoint.no_speech_timeout_secs,
        }
    }
}

impl RecognitionConfig {
    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig {
            speech_threshold: self.speech_threshold,
            silence_ms: self.silence_ms,
            min_speech_ms: self.min_speech_ms,
            max_utterance_secs: self.max_utterance_secs,
            no_speech_timeout_secs: self.no_speech_timeout_secs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_width: f32,
    pub window_height: f32,
    pub show_debug_panel: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_width: 900.0,
            window_height: 700.0,
            show_debug_panel: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub backend: BackendConfig,
    pub audio: AudioConfig,
    pub particles: ParticleConfig,
    pub speech: SpeechConfig,
    pub recognition: RecognitionConfig,
    pub ui: UiConfig,
}

impl StudioConfig {
    /// Default location: `<config dir>/speech-studio/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("speech-studio").join("config.toml"))
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StudioError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: StudioConfig = toml::from_str(&content).map_err(|e| {
            StudioError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else defaults
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend.url = url.into();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.speech.language = language;
        self
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.backend.mode = mode;
        self
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particles.count = count;
        self
    }

    /// Text-only mode: no microphone, no speakers
    pub fn without_audio(mut self) -> Self {
        self.audio.enabled = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.backend.url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StudioError::ConfigError(format!(
                "Backend URL must be http(s): {}",
                url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(StudioError::ConfigError("Backend timeout must be > 0".into()));
        }

        let fft = self.audio.fft_size;
        if fft < 32 || !fft.is_power_of_two() {
            return Err(StudioError::ConfigError(format!(
                "FFT size must be a power of two >= 32, got {}",
                fft
            )));
        }

        if self.audio.buffer_secs <= 0.0 {
            return Err(StudioError::ConfigError("Audio buffer must be > 0 seconds".into()));
        }

        if self.particles.count == 0 {
            return Err(StudioError::ConfigError("Particle count must be > 0".into()));
        }

        let scale = self.particles.amplitude_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(StudioError::ConfigError(format!(
                "Particle amplitude scale must be > 0, got {}",
                scale
            )));
        }

        if self.particles.min_velocity < 0.0 || self.particles.velocity_jitter < 0.0 {
            return Err(StudioError::ConfigError(
                "Particle velocities must not be negative".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.recognition.speech_threshold) {
            return Err(StudioError::ConfigError(format!(
                "Speech threshold must be within 0..=1, got {}",
                self.recognition.speech_threshold
            )));
        }

        if self.particles.ceiling <= -2.5 {
            return Err(StudioError::ConfigError(
                "Particle ceiling must be above the lowest anchor (-2.5)".into(),
            ));
        }

        if let Some(model) = &self.speech.whisper_model {
            if !model.exists() {
                return Err(StudioError::ConfigError(format!(
                    "Whisper model not found: {}",
                    model.display()
                )));
            }
        }

        for voice in &self.speech.voices {
            for path in [&voice.model, &voice.tokens] {
                if !Path::new(path).exists() {
                    return Err(StudioError::ConfigError(format!(
                        "Voice '{}' file not found: {}",
                        voice.name, path
                    )));
                }
            }
        }

        Ok(())
    }
}
