//! Application state
//!
//! `AppState` is the one coordinating object: it owns the chat session, the
//! audio stack and the particle field, and moves data between them once per
//! frame in [`AppState::tick`].

use crate::backend::HttpBackend;
use crate::integration::config::StudioConfig;
use crate::integration::setup::{build_audio_stack, AudioStack, MicrophoneStatus};
use crate::messages::ChatSession;
use crate::speech::{RecognitionOutcome, RecognitionPhase};
use crate::utils::perf::{FrameRate, TimingTracker};
use crate::visual::{ParticleConfig, ParticleField};
use crate::{Result, StudioError};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

const LOG_CAPACITY: usize = 100;

/// Diagnostics shown in the debug panel
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    pub fps: f32,
    pub amplitude: f32,
    pub transcription_status: String,
    pub backend_latency: String,
    pub log_messages: VecDeque<String>,
}

impl DebugInfo {
    pub fn new() -> Self {
        Self {
            log_messages: VecDeque::with_capacity(LOG_CAPACITY),
            ..Default::default()
        }
    }

    pub fn add_log(&mut self, message: impl Into<String>) {
        if self.log_messages.len() >= LOG_CAPACITY {
            self.log_messages.pop_front();
        }
        self.log_messages.push_back(message.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

/// Dismissable banner above the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

pub struct AppState {
    pub session: ChatSession,
    pub audio: AudioStack,
    pub particles: ParticleField,
    /// Particles are re-seeded on the first real panel position
    particles_placed: bool,
    pub notice: Option<Notice>,
    pub debug_info: DebugInfo,
    pub show_debug_panel: bool,
    latency: TimingTracker,
    frame_rate: FrameRate,
}

impl AppState {
    /// Build the full application from configuration
    pub fn new(config: &StudioConfig, runtime: Handle) -> Result<Self> {
        let backend = HttpBackend::new(config.backend.url.clone(), config.backend.timeout())?;
        info!("Backend endpoint: {}", backend.url());

        let session = ChatSession::new(Arc::new(backend), runtime)
            .with_language(config.speech.language)
            .with_mode(config.backend.mode);

        let audio = build_audio_stack(config);

        let mut state = Self::from_parts(session, audio, config.particles.clone());
        state.show_debug_panel = config.ui.show_debug_panel;
        Ok(state)
    }

    pub fn from_parts(session: ChatSession, audio: AudioStack, particles: ParticleConfig) -> Self {
        let mut debug_info = DebugInfo::new();
        let mut notice = None;

        match &audio.microphone {
            MicrophoneStatus::Live => debug_info.add_log("Microphone live"),
            MicrophoneStatus::Disabled => debug_info.add_log("Audio disabled"),
            MicrophoneStatus::Unavailable(reason) => {
                debug_info.add_log(format!("Microphone unavailable: {}", reason));
                notice = Some(Notice::warning(reason.clone()));
            }
        }

        Self {
            session,
            audio,
            particles: ParticleField::new(particles, -2.5),
            particles_placed: false,
            notice,
            debug_info,
            show_debug_panel: false,
            latency: TimingTracker::new(50),
            frame_rate: FrameRate::new(60),
        }
    }

    /// State with no devices, for tests and text-only runs
    pub fn with_session(session: ChatSession) -> Self {
        Self::from_parts(session, AudioStack::silent(), ParticleConfig::default())
    }

    pub fn amplitude(&self) -> f32 {
        self.audio.amplitude.get()
    }

    pub fn recognition_phase(&self) -> RecognitionPhase {
        self.audio.speech_input.phase()
    }

    pub fn is_speaking(&self) -> bool {
        self.audio.speech_output.is_speaking()
    }

    pub fn backend_latency(&self) -> &TimingTracker {
        &self.latency
    }

    /// Send the text in the input box
    pub fn submit_draft(&mut self) {
        if let Some(id) = self.session.submit_draft() {
            self.debug_info.add_log(format!("Sent request {}", short_id(&id)));
        }
    }

    /// Start a recognition session, or report why it cannot start
    pub fn start_voice_input(&mut self) {
        let language = self.session.language();

        match self.audio.speech_input.start(language) {
            Ok(()) => {
                self.notice = None;
                self.debug_info.transcription_status = "Listening".into();
                self.debug_info.add_log(format!("Listening ({})", language.tag()));
            }
            Err(StudioError::RecognitionBusy) => {
                debug!("Voice input already active");
            }
            Err(e) => {
                warn!("Voice input unavailable: {}", e);
                self.debug_info.add_log(format!("Voice input: {}", e));
                self.notice = Some(Notice::warning(e.user_message()));
            }
        }
    }

    pub fn cancel_voice_input(&mut self) {
        if self.audio.speech_input.is_active() {
            self.audio.speech_input.cancel();
            self.debug_info.transcription_status = "Cancelled".into();
            self.debug_info.add_log("Voice input cancelled");
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Keep the particle spawn line at the bottom of the chat panel
    pub fn update_particle_anchor(&mut self, anchor_y: f32) {
        if self.particles_placed {
            self.particles.set_anchor(anchor_y);
        } else {
            let config = self.particles.config().clone();
            self.particles = ParticleField::new(config, anchor_y);
            self.particles_placed = true;
        }
    }

    /// Record a frame's duration for the FPS readout
    pub fn record_frame(&mut self, delta_secs: f64) {
        self.debug_info.fps = self.frame_rate.tick(delta_secs);
    }

    /// Advance everything by one frame
    ///
    /// `time_secs` is wall-clock time, used for particle drift.
    pub fn tick(&mut self, time_secs: f64) {
        let amplitude = match &mut self.audio.sampler {
            Some(sampler) => sampler.tick(),
            None => self.audio.amplitude.get(),
        };
        self.debug_info.amplitude = amplitude;
        self.particles.advance(amplitude, time_secs);

        self.poll_voice_input();
        self.poll_replies();
    }

    fn poll_voice_input(&mut self) {
        let Some(outcome) = self.audio.speech_input.poll() else {
            return;
        };

        match outcome {
            RecognitionOutcome::Transcript(text) => {
                self.debug_info.transcription_status = format!("Last: \"{}\"", preview(&text, 50));
                self.session.submit_transcript(&text);
            }
            RecognitionOutcome::NoSpeech => {
                self.debug_info.transcription_status = "No speech".into();
                self.notice = Some(Notice::info("Didn't catch that. Try the mic again."));
            }
            RecognitionOutcome::Failed(reason) => {
                self.debug_info.transcription_status = "Failed".into();
                self.debug_info.add_log(format!("Recognition failed: {}", reason));
                self.notice = Some(Notice::warning(
                    StudioError::RecognitionError(reason).user_message(),
                ));
            }
        }
    }

    fn poll_replies(&mut self) {
        for reply in self.session.poll() {
            let id = short_id(&reply.request_id);

            if !reply.ok {
                self.debug_info.add_log(format!("Request {} failed", id));
                continue;
            }

            self.latency.record(reply.elapsed);
            self.debug_info.backend_latency = self.latency.summary();
            self.debug_info
                .add_log(format!("Reply {} in {}ms", id, reply.elapsed.as_millis()));

            match self.audio.speech_output.speak(&reply.text, self.session.language()) {
                Ok(_) => {}
                Err(StudioError::UnsupportedCapability(_)) => {
                    debug!("No synthesizer, reply shown as text only");
                }
                Err(e) => {
                    warn!("Could not speak reply: {}", e);
                    self.debug_info.add_log(format!("Speech output: {}", e));
                }
            }
        }
    }

    /// Stop devices and any speech in progress
    pub fn shutdown(&mut self) {
        self.audio.shutdown();
        self.debug_info.add_log("Shutting down");
    }
}

fn short_id(id: &uuid::Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
