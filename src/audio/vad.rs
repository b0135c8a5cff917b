//! Voice activity detection and end-of-utterance detection
//!
//! Speech/non-speech decisions come from Silero VAD (`SileroDetector`). The
//! `Endpointer` turns those decisions into one utterance per recognition
//! session: it ends on trailing silence, on a hard length cap, or when nobody
//! speaks.

use crate::audio::preprocessor::RECOGNITION_SAMPLE_RATE;
use crate::audio::resampler::MonoResampler;
use crate::{Result, StudioError};
use tracing::{debug, info, warn};
use voice_activity_detector::VoiceActivityDetector as VadDetector;

/// Samples per Silero frame at 16 kHz (32ms)
const SILERO_FRAME: usize = 512;

/// Thresholds for utterance endpointing
#[derive(Clone, Debug)]
pub struct EndpointConfig {
    /// Speech probability at or above which a chunk counts as speech
    pub speech_threshold: f32,
    /// Trailing silence that ends an utterance (milliseconds)
    pub silence_ms: u32,
    /// Utterances shorter than this are discarded (milliseconds)
    pub min_speech_ms: u32,
    /// Hard cap on utterance length (seconds)
    pub max_utterance_secs: f32,
    /// Give up when no speech starts within this window (seconds)
    pub no_speech_timeout_secs: f32,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            speech_threshold: 0.5,
            silence_ms: 800,
            min_speech_ms: 250,
            max_utterance_secs: 15.0,
            no_speech_timeout_secs: 8.0,
        }
    }
}

/// Scores microphone chunks for speech
pub trait SpeechDetector {
    /// Probability (0.0..=1.0) that `chunk` contains speech
    fn speech_probability(&mut self, chunk: &[f32]) -> f32;

    /// Forget state carried between chunks
    fn reset(&mut self);
}

/// Silero VAD over microphone audio at any rate
///
/// Chunks are resampled to 16 kHz and scored in 512-sample frames; a chunk
/// scores the highest probability among the frames it completed. A chunk too
/// short to complete a frame keeps the previous score.
pub struct SileroDetector {
    detector: VadDetector,
    resampler: Option<MonoResampler>,
    pending: Vec<f32>,
    last_probability: f32,
}

impl SileroDetector {
    /// `input_rate` is the rate of the chunks that will be scored
    pub fn new(input_rate: u32) -> Result<Self> {
        let detector = VadDetector::builder()
            .sample_rate(RECOGNITION_SAMPLE_RATE as i32)
            .chunk_size(SILERO_FRAME)
            .build()
            .map_err(|e| StudioError::AudioProcessingError(format!("Failed to create VAD: {:?}", e)))?;

        let resampler = if input_rate == RECOGNITION_SAMPLE_RATE {
            None
        } else {
            Some(MonoResampler::new(input_rate, RECOGNITION_SAMPLE_RATE)?)
        };

        info!("Initialized Silero VAD for {} Hz input", input_rate);

        Ok(Self {
            detector,
            resampler,
            pending: Vec::with_capacity(SILERO_FRAME * 4),
            last_probability: 0.0,
        })
    }

    /// Samples waiting for a complete frame
    pub fn pending_samples(&self) -> usize {
        self.pending.len()
    }
}

impl SpeechDetector for SileroDetector {
    fn speech_probability(&mut self, chunk: &[f32]) -> f32 {
        match &mut self.resampler {
            Some(resampler) => match resampler.process(chunk) {
                Ok(resampled) => self.pending.extend_from_slice(&resampled),
                Err(e) => {
                    warn!("VAD resampling failed: {}", e);
                    return self.last_probability;
                }
            },
            None => self.pending.extend_from_slice(chunk),
        }

        let mut best: Option<f32> = None;
        while self.pending.len() >= SILERO_FRAME {
            let probability = self.detector.predict(self.pending.drain(..SILERO_FRAME));
            best = Some(best.map_or(probability, |b: f32| b.max(probability)));
        }

        if let Some(probability) = best {
            self.last_probability = probability;
        }
        self.last_probability
    }

    fn reset(&mut self) {
        self.detector.reset();
        self.pending.clear();
        self.last_probability = 0.0;
    }
}

/// Outcome of feeding a chunk to the endpointer
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// Keep listening
    Listening,
    /// An utterance finished; carries its samples
    Utterance(Vec<f32>),
    /// Nothing usable was said before the timeout
    NoSpeech,
}

/// Sample-count driven utterance detector
pub struct Endpointer {
    config: EndpointConfig,
    detector: Box<dyn SpeechDetector>,
    sample_rate: u32,
    speech_buffer: Vec<f32>,
    in_speech: bool,
    speech_samples: usize,
    silence_samples: usize,
    waited_samples: usize,
}

impl Endpointer {
    pub fn new(config: EndpointConfig, sample_rate: u32, detector: Box<dyn SpeechDetector>) -> Self {
        Self {
            config,
            detector,
            sample_rate: sample_rate.max(1),
            speech_buffer: Vec::new(),
            in_speech: false,
            speech_samples: 0,
            silence_samples: 0,
            waited_samples: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Feed one mono chunk at `sample_rate`
    pub fn process(&mut self, chunk: &[f32]) -> Endpoint {
        if chunk.is_empty() {
            return Endpoint::Listening;
        }

        let is_speech = self.detector.speech_probability(chunk) >= self.config.speech_threshold;

        if is_speech {
            if !self.in_speech {
                debug!("Speech started after {} samples", self.waited_samples);
                self.in_speech = true;
            }
            self.speech_samples += chunk.len();
            self.silence_samples = 0;
            self.speech_buffer.extend_from_slice(chunk);
        } else if self.in_speech {
            // Trailing silence stays in the utterance
            self.silence_samples += chunk.len();
            self.speech_buffer.extend_from_slice(chunk);

            if self.silence_samples >= self.ms_to_samples(self.config.silence_ms) {
                return self.finish();
            }
        } else {
            self.waited_samples += chunk.len();
            if self.waited_samples >= self.secs_to_samples(self.config.no_speech_timeout_secs) {
                debug!("No speech before timeout");
                self.reset();
                return Endpoint::NoSpeech;
            }
        }

        if self.speech_buffer.len() >= self.secs_to_samples(self.config.max_utterance_secs) {
            debug!("Maximum utterance length reached");
            return self.finish();
        }

        Endpoint::Listening
    }

    fn finish(&mut self) -> Endpoint {
        let long_enough = self.speech_samples >= self.ms_to_samples(self.config.min_speech_ms);
        let samples = std::mem::take(&mut self.speech_buffer);
        self.reset();

        if long_enough {
            Endpoint::Utterance(samples)
        } else {
            debug!("Utterance too short, discarding");
            Endpoint::NoSpeech
        }
    }

    /// Reset for a new session
    pub fn reset(&mut self) {
        self.detector.reset();
        self.speech_buffer.clear();
        self.in_speech = false;
        self.speech_samples = 0;
        self.silence_samples = 0;
        self.waited_samples = 0;
    }

    fn ms_to_samples(&self, ms: u32) -> usize {
        (ms as usize * self.sample_rate as usize) / 1000
    }

    fn secs_to_samples(&self, secs: f32) -> usize {
        (secs.max(0.0) * self.sample_rate as f32) as usize
    }
}
