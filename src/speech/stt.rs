//! One-shot speech recognition
//!
//! A session listens for a single utterance in the selected language,
//! transcribes it on a worker thread and hands back exactly one outcome.

use crate::audio::preprocessor::{preprocess_for_recognition, RECOGNITION_SAMPLE_RATE};
use crate::audio::vad::{Endpoint, EndpointConfig, Endpointer, SileroDetector, SpeechDetector};
use crate::speech::language::Language;
use crate::{Result, StudioError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread;
use tracing::{debug, error, info, warn};

/// Speech-to-text engine run on the recognition worker
pub trait Transcriber: Send {
    /// Transcribe 16 kHz mono audio in the given Whisper language code
    fn transcribe(&mut self, samples: &[f32], language: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionPhase {
    Idle,
    Listening,
    Transcribing,
}

/// How a recognition session ended
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    Transcript(String),
    NoSpeech,
    Failed(String),
}

enum WorkerCommand {
    Transcribe {
        session: u64,
        samples: Vec<f32>,
        language: &'static str,
    },
    Shutdown,
}

struct WorkerResult {
    session: u64,
    result: Result<String>,
}

/// Microphone-to-text adapter
///
/// Owned by the UI thread and driven by [`SpeechInput::poll`] once per
/// frame. At most one session is active at a time.
pub struct SpeechInput {
    command_tx: Option<Sender<WorkerCommand>>,
    result_rx: Receiver<WorkerResult>,
    chunk_rx: Option<Receiver<Vec<f32>>>,
    /// Missing when the voice activity detector could not be loaded
    vad: Option<Endpointer>,
    sample_rate: u32,
    phase: RecognitionPhase,
    session: u64,
    language: Option<&'static str>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SpeechInput {
    /// Create the adapter with Silero voice activity detection
    ///
    /// `chunk_rx` carries mono microphone audio at `sample_rate`. Without a
    /// transcriber, a microphone or a working detector every `start` reports
    /// the capability as unsupported.
    pub fn new(
        transcriber: Option<Box<dyn Transcriber>>,
        chunk_rx: Option<Receiver<Vec<f32>>>,
        sample_rate: u32,
        endpoint: EndpointConfig,
    ) -> Self {
        let detector = if transcriber.is_some() && chunk_rx.is_some() {
            match SileroDetector::new(sample_rate) {
                Ok(detector) => Some(Box::new(detector) as Box<dyn SpeechDetector>),
                Err(e) => {
                    warn!("Speech recognition disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self::build(transcriber, chunk_rx, sample_rate, endpoint, detector)
    }

    /// Create the adapter around a given speech detector
    pub fn with_detector(
        transcriber: Option<Box<dyn Transcriber>>,
        chunk_rx: Option<Receiver<Vec<f32>>>,
        sample_rate: u32,
        endpoint: EndpointConfig,
        detector: Box<dyn SpeechDetector>,
    ) -> Self {
        Self::build(transcriber, chunk_rx, sample_rate, endpoint, Some(detector))
    }

    fn build(
        transcriber: Option<Box<dyn Transcriber>>,
        chunk_rx: Option<Receiver<Vec<f32>>>,
        sample_rate: u32,
        endpoint: EndpointConfig,
        detector: Option<Box<dyn SpeechDetector>>,
    ) -> Self {
        let (result_tx, result_rx) = unbounded();

        let (command_tx, worker) = match transcriber {
            Some(transcriber) => {
                let (command_tx, command_rx) = unbounded();
                let handle = spawn_worker(transcriber, command_rx, result_tx);
                (Some(command_tx), Some(handle))
            }
            None => (None, None),
        };

        Self {
            command_tx,
            result_rx,
            chunk_rx,
            vad: detector.map(|detector| Endpointer::new(endpoint, sample_rate, detector)),
            sample_rate,
            phase: RecognitionPhase::Idle,
            session: 0,
            language: None,
            worker,
        }
    }

    /// A recogniser that only ever reports the capability as missing
    pub fn disabled() -> Self {
        Self::new(None, None, RECOGNITION_SAMPLE_RATE, EndpointConfig::default())
    }

    pub fn is_available(&self) -> bool {
        self.command_tx.is_some() && self.chunk_rx.is_some() && self.vad.is_some()
    }

    pub fn phase(&self) -> RecognitionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != RecognitionPhase::Idle
    }

    /// Begin listening for one utterance
    pub fn start(&mut self, language: Language) -> Result<()> {
        if !self.is_available() {
            return Err(StudioError::UnsupportedCapability(
                "No speech recogniser or microphone".into(),
            ));
        }

        if self.is_active() {
            return Err(StudioError::RecognitionBusy);
        }

        let code = language
            .recognition_code()
            .ok_or_else(|| StudioError::UnsupportedLanguage(language.tag().to_string()))?;

        // Audio captured before the button press is not part of the utterance
        if let Some(rx) = &self.chunk_rx {
            while rx.try_recv().is_ok() {}
        }

        if let Some(vad) = &mut self.vad {
            vad.reset();
        }
        self.session += 1;
        self.language = Some(code);
        self.phase = RecognitionPhase::Listening;

        info!("Recognition session {} started ({})", self.session, language.tag());
        Ok(())
    }

    /// Abandon the active session; a late transcript is discarded
    pub fn cancel(&mut self) {
        if !self.is_active() {
            return;
        }

        debug!("Recognition session {} cancelled", self.session);
        self.session += 1;
        if let Some(vad) = &mut self.vad {
            vad.reset();
        }
        self.phase = RecognitionPhase::Idle;
    }

    /// Advance the session; returns its outcome exactly once
    pub fn poll(&mut self) -> Option<RecognitionOutcome> {
        if let Some(outcome) = self.poll_worker() {
            return Some(outcome);
        }

        let chunks: Vec<Vec<f32>> = match &self.chunk_rx {
            Some(rx) => rx.try_iter().collect(),
            None => return None,
        };

        if self.phase != RecognitionPhase::Listening {
            return None;
        }
        let Some(vad) = &mut self.vad else {
            return None;
        };

        let mut endpoint = Endpoint::Listening;
        for chunk in chunks {
            endpoint = vad.process(&chunk);
            if endpoint != Endpoint::Listening {
                break;
            }
        }

        match endpoint {
            Endpoint::Listening => None,
            Endpoint::Utterance(samples) => self.submit_utterance(samples),
            Endpoint::NoSpeech => {
                warn!("Recognition session {} heard no speech", self.session);
                self.phase = RecognitionPhase::Idle;
                Some(RecognitionOutcome::NoSpeech)
            }
        }
    }

    fn submit_utterance(&mut self, samples: Vec<f32>) -> Option<RecognitionOutcome> {
        let prepared = match preprocess_for_recognition(&samples, self.sample_rate) {
            Ok(prepared) => prepared,
            Err(e) => {
                self.phase = RecognitionPhase::Idle;
                return Some(RecognitionOutcome::Failed(e.to_string()));
            }
        };

        let (Some(tx), Some(language)) = (&self.command_tx, self.language) else {
            self.phase = RecognitionPhase::Idle;
            return Some(RecognitionOutcome::Failed("Recogniser unavailable".into()));
        };

        debug!(
            "Session {} utterance: {:.2}s",
            self.session,
            samples.len() as f32 / self.sample_rate as f32
        );

        let command = WorkerCommand::Transcribe {
            session: self.session,
            samples: prepared,
            language,
        };

        if tx.send(command).is_err() {
            self.phase = RecognitionPhase::Idle;
            return Some(RecognitionOutcome::Failed("Recognition worker stopped".into()));
        }

        self.phase = RecognitionPhase::Transcribing;
        None
    }

    fn poll_worker(&mut self) -> Option<RecognitionOutcome> {
        while let Ok(WorkerResult { session, result }) = self.result_rx.try_recv() {
            if session != self.session || self.phase != RecognitionPhase::Transcribing {
                debug!("Discarding stale transcript from session {}", session);
                continue;
            }

            self.phase = RecognitionPhase::Idle;

            return Some(match result {
                Ok(text) if text.trim().is_empty() => RecognitionOutcome::NoSpeech,
                Ok(text) => RecognitionOutcome::Transcript(text.trim().to_string()),
                Err(e) => {
                    warn!("Transcription failed: {}", e);
                    RecognitionOutcome::Failed(e.to_string())
                }
            });
        }

        None
    }
}

impl Drop for SpeechInput {
    fn drop(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(WorkerCommand::Shutdown);
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn spawn_worker(
    mut transcriber: Box<dyn Transcriber>,
    command_rx: Receiver<WorkerCommand>,
    result_tx: Sender<WorkerResult>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        info!("Recognition worker starting");

        loop {
            match command_rx.recv() {
                Ok(WorkerCommand::Transcribe {
                    session,
                    samples,
                    language,
                }) => {
                    let result = transcriber.transcribe(&samples, language);
                    if result_tx.send(WorkerResult { session, result }).is_err() {
                        break;
                    }
                }
                Ok(WorkerCommand::Shutdown) => break,
                Err(e) => {
                    error!("Recognition command channel error: {}", e);
                    break;
                }
            }
        }

        info!("Recognition worker stopped");
    })
}

#[cfg(feature = "whisper")]
pub use whisper::WhisperTranscriber;

#[cfg(feature = "whisper")]
mod whisper {
    use super::Transcriber;
    use crate::{Result, StudioError};
    use std::path::Path;
    use tracing::{debug, info};
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Whisper transcriber backed by a ggml model file
    pub struct WhisperTranscriber {
        context: WhisperContext,
        n_threads: i32,
    }

    impl WhisperTranscriber {
        pub fn new(model_path: &Path, n_threads: i32) -> Result<Self> {
            info!("Loading Whisper model from: {:?}", model_path);

            if !model_path.exists() {
                return Err(StudioError::ModelLoadError(format!(
                    "Model file not found: {:?}",
                    model_path
                )));
            }

            let path = model_path
                .to_str()
                .ok_or_else(|| StudioError::ModelLoadError("Invalid model path".to_string()))?;

            let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
                .map_err(|e| {
                    StudioError::ModelLoadError(format!("Failed to load Whisper model: {:?}", e))
                })?;

            info!("Whisper model loaded successfully");

            Ok(Self { context, n_threads })
        }
    }

    impl Transcriber for WhisperTranscriber {
        fn transcribe(&mut self, samples: &[f32], language: &str) -> Result<String> {
            if samples.is_empty() {
                return Err(StudioError::RecognitionError("Empty audio".to_string()));
            }

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_n_threads(self.n_threads);
            params.set_translate(false);
            params.set_language(Some(language));
            params.set_print_special(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            let mut state = self.context.create_state().map_err(|e| {
                StudioError::RecognitionError(format!("Failed to create state: {:?}", e))
            })?;

            state.full(params, samples).map_err(|e| {
                StudioError::RecognitionError(format!("Transcription failed: {:?}", e))
            })?;

            let num_segments = state.full_n_segments().map_err(|e| {
                StudioError::RecognitionError(format!("Failed to get segments: {:?}", e))
            })?;

            let mut text = String::new();
            for i in 0..num_segments {
                let segment = state.full_get_segment_text(i).map_err(|e| {
                    StudioError::RecognitionError(format!("Failed to get segment text: {:?}", e))
                })?;
                text.push_str(&segment);
            }

            debug!("Transcription result: '{}'", text.trim());
            Ok(text.trim().to_string())
        }
    }
}
