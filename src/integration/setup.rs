//! Device and engine wiring
//!
//! Opens the microphone and speakers and loads the speech engines named in
//! the configuration. Every piece is optional: a missing device or model
//! only switches off the feature that needs it.

use crate::audio::amplitude::{AmplitudeSampler, SharedAmplitude};
#[cfg(feature = "audio-io")]
use crate::audio::preprocessor::RECOGNITION_SAMPLE_RATE;
use crate::integration::config::StudioConfig;
use crate::speech::{NullSink, PlaybackSink, SpeechInput, SpeechOutput, Synthesizer, Transcriber};
use std::sync::Arc;
use tracing::{info, warn};

/// State of the live microphone feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MicrophoneStatus {
    Live,
    /// Switched off in the configuration
    Disabled,
    /// The device could not be opened; carries the reason
    Unavailable(String),
}

impl MicrophoneStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, MicrophoneStatus::Live)
    }
}

/// Everything audio the UI drives each frame
pub struct AudioStack {
    pub amplitude: SharedAmplitude,
    pub sampler: Option<AmplitudeSampler>,
    pub speech_input: SpeechInput,
    pub speech_output: SpeechOutput,
    pub microphone: MicrophoneStatus,
    #[cfg(feature = "audio-io")]
    pub devices: devices::Devices,
}

impl AudioStack {
    /// No devices, no engines
    pub fn silent() -> Self {
        Self {
            amplitude: SharedAmplitude::new(),
            sampler: None,
            speech_input: SpeechInput::disabled(),
            speech_output: SpeechOutput::disabled(Arc::new(NullSink)),
            microphone: MicrophoneStatus::Disabled,
            #[cfg(feature = "audio-io")]
            devices: devices::Devices::default(),
        }
    }

    /// Release the microphone and speakers
    pub fn shutdown(&mut self) {
        self.speech_input.cancel();
        self.speech_output.cancel();
        if let Some(sampler) = &mut self.sampler {
            sampler.stop();
        }
        #[cfg(feature = "audio-io")]
        self.devices.stop();
        self.amplitude.set(0.0);
    }
}

/// Build the audio stack described by `config`
pub fn build_audio_stack(config: &StudioConfig) -> AudioStack {
    if !config.audio.enabled {
        info!("Audio disabled by configuration");
        return AudioStack::silent();
    }

    build_with_devices(config)
}

#[cfg(feature = "audio-io")]
fn build_with_devices(config: &StudioConfig) -> AudioStack {
    let amplitude = SharedAmplitude::new();
    let mut devices = devices::Devices::default();

    let (sampler, microphone, capture) = match devices.open_microphone(config, amplitude.clone()) {
        Ok((sampler, capture)) => (Some(sampler), MicrophoneStatus::Live, Some(capture)),
        Err(e) => {
            warn!("Microphone unavailable: {}", e);
            (None, MicrophoneStatus::Unavailable(e.user_message()), None)
        }
    };

    // The capture feed is drained by the recogniser even when it is disabled
    let (chunk_rx, rate) = match capture {
        Some((rx, rate)) => (Some(rx), rate),
        None => (None, RECOGNITION_SAMPLE_RATE),
    };
    let speech_input = SpeechInput::new(
        load_transcriber(config),
        chunk_rx,
        rate,
        config.recognition.endpoint(),
    );

    let sink: Option<Arc<dyn PlaybackSink>> = match devices.open_speakers() {
        Ok(queue) => Some(Arc::new(queue)),
        Err(e) => {
            warn!("Speakers unavailable: {}", e);
            None
        }
    };

    let speech_output = match (load_synthesizer(config), sink) {
        (Some(synthesizer), Some(sink)) => SpeechOutput::new(synthesizer, sink),
        (_, sink) => {
            SpeechOutput::disabled(sink.unwrap_or_else(|| Arc::new(NullSink) as Arc<dyn PlaybackSink>))
        }
    };

    AudioStack {
        amplitude,
        sampler,
        speech_input,
        speech_output,
        microphone,
        devices,
    }
}

#[cfg(not(feature = "audio-io"))]
fn build_with_devices(_config: &StudioConfig) -> AudioStack {
    warn!("Built without audio device support");
    AudioStack {
        microphone: MicrophoneStatus::Unavailable("Built without audio support".into()),
        ..AudioStack::silent()
    }
}

#[cfg(feature = "whisper")]
fn load_transcriber(config: &StudioConfig) -> Option<Box<dyn Transcriber>> {
    use crate::speech::stt::WhisperTranscriber;

    let path = config.speech.whisper_model.as_ref()?;
    match WhisperTranscriber::new(path, config.speech.whisper_threads) {
        Ok(transcriber) => Some(Box::new(transcriber)),
        Err(e) => {
            warn!("Speech recognition disabled: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "whisper"))]
fn load_transcriber(config: &StudioConfig) -> Option<Box<dyn Transcriber>> {
    if config.speech.whisper_model.is_some() {
        warn!("Whisper model configured but built without the `whisper` feature");
    }
    None
}

#[cfg(feature = "sherpa")]
fn load_synthesizer(config: &StudioConfig) -> Option<Box<dyn Synthesizer>> {
    use crate::speech::tts::VitsSynthesizer;

    if config.speech.voices.is_empty() {
        return None;
    }
    match VitsSynthesizer::new(&config.speech.voices) {
        Ok(synthesizer) => Some(Box::new(synthesizer)),
        Err(e) => {
            warn!("Speech synthesis disabled: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "sherpa"))]
fn load_synthesizer(config: &StudioConfig) -> Option<Box<dyn Synthesizer>> {
    if !config.speech.voices.is_empty() {
        warn!("Voices configured but built without the `sherpa` feature");
    }
    None
}

#[cfg(feature = "audio-io")]
mod devices {
    use crate::audio::amplitude::{AmplitudeSampler, SharedAmplitude};
    use crate::audio::{AudioInput, AudioOutput, AudioRingBuffer, PlaybackQueue};
    use crate::integration::config::StudioConfig;
    use crate::Result;
    use crossbeam_channel::{bounded, Receiver};

    /// Chunks buffered between the capture callback and the UI thread
    const CHUNK_QUEUE: usize = 256;

    /// Open cpal streams; dropping this closes them
    #[derive(Default)]
    pub struct Devices {
        input: Option<AudioInput>,
        output: Option<AudioOutput>,
    }

    impl Devices {
        /// Start capture; returns the analyser and the recognition feed
        pub fn open_microphone(
            &mut self,
            config: &StudioConfig,
            amplitude: SharedAmplitude,
        ) -> Result<(AmplitudeSampler, (Receiver<Vec<f32>>, u32))> {
            let mut input = AudioInput::new()?;
            let rate = input.sample_rate();

            let capacity = ((rate as f32 * config.audio.buffer_secs) as usize).max(config.audio.fft_size);
            let ring = AudioRingBuffer::new(capacity);
            let (chunk_tx, chunk_rx) = bounded(CHUNK_QUEUE);

            input.start_capture(ring.clone(), chunk_tx)?;
            let sampler = AmplitudeSampler::new(ring, amplitude, config.audio.fft_size)?;

            self.input = Some(input);
            Ok((sampler, (chunk_rx, rate)))
        }

        pub fn open_speakers(&mut self) -> Result<PlaybackQueue> {
            let mut output = AudioOutput::new()?;
            output.start()?;
            let queue = output.queue();
            self.output = Some(output);
            Ok(queue)
        }

        pub fn stop(&mut self) {
            if let Some(input) = &mut self.input {
                input.stop_capture();
            }
            if let Some(output) = &mut self.output {
                output.stop();
            }
        }
    }
}
