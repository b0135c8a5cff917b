//! Speech input and output
//!
//! - Speech-to-text: one utterance per session, transcribed by Whisper
//! - Text-to-speech: VITS voices through sherpa-rs, last utterance wins

pub mod language;
pub mod stt;
pub mod tts;

pub use language::Language;
pub use stt::{RecognitionOutcome, RecognitionPhase, SpeechInput, Transcriber};
pub use tts::{
    select_voice, NullSink, PlaybackSink, SpeechOutput, SynthesizedAudio, Synthesizer, Voice,
    VoiceModelConfig,
};
