pub mod amplitude;
pub mod buffer;
#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod preprocessor;
pub mod resampler;
pub mod vad;

pub use amplitude::{AmplitudeSampler, SharedAmplitude, SpectrumAnalyser};
pub use buffer::AudioRingBuffer;
#[cfg(feature = "audio-io")]
pub use input::AudioInput;
#[cfg(feature = "audio-io")]
pub use output::{AudioOutput, PlaybackQueue};
pub use resampler::{resample_mono, MonoResampler};
pub use vad::{Endpoint, EndpointConfig, Endpointer, SileroDetector, SpeechDetector};
