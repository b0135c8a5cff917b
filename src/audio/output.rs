use crate::audio::resampler::resample_mono;
use crate::speech::tts::{PlaybackSink, SynthesizedAudio};
use crate::{Result, StudioError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Samples waiting to be played, shared with the output callback
///
/// Holds at most one utterance: `play` replaces whatever was queued.
#[derive(Clone)]
pub struct PlaybackQueue {
    samples: Arc<Mutex<VecDeque<f32>>>,
    device_rate: u32,
}

impl PlaybackQueue {
    pub fn new(device_rate: u32) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::new())),
            device_rate,
        }
    }

    /// Fill `data` (interleaved, `channels` wide) and return frames written
    fn fill(&self, data: &mut [f32], channels: usize) -> usize {
        let mut queue = self.samples.lock();
        let mut frames = 0;

        for frame in data.chunks_mut(channels) {
            match queue.pop_front() {
                Some(sample) => {
                    frame.fill(sample);
                    frames += 1;
                }
                None => frame.fill(0.0),
            }
        }

        frames
    }

    pub fn queued_samples(&self) -> usize {
        self.samples.lock().len()
    }
}

impl PlaybackSink for PlaybackQueue {
    fn prepare(&self, audio: SynthesizedAudio) -> Result<SynthesizedAudio> {
        if audio.sample_rate == self.device_rate {
            return Ok(audio);
        }
        let samples = resample_mono(&audio.samples, audio.sample_rate, self.device_rate)?;
        Ok(SynthesizedAudio::new(samples, self.device_rate))
    }

    fn play(&self, audio: &SynthesizedAudio) -> Result<()> {
        if audio.sample_rate != self.device_rate {
            return self.play(&self.prepare(audio.clone())?);
        }

        let mut queue = self.samples.lock();
        queue.clear();
        queue.extend(audio.samples.iter().copied());
        debug!("Queued {} samples for playback", queue.len());
        Ok(())
    }

    fn stop(&self) {
        self.samples.lock().clear();
    }

    fn is_playing(&self) -> bool {
        !self.samples.lock().is_empty()
    }
}

/// Speaker output on the default device
///
/// The stream runs for the lifetime of this value and plays silence while
/// the queue is empty.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    queue: PlaybackQueue,
}

impl AudioOutput {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| StudioError::AudioDeviceError("No output device available".into()))?;

        info!("Using output device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));

        let config: StreamConfig = device
            .default_output_config()
            .map_err(|e| StudioError::AudioDeviceError(format!("Failed to get output config: {}", e)))?
            .into();

        let queue = PlaybackQueue::new(config.sample_rate.0);

        Ok(Self {
            device,
            config,
            stream: None,
            queue,
        })
    }

    /// Get the sample rate of the output device
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Get the number of channels
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Handle the speech output writes into
    pub fn queue(&self) -> PlaybackQueue {
        self.queue.clone()
    }

    /// Start the output stream
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let queue = self.queue.clone();

        let err_fn = |err| {
            error!("Audio output stream error: {}", err);
        };

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    queue.fill(data, channels);
                },
                err_fn,
                None,
            )
            .map_err(|e| StudioError::AudioDeviceError(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| StudioError::AudioDeviceError(format!("Failed to start output stream: {}", e)))?;

        self.stream = Some(stream);

        info!("Started audio output at {} Hz", self.sample_rate());
        Ok(())
    }

    /// Stop the output stream
    pub fn stop(&mut self) {
        self.queue.stop();

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Stopped audio output");
        }
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
