use crate::audio::buffer::AudioRingBuffer;
use crate::audio::preprocessor::downmix;
use crate::{Result, StudioError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Microphone capture on the default input device
///
/// Every callback writes the mono samples into the amplitude ring buffer and
/// forwards them to the recognition chunk channel.
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    is_capturing: Arc<AtomicBool>,
}

impl AudioInput {
    /// Open the default input device
    ///
    /// Fails with [`StudioError::MicrophoneUnavailable`] when there is no
    /// device or the platform refuses access.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| StudioError::MicrophoneUnavailable("No input device available".into()))?;

        info!("Using input device: {}", device.name().unwrap_or_else(|_| "Unknown".to_string()));

        let config = device
            .default_input_config()
            .map_err(|e| StudioError::MicrophoneUnavailable(format!("Failed to get input config: {}", e)))?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            is_capturing: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the sample rate of the input device
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Get the number of channels
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Start capturing into `ring` and `chunk_tx`
    pub fn start_capture(&mut self, ring: AudioRingBuffer, chunk_tx: Sender<Vec<f32>>) -> Result<()> {
        if self.is_capturing.load(Ordering::SeqCst) {
            warn!("Already capturing");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let is_capturing = Arc::clone(&self.is_capturing);

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !is_capturing.load(Ordering::Relaxed) {
                        return;
                    }

                    let samples = downmix(data, channels);
                    ring.write(&samples);

                    if let Err(e) = chunk_tx.try_send(samples) {
                        debug!("Dropping capture chunk: {}", e);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| StudioError::MicrophoneUnavailable(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| StudioError::MicrophoneUnavailable(format!("Failed to start input stream: {}", e)))?;

        self.is_capturing.store(true, Ordering::SeqCst);
        self.stream = Some(stream);

        info!("Started microphone capture at {} Hz", self.sample_rate());
        Ok(())
    }

    /// Stop capturing and release the stream
    pub fn stop_capture(&mut self) {
        self.is_capturing.store(false, Ordering::SeqCst);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Stopped microphone capture");
        }
    }

    /// Check if currently capturing
    pub fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }
}

impl Drop for AudioInput {
    fn drop(&mut self) {
        self.stop_capture();
    }
}
