//! Live loudness estimate for the particle field
//!
//! Mirrors what a Web Audio `AnalyserNode` reports through
//! `getByteFrequencyData`: a Blackman-windowed FFT whose bin magnitudes are
//! mapped from decibels onto `0..=255`. The sampler averages those bytes into
//! one scalar per rendered frame.

use crate::audio::buffer::AudioRingBuffer;
use crate::{Result, StudioError};
use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Default transform size (128 frequency bins)
pub const DEFAULT_FFT_SIZE: usize = 256;

/// Lower end of the byte mapping, in dBFS
pub const MIN_DECIBELS: f32 = -100.0;

/// Upper end of the byte mapping, in dBFS
pub const MAX_DECIBELS: f32 = -30.0;

/// The current amplitude scalar, shared between the sampler and the renderer
///
/// Last write wins; no history is kept.
#[derive(Debug, Clone, Default)]
pub struct SharedAmplitude {
    bits: Arc<AtomicU32>,
}

impl SharedAmplitude {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Frequency analyser producing byte magnitudes per bin
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    spectrum: Vec<Complex32>,
    fft_size: usize,
}

impl SpectrumAnalyser {
    /// Create an analyser for the given transform size
    pub fn new(fft_size: usize) -> Result<Self> {
        if fft_size < 32 || !fft_size.is_power_of_two() {
            return Err(StudioError::ConfigError(format!(
                "FFT size must be a power of two >= 32, got {}",
                fft_size
            )));
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);

        Ok(Self {
            fft,
            window: blackman_window(fft_size),
            spectrum: vec![Complex32::new(0.0, 0.0); fft_size],
            fft_size,
        })
    }

    /// Number of frequency bins (half the transform size)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Compute byte magnitudes for one time-domain frame
    ///
    /// `samples` must hold `fft_size` values; `out` receives `bin_count` bytes.
    pub fn byte_frequency_data(&mut self, samples: &[f32], out: &mut [u8]) {
        for (slot, (sample, w)) in self
            .spectrum
            .iter_mut()
            .zip(samples.iter().zip(self.window.iter()))
        {
            *slot = Complex32::new(sample * w, 0.0);
        }

        self.fft.process(&mut self.spectrum);

        let scale = 1.0 / self.fft_size as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;

        for (byte, bin) in out.iter_mut().zip(self.spectrum.iter()) {
            let magnitude = bin.norm() * scale;
            let db = if magnitude > 0.0 {
                20.0 * magnitude.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 * (db - MIN_DECIBELS) / range;
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Samples the microphone ring buffer once per frame and publishes the mean
/// byte magnitude into a [`SharedAmplitude`]
pub struct AmplitudeSampler {
    analyser: SpectrumAnalyser,
    source: AudioRingBuffer,
    amplitude: SharedAmplitude,
    frame: Vec<f32>,
    bins: Vec<u8>,
    running: bool,
}

impl AmplitudeSampler {
    pub fn new(source: AudioRingBuffer, amplitude: SharedAmplitude, fft_size: usize) -> Result<Self> {
        let analyser = SpectrumAnalyser::new(fft_size)?;
        let bins = vec![0u8; analyser.bin_count()];

        info!(
            "Amplitude sampler ready: {}-point FFT, {} bins",
            fft_size,
            bins.len()
        );

        Ok(Self {
            analyser,
            source,
            amplitude,
            frame: vec![0.0; fft_size],
            bins,
            running: true,
        })
    }

    /// Take one amplitude sample and publish it
    ///
    /// Returns the value stored, or 0 once the sampler has been stopped.
    pub fn tick(&mut self) -> f32 {
        if !self.running {
            return 0.0;
        }

        self.source.latest(&mut self.frame);
        self.analyser.byte_frequency_data(&self.frame, &mut self.bins);

        let sum: u32 = self.bins.iter().map(|&b| b as u32).sum();
        let mean = sum as f32 / self.bins.len() as f32;

        self.amplitude.set(mean);
        mean
    }

    /// Stop sampling and zero the published amplitude
    pub fn stop(&mut self) {
        if self.running {
            debug!("Amplitude sampler stopped");
        }
        self.running = false;
        self.amplitude.set(0.0);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The most recent per-bin magnitudes
    pub fn bins(&self) -> &[u8] {
        &self.bins
    }
}

fn blackman_window(n: usize) -> Vec<f32> {
    let alpha = 0.16f32;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    let two_pi = 2.0 * std::f32::consts::PI;

    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (two_pi * x).cos() + a2 * (2.0 * two_pi * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, freq_bin: f32, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq_bin * i as f32 / DEFAULT_FFT_SIZE as f32).sin()
                    * amplitude
            })
            .collect()
    }

    #[test]
    fn test_bin_count_is_half_fft_size() {
        let analyser = SpectrumAnalyser::new(256).unwrap();
        assert_eq!(analyser.bin_count(), 128);
    }

    #[test]
    fn test_rejects_bad_fft_size() {
        assert!(SpectrumAnalyser::new(100).is_err());
        assert!(SpectrumAnalyser::new(16).is_err());
    }

    #[test]
    fn test_silence_reads_zero() {
        let buffer = AudioRingBuffer::new(4096);
        buffer.write(&vec![0.0; 1024]);
        let amplitude = SharedAmplitude::new();

        let mut sampler = AmplitudeSampler::new(buffer, amplitude.clone(), 256).unwrap();
        assert_eq!(sampler.tick(), 0.0);
        assert_eq!(amplitude.get(), 0.0);
    }

    #[test]
    fn test_tone_raises_amplitude() {
        let buffer = AudioRingBuffer::new(4096);
        buffer.write(&sine(1024, 16.0, 0.8));
        let amplitude = SharedAmplitude::new();

        let mut sampler = AmplitudeSampler::new(buffer, amplitude.clone(), 256).unwrap();
        let value = sampler.tick();

        assert!(value > 1.0, "expected audible amplitude, got {}", value);
        assert_eq!(amplitude.get(), value);
        assert_eq!(sampler.bins()[16], 255);
    }

    #[test]
    fn test_each_sample_replaces_previous() {
        let buffer = AudioRingBuffer::new(256);
        let amplitude = SharedAmplitude::new();
        let mut sampler = AmplitudeSampler::new(buffer.clone(), amplitude.clone(), 256).unwrap();

        buffer.write(&sine(256, 16.0, 0.8));
        assert!(sampler.tick() > 0.0);

        buffer.write(&vec![0.0; 256]);
        assert_eq!(sampler.tick(), 0.0);
        assert_eq!(amplitude.get(), 0.0);
    }

    #[test]
    fn test_stop_zeroes_amplitude() {
        let buffer = AudioRingBuffer::new(1024);
        buffer.write(&sine(1024, 8.0, 0.5));
        let amplitude = SharedAmplitude::new();
        let mut sampler = AmplitudeSampler::new(buffer, amplitude.clone(), 256).unwrap();

        assert!(sampler.tick() > 0.0);
        sampler.stop();

        assert!(!sampler.is_running());
        assert_eq!(amplitude.get(), 0.0);
        assert_eq!(sampler.tick(), 0.0);
    }
}
