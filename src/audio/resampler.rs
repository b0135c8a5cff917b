use crate::{Result, StudioError};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Frames fed to the sinc resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Mono sample-rate converter
///
/// Used to bring microphone audio down to the recogniser's 16 kHz and to
/// bring synthesised speech up to the output device rate.
pub struct MonoResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl MonoResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(StudioError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let resampler = SincFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            2.0,
            params,
            CHUNK_FRAMES,
            1,
        )
        .map_err(|e| {
            StudioError::AudioProcessingError(format!("Failed to create resampler: {}", e))
        })?;

        debug!("Created resampler: {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
        })
    }

    /// Convert a complete mono clip
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let expected = (input.len() as f64 * ratio).ceil() as usize;
        let mut output = Vec::with_capacity(expected + CHUNK_FRAMES);

        for chunk in input.chunks(CHUNK_FRAMES) {
            // SincFixedIn wants exactly CHUNK_FRAMES per call
            let mut planar = vec![vec![0.0f32; CHUNK_FRAMES]];
            planar[0][..chunk.len()].copy_from_slice(chunk);

            let processed = self.resampler.process(&planar, None).map_err(|e| {
                StudioError::AudioProcessingError(format!("Resampling failed: {}", e))
            })?;

            let produced = &processed[0];
            let keep = if chunk.len() < CHUNK_FRAMES {
                ((chunk.len() as f64) * ratio).ceil() as usize
            } else {
                produced.len()
            };
            output.extend_from_slice(&produced[..keep.min(produced.len())]);
        }

        self.resampler.reset();
        Ok(output)
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }
}

/// Resample a mono clip in one step
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }

    MonoResampler::new(input_rate, output_rate)?.process(input)
}
