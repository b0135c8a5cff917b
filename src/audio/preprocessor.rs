use crate::audio::resampler::resample_mono;
use crate::Result;
use tracing::debug;

/// Sample rate expected by the speech recogniser
pub const RECOGNITION_SAMPLE_RATE: u32 = 16000;

/// Down-mix interleaved audio to mono by averaging channels
pub fn downmix(input: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return input.to_vec();
    }

    input
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Normalize audio to a peak amplitude of 0.95
pub fn normalize_audio(samples: &[f32]) -> Vec<f32> {
    let peak = samples
        .iter()
        .map(|&s| s.abs())
        .fold(0.0f32, |max, val| max.max(val));

    if peak == 0.0 || peak.is_nan() {
        return samples.to_vec();
    }

    let gain = 0.95 / peak;
    samples.iter().map(|&s| s * gain).collect()
}

/// Remove DC offset by subtracting the mean
pub fn remove_dc_offset(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mean: f32 = samples.iter().sum::<f32>() / samples.len() as f32;
    samples.iter().map(|&s| s - mean).collect()
}

/// Prepare a captured mono utterance for the recogniser
///
/// DC removal, resampling to 16 kHz, then peak normalisation.
pub fn preprocess_for_recognition(input: &[f32], input_sample_rate: u32) -> Result<Vec<f32>> {
    debug!(
        "Preprocessing utterance: {} samples at {}Hz",
        input.len(),
        input_sample_rate
    );

    let no_dc = remove_dc_offset(input);
    let resampled = resample_mono(&no_dc, input_sample_rate, RECOGNITION_SAMPLE_RATE)?;
    let normalized = normalize_audio(&resampled);

    debug!(
        "Preprocessing complete: {} samples at {}Hz",
        normalized.len(),
        RECOGNITION_SAMPLE_RATE
    );

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_audio() {
        let output = normalize_audio(&[0.5, -0.3, 0.8, -0.2]);
        let peak = output.iter().map(|&s| s.abs()).fold(0.0, f32::max);
        assert!((peak - 0.95).abs() < 0.01);
    }

    #[test]
    fn test_normalize_silence_is_untouched() {
        assert_eq!(normalize_audio(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_downmix_stereo() {
        let output = downmix(&[1.0, -1.0, 0.5, -0.5, 0.8, 0.4], 2);
        assert_eq!(output.len(), 3);
        assert_eq!(output[0], 0.0);
        assert!((output[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_remove_dc_offset() {
        let output = remove_dc_offset(&[1.0, 1.1, 0.9, 1.0]);
        let mean: f32 = output.iter().sum::<f32>() / output.len() as f32;
        assert!(mean.abs() < 0.0001);
    }

    #[test]
    fn test_preprocess_at_native_rate() {
        let input: Vec<f32> = (0..1600).map(|i| 0.1 + (i as f32 * 0.05).sin() * 0.2).collect();
        let output = preprocess_for_recognition(&input, RECOGNITION_SAMPLE_RATE).unwrap();
        assert_eq!(output.len(), input.len());
        let peak = output.iter().map(|&s| s.abs()).fold(0.0, f32::max);
        assert!((peak - 0.95).abs() < 0.01);
    }
}
