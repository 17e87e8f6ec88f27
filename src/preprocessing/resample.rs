//! Sample-rate conversion for analysis
//!
//! Tempo analysis does not need the full audio bandwidth, so the waveform is
//! usually brought down to a lower rate first. This trades a little onset
//! sharpness for a large cut in STFT cost.

use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::error::AnalysisError;

const CHUNK_SIZE: usize = 1024;

fn build_resampler(from_rate: u32, to_rate: u32) -> Result<SincFixedIn<f32>, AnalysisError> {
    let ratio = to_rate as f64 / from_rate as f64;
    let sinc_len = 128usize;
    let window = WindowFunction::BlackmanHarris2;
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff: calculate_cutoff(sinc_len, window),
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window,
    };

    SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1).map_err(|e| {
        AnalysisError::ProcessingError(format!(
            "Failed to build resampler {} -> {} Hz: {}",
            from_rate, to_rate, e
        ))
    })
}

/// Resample mono audio from `from_rate` to `to_rate`
///
/// The output is aligned with the input (the filter delay is removed) and has
/// `round(len * to_rate / from_rate)` samples.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for zero rates and
/// `AnalysisError::ProcessingError` if the resampler fails.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AnalysisError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid resampling rates: {} -> {}",
            from_rate, to_rate
        )));
    }

    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    log::debug!(
        "Resampling {} samples from {} Hz to {} Hz",
        samples.len(),
        from_rate,
        to_rate
    );

    let mut resampler = build_resampler(from_rate, to_rate)?;
    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let delay = resampler.output_delay();
    let map_err = |e: rubato::ResampleError| {
        AnalysisError::ProcessingError(format!("Resampling failed: {}", e))
    };

    let mut out: Vec<f32> = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut pos = 0usize;

    loop {
        let need = resampler.input_frames_next();
        if samples.len() - pos < need {
            break;
        }
        let block = vec![samples[pos..pos + need].to_vec()];
        let processed = resampler.process(&block[..], None).map_err(map_err)?;
        out.extend_from_slice(&processed[0]);
        pos += need;
    }

    if pos < samples.len() {
        let block = vec![samples[pos..].to_vec()];
        let processed = resampler.process_partial(Some(&block[..]), None).map_err(map_err)?;
        out.extend_from_slice(&processed[0]);
    }

    // Flush the filter tail until the delayed output covers the whole input
    while out.len() < expected + delay {
        let processed = resampler
            .process_partial::<Vec<f32>>(None, None)
            .map_err(map_err)?;
        if processed[0].is_empty() {
            break;
        }
        out.extend_from_slice(&processed[0]);
    }

    let end = (delay + expected).min(out.len());
    let start = delay.min(end);
    Ok(out[start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let input = vec![0.25f32; 100];
        assert_eq!(resample(&input, 22050, 22050).unwrap(), input);
    }

    #[test]
    fn test_downsample_halves_length() {
        let input: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
            .collect();
        let out = resample(&input, 44100, 22050).unwrap();
        assert_eq!(out.len(), 22050);

        // A 220 Hz tone survives downsampling with roughly the same level
        let rms_in = (input.iter().map(|x| x * x).sum::<f32>() / input.len() as f32).sqrt();
        let middle = &out[2000..20000];
        let rms_out = (middle.iter().map(|x| x * x).sum::<f32>() / middle.len() as f32).sqrt();
        assert!(
            (rms_in - rms_out).abs() < 0.05,
            "rms changed too much: {:.3} -> {:.3}",
            rms_in,
            rms_out
        );
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(resample(&[0.0; 10], 0, 22050).is_err());
        assert!(resample(&[0.0; 10], 44100, 0).is_err());
    }
}
