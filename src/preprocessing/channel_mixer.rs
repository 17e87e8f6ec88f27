//! Channel mixing utilities (multi-channel to mono conversion)

/// Average interleaved multi-channel samples down to mono
///
/// # Arguments
///
/// * `interleaved` - Samples laid out frame by frame (`L R L R ...` for stereo)
/// * `channels` - Number of channels per frame
///
/// # Returns
///
/// One sample per frame. A trailing partial frame is dropped. With `channels <= 1`
/// the input is returned unchanged.
pub fn downmix_interleaved(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_passthrough() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_interleaved(&input, 1), input);
    }

    #[test]
    fn test_stereo_average() {
        let input = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_interleaved(&input, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_partial_frame_dropped() {
        let input = vec![0.3, 0.3, 0.3, 0.9, 0.9];
        let mono = downmix_interleaved(&input, 3);
        assert_eq!(mono.len(), 1);
        assert!((mono[0] - 0.3).abs() < 1e-6);
    }
}
