//! Peak detection utilities
//!
//! Local maxima and sub-sample peak refinement for 1D curves (autocorrelation
//! functions, tempo scores, cumulative beat scores).

/// Indices of local maxima
///
/// `x[i]` is a local maximum if `x[i] > x[i - 1]` and `x[i] >= x[i + 1]`.
/// The first element is never a maximum; the last one is if it rises above
/// its left neighbour.
///
/// # Example
///
/// ```
/// use tempo_dsp::features::period::peak_picking::local_maxima;
///
/// let signal = vec![0.0, 0.5, 1.0, 0.7, 0.3, 0.9, 0.2];
/// assert_eq!(local_maxima(&signal), vec![2, 5]);
/// ```
pub fn local_maxima(signal: &[f32]) -> Vec<usize> {
    let n = signal.len();
    if n < 2 {
        return vec![];
    }

    let mut peaks = Vec::new();
    for i in 1..n {
        let rises = signal[i] > signal[i - 1];
        let holds = i + 1 == n || signal[i] >= signal[i + 1];
        if rises && holds {
            peaks.push(i);
        }
    }
    peaks
}

/// Index of the largest finite value in `signal[range]`
pub fn argmax_in(signal: &[f32], start: usize, end: usize) -> Option<usize> {
    let end = end.min(signal.len());
    (start..end)
        .filter(|&i| signal[i].is_finite())
        .max_by(|&a, &b| signal[a].total_cmp(&signal[b]))
}

/// Refine a peak position with parabolic interpolation
///
/// Fits a parabola through `signal[idx - 1..=idx + 1]` and returns the
/// fractional index of its vertex. Falls back to `idx` at the edges or when
/// a neighbour is not finite. The offset is limited to half a sample.
pub fn refine_peak(signal: &[f32], idx: usize) -> f32 {
    if idx == 0 || idx + 1 >= signal.len() {
        return idx as f32;
    }

    let (left, centre, right) = (signal[idx - 1], signal[idx], signal[idx + 1]);
    if !(left.is_finite() && centre.is_finite() && right.is_finite()) {
        return idx as f32;
    }

    let denom = left - 2.0 * centre + right;
    if denom.abs() < 1e-12 {
        return idx as f32;
    }

    let offset = (0.5 * (left - right) / denom).clamp(-0.5, 0.5);
    idx as f32 + offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_maxima_basic() {
        let signal = vec![0.0, 1.0, 0.0, 2.0, 0.0];
        assert_eq!(local_maxima(&signal), vec![1, 3]);
    }

    #[test]
    fn test_local_maxima_plateau_and_edges() {
        // Plateau counts once at its left end; a rising tail counts
        assert_eq!(local_maxima(&[0.0, 1.0, 1.0, 0.0]), vec![1]);
        assert_eq!(local_maxima(&[0.0, 1.0, 2.0]), vec![2]);
        assert!(local_maxima(&[3.0, 2.0, 1.0]).is_empty());
        assert!(local_maxima(&[1.0]).is_empty());
    }

    #[test]
    fn test_argmax_skips_non_finite() {
        let signal = vec![f32::NEG_INFINITY, 0.5, f32::NAN, 0.7, 0.1];
        assert_eq!(argmax_in(&signal, 0, 5), Some(3));
        assert_eq!(argmax_in(&signal, 0, 2), Some(1));
        assert_eq!(argmax_in(&signal, 5, 9), None);
    }

    #[test]
    fn test_refine_peak_symmetric() {
        let signal = vec![0.0, 1.0, 2.0, 1.0, 0.0];
        assert!((refine_peak(&signal, 2) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_refine_peak_shifts_toward_larger_neighbour() {
        // Samples of -(x - 2.3)^2
        let signal: Vec<f32> = (0..5).map(|x| -((x as f32 - 2.3).powi(2))).collect();
        assert!((refine_peak(&signal, 2) - 2.3).abs() < 1e-4);
    }

    #[test]
    fn test_refine_peak_edges() {
        let signal = vec![1.0, 0.5];
        assert_eq!(refine_peak(&signal, 0), 0.0);
        assert_eq!(refine_peak(&signal, 1), 1.0);
    }
}
