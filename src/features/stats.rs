//! Small descriptive statistics shared by the feature extractors and the
//! reconciler

/// Arithmetic mean (0.0 for an empty slice)
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population variance (divides by `n`)
pub fn population_variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32
}

/// Population standard deviation
pub fn std_dev(values: &[f32]) -> f32 {
    population_variance(values).sqrt()
}

/// Median, reordering `values` in place
///
/// For an even count this is the mean of the two middle values. Returns 0.0
/// for an empty slice.
pub fn median_in_place(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }

    let mid = n / 2;
    let (lower, upper_mid, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    let upper_mid = *upper_mid;

    if n % 2 == 1 {
        upper_mid
    } else {
        let lower_mid = lower.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        (lower_mid + upper_mid) / 2.0
    }
}

/// Median of a slice without modifying it
pub fn median(values: &[f32]) -> f32 {
    let mut scratch = values.to_vec();
    median_in_place(&mut scratch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[160.0, 118.0, 120.0]), 120.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_population_variance() {
        let var = population_variance(&[100.0, 120.0, 140.0]);
        assert!((var - 266.666_66).abs() < 1e-3);
        assert_eq!(population_variance(&[120.0, 120.0, 120.0]), 0.0);
    }

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!((std_dev(&[2.0, 4.0]) - 1.0).abs() < 1e-6);
    }
}
