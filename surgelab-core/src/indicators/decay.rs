//! Half-life weighting: the newest element weighs 1 and older elements fall
//! off as `exp(−age / half_life)`.

/// Weighted mean with `weight_i = exp(−(n − 1 − i) / half_life)`.
///
/// Returns 0.0 for an empty slice or a non-positive half-life.
pub fn decay_weighted_mean(values: &[f64], half_life: f64) -> f64 {
    let n = values.len();
    if n == 0 || half_life <= 0.0 {
        return 0.0;
    }
    let (weighted, total_weight) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(acc, total), (i, &v)| {
            let w = (-((n - 1 - i) as f64) / half_life).exp();
            (acc + w * v, total + w)
        });
    weighted / total_weight
}
