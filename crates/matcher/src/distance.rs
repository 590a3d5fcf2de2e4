/// Chi-square distance between two histograms:
/// `sum((q - d)^2 / (q + d))`, skipping bins where both are zero.
///
/// Bins are paired positionally; callers are expected to pass histograms of
/// equal length. The result is never negative zero.
pub fn chi_square_distance(query: &[f64], reference: &[f64]) -> f64 {
    query
        .iter()
        .zip(reference)
        .filter_map(|(&q, &d)| {
            let sum = q + d;
            if sum == 0.0 {
                None
            } else {
                let diff = q - d;
                Some(diff * diff / sum)
            }
        })
        .fold(0.0, |acc, term| acc + term)
}
