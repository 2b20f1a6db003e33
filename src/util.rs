pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Percentage of `part` in `total`; `None` when `total` is zero.
pub fn percentage(part: usize, total: usize) -> Option<f64> {
    match total {
        0 => None,
        _ => Some(part as f64 * 100.0 / total as f64),
    }
}
