//! Rolling percentile rank with minimum-rank tie handling.
//!
//! For each position i the window is the last `window` observations ending
//! at i (shorter at the start of the series). The rank of the current value
//! is one plus the number of present values strictly below it, so tied
//! values all share the lowest rank of their group. The percentile is that
//! rank divided by the number of present values in the window.
//!
//! A missing current value yields a missing percentile. Missing values
//! elsewhere in the window are excluded from both the comparison set and the
//! denominator.

pub fn rolling_percentile_rank(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if window == 0 {
        out.resize(values.len(), None);
        return out;
    }

    for i in 0..values.len() {
        let Some(current) = values[i] else {
            out.push(None);
            continue;
        };
        let start = (i + 1).saturating_sub(window);
        let mut present = 0usize;
        let mut below = 0usize;
        for v in values[start..=i].iter().flatten() {
            present += 1;
            if *v < current {
                below += 1;
            }
        }
        out.push(Some((below + 1) as f64 / present as f64));
    }
    out
}

/// `1 - rank`: for series where a higher reading means a cheaper market.
pub fn inverted_percentile_rank(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_percentile_rank(values, window)
        .into_iter()
        .map(|p| p.map(|p| 1.0 - p))
        .collect()
}
