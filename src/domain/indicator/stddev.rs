//! Rolling sample standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) values are undefined; n < 2 is undefined everywhere.

pub fn calculate_stddev(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if period < 2 {
        out.resize(values.len(), None);
        return out;
    }

    for i in 0..values.len() {
        if i + 1 < period {
            out.push(None);
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let variance: f64 = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;
        out.push(Some(variance.sqrt()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_warmup() {
        let series = calculate_stddev(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(series[0].is_none());
        assert!(series[1].is_none());
        assert!(series[2].is_some());
        assert!(series[4].is_some());
    }

    #[test]
    fn stddev_constant_values() {
        let series = calculate_stddev(&[100.0; 5], 3);
        assert!((series[2].unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stddev_uses_sample_divisor() {
        // mean 20, squared deviations 100 + 0 + 100 = 200, / (3 - 1) = 100
        let series = calculate_stddev(&[10.0, 20.0, 30.0], 3);
        assert!((series[2].unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn stddev_known_values() {
        // population stddev of this classic series is 2; sample is sqrt(32/7)
        let series = calculate_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((series[7].unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn stddev_period_one_undefined() {
        assert_eq!(calculate_stddev(&[1.0, 2.0], 1), vec![None, None]);
    }
}
