//! Two-sample statistics used for drift decisions

use crate::contracts::StatTestKind;

/// Reference size up to which the automatic choice is Kolmogorov-Smirnov
pub const AUTO_KS_MAX_REFERENCE: usize = 1000;

/// Lower bound of the Wasserstein normalizer
const MIN_NORM: f64 = 0.001;

/// Outcome of one stat test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatTestOutcome {
    pub kind: StatTestKind,
    pub threshold: f64,
    pub score: f64,
    pub drift_detected: bool,
}

/// Kolmogorov-Smirnov result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Stat test picked when a metric does not name one
pub fn auto_stattest(reference_len: usize) -> StatTestKind {
    if reference_len <= AUTO_KS_MAX_REFERENCE {
        StatTestKind::Ks
    } else {
        StatTestKind::Wasserstein
    }
}

/// Run `kind` on non-empty samples
pub fn run_stattest(
    kind: StatTestKind,
    threshold: Option<f64>,
    reference: &[f64],
    current: &[f64],
) -> StatTestOutcome {
    let threshold = threshold.unwrap_or_else(|| kind.default_threshold());
    let (score, drift_detected) = match kind {
        StatTestKind::Wasserstein => {
            let score = normed_wasserstein(reference, current);
            (score, score >= threshold)
        }
        StatTestKind::Ks => {
            let p_value = ks_2samp(reference, current).p_value;
            (p_value, p_value < threshold)
        }
    };

    StatTestOutcome {
        kind,
        threshold,
        score,
        drift_detected,
    }
}

/// Wasserstein distance divided by the reference standard deviation
pub fn normed_wasserstein(reference: &[f64], current: &[f64]) -> f64 {
    let norm = population_std(reference).unwrap_or(0.0).max(MIN_NORM);
    wasserstein_distance(reference, current) / norm
}

/// First Wasserstein distance between two empirical distributions
pub fn wasserstein_distance(u: &[f64], v: &[f64]) -> f64 {
    if u.is_empty() || v.is_empty() {
        return 0.0;
    }
    let u = sorted(u);
    let v = sorted(v);
    let all = merged(&u, &v);

    let (nu, nv) = (u.len() as f64, v.len() as f64);
    let (mut iu, mut iv) = (0usize, 0usize);
    let mut distance = 0.0;

    for pair in all.windows(2) {
        let x = pair[0];
        while iu < u.len() && u[iu] <= x {
            iu += 1;
        }
        while iv < v.len() && v[iv] <= x {
            iv += 1;
        }
        distance += (iu as f64 / nu - iv as f64 / nv).abs() * (pair[1] - pair[0]);
    }

    distance
}

/// Two-sample Kolmogorov-Smirnov test with the asymptotic p-value
pub fn ks_2samp(u: &[f64], v: &[f64]) -> KsResult {
    if u.is_empty() || v.is_empty() {
        return KsResult {
            statistic: 0.0,
            p_value: 1.0,
        };
    }
    let u = sorted(u);
    let v = sorted(v);
    let all = merged(&u, &v);

    let (nu, nv) = (u.len() as f64, v.len() as f64);
    let (mut iu, mut iv) = (0usize, 0usize);
    let mut statistic: f64 = 0.0;

    for &x in &all {
        while iu < u.len() && u[iu] <= x {
            iu += 1;
        }
        while iv < v.len() && v[iv] <= x {
            iv += 1;
        }
        statistic = statistic.max((iu as f64 / nu - iv as f64 / nv).abs());
    }

    let en = (nu * nv / (nu + nv)).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * statistic;

    KsResult {
        statistic,
        p_value: kolmogorov_q(lambda),
    }
}

/// Complementary Kolmogorov distribution `Q(lambda) = P(K > lambda)`
fn kolmogorov_q(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let q = if lambda < 1.18 {
        let y = (-std::f64::consts::PI.powi(2) / (8.0 * lambda * lambda)).exp();
        let p = (2.0 * std::f64::consts::PI).sqrt() / lambda
            * (y + y.powi(9) + y.powi(25) + y.powi(49));
        1.0 - p
    } else {
        let x = (-2.0 * lambda * lambda).exp();
        2.0 * (x - x.powi(4) + x.powi(9) - x.powi(16))
    };
    q.clamp(0.0, 1.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with divisor `n`
pub fn population_std(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Percentile of sorted data with linear interpolation between ranks
pub fn percentile(sorted_data: &[f64], p: f64) -> Option<f64> {
    if sorted_data.is_empty() {
        return None;
    }
    let rank = p / 100.0 * (sorted_data.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted_data[lower] + (sorted_data[upper] - sorted_data[lower]) * weight)
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

fn merged(u: &[f64], v: &[f64]) -> Vec<f64> {
    let mut all = Vec::with_capacity(u.len() + v.len());
    all.extend_from_slice(u);
    all.extend_from_slice(v);
    all.sort_by(|a, b| a.total_cmp(b));
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_wasserstein_known_values() {
        assert!(close(wasserstein_distance(&[0.0, 1.0, 3.0], &[5.0, 6.0, 8.0]), 5.0));
        assert!(close(wasserstein_distance(&[0.0, 1.0], &[0.0, 1.0]), 0.0));
        assert!(close(wasserstein_distance(&[3.0, 1.0, 0.0], &[8.0, 6.0, 5.0]), 5.0));
    }

    #[test]
    fn test_normed_wasserstein_uses_floor_for_constant_reference() {
        let score = normed_wasserstein(&[1.0, 1.0], &[1.001, 1.001]);
        assert!(close(score, 1.0));
    }

    #[test]
    fn test_ks_identical_samples() {
        let sample = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ks_2samp(&sample, &sample);
        assert!(close(result.statistic, 0.0));
        assert!(close(result.p_value, 1.0));
    }

    #[test]
    fn test_ks_disjoint_samples() {
        let u: Vec<f64> = (0..50).map(f64::from).collect();
        let v: Vec<f64> = (100..150).map(f64::from).collect();
        let result = ks_2samp(&u, &v);
        assert!(close(result.statistic, 1.0));
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn test_run_stattest_thresholds() {
        let reference: Vec<f64> = (0..100).map(f64::from).collect();
        let shifted: Vec<f64> = reference.iter().map(|x| x + 50.0).collect();

        let outcome = run_stattest(StatTestKind::Wasserstein, None, &reference, &shifted);
        assert!(outcome.drift_detected);
        assert_eq!(outcome.threshold, 0.1);

        let outcome = run_stattest(StatTestKind::Ks, None, &reference, &reference);
        assert!(!outcome.drift_detected);
        assert_eq!(outcome.threshold, 0.05);
    }

    #[test]
    fn test_auto_stattest() {
        assert_eq!(auto_stattest(10), StatTestKind::Ks);
        assert_eq!(auto_stattest(1000), StatTestKind::Ks);
        assert_eq!(auto_stattest(1001), StatTestKind::Wasserstein);
    }

    #[test]
    fn test_summary_helpers() {
        let data = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(mean(&data), Some(2.5));
        assert!(close(population_std(&data).unwrap(), 1.25f64.sqrt()));
        assert_eq!(percentile(&data, 50.0), Some(2.5));
        assert_eq!(percentile(&data, 0.0), Some(1.0));
        assert_eq!(percentile(&data, 100.0), Some(4.0));
        assert_eq!(percentile(&[], 50.0), None);
    }
}
