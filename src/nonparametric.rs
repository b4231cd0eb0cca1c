//! Rank-based tests: Mann-Whitney U and Kruskal-Wallis H.
//!
//! Kruskal-Wallis uses the chi-squared approximation with tie correction.
//! Mann-Whitney uses the exact null distribution of U for small tie-free
//! samples, otherwise the normal approximation with tie correction and a
//! continuity correction of 0.5.

#![allow(clippy::cast_precision_loss)]

use crate::distribution::{chi2_sf, normal_sf};
use crate::error::{Result, StatsError};
use crate::parametric::ALL_GROUPS;
use crate::sample::Sample;
use crate::stats::average_ranks;
use crate::types::{TestKind, TestResult};

/// Largest group size for which the exact distribution is used whatever the
/// size of the other group.
pub const EXACT_MAX_GROUP: usize = 8;

/// Number of arrangements giving each value of U for group sizes `m` and `n`.
///
/// These are the coefficients of the Gaussian binomial `[m + n choose m]`,
/// built one factor `(1 - q^(n+i)) / (1 - q^i)` at a time.
fn u_frequencies(m: usize, n: usize) -> Vec<f64> {
    let (m, n) = if m <= n { (m, n) } else { (n, m) };
    let top = m * n;
    let mut freq = vec![0.0; top + 1];
    freq[0] = 1.0;
    for i in 1..=m {
        let shift = n + i;
        for k in (shift..=top).rev() {
            freq[k] -= freq[k - shift];
        }
        for k in i..=top {
            freq[k] += freq[k - i];
        }
    }
    freq
}

/// Two-sided exact p-value, `2 · P(U ≥ u_max)`, capped at 1.
fn exact_p_value(u_max: f64, m: usize, n: usize) -> f64 {
    let freq = u_frequencies(m, n);
    let total: f64 = freq.iter().sum();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let from = u_max.round() as usize;
    let upper: f64 = freq.iter().skip(from).sum();
    (2.0 * upper / total).min(1.0)
}

/// Mann-Whitney U (Wilcoxon rank-sum) test of H0: both samples come from the
/// same distribution.
///
/// The reported statistic is U for `a`: its rank sum minus n_a(n_a + 1)/2.
/// Exact when there are no ties and either group has at most
/// [`EXACT_MAX_GROUP`] observations.
pub fn mann_whitney_u(a: &Sample, b: &Sample) -> Result<TestResult> {
    let na = a.len();
    let nb = b.len();
    let n = na + nb;

    let mut pooled = Vec::with_capacity(n);
    pooled.extend_from_slice(a.values());
    pooled.extend_from_slice(b.values());
    let ranking = average_ranks(&pooled);

    let rank_sum_a: f64 = ranking.ranks[..na].iter().sum();
    let (na_f, nb_f, n_f) = (na as f64, nb as f64, n as f64);
    let u_a = rank_sum_a - na_f * (na_f + 1.0) / 2.0;
    let u_b = na_f * nb_f - u_a;

    if ranking.tie_term <= 0.0 && na.min(nb) <= EXACT_MAX_GROUP {
        let p_value = exact_p_value(u_a.max(u_b), na, nb);
        return Ok(TestResult::new(TestKind::MannWhitneyU, u_a, p_value));
    }

    let mu = na_f * nb_f / 2.0;
    let tie_adjust = if n > 1 {
        ranking.tie_term / (n_f * (n_f - 1.0))
    } else {
        0.0
    };
    let sigma = (na_f * nb_f / 12.0 * ((n_f + 1.0) - tie_adjust)).sqrt();

    let p_value = if sigma > 0.0 {
        let z = (u_a.max(u_b) - mu - 0.5) / sigma;
        (2.0 * normal_sf(z)?).clamp(0.0, 1.0)
    } else {
        1.0
    };

    Ok(TestResult::new(TestKind::MannWhitneyU, u_a, p_value))
}

/// Kruskal-Wallis H test of H0: all samples come from the same distribution.
pub fn kruskal_wallis(samples: &[Sample]) -> Result<TestResult> {
    if samples.len() < 2 {
        return Err(StatsError::insufficient("groups", 2, samples.len()));
    }

    let pooled: Vec<f64> = samples.iter().flat_map(|s| s.values().iter().copied()).collect();
    let n = pooled.len() as f64;
    let ranking = average_ranks(&pooled);

    let tie_factor = 1.0 - ranking.tie_term / (n * n * n - n);
    if tie_factor <= 0.0 {
        return Err(StatsError::zero_variance(ALL_GROUPS));
    }

    let mut offset = 0;
    let mut weighted = 0.0;
    for s in samples {
        let rank_sum: f64 = ranking.ranks[offset..offset + s.len()].iter().sum();
        weighted += rank_sum * rank_sum / s.len() as f64;
        offset += s.len();
    }

    let h = (12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0)) / tie_factor;
    let df = (samples.len() - 1) as f64;
    Ok(TestResult::new(TestKind::KruskalWallis, h, chi2_sf(h, df)?).with_df(df))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str, values: &[f64]) -> Sample {
        Sample::new(name, values.to_vec()).unwrap()
    }

    #[test]
    fn identical_samples_tied_ranks() {
        let a = s("a", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let result = mann_whitney_u(&a, &a.clone()).unwrap();
        assert_eq!(result.kind, TestKind::MannWhitneyU);
        // Every value is tied across groups, so U sits exactly at n_a·n_b/2.
        assert!((result.statistic - 12.5).abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn separated_ranges() {
        let low: Vec<f64> = (0..=10).map(f64::from).collect();
        let high: Vec<f64> = (1000..=1010).map(f64::from).collect();
        let result = mann_whitney_u(&s("low", &low), &s("high", &high)).unwrap();
        assert!(result.statistic.abs() < 1e-12);
        assert!(result.p_value < 0.01, "p={}", result.p_value);
    }

    #[test]
    fn reference_value_with_ties() {
        // Ties at 3 and 4 shrink sigma; continuity-corrected z gives p = 0.0345.
        let result =
            mann_whitney_u(&s("a", &[1.0, 2.0, 2.0, 3.0, 4.0]), &s("b", &[3.0, 4.0, 5.0, 5.0, 6.0]))
                .unwrap();
        assert!((result.statistic - 2.0).abs() < 1e-12);
        assert!((result.p_value - 0.0345).abs() < 1e-3, "p={}", result.p_value);
    }

    #[test]
    fn small_tie_free_samples_are_exact() {
        // Only one of C(10, 5) = 252 arrangements is this extreme on each side.
        let result = mann_whitney_u(
            &s("lunch", &[10.0, 11.0, 12.0, 13.0, 14.0]),
            &s("dinner", &[50.0, 51.0, 52.0, 53.0, 54.0]),
        )
        .unwrap();
        assert!(result.statistic.abs() < 1e-12);
        assert!((result.p_value - 2.0 / 252.0).abs() < 1e-12, "p={}", result.p_value);

        let result = mann_whitney_u(
            &s("a", &[1.1, 2.3, 3.5, 6.2, 7.7]),
            &s("b", &[4.4, 5.1, 8.3, 9.6, 10.2, 11.8]),
        )
        .unwrap();
        assert!((result.statistic - 4.0).abs() < 1e-12);
        assert!((result.p_value - 0.051_948).abs() < 1e-5, "p={}", result.p_value);
    }

    #[test]
    fn exact_when_only_one_group_is_small() {
        let high: Vec<f64> = (4..=15).map(f64::from).collect();
        let result = mann_whitney_u(&s("few", &[1.0, 2.0, 3.0]), &s("many", &high)).unwrap();
        // 2 / C(15, 3)
        assert!((result.p_value - 2.0 / 455.0).abs() < 1e-12, "p={}", result.p_value);
    }

    #[test]
    fn u_frequencies_sum_to_binomial() {
        let freq = u_frequencies(4, 3);
        assert_eq!(freq.len(), 13);
        assert!((freq.iter().sum::<f64>() - 35.0).abs() < 1e-9);
        // Symmetric about m·n/2.
        assert!(freq
            .iter()
            .zip(freq.iter().rev())
            .all(|(lo, hi)| (lo - hi).abs() < 1e-9));
    }

    #[test]
    fn all_values_tied() {
        let result = mann_whitney_u(&s("a", &[2.0, 2.0]), &s("b", &[2.0, 2.0, 2.0])).unwrap();
        assert!((result.p_value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn kruskal_separated_groups() {
        let groups = [
            s("g1", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            s("g2", &[6.0, 7.0, 8.0, 9.0, 10.0]),
            s("g3", &[11.0, 12.0, 13.0, 14.0, 15.0]),
        ];
        let result = kruskal_wallis(&groups).unwrap();
        assert_eq!(result.kind, TestKind::KruskalWallis);
        // H = 12/(15·16) · (15² + 40² + 65²)/5 − 3·16 = 12.5
        assert!((result.statistic - 12.5).abs() < 1e-9, "H={}", result.statistic);
        assert!(result.p_value < 0.01);
        assert_eq!(result.df, Some(2.0));
    }

    #[test]
    fn kruskal_same_groups() {
        let g = s("g", &[1.0, 2.0, 3.0, 4.0]);
        let result = kruskal_wallis(&[g.clone(), g.clone(), g]).unwrap();
        assert!(result.statistic.abs() < 1e-9);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn kruskal_all_identical() {
        let g = s("g", &[3.0, 3.0, 3.0]);
        assert!(matches!(
            kruskal_wallis(&[g.clone(), g]),
            Err(StatsError::ZeroVariance { .. })
        ));
    }
}
