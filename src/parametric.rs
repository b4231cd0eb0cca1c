//! Parametric tests: t-tests, one-way ANOVA and Welch's ANOVA.
//!
//! All p-values are two-sided for t statistics and upper-tail for F.

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

use crate::distribution::{f_sf, t_quantile, t_two_sided};
use crate::error::{Result, StatsError};
use crate::sample::Sample;
use crate::stats::{mean, sum_of_squares, variance};
use crate::types::{TestKind, TestResult};

/// Label used in errors that concern every group at once.
pub(crate) const ALL_GROUPS: &str = "all groups";

/// Whether a two-sample t-test may pool the variances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualVariance {
    /// Student's pooled-variance t-test.
    Assumed,
    /// Welch's t-test with Welch-Satterthwaite degrees of freedom.
    NotAssumed,
}

/// One-sample t-test of H0: population mean equals `popmean`.
pub fn one_sample_t(sample: &Sample, popmean: f64) -> Result<TestResult> {
    sample.require(2)?;
    let n = sample.len() as f64;
    let sd = variance(sample.values(), 1).sqrt();
    if sd == 0.0 {
        return Err(StatsError::zero_variance(sample.name()));
    }
    let t = (mean(sample.values()) - popmean) / (sd / n.sqrt());
    let df = n - 1.0;
    Ok(TestResult::new(TestKind::OneSampleT, t, t_two_sided(t, df)?).with_df(df))
}

/// Independent two-sample t-test of H0: equal means.
///
/// The statistic is positive when `a` has the larger mean.
pub fn two_sample_t(a: &Sample, b: &Sample, equal_var: EqualVariance) -> Result<TestResult> {
    a.require(2)?;
    b.require(2)?;

    let na = a.len() as f64;
    let nb = b.len() as f64;
    let diff = mean(a.values()) - mean(b.values());
    let va = variance(a.values(), 1);
    let vb = variance(b.values(), 1);

    let (kind, se, df) = match equal_var {
        EqualVariance::Assumed => {
            let pooled = ((na - 1.0) * va + (nb - 1.0) * vb) / (na + nb - 2.0);
            let se = (pooled * (1.0 / na + 1.0 / nb)).sqrt();
            (TestKind::StudentT, se, na + nb - 2.0)
        }
        EqualVariance::NotAssumed => {
            let qa = va / na;
            let qb = vb / nb;
            let se = (qa + qb).sqrt();
            let df = (qa + qb).powi(2) / (qa.powi(2) / (na - 1.0) + qb.powi(2) / (nb - 1.0));
            (TestKind::WelchT, se, df)
        }
    };

    if se == 0.0 {
        return Err(StatsError::zero_variance(ALL_GROUPS));
    }
    let t = diff / se;
    Ok(TestResult::new(kind, t, t_two_sided(t, df)?).with_df(df))
}

/// F statistic and degrees of freedom of a one-way ANOVA over raw groups.
pub(crate) fn anova_f(groups: &[&[f64]]) -> Result<(f64, f64, f64)> {
    let k = groups.len();
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if n_total <= k {
        return Err(StatsError::insufficient(ALL_GROUPS, k + 1, n_total));
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n_total as f64;
    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups.iter().map(|g| sum_of_squares(g)).sum();

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;

    if ss_within == 0.0 {
        if ss_between == 0.0 {
            return Err(StatsError::zero_variance(ALL_GROUPS));
        }
        return Ok((f64::INFINITY, df_between, df_within));
    }
    let f = (ss_between / df_between) / (ss_within / df_within);
    Ok((f, df_between, df_within))
}

fn require_groups(samples: &[Sample]) -> Result<()> {
    if samples.len() < 2 {
        return Err(StatsError::insufficient("groups", 2, samples.len()));
    }
    Ok(())
}

/// One-way ANOVA of H0: all group means are equal.
pub fn one_way_anova(samples: &[Sample]) -> Result<TestResult> {
    require_groups(samples)?;
    let groups: Vec<&[f64]> = samples.iter().map(Sample::values).collect();
    let (f, d1, d2) = anova_f(&groups)?;
    Ok(TestResult::new(TestKind::OneWayAnova, f, f_sf(f, d1, d2)?).with_dfs(d1, d2))
}

/// Welch's heteroscedastic one-way ANOVA.
pub fn welch_anova(samples: &[Sample]) -> Result<TestResult> {
    require_groups(samples)?;
    let mut weights = Vec::with_capacity(samples.len());
    for s in samples {
        s.require(2)?;
        let v = variance(s.values(), 1);
        if v == 0.0 {
            return Err(StatsError::zero_variance(s.name()));
        }
        weights.push(s.len() as f64 / v);
    }

    let k = samples.len() as f64;
    let means: Vec<f64> = samples.iter().map(|s| mean(s.values())).collect();
    let w_sum: f64 = weights.iter().sum();
    let weighted_mean = weights.iter().zip(&means).map(|(w, m)| w * m).sum::<f64>() / w_sum;

    let between = weights
        .iter()
        .zip(&means)
        .map(|(w, m)| w * (m - weighted_mean).powi(2))
        .sum::<f64>()
        / (k - 1.0);
    let lambda: f64 = weights
        .iter()
        .zip(samples)
        .map(|(w, s)| (1.0 - w / w_sum).powi(2) / (s.len() as f64 - 1.0))
        .sum();

    let f = between / (1.0 + 2.0 * (k - 2.0) / (k * k - 1.0) * lambda);
    let d1 = k - 1.0;
    let d2 = (k * k - 1.0) / (3.0 * lambda);
    Ok(TestResult::new(TestKind::WelchAnova, f, f_sf(f, d1, d2)?).with_dfs(d1, d2))
}

/// Two-sided t confidence interval for a population mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub sample: String,
    pub confidence: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Confidence interval for the mean of `sample` at the given level.
pub fn mean_confidence_interval(sample: &Sample, confidence: f64) -> Result<ConfidenceInterval> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(StatsError::InvalidParameter(format!(
            "confidence level {confidence} must lie in (0, 1)"
        )));
    }
    sample.require(2)?;

    let n = sample.len() as f64;
    let m = mean(sample.values());
    let se = (variance(sample.values(), 1) / n).sqrt();
    let t = t_quantile(1.0 - (1.0 - confidence) / 2.0, n - 1.0)?;

    Ok(ConfidenceInterval {
        sample: sample.name().to_string(),
        confidence,
        mean: m,
        lower: m - t * se,
        upper: m + t * se,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str, values: &[f64]) -> Sample {
        Sample::new(name, values.to_vec()).unwrap()
    }

    #[test]
    fn one_sample_centered() {
        let result = one_sample_t(&s("x", &[-1.0, -0.5, 0.0, 0.5, 1.0]), 0.0).unwrap();
        assert!(result.statistic.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
        assert_eq!(result.df, Some(4.0));
    }

    #[test]
    fn one_sample_far_from_mu() {
        let result = one_sample_t(&s("x", &[10.0, 11.0, 12.0, 13.0, 14.0]), 0.0).unwrap();
        assert!(result.p_value < 0.001, "p={}", result.p_value);
    }

    #[test]
    fn one_sample_constant_is_zero_variance() {
        assert!(matches!(
            one_sample_t(&s("flat", &[2.0, 2.0, 2.0]), 1.0),
            Err(StatsError::ZeroVariance { .. })
        ));
    }

    #[test]
    fn student_t_separated_groups() {
        let a = s("a", &[10.0, 12.0, 14.0, 11.0, 13.0]);
        let b = s("b", &[50.0, 52.0, 54.0, 51.0, 53.0]);
        let result = two_sample_t(&a, &b, EqualVariance::Assumed).unwrap();
        assert_eq!(result.kind, TestKind::StudentT);
        assert!((result.statistic + 40.0).abs() < 1e-9, "t={}", result.statistic);
        assert!(result.p_value < 0.001);
        assert_eq!(result.df, Some(8.0));
    }

    #[test]
    fn identical_samples_p_one() {
        let a = s("a", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let result = two_sample_t(&a, &a.clone(), EqualVariance::Assumed).unwrap();
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn welch_df_below_pooled() {
        let a = s("a", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = s("b", &[10.0, 30.0, 50.0, 70.0, 90.0, 110.0]);
        let result = two_sample_t(&a, &b, EqualVariance::NotAssumed).unwrap();
        assert_eq!(result.kind, TestKind::WelchT);
        let df = result.df.unwrap();
        assert!(df > 4.0 && df < 9.0, "df={df}");
    }

    #[test]
    fn anova_matches_t_for_two_groups() {
        let a = s("a", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = s("b", &[3.0, 4.0, 5.0, 6.0, 7.0]);
        let f = one_way_anova(&[a.clone(), b.clone()]).unwrap();
        let t = two_sample_t(&a, &b, EqualVariance::Assumed).unwrap();
        assert!((f.statistic - t.statistic.powi(2)).abs() < 1e-9);
        assert!((f.p_value - t.p_value).abs() < 1e-6);
    }

    #[test]
    fn anova_separated_groups() {
        let groups = [
            s("g1", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            s("g2", &[100.0, 101.0, 102.0, 103.0, 104.0]),
            s("g3", &[200.0, 201.0, 202.0, 203.0, 204.0]),
        ];
        let result = one_way_anova(&groups).unwrap();
        assert!(result.p_value < 0.001);
        assert_eq!(result.df, Some(2.0));
        assert_eq!(result.df_denom, Some(12.0));
    }

    #[test]
    fn anova_needs_two_groups() {
        assert!(matches!(
            one_way_anova(&[s("only", &[1.0, 2.0])]),
            Err(StatsError::InsufficientData { .. })
        ));
    }

    #[test]
    fn welch_anova_detects_shift() {
        let groups = [
            s("g1", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            s("g2", &[10.0, 20.0, 30.0, 40.0, 50.0]),
            s("g3", &[100.0, 100.5, 101.0, 101.5, 102.0]),
        ];
        let result = welch_anova(&groups).unwrap();
        assert_eq!(result.kind, TestKind::WelchAnova);
        assert!(result.p_value < 0.001, "p={}", result.p_value);
        assert!(result.df_denom.unwrap() < 12.0);
    }

    #[test]
    fn confidence_interval_brackets_mean() {
        let ci = mean_confidence_interval(&s("bill", &[10.0, 12.0, 14.0, 11.0, 13.0]), 0.95)
            .unwrap();
        assert!((ci.mean - 12.0).abs() < 1e-12);
        // 12 ± 2.776445 · sqrt(2.5 / 5)
        let half = 2.776_445 * (0.5_f64).sqrt();
        assert!((ci.upper - (12.0 + half)).abs() < 1e-4);
        assert!((ci.lower - (12.0 - half)).abs() < 1e-4);
        assert!(mean_confidence_interval(&s("x", &[1.0, 2.0]), 1.0).is_err());
    }
}
