//! Test Selector: picks and runs the comparison test the data supports.
//!
//! 1. Shapiro-Wilk on every sample.
//! 2. Any sample non-normal → rank-based test, variances are not checked.
//! 3. All normal → Levene's test; equal variances → Student t / ANOVA,
//!    otherwise [`UnequalVariancePolicy`] decides.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::nonparametric::{kruskal_wallis, mann_whitney_u};
use crate::normality::{self, shapiro_wilk};
use crate::parametric::{one_way_anova, two_sample_t, welch_anova, EqualVariance};
use crate::sample::Sample;
use crate::types::{TestKind, TestResult};
use crate::variance::{levene, Center};

/// Conventional significance threshold.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// What to run when every sample is normal but variances differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnequalVariancePolicy {
    /// Welch's t-test, or Welch's ANOVA for more than two groups.
    #[default]
    Welch,
    /// Fall back to the rank-based branch.
    Nonparametric,
    /// Refuse with [`StatsError::AmbiguousDecision`].
    Reject,
}

/// Selector configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    /// Threshold below which a p-value rejects its H0.
    pub alpha: f64,
    pub unequal_variance: UnequalVariancePolicy,
    /// Centre used by Levene's test.
    pub center: Center,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            alpha: SIGNIFICANCE_LEVEL,
            unequal_variance: UnequalVariancePolicy::default(),
            center: Center::default(),
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(StatsError::InvalidParameter(format!(
                "alpha {} must lie in (0, 1)",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Outcome of the assumption checks, as far as the branch is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assumptions {
    /// At least one sample failed normality.
    NonNormal,
    NormalEqualVariance,
    NormalUnequalVariance { levene_p: f64 },
}

/// Shapiro-Wilk outcome for one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityCheck {
    pub sample: String,
    pub result: TestResult,
    pub normal: bool,
}

/// Levene outcome across all samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceCheck {
    pub result: TestResult,
    pub homogeneous: bool,
}

/// Record of one selector run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub normality: Vec<NormalityCheck>,
    /// Absent when the normality branch already ruled out parametric tests.
    pub variance: Option<VarianceCheck>,
    pub test: TestKind,
    pub result: TestResult,
}

/// Chooses the comparison test for `groups` samples.
///
/// Pure function of its inputs, so identical checks always take the same path.
pub fn plan_test(
    groups: usize,
    assumptions: Assumptions,
    policy: UnequalVariancePolicy,
) -> Result<TestKind> {
    if groups < 2 {
        return Err(StatsError::insufficient("groups", 2, groups));
    }
    let two = groups == 2;
    let rank_based = if two {
        TestKind::MannWhitneyU
    } else {
        TestKind::KruskalWallis
    };

    let kind = match assumptions {
        Assumptions::NonNormal => rank_based,
        Assumptions::NormalEqualVariance if two => TestKind::StudentT,
        Assumptions::NormalEqualVariance => TestKind::OneWayAnova,
        Assumptions::NormalUnequalVariance { levene_p } => match policy {
            UnequalVariancePolicy::Welch if two => TestKind::WelchT,
            UnequalVariancePolicy::Welch => TestKind::WelchAnova,
            UnequalVariancePolicy::Nonparametric => rank_based,
            UnequalVariancePolicy::Reject => {
                return Err(StatsError::AmbiguousDecision { levene_p });
            }
        },
    };
    Ok(kind)
}

/// Runs a comparison test directly.
pub fn run_test(kind: TestKind, samples: &[Sample]) -> Result<TestResult> {
    match (kind, samples) {
        (TestKind::StudentT, [a, b]) => two_sample_t(a, b, EqualVariance::Assumed),
        (TestKind::WelchT, [a, b]) => two_sample_t(a, b, EqualVariance::NotAssumed),
        (TestKind::MannWhitneyU, [a, b]) => mann_whitney_u(a, b),
        (TestKind::OneWayAnova, _) => one_way_anova(samples),
        (TestKind::WelchAnova, _) => welch_anova(samples),
        (TestKind::KruskalWallis, _) => kruskal_wallis(samples),
        (kind, _) => Err(StatsError::InvalidParameter(format!(
            "{kind} cannot compare {} samples",
            samples.len()
        ))),
    }
}

/// Checks assumptions on `samples`, then runs the single test they allow.
pub fn choose_and_run(samples: &[Sample], config: &SelectorConfig) -> Result<Selection> {
    config.validate()?;
    if samples.len() < 2 {
        return Err(StatsError::insufficient("groups", 2, samples.len()));
    }
    for s in samples {
        s.require(normality::MIN_SAMPLE)?;
        if s.is_constant() {
            return Err(StatsError::zero_variance(s.name()));
        }
    }

    let mut normality = Vec::with_capacity(samples.len());
    for s in samples {
        let result = shapiro_wilk(s)?;
        let normal = !result.is_significant(config.alpha);
        debug!(
            sample = s.name(),
            w = result.statistic,
            p = result.p_value,
            normal,
            "normality check"
        );
        normality.push(NormalityCheck {
            sample: s.name().to_string(),
            result,
            normal,
        });
    }

    let (assumptions, variance) = if normality.iter().all(|c| c.normal) {
        let result = levene(samples, config.center)?;
        let homogeneous = !result.is_significant(config.alpha);
        debug!(
            f = result.statistic,
            p = result.p_value,
            homogeneous,
            "variance homogeneity check"
        );
        let assumptions = if homogeneous {
            Assumptions::NormalEqualVariance
        } else {
            Assumptions::NormalUnequalVariance {
                levene_p: result.p_value,
            }
        };
        (assumptions, Some(VarianceCheck { result, homogeneous }))
    } else {
        (Assumptions::NonNormal, None)
    };

    let test = plan_test(samples.len(), assumptions, config.unequal_variance)?;
    debug!(?assumptions, %test, "selected test");

    let result = run_test(test, samples)?;
    Ok(Selection {
        normality,
        variance,
        test,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(name: &str, values: &[f64]) -> Sample {
        Sample::new(name, values.to_vec()).unwrap()
    }

    fn skewed(name: &str, offset: f64) -> Sample {
        let values: Vec<f64> = [1.0, 1.1, 1.2, 1.3, 1.5, 2.0, 3.0, 6.0, 15.0, 40.0]
            .iter()
            .map(|v| v + offset)
            .collect();
        s(name, &values)
    }

    #[test]
    fn separated_normal_groups_use_student_t() {
        let a = s("a", &[10.0, 12.0, 14.0, 11.0, 13.0]);
        let b = s("b", &[50.0, 52.0, 54.0, 51.0, 53.0]);
        let selection = choose_and_run(&[a, b], &SelectorConfig::default()).unwrap();
        assert_eq!(selection.test, TestKind::StudentT);
        assert!(selection.variance.as_ref().unwrap().homogeneous);
        assert!(selection.result.p_value < 0.001);
        assert_eq!(selection.normality.len(), 2);
    }

    #[test]
    fn identical_samples_not_significant() {
        let a = s("a", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let selection = choose_and_run(&[a.clone(), a], &SelectorConfig::default()).unwrap();
        assert!((selection.result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn wide_separation_significant_both_ways() {
        let low: Vec<f64> = (0..=10).map(f64::from).collect();
        let high: Vec<f64> = (1000..=1010).map(f64::from).collect();
        let samples = [s("low", &low), s("high", &high)];

        let selection = choose_and_run(&samples, &SelectorConfig::default()).unwrap();
        assert!(selection.result.p_value < 0.01);

        let forced = run_test(TestKind::MannWhitneyU, &samples).unwrap();
        assert!(forced.p_value < 0.01);
    }

    #[test]
    fn non_normal_sample_uses_rank_test() {
        let samples = [skewed("a", 0.0), skewed("b", 0.5)];
        let selection = choose_and_run(&samples, &SelectorConfig::default()).unwrap();
        assert!(selection.normality.iter().any(|c| !c.normal));
        assert!(selection.variance.is_none());
        assert_eq!(selection.test, TestKind::MannWhitneyU);
    }

    #[test]
    fn three_non_normal_groups_use_kruskal() {
        let samples = [skewed("thur", 0.0), skewed("fri", 1.0), skewed("sat", 2.0)];
        let selection = choose_and_run(&samples, &SelectorConfig::default()).unwrap();
        assert_eq!(selection.test, TestKind::KruskalWallis);
    }

    #[test]
    fn plan_covers_every_branch() {
        use Assumptions::{NonNormal, NormalEqualVariance, NormalUnequalVariance};
        use UnequalVariancePolicy::{Nonparametric, Reject, Welch};

        let unequal = NormalUnequalVariance { levene_p: 0.01 };
        let cases = [
            (2, NonNormal, Welch, TestKind::MannWhitneyU),
            (4, NonNormal, Welch, TestKind::KruskalWallis),
            (2, NormalEqualVariance, Reject, TestKind::StudentT),
            (3, NormalEqualVariance, Welch, TestKind::OneWayAnova),
            (2, unequal, Welch, TestKind::WelchT),
            (3, unequal, Welch, TestKind::WelchAnova),
            (2, unequal, Nonparametric, TestKind::MannWhitneyU),
            (3, unequal, Nonparametric, TestKind::KruskalWallis),
        ];
        for (groups, assumptions, policy, expected) in cases {
            assert_eq!(plan_test(groups, assumptions, policy).unwrap(), expected);
        }
        assert_eq!(
            plan_test(2, unequal, Reject).unwrap_err(),
            StatsError::AmbiguousDecision { levene_p: 0.01 }
        );
    }

    #[test]
    fn heterogeneous_normal_groups_follow_policy() {
        let tight = s("tight", &[9.8, 9.9, 10.0, 10.1, 10.2, 9.95, 10.05, 10.0]);
        let wide = s("wide", &[0.0, 5.0, 10.0, 15.0, 20.0, 7.5, 12.5, 10.0]);
        let samples = [tight, wide];

        let welch = choose_and_run(&samples, &SelectorConfig::default()).unwrap();
        assert!(!welch.variance.as_ref().unwrap().homogeneous);
        assert_eq!(welch.test, TestKind::WelchT);

        let config = SelectorConfig {
            unequal_variance: UnequalVariancePolicy::Nonparametric,
            ..SelectorConfig::default()
        };
        assert_eq!(
            choose_and_run(&samples, &config).unwrap().test,
            TestKind::MannWhitneyU
        );

        let config = SelectorConfig {
            unequal_variance: UnequalVariancePolicy::Reject,
            ..SelectorConfig::default()
        };
        assert!(matches!(
            choose_and_run(&samples, &config),
            Err(StatsError::AmbiguousDecision { .. })
        ));
    }

    #[test]
    fn three_normal_groups_with_unequal_spread_use_welch_anova() {
        let spaced = |name: &str, start: f64, step: f64| {
            let values: Vec<f64> = (0..10).map(|i| start + step * f64::from(i)).collect();
            s(name, &values)
        };
        let samples = [
            spaced("narrow", 10.0, 0.1),
            spaced("medium", 12.0, 1.0),
            spaced("broad", 20.0, 10.0),
        ];

        let selection = choose_and_run(&samples, &SelectorConfig::default()).unwrap();
        assert!(selection.normality.iter().all(|c| c.normal));
        assert!(!selection.variance.as_ref().unwrap().homogeneous);
        assert_eq!(selection.test, TestKind::WelchAnova);
        assert_eq!(selection.result.kind, TestKind::WelchAnova);
        assert!(selection.result.p_value < 0.05);
    }

    #[test]
    fn deterministic_branch() {
        let samples = [skewed("a", 0.0), s("b", &[3.0, 4.0, 5.0, 6.0, 7.0])];
        let config = SelectorConfig::default();
        let first = choose_and_run(&samples, &config).unwrap();
        for _ in 0..10 {
            assert_eq!(choose_and_run(&samples, &config).unwrap(), first);
        }
    }

    #[test]
    fn rejects_bad_input() {
        let ok = s("ok", &[1.0, 2.0, 3.0]);
        let small = s("small", &[1.0, 2.0]);
        let flat = s("flat", &[4.0, 4.0, 4.0]);
        let config = SelectorConfig::default();

        assert_eq!(
            choose_and_run(&[ok.clone(), small], &config).unwrap_err(),
            StatsError::InsufficientData {
                sample: "small".to_string(),
                needed: 3,
                got: 2,
            }
        );
        assert_eq!(
            choose_and_run(&[ok.clone(), flat], &config)
                .unwrap_err()
                .sample(),
            Some("flat")
        );
        assert!(matches!(
            choose_and_run(&[ok.clone()], &config),
            Err(StatsError::InsufficientData { .. })
        ));

        let bad_alpha = SelectorConfig {
            alpha: 1.5,
            ..config
        };
        assert!(matches!(
            choose_and_run(&[ok.clone(), ok], &bad_alpha),
            Err(StatsError::InvalidParameter(_))
        ));
    }
}
