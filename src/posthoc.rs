//! Pairwise follow-up comparisons after a k-group omnibus test.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::nonparametric::mann_whitney_u;
use crate::parametric::{two_sample_t, EqualVariance};
use crate::sample::Sample;
use crate::types::{TestKind, TestResult};

/// Two-group test used for every pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Student,
    Welch,
    RankSum,
}

impl Family {
    /// Pairwise family matching an omnibus test, if it is one.
    pub const fn for_omnibus(kind: TestKind) -> Option<Self> {
        match kind {
            TestKind::OneWayAnova | TestKind::StudentT => Some(Self::Student),
            TestKind::WelchAnova | TestKind::WelchT => Some(Self::Welch),
            TestKind::KruskalWallis | TestKind::MannWhitneyU => Some(Self::RankSum),
            _ => None,
        }
    }
}

/// Multiple-comparison correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    Bonferroni,
    Holm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    pub first: String,
    pub second: String,
    pub result: TestResult,
    pub adjusted_p: f64,
}

/// Adjusts raw p-values for `m = p_values.len()` comparisons.
#[allow(clippy::cast_precision_loss)]
pub fn adjust(p_values: &[f64], correction: Correction) -> Vec<f64> {
    let m = p_values.len() as f64;
    match correction {
        Correction::Bonferroni => p_values.iter().map(|p| (p * m).min(1.0)).collect(),
        Correction::Holm => {
            let mut order: Vec<usize> = (0..p_values.len()).collect();
            order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

            let mut adjusted = vec![0.0; p_values.len()];
            let mut running_max = 0.0_f64;
            for (rank, &idx) in order.iter().enumerate() {
                let scaled = (p_values[idx] * (m - rank as f64)).min(1.0);
                running_max = running_max.max(scaled);
                adjusted[idx] = running_max;
            }
            adjusted
        }
    }
}

/// Compares every pair of samples and adjusts the p-values.
pub fn pairwise(
    samples: &[Sample],
    family: Family,
    correction: Correction,
) -> Result<Vec<PairwiseComparison>> {
    if samples.len() < 2 {
        return Err(StatsError::insufficient("groups", 2, samples.len()));
    }

    let mut comparisons = Vec::new();
    for (i, a) in samples.iter().enumerate() {
        for b in &samples[i + 1..] {
            let result = match family {
                Family::Student => two_sample_t(a, b, EqualVariance::Assumed)?,
                Family::Welch => two_sample_t(a, b, EqualVariance::NotAssumed)?,
                Family::RankSum => mann_whitney_u(a, b)?,
            };
            comparisons.push(PairwiseComparison {
                first: a.name().to_string(),
                second: b.name().to_string(),
                result,
                adjusted_p: 0.0,
            });
        }
    }

    let raw: Vec<f64> = comparisons.iter().map(|c| c.result.p_value).collect();
    for (c, p) in comparisons.iter_mut().zip(adjust(&raw, correction)) {
        c.adjusted_p = p;
    }
    Ok(comparisons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(name: &str, values: &[f64]) -> Sample {
        Sample::new(name, values.to_vec()).unwrap()
    }

    #[test]
    fn bonferroni_caps_at_one() {
        assert_eq!(adjust(&[0.01, 0.4, 0.02], Correction::Bonferroni), vec![0.03, 1.0, 0.06]);
    }

    #[test]
    fn holm_is_monotone() {
        let adjusted = adjust(&[0.01, 0.04, 0.03, 0.005], Correction::Holm);
        // sorted: 0.005·4, 0.01·3, 0.03·2, 0.04·1 -> 0.02, 0.03, 0.06, max(0.04, 0.06)
        let expected = [0.03, 0.06, 0.06, 0.02];
        for (got, want) in adjusted.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{adjusted:?}");
        }
    }

    #[test]
    fn pairs_in_input_order() {
        let groups = [
            s("thur", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            s("fri", &[1.5, 2.5, 3.5, 4.5, 5.5]),
            s("sat", &[20.0, 21.0, 22.0, 23.0, 24.0]),
        ];
        let pairs = pairwise(&groups, Family::Student, Correction::Holm).unwrap();
        let names: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.first.as_str(), p.second.as_str()))
            .collect();
        assert_eq!(names, vec![("thur", "fri"), ("thur", "sat"), ("fri", "sat")]);
        assert!(pairs[0].adjusted_p > 0.05);
        assert!(pairs[1].adjusted_p < 0.001);
        assert!(pairs.iter().all(|p| p.adjusted_p >= p.result.p_value));
    }

    #[test]
    fn family_for_omnibus() {
        assert_eq!(Family::for_omnibus(TestKind::KruskalWallis), Some(Family::RankSum));
        assert_eq!(Family::for_omnibus(TestKind::WelchAnova), Some(Family::Welch));
        assert_eq!(Family::for_omnibus(TestKind::ShapiroWilk), None);
    }
}
