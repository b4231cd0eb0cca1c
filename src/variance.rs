//! Levene's test for homogeneity of variances.

use serde::{Deserialize, Serialize};

use crate::distribution::f_sf;
use crate::error::{Result, StatsError};
use crate::parametric::anova_f;
use crate::sample::Sample;
use crate::stats::{mean, median};
use crate::types::{TestKind, TestResult};

/// Location the absolute deviations are measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Center {
    /// Brown-Forsythe variant, robust to skewed data.
    #[default]
    Median,
    /// Levene's original formulation.
    Mean,
}

/// Levene's test of H0: all groups share the same variance.
pub fn levene(samples: &[Sample], center: Center) -> Result<TestResult> {
    if samples.len() < 2 {
        return Err(StatsError::insufficient("groups", 2, samples.len()));
    }
    for s in samples {
        s.require(2)?;
    }

    let deviations: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| {
            let c = match center {
                Center::Median => median(s.values()),
                Center::Mean => mean(s.values()),
            };
            s.values().iter().map(|x| (x - c).abs()).collect()
        })
        .collect();
    let groups: Vec<&[f64]> = deviations.iter().map(Vec::as_slice).collect();

    let (f, d1, d2) = anova_f(&groups)?;
    Ok(TestResult::new(TestKind::Levene, f, f_sf(f, d1, d2)?).with_dfs(d1, d2))
}
