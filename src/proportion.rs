//! Two-sample proportion z-test.

#![allow(clippy::cast_precision_loss)]

use crate::distribution::normal_two_sided;
use crate::error::{Result, StatsError};
use crate::types::{TestKind, TestResult};

/// Pooled two-proportion z-test of H0: p₁ = p₂.
///
/// `successes[i]` out of `trials[i]` for each of the two groups. The statistic
/// is positive when the first group has the higher rate.
pub fn two_proportion_z(successes: [u64; 2], trials: [u64; 2]) -> Result<TestResult> {
    for (i, (&x, &n)) in successes.iter().zip(&trials).enumerate() {
        if n == 0 {
            return Err(StatsError::InvalidParameter(format!(
                "group {} has zero trials",
                i + 1
            )));
        }
        if x > n {
            return Err(StatsError::InvalidParameter(format!(
                "group {} has {x} successes out of {n} trials",
                i + 1
            )));
        }
    }

    let [x1, x2] = successes.map(|v| v as f64);
    let [n1, n2] = trials.map(|v| v as f64);
    let pooled = (x1 + x2) / (n1 + n2);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    if se == 0.0 {
        return Err(StatsError::zero_variance("proportions"));
    }

    let z = (x1 / n1 - x2 / n2) / se;
    Ok(TestResult::new(TestKind::ProportionZ, z, normal_two_sided(z)?))
}
