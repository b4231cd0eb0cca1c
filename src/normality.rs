//! Shapiro-Wilk normality test.
//!
//! Coefficients and p-values follow Royston's AS R94 approximation, which is
//! what most statistics packages ship. H0: the sample comes from a normal
//! distribution.

#![allow(clippy::cast_precision_loss)]

use tracing::warn;

use crate::distribution::{normal_quantile, normal_sf};
use crate::error::{Result, StatsError};
use crate::sample::Sample;
use crate::types::{TestKind, TestResult};

/// Smallest sample the test is defined for.
pub const MIN_SAMPLE: usize = 3;

/// Largest sample the p-value approximation is validated for.
pub const MAX_VALIDATED_SAMPLE: usize = 5000;

const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];
const G: [f64; 2] = [-2.273, 0.459];

/// c[0] + c[1]·x + c[2]·x² + …
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &coef| acc * x + coef)
}

/// Runs the Shapiro-Wilk test on one sample.
pub fn shapiro_wilk(sample: &Sample) -> Result<TestResult> {
    sample.require(MIN_SAMPLE)?;
    if sample.is_constant() {
        return Err(StatsError::zero_variance(sample.name()));
    }
    let n = sample.len();
    if n > MAX_VALIDATED_SAMPLE {
        warn!(
            sample = sample.name(),
            n, "Shapiro-Wilk p-value is only validated up to {MAX_VALIDATED_SAMPLE} observations"
        );
    }

    let mut x = sample.values().to_vec();
    x.sort_by(f64::total_cmp);

    let half = coefficients(n)?;
    let w = w_statistic(&x, &half);
    let p_value = p_value(w, n)?;

    Ok(TestResult::new(TestKind::ShapiroWilk, w, p_value))
}

/// Upper half of the antisymmetric coefficient vector, largest first.
fn coefficients(n: usize) -> Result<Vec<f64>> {
    let nn2 = n / 2;
    if n == 3 {
        return Ok(vec![std::f64::consts::FRAC_1_SQRT_2]);
    }

    let an = n as f64;
    let m = (1..=nn2)
        .map(|i| normal_quantile((i as f64 - 0.375) / (an + 0.25)))
        .collect::<Result<Vec<_>>>()?;
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let mut a = vec![0.0; nn2];
    a[0] = poly(&C1, rsn) - m[0] / ssumm2;

    let (first_plain, fac) = if n > 5 {
        a[1] = -m[1] / ssumm2 + poly(&C2, rsn);
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a[0] * a[0] - 2.0 * a[1] * a[1]))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a[0] * a[0])).sqrt();
        (1, fac)
    };
    for i in first_plain..nn2 {
        a[i] = -m[i] / fac;
    }
    Ok(a)
}

/// W as the squared correlation between sorted data and coefficients.
fn w_statistic(sorted: &[f64], half: &[f64]) -> f64 {
    let n = sorted.len();
    let range = sorted[n - 1] - sorted[0];
    let x: Vec<f64> = sorted.iter().map(|v| v / range).collect();

    let mut coef = vec![0.0; n];
    for (i, &a) in half.iter().enumerate() {
        coef[i] = -a;
        coef[n - 1 - i] = a;
    }

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let (mut sax, mut ssa, mut ssx) = (0.0, 0.0, 0.0);
    for (c, v) in coef.iter().zip(&x) {
        let dx = v - x_mean;
        sax += c * dx;
        ssa += c * c;
        ssx += dx * dx;
    }
    (sax * sax / (ssa * ssx)).min(1.0)
}

fn p_value(w: f64, n: usize) -> Result<f64> {
    if n == 3 {
        let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - std::f64::consts::FRAC_PI_3);
        return Ok(p.clamp(0.0, 1.0));
    }

    let an = n as f64;
    let y = (1.0 - w).max(0.0).ln();
    let (y, m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return Ok(0.0);
        }
        (-(gamma - y).ln(), poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (y, poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    Ok(normal_sf((y - m) / s)?.clamp(0.0, 1.0))
}
