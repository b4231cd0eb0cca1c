//! Reference distributions for p-values and critical values.
//!
//! Thin wrappers over `statrs` that translate construction failures into
//! [`StatsError::Distribution`] and clamp probabilities into `[0, 1]`.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use crate::error::{Result, StatsError};

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))
}

fn students_t(df: f64) -> Result<StudentsT> {
    StudentsT::new(0.0, 1.0, df)
        .map_err(|e| StatsError::Distribution(format!("t with df={df}: {e}")))
}

/// Standard normal CDF Φ(z).
pub fn normal_cdf(z: f64) -> Result<f64> {
    Ok(standard_normal()?.cdf(z))
}

/// Standard normal upper tail 1 − Φ(z).
pub fn normal_sf(z: f64) -> Result<f64> {
    Ok(standard_normal()?.sf(z))
}

/// Two-sided normal p-value for a z statistic.
pub fn normal_two_sided(z: f64) -> Result<f64> {
    Ok((2.0 * normal_sf(z.abs())?).clamp(0.0, 1.0))
}

/// Standard normal quantile Φ⁻¹(p).
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(StatsError::InvalidParameter(format!(
            "probability {p} outside [0, 1]"
        )));
    }
    Ok(standard_normal()?.inverse_cdf(p))
}

/// Two-sided Student t p-value.
pub fn t_two_sided(t: f64, df: f64) -> Result<f64> {
    Ok((2.0 * students_t(df)?.sf(t.abs())).clamp(0.0, 1.0))
}

/// Student t quantile.
pub fn t_quantile(p: f64, df: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&p) {
        return Err(StatsError::InvalidParameter(format!(
            "probability {p} outside [0, 1]"
        )));
    }
    Ok(students_t(df)?.inverse_cdf(p))
}

/// Upper tail of F(d1, d2).
pub fn f_sf(f: f64, d1: f64, d2: f64) -> Result<f64> {
    if f.is_infinite() {
        return Ok(0.0);
    }
    let dist = FisherSnedecor::new(d1, d2)
        .map_err(|e| StatsError::Distribution(format!("F({d1}, {d2}): {e}")))?;
    Ok(dist.sf(f.max(0.0)).clamp(0.0, 1.0))
}

/// Upper tail of χ²(df).
pub fn chi2_sf(x: f64, df: f64) -> Result<f64> {
    let dist = ChiSquared::new(df)
        .map_err(|e| StatsError::Distribution(format!("chi-squared({df}): {e}")))?;
    Ok(dist.sf(x.max(0.0)).clamp(0.0, 1.0))
}
