//! Named samples of observations.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Observations drawn from one group, e.g. "smokers' total bill".
///
/// Always non-empty and finite; the fields are private so that holds for the
/// whole lifetime of the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSample")]
pub struct Sample {
    name: String,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct RawSample {
    name: String,
    values: Vec<f64>,
}

impl TryFrom<RawSample> for Sample {
    type Error = StatsError;

    fn try_from(raw: RawSample) -> Result<Self> {
        Self::new(raw.name, raw.values)
    }
}

impl Sample {
    /// Builds a sample, rejecting empty input and non-finite values.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(StatsError::InvalidInput {
                sample: name,
                reason: "sample is empty".to_string(),
            });
        }
        if let Some((idx, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(StatsError::InvalidInput {
                sample: name,
                reason: format!("non-finite value {value} at position {idx}"),
            });
        }
        Ok(Self { name, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Never true for a constructed sample; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Errors with [`StatsError::InsufficientData`] below `needed` observations.
    pub fn require(&self, needed: usize) -> Result<()> {
        if self.len() < needed {
            return Err(StatsError::insufficient(&self.name, needed, self.len()));
        }
        Ok(())
    }

    /// True when every observation is the same value.
    pub fn is_constant(&self) -> bool {
        let first = self.values[0];
        self.values.iter().all(|&v| (v - first).abs() <= f64::EPSILON * first.abs().max(1.0))
    }
}

impl AsRef<[f64]> for Sample {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}
