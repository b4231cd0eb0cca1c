//! Error types for hypothesis testing.

use thiserror::Error;

/// Convenience alias used across the statistical modules.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors raised while validating samples or running a test.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// A sample (or the set of samples) is too small for the requested test.
    #[error("insufficient data in '{sample}': need at least {needed}, got {got}")]
    InsufficientData {
        sample: String,
        needed: usize,
        got: usize,
    },

    /// A sample holds values the tests cannot use.
    #[error("invalid input in '{sample}': {reason}")]
    InvalidInput { sample: String, reason: String },

    /// Normal data with heterogeneous variances while the policy refuses to
    /// pick a corrected test.
    #[error(
        "ambiguous decision: all samples pass normality but variances differ \
         (Levene p-value = {levene_p:.4})"
    )]
    AmbiguousDecision { levene_p: f64 },

    /// Zero spread makes the statistic undefined.
    #[error("zero variance in '{sample}'")]
    ZeroVariance { sample: String },

    /// Out-of-range parameter (alpha, confidence level, counts).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A reference distribution could not be constructed.
    #[error("distribution error: {0}")]
    Distribution(String),
}

impl StatsError {
    pub(crate) fn insufficient(sample: &str, needed: usize, got: usize) -> Self {
        Self::InsufficientData {
            sample: sample.to_string(),
            needed,
            got,
        }
    }

    pub(crate) fn zero_variance(sample: &str) -> Self {
        Self::ZeroVariance {
            sample: sample.to_string(),
        }
    }

    /// Name of the sample the error refers to, when there is one.
    pub fn sample(&self) -> Option<&str> {
        match self {
            Self::InsufficientData { sample, .. }
            | Self::InvalidInput { sample, .. }
            | Self::ZeroVariance { sample } => Some(sample),
            _ => None,
        }
    }
}
