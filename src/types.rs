//! Common types for ab-testing.
//!
//! Defines test results, analysis specifications and per-analysis outcomes.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::parametric::ConfidenceInterval;
use crate::posthoc::{Correction, PairwiseComparison};
use crate::sample::Sample;
use crate::selector::UnequalVariancePolicy;
use crate::stats::Summary;
use crate::variance::Center;

/// Which test produced a [`TestResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    ShapiroWilk,
    Levene,
    OneSampleT,
    StudentT,
    WelchT,
    MannWhitneyU,
    OneWayAnova,
    WelchAnova,
    KruskalWallis,
    ProportionZ,
}

impl TestKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShapiroWilk => "Shapiro-Wilk",
            Self::Levene => "Levene",
            Self::OneSampleT => "One-sample t-test",
            Self::StudentT => "Independent two-sample t-test",
            Self::WelchT => "Welch's t-test",
            Self::MannWhitneyU => "Mann-Whitney U",
            Self::OneWayAnova => "One-way ANOVA",
            Self::WelchAnova => "Welch's ANOVA",
            Self::KruskalWallis => "Kruskal-Wallis H",
            Self::ProportionZ => "Two-proportion z-test",
        }
    }

    /// True for tests that make no distributional assumption.
    pub const fn is_nonparametric(self) -> bool {
        matches!(self, Self::MannWhitneyU | Self::KruskalWallis)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Statistic and p-value of one test invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub kind: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    /// Degrees of freedom (numerator df for F tests).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub df: Option<f64>,
    /// Denominator degrees of freedom for F tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub df_denom: Option<f64>,
}

impl TestResult {
    pub const fn new(kind: TestKind, statistic: f64, p_value: f64) -> Self {
        Self {
            kind,
            statistic,
            p_value,
            df: None,
            df_denom: None,
        }
    }

    #[must_use]
    pub const fn with_df(mut self, df: f64) -> Self {
        self.df = Some(df);
        self
    }

    #[must_use]
    pub const fn with_dfs(mut self, df: f64, df_denom: f64) -> Self {
        self.df = Some(df);
        self.df_denom = Some(df_denom);
        self
    }

    /// H0 is rejected when the p-value falls strictly below `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Analysis specification, one entry of an analysis file.
#[derive(Debug, Clone, Deserialize)]
pub struct Analysis {
    /// Analysis name (populated from the map key).
    #[serde(default)]
    pub name: String,
    /// Significance threshold for this analysis.
    pub alpha: Option<f64>,
    /// `_alpha` header of the file the analysis came from.
    #[serde(skip)]
    pub file_alpha: Option<f64>,
    #[serde(flatten)]
    pub kind: AnalysisKind,
}

/// What an analysis runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Assumption-driven comparison of two or more groups.
    Compare {
        samples: Vec<Sample>,
        #[serde(default)]
        unequal_variance: UnequalVariancePolicy,
        #[serde(default)]
        center: Center,
        /// Pairwise follow-up for more than two groups.
        posthoc: Option<Correction>,
    },
    /// One-sample t-test against a hypothesised mean.
    OneSample { sample: Sample, popmean: f64 },
    /// t confidence interval for a mean.
    ConfidenceInterval {
        sample: Sample,
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    /// Two-proportion z-test.
    Proportions {
        successes: [u64; 2],
        trials: [u64; 2],
    },
    /// Shapiro-Wilk on each sample.
    Normality { samples: Vec<Sample> },
    /// Levene's test across samples.
    Variance {
        samples: Vec<Sample>,
        #[serde(default)]
        center: Center,
    },
}

const fn default_confidence() -> f64 {
    0.95
}

/// An assumption check attached to a finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    /// Sample name, or the group list for multi-sample checks.
    pub subject: String,
    pub result: TestResult,
    /// True when the assumption holds (H0 not rejected).
    pub passed: bool,
}

/// Everything a hypothesis-test analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub alpha: f64,
    pub groups: Vec<Summary>,
    pub checks: Vec<Check>,
    pub result: TestResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pairwise: Vec<PairwiseComparison>,
}

/// Result of running one analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// H0 rejected.
    Significant { name: String, finding: Finding },
    /// H0 not rejected.
    NotSignificant { name: String, finding: Finding },
    /// Assumption checks only.
    Checked {
        name: String,
        alpha: f64,
        checks: Vec<Check>,
    },
    /// Interval estimate.
    Estimate {
        name: String,
        interval: ConfidenceInterval,
    },
    /// Analysis could not be run.
    Error { name: String, error: String },
}

impl Outcome {
    /// Wraps a finding according to its p-value.
    pub fn from_finding(name: String, finding: Finding) -> Self {
        if finding.result.is_significant(finding.alpha) {
            Self::Significant { name, finding }
        } else {
            Self::NotSignificant { name, finding }
        }
    }

    pub const fn is_significant(&self) -> bool {
        matches!(self, Self::Significant { .. })
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Significant { name, .. }
            | Self::NotSignificant { name, .. }
            | Self::Checked { name, .. }
            | Self::Estimate { name, .. }
            | Self::Error { name, .. } => name,
        }
    }
}

/// Analysis file structure.
#[derive(Debug, Deserialize)]
pub struct AnalysisFile {
    /// Significance threshold for every analysis in this file.
    #[serde(rename = "_alpha")]
    pub alpha: Option<f64>,

    /// Analyses in this file, keyed by name.
    #[serde(default)]
    pub analyses: BTreeMap<String, Analysis>,
}

/// Loads analyses from YAML content, in name order.
pub fn load_analyses(content: &str) -> anyhow::Result<Vec<Analysis>> {
    let file: AnalysisFile = serde_yaml_ng::from_str(content)?;
    let mut analyses = Vec::with_capacity(file.analyses.len());

    for (name, mut analysis) in file.analyses {
        analysis.name = name;
        analysis.file_alpha = file.alpha;
        analyses.push(analysis);
    }

    Ok(analyses)
}

/// Loads every `*.yaml` file in `dir`, in file name order.
///
/// Files that fail to parse are logged and skipped.
pub fn load_analysis_dir(dir: &Path) -> anyhow::Result<Vec<Analysis>> {
    if !dir.is_dir() {
        anyhow::bail!("Analyses directory not found: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut all = Vec::new();
    for path in paths {
        let content =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        match load_analyses(&content) {
            Ok(analyses) => all.extend(analyses),
            Err(e) => warn!(file = %path.display(), "skipping unparsable analysis file: {e}"),
        }
    }

    Ok(all)
}
