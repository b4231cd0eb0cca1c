//! Report formatting.
//!
//! Renders outcomes as plain text lines. Precision is always passed in via
//! [`ReportConfig`]; colouring is left to the binary.

use std::fmt;

use serde::Serialize;

use crate::parametric::ConfidenceInterval;
use crate::stats::Summary;
use crate::types::{Check, Finding, TestResult};

/// Presentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    /// Decimal places for statistics and p-values.
    pub precision: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { precision: 4 }
    }
}

/// Reading of a p-value against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    RejectNull,
    FailToReject,
}

impl Decision {
    pub fn from_p(p_value: f64, alpha: f64) -> Self {
        if p_value < alpha {
            Self::RejectNull
        } else {
            Self::FailToReject
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RejectNull => f.write_str("reject H0"),
            Self::FailToReject => f.write_str("fail to reject H0"),
        }
    }
}

/// `Test Stat = …, p-value = …`
pub fn stat_line(result: &TestResult, config: &ReportConfig) -> String {
    let p = config.precision;
    format!(
        "Test Stat = {:.p$}, p-value = {:.p$}",
        result.statistic, result.p_value
    )
}

/// Test name, statistic line and decision.
pub fn result_line(result: &TestResult, alpha: f64, config: &ReportConfig) -> String {
    format!(
        "{}: {} ({})",
        result.kind,
        stat_line(result, config),
        Decision::from_p(result.p_value, alpha)
    )
}

pub fn summary_line(summary: &Summary, config: &ReportConfig) -> String {
    let p = config.precision;
    format!(
        "{}: n={} mean={:.p$} median={:.p$} std={:.p$}",
        summary.name, summary.n, summary.mean, summary.median, summary.std
    )
}

pub fn check_line(check: &Check, config: &ReportConfig) -> String {
    format!(
        "{} [{}]: {} ({})",
        check.result.kind,
        check.subject,
        stat_line(&check.result, config),
        if check.passed { "holds" } else { "violated" }
    )
}

pub fn interval_line(interval: &ConfidenceInterval, config: &ReportConfig) -> String {
    let p = config.precision;
    format!(
        "{}: mean={:.p$}, {:.0}% CI [{:.p$}, {:.p$}]",
        interval.sample,
        interval.mean,
        interval.confidence * 100.0,
        interval.lower,
        interval.upper
    )
}

/// Detail lines for a finding: group summaries, checks, test, pairwise.
pub fn finding_lines(finding: &Finding, config: &ReportConfig) -> Vec<String> {
    let p = config.precision;
    let mut lines: Vec<String> = finding
        .groups
        .iter()
        .map(|s| summary_line(s, config))
        .collect();
    lines.extend(finding.checks.iter().map(|c| check_line(c, config)));
    lines.push(result_line(&finding.result, finding.alpha, config));
    lines.extend(finding.pairwise.iter().map(|c| {
        format!(
            "  {} vs {}: {} (adjusted p = {:.p$})",
            c.first,
            c.second,
            stat_line(&c.result, config),
            c.adjusted_p
        )
    }));
    lines
}
