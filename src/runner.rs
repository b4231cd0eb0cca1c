//! Analysis runner.
//!
//! Turns an [`Analysis`] into an [`Outcome`]: runs the requested test (or the
//! Test Selector), attaches group summaries and assumption checks, and maps
//! library errors into reportable outcomes.

use tracing::debug;

use crate::error::Result;
use crate::normality::shapiro_wilk;
use crate::parametric::{mean_confidence_interval, one_sample_t};
use crate::posthoc::{pairwise, Family};
use crate::proportion::two_proportion_z;
use crate::sample::Sample;
use crate::selector::{choose_and_run, SelectorConfig, SIGNIFICANCE_LEVEL};
use crate::stats::describe;
use crate::types::{Analysis, AnalysisKind, Check, Finding, Outcome};
use crate::variance::levene;

/// Run-wide settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunConfig {
    /// Explicit threshold (`--alpha`). Beats a file's `_alpha` header but not
    /// an analysis's own `alpha`.
    pub alpha: Option<f64>,
}

/// Threshold for `analysis`: its own `alpha`, then the run-wide override,
/// then the file header, then [`SIGNIFICANCE_LEVEL`].
pub fn resolve_alpha(analysis: &Analysis, config: &RunConfig) -> f64 {
    analysis
        .alpha
        .or(config.alpha)
        .or(analysis.file_alpha)
        .unwrap_or(SIGNIFICANCE_LEVEL)
}

/// Runs one analysis. Never fails: errors become [`Outcome::Error`].
pub fn run_analysis(analysis: &Analysis, config: &RunConfig) -> Outcome {
    let alpha = resolve_alpha(analysis, config);
    debug!(analysis = %analysis.name, alpha, "running analysis");

    evaluate(analysis, alpha).unwrap_or_else(|e| Outcome::Error {
        name: analysis.name.clone(),
        error: e.to_string(),
    })
}

fn group_label(samples: &[Sample]) -> String {
    samples
        .iter()
        .map(Sample::name)
        .collect::<Vec<_>>()
        .join(" vs ")
}

fn evaluate(analysis: &Analysis, alpha: f64) -> Result<Outcome> {
    let name = analysis.name.clone();
    SelectorConfig {
        alpha,
        ..SelectorConfig::default()
    }
    .validate()?;

    let outcome = match &analysis.kind {
        AnalysisKind::Compare {
            samples,
            unequal_variance,
            center,
            posthoc,
        } => {
            let config = SelectorConfig {
                alpha,
                unequal_variance: *unequal_variance,
                center: *center,
            };
            let selection = choose_and_run(samples, &config)?;

            // Assumption checks in the order they ran
            let mut checks: Vec<Check> = selection
                .normality
                .into_iter()
                .map(|c| Check {
                    subject: c.sample,
                    result: c.result,
                    passed: c.normal,
                })
                .collect();
            if let Some(v) = selection.variance {
                checks.push(Check {
                    subject: group_label(samples),
                    result: v.result,
                    passed: v.homogeneous,
                });
            }

            // Post-hoc pairs only follow a k-group omnibus test
            let pairwise = match (posthoc, Family::for_omnibus(selection.test)) {
                (Some(correction), Some(family)) if samples.len() > 2 => {
                    pairwise(samples, family, *correction)?
                }
                _ => Vec::new(),
            };

            Outcome::from_finding(
                name,
                Finding {
                    alpha,
                    groups: samples.iter().map(describe).collect(),
                    checks,
                    result: selection.result,
                    pairwise,
                },
            )
        }
        AnalysisKind::OneSample { sample, popmean } => Outcome::from_finding(
            name,
            Finding {
                alpha,
                groups: vec![describe(sample)],
                checks: Vec::new(),
                result: one_sample_t(sample, *popmean)?,
                pairwise: Vec::new(),
            },
        ),
        AnalysisKind::ConfidenceInterval { sample, confidence } => Outcome::Estimate {
            name,
            interval: mean_confidence_interval(sample, *confidence)?,
        },
        AnalysisKind::Proportions { successes, trials } => Outcome::from_finding(
            name,
            Finding {
                alpha,
                groups: Vec::new(),
                checks: Vec::new(),
                result: two_proportion_z(*successes, *trials)?,
                pairwise: Vec::new(),
            },
        ),
        AnalysisKind::Normality { samples } => {
            let checks = samples
                .iter()
                .map(|s| {
                    let result = shapiro_wilk(s)?;
                    Ok(Check {
                        subject: s.name().to_string(),
                        passed: !result.is_significant(alpha),
                        result,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Outcome::Checked {
                name,
                alpha,
                checks,
            }
        }
        AnalysisKind::Variance { samples, center } => {
            let result = levene(samples, *center)?;
            Outcome::Checked {
                name,
                alpha,
                checks: vec![Check {
                    subject: group_label(samples),
                    passed: !result.is_significant(alpha),
                    result,
                }],
            }
        }
    };

    Ok(outcome)
}
