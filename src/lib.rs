//! ab-testing: assumption-driven hypothesis testing for A/B comparisons.
//!
//! Checks normality and variance homogeneity, picks the matching parametric
//! or rank-based test, and reports its statistic and p-value.

pub mod distribution;
pub mod error;
pub mod nonparametric;
pub mod normality;
pub mod parametric;
pub mod posthoc;
pub mod proportion;
pub mod report;
pub mod runner;
pub mod sample;
pub mod selector;
pub mod stats;
pub mod types;
pub mod variance;

pub use error::{Result, StatsError};
pub use sample::Sample;
pub use selector::{choose_and_run, Selection, SelectorConfig, UnequalVariancePolicy};
pub use types::{TestKind, TestResult};
