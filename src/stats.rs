//! Descriptive statistics and ranking utilities.
//!
//! Shared building blocks for the hypothesis tests: moments, medians,
//! per-group summaries and average ranks with tie bookkeeping.

#![allow(clippy::cast_precision_loss)]

use serde::Serialize;

use crate::sample::Sample;

/// Arithmetic mean. Returns 0 for an empty slice.
#[inline]
#[must_use]
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Variance with `ddof` delta degrees of freedom (1 = sample variance).
#[must_use]
pub fn variance(data: &[f64], ddof: usize) -> f64 {
    if data.len() <= ddof {
        return 0.0;
    }
    let m = mean(data);
    let ss = data.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    ss / (data.len() - ddof) as f64
}

/// Sum of squared deviations from the mean.
#[must_use]
pub fn sum_of_squares(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum()
}

/// Median of the data. Returns 0 for an empty slice.
#[must_use]
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Group summary printed ahead of every comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub name: String,
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

/// Summarizes a sample (sample standard deviation, ddof = 1).
#[must_use]
pub fn describe(sample: &Sample) -> Summary {
    let values = sample.values();
    Summary {
        name: sample.name().to_string(),
        n: values.len(),
        mean: mean(values),
        median: median(values),
        std: variance(values, 1).sqrt(),
    }
}

/// Average ranks of pooled observations.
#[derive(Debug, Clone)]
pub struct Ranking {
    /// Rank of each input value, in input order (1-based, ties averaged).
    pub ranks: Vec<f64>,
    /// Σ (t³ − t) over tie groups of size t.
    pub tie_term: f64,
}

/// Assigns average ranks to `data`, accumulating the tie correction term.
#[must_use]
pub fn average_ranks(data: &[f64]) -> Ranking {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; n];
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && data[order[j]].total_cmp(&data[order[i]]).is_eq() {
            j += 1;
        }
        // Positions i..j share the average of ranks i+1..=j.
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        let t = (j - i) as f64;
        tie_term += t * t * t - t;
        i = j;
    }

    Ranking { ranks, tie_term }
}
