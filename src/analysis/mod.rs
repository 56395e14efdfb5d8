//! Exploratory data analysis
//!
//! Every analysis returns a plain-data report that serializes to JSON and
//! renders as text through `Display` (tables, bar charts, histograms).

pub mod bivariate;
pub mod inspection;
pub mod missing_values;
pub mod multivariate;
pub mod univariate;

pub use bivariate::{BivariateAnalysisStrategy, BivariateReport, BoxStats};
pub use inspection::{InspectionReport, InspectionStrategy};
pub use missing_values::{MissingValuesAnalysis, MissingValuesReport, SimpleMissingValuesAnalysis};
pub use multivariate::{CorrelationMatrix, MultivariateAnalysis, MultivariateReport, PairPlot, SimpleMultivariateAnalysis};
pub use univariate::{UnivariateAnalysisStrategy, UnivariateReport};

use serde::{Deserialize, Serialize};
use std::fmt;

const BAR_WIDTH: usize = 40;

/// Equal-width histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width buckets; the last bucket is closed
    pub fn new(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        if values.is_empty() {
            return Self {
                edges: Vec::new(),
                counts: Vec::new(),
            };
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
        let width = (hi - lo) / bins as f64;

        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Self { edges, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        for (i, count) in self.counts.iter().enumerate() {
            writeln!(
                f,
                "[{:>12.3}, {:>12.3}{} {:>6} {}",
                self.edges[i],
                self.edges[i + 1],
                if i + 1 == self.counts.len() { "]" } else { ")" },
                count,
                bar(*count as f64 / peak as f64)
            )?;
        }
        Ok(())
    }
}

/// Horizontal text bar for a ratio in `[0, 1]`
pub(crate) fn bar(ratio: f64) -> String {
    let n = (ratio.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(n)
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (ddof = 1)
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Adjusted Fisher-Pearson skewness
pub(crate) fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 3 {
        return None;
    }
    let m = mean(values)?;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return Some(0.0);
    }
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Pearson correlation, `None` when undefined
pub(crate) fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

/// Keep positions where both values are present and not NaN
pub(crate) fn complete_pairs(a: &[Option<f64>], b: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((*x, *y)),
            _ => None,
        })
        .unzip()
}

pub(crate) fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts() {
        let h = Histogram::new(&[0.0, 1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(h.counts, vec![2, 3]);
        assert_eq!(h.edges, vec![0.0, 2.0, 4.0]);
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn test_histogram_constant_values() {
        let h = Histogram::new(&[3.0, 3.0], 4);
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn test_pearson() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert!(pearson(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_skewness_symmetric() {
        assert!(skewness(&[1.0, 2.0, 3.0]).unwrap().abs() < 1e-12);
        assert!(skewness(&[1.0, 1.0, 1.0, 10.0]).unwrap() > 0.0);
    }

    #[test]
    fn test_complete_pairs() {
        let (x, y) = complete_pairs(&[Some(1.0), None, Some(3.0)], &[Some(1.0), Some(2.0), Some(f64::NAN)]);
        assert_eq!(x, vec![1.0]);
        assert_eq!(y, vec![1.0]);
    }
}
