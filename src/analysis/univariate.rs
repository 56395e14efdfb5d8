//! Single-feature analysis

use super::{fmt_opt, mean, sample_std, skewness, Histogram};
use crate::data::{present_values, require_kind, ColumnKind};
use crate::error::Result;
use crate::strategy::Strategy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnivariateAnalysisStrategy {
    /// Distribution of a numeric feature
    Numerical { bins: usize },
    /// Value counts of a categorical feature
    Categorical,
}

impl Default for UnivariateAnalysisStrategy {
    fn default() -> Self {
        UnivariateAnalysisStrategy::Numerical { bins: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnivariateReport {
    Numerical {
        column: String,
        count: usize,
        mean: Option<f64>,
        std: Option<f64>,
        skewness: Option<f64>,
        histogram: Histogram,
    },
    Categorical {
        column: String,
        /// Sorted by count descending, then by category
        counts: Vec<(String, usize)>,
        missing: usize,
    },
}

impl UnivariateAnalysisStrategy {
    pub fn analyze(&self, df: &DataFrame, feature: &str) -> Result<UnivariateReport> {
        match self {
            UnivariateAnalysisStrategy::Numerical { bins } => {
                let series = require_kind(df, feature, ColumnKind::Numeric)?;
                let values = present_values(series)?;
                Ok(UnivariateReport::Numerical {
                    column: feature.to_string(),
                    count: values.len(),
                    mean: mean(&values),
                    std: sample_std(&values),
                    skewness: skewness(&values),
                    histogram: Histogram::new(&values, *bins),
                })
            }
            UnivariateAnalysisStrategy::Categorical => {
                let series = require_kind(df, feature, ColumnKind::Categorical)?;
                let cast = series.cast(&DataType::String)?;
                let mut counts: HashMap<&str, usize> = HashMap::new();
                for v in cast.str()?.into_iter().flatten() {
                    *counts.entry(v).or_insert(0) += 1;
                }
                let mut counts: Vec<(String, usize)> =
                    counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
                counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

                Ok(UnivariateReport::Categorical {
                    column: feature.to_string(),
                    counts,
                    missing: series.null_count(),
                })
            }
        }
    }
}

impl Strategy for UnivariateAnalysisStrategy {
    type Input<'a> = (&'a DataFrame, &'a str);
    type Output = UnivariateReport;

    fn execute(&self, (df, feature): (&DataFrame, &str)) -> Result<UnivariateReport> {
        self.analyze(df, feature)
    }
}

impl fmt::Display for UnivariateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnivariateReport::Numerical {
                column,
                count,
                mean,
                std,
                skewness,
                histogram,
            } => {
                writeln!(f, "Distribution of {}", column)?;
                writeln!(
                    f,
                    "count={} mean={} std={} skew={}",
                    count,
                    fmt_opt(*mean),
                    fmt_opt(*std),
                    fmt_opt(*skewness)
                )?;
                write!(f, "{}", histogram)
            }
            UnivariateReport::Categorical {
                column,
                counts,
                missing,
            } => {
                writeln!(f, "Distribution of {} ({} missing)", column, missing)?;
                let peak = counts.first().map(|(_, c)| *c).unwrap_or(1).max(1);
                for (category, count) in counts {
                    writeln!(
                        f,
                        "{:<24} {:>6} {}",
                        category,
                        count,
                        super::bar(*count as f64 / peak as f64)
                    )?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn frame() -> DataFrame {
        df! {
            "price" => [1.0, 2.0, 2.0, 3.0, 10.0],
            "zone" => ["b", "a", "b", "c", "a"],
        }
        .unwrap()
    }

    #[test]
    fn test_numerical() {
        let strategy = UnivariateAnalysisStrategy::Numerical { bins: 3 };
        let report = strategy.analyze(&frame(), "price").unwrap();
        let UnivariateReport::Numerical {
            count,
            skewness,
            histogram,
            ..
        } = report
        else {
            panic!("expected numerical report");
        };
        assert_eq!(count, 5);
        assert!(skewness.unwrap() > 0.0);
        assert_eq!(histogram.total(), 5);
        assert_eq!(histogram.counts.len(), 3);
    }

    #[test]
    fn test_categorical_ordering() {
        let report = UnivariateAnalysisStrategy::Categorical
            .analyze(&frame(), "zone")
            .unwrap();
        let UnivariateReport::Categorical { counts, .. } = report else {
            panic!("expected categorical report");
        };
        assert_eq!(
            counts,
            vec![("a".to_string(), 2), ("b".to_string(), 2), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let err = UnivariateAnalysisStrategy::default()
            .analyze(&frame(), "zone")
            .unwrap_err();
        assert!(matches!(err, PipelineError::ColumnType { .. }));
    }
}
