//! Outlier detection and handling

use crate::data::{filter_rows, numeric_values, present_values, require_kind, ColumnKind};
use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Method for flagging outliers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutlierDetectionStrategy {
    /// |x - mean| / std > threshold, population std
    ZScore { threshold: f64 },
    /// Outside [q1 - factor * iqr, q3 + factor * iqr]
    Iqr { factor: f64 },
}

impl Default for OutlierDetectionStrategy {
    fn default() -> Self {
        OutlierDetectionStrategy::ZScore { threshold: 3.0 }
    }
}

/// What to do with flagged values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlierHandling {
    /// Drop rows with an outlier in any listed column
    Remove,
    /// Clip values to the detection bounds
    Cap,
}

/// Inclusive range of non-outlier values for a column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

impl OutlierDetectionStrategy {
    /// Bounds computed from the column's present values
    pub fn bounds(&self, df: &DataFrame, column: &str) -> Result<OutlierBounds> {
        let series = require_kind(df, column, ColumnKind::Numeric)?;
        let mut values = present_values(series)?;
        if values.is_empty() {
            return Ok(OutlierBounds {
                lower: f64::NEG_INFINITY,
                upper: f64::INFINITY,
            });
        }

        match self {
            OutlierDetectionStrategy::ZScore { threshold } => {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let std = (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
                if std == 0.0 {
                    return Ok(OutlierBounds {
                        lower: mean,
                        upper: mean,
                    });
                }
                Ok(OutlierBounds {
                    lower: mean - threshold * std,
                    upper: mean + threshold * std,
                })
            }
            OutlierDetectionStrategy::Iqr { factor } => {
                values.sort_by(|a, b| a.total_cmp(b));
                let q1 = linear_quantile(&values, 0.25);
                let q3 = linear_quantile(&values, 0.75);
                let iqr = q3 - q1;
                Ok(OutlierBounds {
                    lower: q1 - factor * iqr,
                    upper: q3 + factor * iqr,
                })
            }
        }
    }

    /// Flag rows holding an outlier in any of `columns`. Nulls are never outliers.
    pub fn detect(&self, df: &DataFrame, columns: &[String]) -> Result<Vec<bool>> {
        let mut flags = vec![false; df.height()];
        for column in columns {
            let bounds = self.bounds(df, column)?;
            let values = numeric_values(require_kind(df, column, ColumnKind::Numeric)?)?;
            for (flag, value) in flags.iter_mut().zip(values) {
                if let Some(v) = value {
                    if !v.is_nan() && !bounds.contains(v) {
                        *flag = true;
                    }
                }
            }
        }
        Ok(flags)
    }

    /// Remove or cap outliers in `columns`
    pub fn handle(
        &self,
        df: &DataFrame,
        columns: &[String],
        handling: OutlierHandling,
    ) -> Result<DataFrame> {
        match handling {
            OutlierHandling::Remove => {
                let flags = self.detect(df, columns)?;
                let keep: Vec<bool> = flags.iter().map(|f| !f).collect();
                let result = filter_rows(df, &keep)?;
                info!(
                    removed = df.height() - result.height(),
                    remaining = result.height(),
                    "Removed outlier rows"
                );
                Ok(result)
            }
            OutlierHandling::Cap => {
                let mut result = df.clone();
                for column in columns {
                    let bounds = self.bounds(df, column)?;
                    let series = require_kind(df, column, ColumnKind::Numeric)?;
                    let capped: Float64Chunked = numeric_values(series)?
                        .into_iter()
                        .map(|opt| opt.map(|v| v.max(bounds.lower).min(bounds.upper)))
                        .collect();
                    result.with_column(capped.with_name(series.name().clone()).into_series())?;
                }
                Ok(result)
            }
        }
    }
}

impl Strategy for OutlierDetectionStrategy {
    type Input<'a> = (&'a DataFrame, &'a [String]);
    type Output = Vec<bool>;

    fn execute(&self, (df, columns): (&DataFrame, &[String])) -> Result<Vec<bool>> {
        self.detect(df, columns)
    }
}

/// Quantile with linear interpolation over sorted values
pub(crate) fn linear_quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Validate detection parameters before running
pub fn validate(strategy: &OutlierDetectionStrategy) -> Result<()> {
    let (name, value) = match strategy {
        OutlierDetectionStrategy::ZScore { threshold } => ("threshold", *threshold),
        OutlierDetectionStrategy::Iqr { factor } => ("factor", *factor),
    };
    if !(value > 0.0) {
        return Err(PipelineError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df! {
            "price" => [10.0, 11.0, 9.0, 10.5, 9.5, 10.0, 11.0, 9.0, 10.0, 10.0, 500.0],
            "zone" => ["a", "b", "a", "b", "a", "b", "a", "b", "a", "b", "a"],
        }
        .unwrap()
    }

    fn cols() -> Vec<String> {
        vec!["price".to_string()]
    }

    #[test]
    fn test_zscore_flags_extreme_row() {
        let strategy = OutlierDetectionStrategy::ZScore { threshold: 3.0 };
        let flags = strategy.detect(&frame(), &cols()).unwrap();
        assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        assert!(flags[10]);
    }

    #[test]
    fn test_iqr_remove() {
        let strategy = OutlierDetectionStrategy::Iqr { factor: 1.5 };
        let result = strategy
            .handle(&frame(), &cols(), OutlierHandling::Remove)
            .unwrap();
        assert_eq!(result.height(), 10);
        assert_eq!(result.width(), 2);
    }

    #[test]
    fn test_cap_clips_to_bounds() {
        let strategy = OutlierDetectionStrategy::Iqr { factor: 1.5 };
        let bounds = strategy.bounds(&frame(), "price").unwrap();
        let result = strategy.handle(&frame(), &cols(), OutlierHandling::Cap).unwrap();
        let max = result.column("price").unwrap().f64().unwrap().max().unwrap();
        assert_eq!(result.height(), 11);
        assert!((max - bounds.upper).abs() < 1e-12);
    }

    #[test]
    fn test_categorical_column_rejected() {
        let strategy = OutlierDetectionStrategy::default();
        let err = strategy.detect(&frame(), &["zone".to_string()]).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnType { .. }));
    }

    #[test]
    fn test_linear_quantile() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((linear_quantile(&v, 0.25) - 1.75).abs() < 1e-12);
        assert!((linear_quantile(&v, 0.5) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(validate(&OutlierDetectionStrategy::Iqr { factor: 0.0 }).is_err());
        assert!(validate(&OutlierDetectionStrategy::default()).is_ok());
    }
}
