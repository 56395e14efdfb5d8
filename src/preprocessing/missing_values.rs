//! Dataset-level missing value handling

use super::imputer::{ImputeStrategy, Imputer};
use crate::data::{categorical_columns, filter_rows, numeric_columns, numeric_values, ColumnKind};
use crate::error::Result;
use crate::strategy::Strategy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Statistic used to fill missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillMethod {
    Mean,
    Median,
    /// Most frequent value, applied to every column
    Mode,
    Constant(f64),
}

/// How to treat missing values across a whole dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MissingValueStrategy {
    /// Drop rows with any missing value, or with fewer than `min_non_null`
    /// present values when set
    Drop { min_non_null: Option<usize> },
    /// Fill missing values column by column
    Fill { method: FillMethod },
}

impl Default for MissingValueStrategy {
    fn default() -> Self {
        MissingValueStrategy::Fill {
            method: FillMethod::Mean,
        }
    }
}

impl MissingValueStrategy {
    pub fn handle(&self, df: &DataFrame) -> Result<DataFrame> {
        let result = match self {
            MissingValueStrategy::Drop { min_non_null } => {
                let counts = present_counts(df)?;
                let required = min_non_null.unwrap_or(df.width());
                let keep: Vec<bool> = counts.iter().map(|&c| c >= required).collect();
                filter_rows(df, &keep)?
            }
            MissingValueStrategy::Fill { method } => {
                let (strategy, columns) = match method {
                    FillMethod::Mean => (ImputeStrategy::Mean, numeric_columns(df)),
                    FillMethod::Median => (ImputeStrategy::Median, numeric_columns(df)),
                    FillMethod::Constant(v) => (ImputeStrategy::Constant(*v), numeric_columns(df)),
                    FillMethod::Mode => {
                        let mut all = numeric_columns(df);
                        all.extend(categorical_columns(df));
                        (ImputeStrategy::MostFrequent, all)
                    }
                };
                Imputer::new(strategy).fit_transform(df, &columns)?
            }
        };

        info!(
            strategy = ?self,
            rows_before = df.height(),
            rows_after = result.height(),
            "Handled missing values"
        );
        Ok(result)
    }
}

impl Strategy for MissingValueStrategy {
    type Input<'a> = &'a DataFrame;
    type Output = DataFrame;

    fn execute(&self, df: &DataFrame) -> Result<DataFrame> {
        self.handle(df)
    }
}

/// Present (non-null, non-NaN) values per row
fn present_counts(df: &DataFrame) -> Result<Vec<usize>> {
    let mut counts = vec![0usize; df.height()];
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if ColumnKind::of(series.dtype()) == Some(ColumnKind::Numeric) {
            for (count, v) in counts.iter_mut().zip(numeric_values(series)?) {
                if matches!(v, Some(x) if !x.is_nan()) {
                    *count += 1;
                }
            }
        } else {
            for (count, is_null) in counts.iter_mut().zip(series.is_null().into_iter()) {
                if is_null == Some(false) {
                    *count += 1;
                }
            }
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df! {
            "a" => [Some(1.0), None, Some(3.0), None],
            "b" => [Some("x"), Some("y"), None, None],
            "c" => [Some(1i64), Some(2), Some(3), Some(4)],
        }
        .unwrap()
    }

    #[test]
    fn test_drop_any_missing() {
        let strategy = MissingValueStrategy::Drop { min_non_null: None };
        let result = strategy.handle(&frame()).unwrap();
        assert_eq!(result.height(), 1);
    }

    #[test]
    fn test_drop_with_threshold() {
        let strategy = MissingValueStrategy::Drop {
            min_non_null: Some(2),
        };
        let result = strategy.handle(&frame()).unwrap();
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn test_fill_mean_leaves_categoricals() {
        let result = MissingValueStrategy::default().handle(&frame()).unwrap();
        assert_eq!(result.column("a").unwrap().null_count(), 0);
        assert_eq!(result.column("b").unwrap().null_count(), 2);
        assert_eq!(result.column("a").unwrap().f64().unwrap().get(1), Some(2.0));
    }

    #[test]
    fn test_fill_mode_covers_all_columns() {
        let strategy = MissingValueStrategy::Fill {
            method: FillMethod::Mode,
        };
        let result = strategy.handle(&frame()).unwrap();
        assert_eq!(result.column("b").unwrap().null_count(), 0);
        assert_eq!(result.column("b").unwrap().str().unwrap().get(3), Some("x"));
    }

    #[test]
    fn test_fill_constant() {
        let strategy = MissingValueStrategy::Fill {
            method: FillMethod::Constant(-1.0),
        };
        let result = strategy.handle(&frame()).unwrap();
        assert_eq!(result.column("a").unwrap().f64().unwrap().get(3), Some(-1.0));
    }
}
