//! Dataset inspection: data types and summary statistics

use super::{fmt_opt, mean, sample_std};
use crate::data::{present_values, ColumnKind};
use crate::error::Result;
use crate::preprocessing::{linear_quantile, string_mode};
use crate::strategy::Strategy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// What to inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InspectionStrategy {
    DataTypes,
    SummaryStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column: String,
    pub dtype: String,
    pub non_null: usize,
    pub nulls: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InspectionReport {
    DataTypes {
        rows: usize,
        columns: Vec<ColumnInfo>,
    },
    Summary {
        numeric: Vec<NumericSummary>,
        categorical: Vec<CategoricalSummary>,
    },
}

impl InspectionStrategy {
    pub fn inspect(&self, df: &DataFrame) -> Result<InspectionReport> {
        match self {
            InspectionStrategy::DataTypes => {
                let columns = df
                    .get_columns()
                    .iter()
                    .map(|c| ColumnInfo {
                        column: c.name().to_string(),
                        dtype: c.dtype().to_string(),
                        non_null: c.len() - c.null_count(),
                        nulls: c.null_count(),
                    })
                    .collect();
                Ok(InspectionReport::DataTypes {
                    rows: df.height(),
                    columns,
                })
            }
            InspectionStrategy::SummaryStatistics => {
                let mut numeric = Vec::new();
                let mut categorical = Vec::new();
                for column in df.get_columns() {
                    let series = column.as_materialized_series();
                    match ColumnKind::of(series.dtype()) {
                        Some(ColumnKind::Numeric) => numeric.push(numeric_summary(series)?),
                        Some(ColumnKind::Categorical) => categorical.push(categorical_summary(series)?),
                        None => {}
                    }
                }
                Ok(InspectionReport::Summary { numeric, categorical })
            }
        }
    }
}

impl Strategy for InspectionStrategy {
    type Input<'a> = &'a DataFrame;
    type Output = InspectionReport;

    fn execute(&self, df: &DataFrame) -> Result<InspectionReport> {
        self.inspect(df)
    }
}

fn numeric_summary(series: &Series) -> Result<NumericSummary> {
    let mut values = present_values(series)?;
    values.sort_by(|a, b| a.total_cmp(b));
    let q = |p: f64| (!values.is_empty()).then(|| linear_quantile(&values, p));

    Ok(NumericSummary {
        column: series.name().to_string(),
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        q25: q(0.25),
        median: q(0.5),
        q75: q(0.75),
        max: values.last().copied(),
    })
}

fn categorical_summary(series: &Series) -> Result<CategoricalSummary> {
    let cast = series.cast(&DataType::String)?;
    let ca = cast.str()?;
    let present: Vec<&str> = ca.into_iter().flatten().collect();
    let unique: HashSet<&str> = present.iter().copied().collect();
    let top = string_mode(series)?;
    let freq = top
        .as_deref()
        .map(|t| present.iter().filter(|v| **v == t).count())
        .unwrap_or(0);

    Ok(CategoricalSummary {
        column: series.name().to_string(),
        count: present.len(),
        unique: unique.len(),
        top,
        freq,
    })
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionReport::DataTypes { rows, columns } => {
                writeln!(f, "{} rows, {} columns", rows, columns.len())?;
                writeln!(f, "{:<28} {:<10} {:>9} {:>7}", "column", "dtype", "non-null", "nulls")?;
                for c in columns {
                    writeln!(f, "{:<28} {:<10} {:>9} {:>7}", c.column, c.dtype, c.non_null, c.nulls)?;
                }
            }
            InspectionReport::Summary { numeric, categorical } => {
                writeln!(f, "Numerical features")?;
                writeln!(
                    f,
                    "{:<24} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
                    "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
                )?;
                for s in numeric {
                    writeln!(
                        f,
                        "{:<24} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
                        s.column,
                        s.count,
                        fmt_opt(s.mean),
                        fmt_opt(s.std),
                        fmt_opt(s.min),
                        fmt_opt(s.q25),
                        fmt_opt(s.median),
                        fmt_opt(s.q75),
                        fmt_opt(s.max)
                    )?;
                }
                writeln!(f)?;
                writeln!(f, "Categorical features")?;
                writeln!(f, "{:<24} {:>7} {:>7} {:<16} {:>6}", "column", "count", "unique", "top", "freq")?;
                for s in categorical {
                    writeln!(
                        f,
                        "{:<24} {:>7} {:>7} {:<16} {:>6}",
                        s.column,
                        s.count,
                        s.unique,
                        s.top.as_deref().unwrap_or("-"),
                        s.freq
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df! {
            "price" => [Some(1.0), Some(2.0), Some(3.0), None, Some(4.0)],
            "zone" => [Some("a"), Some("b"), Some("a"), Some("c"), None],
        }
        .unwrap()
    }

    #[test]
    fn test_data_types() {
        let report = InspectionStrategy::DataTypes.inspect(&frame()).unwrap();
        match report {
            InspectionReport::DataTypes { rows, columns } => {
                assert_eq!(rows, 5);
                assert_eq!(columns[0].nulls, 1);
                assert_eq!(columns[1].non_null, 4);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_summary_statistics() {
        let report = InspectionStrategy::SummaryStatistics.inspect(&frame()).unwrap();
        let InspectionReport::Summary { numeric, categorical } = &report else {
            panic!("expected summary");
        };
        assert_eq!(numeric[0].count, 4);
        assert_eq!(numeric[0].mean, Some(2.5));
        assert_eq!(numeric[0].median, Some(2.5));
        assert_eq!(categorical[0].unique, 3);
        assert_eq!(categorical[0].top.as_deref(), Some("a"));
        assert_eq!(categorical[0].freq, 2);
        assert!(report.to_string().contains("Categorical features"));
    }
}
