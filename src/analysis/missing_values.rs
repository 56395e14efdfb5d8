//! Missing value analysis

use super::bar;
use crate::data::{numeric_values, ColumnKind};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingColumn {
    pub column: String,
    pub missing: usize,
    pub ratio: f64,
}

/// Columns with at least one missing value, most missing first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValuesReport {
    pub rows: usize,
    pub columns: Vec<MissingColumn>,
    /// Text rendering produced by the visualization step
    pub chart: String,
}

impl fmt::Display for MissingValuesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return writeln!(f, "No missing values in {} rows", self.rows);
        }
        writeln!(f, "Missing values ({} rows)", self.rows)?;
        write!(f, "{}", self.chart)
    }
}

/// Two-step analysis: identify, then visualize
pub trait MissingValuesAnalysis {
    fn identify_missing_values(&self, df: &DataFrame) -> Result<Vec<MissingColumn>>;

    fn visualize_missing_values(&self, columns: &[MissingColumn]) -> String;

    fn analyze(&self, df: &DataFrame) -> Result<MissingValuesReport> {
        let columns = self.identify_missing_values(df)?;
        let chart = self.visualize_missing_values(&columns);
        Ok(MissingValuesReport {
            rows: df.height(),
            columns,
            chart,
        })
    }
}

/// Counts nulls (and NaN in numeric columns) and draws a ratio bar chart
#[derive(Debug, Clone, Default)]
pub struct SimpleMissingValuesAnalysis;

impl MissingValuesAnalysis for SimpleMissingValuesAnalysis {
    fn identify_missing_values(&self, df: &DataFrame) -> Result<Vec<MissingColumn>> {
        let rows = df.height();
        let mut columns = Vec::new();
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let missing = if ColumnKind::of(series.dtype()) == Some(ColumnKind::Numeric) {
                numeric_values(series)?
                    .iter()
                    .filter(|v| v.map_or(true, f64::is_nan))
                    .count()
            } else {
                series.null_count()
            };
            if missing > 0 {
                columns.push(MissingColumn {
                    column: series.name().to_string(),
                    missing,
                    ratio: missing as f64 / rows.max(1) as f64,
                });
            }
        }
        columns.sort_by(|a, b| b.missing.cmp(&a.missing).then_with(|| a.column.cmp(&b.column)));
        Ok(columns)
    }

    fn visualize_missing_values(&self, columns: &[MissingColumn]) -> String {
        columns
            .iter()
            .map(|c| {
                format!(
                    "{:<28} {:>6} {:>6.1}% {}\n",
                    c.column,
                    c.missing,
                    c.ratio * 100.0,
                    bar(c.ratio)
                )
            })
            .collect()
    }
}
