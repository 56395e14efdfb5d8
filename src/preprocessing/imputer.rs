//! Missing value imputation

use crate::data::{column_kind, present_values, require_column, ColumnKind};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with the most frequent value, ties go to the smallest value
    MostFrequent,
    /// Replace with a constant (numeric only)
    Constant(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Learns one fill value per column and fills nulls with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: Vec<(String, ImputeValue)>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let mut fill_values = Vec::with_capacity(columns.len());
        for col_name in columns {
            let kind = column_kind(df, col_name)?;
            let series = require_column(df, col_name)?;
            let value = self.compute_fill_value(col_name, kind, series)?;
            fill_values.push((col_name.clone(), value));
        }
        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(self)
    }

    /// Fill nulls in every fitted column. Each one must be present in `df`.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            let filled = fill_series(require_column(df, col_name)?, fill_value)?;
            result.with_column(filled)?;
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_fill_value(&self, column: &str, kind: ColumnKind, series: &Series) -> Result<ImputeValue> {
        let numeric_only = || PipelineError::ColumnType {
            column: column.to_string(),
            expected: ColumnKind::Numeric.to_string(),
            actual: kind.to_string(),
        };

        match (&self.strategy, kind) {
            (ImputeStrategy::Mean, ColumnKind::Numeric) => {
                let values = present_values(series)?;
                let mean = if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                };
                Ok(ImputeValue::Numeric(mean))
            }
            (ImputeStrategy::Median, ColumnKind::Numeric) => {
                let mut values = present_values(series)?;
                Ok(ImputeValue::Numeric(median(&mut values).unwrap_or(0.0)))
            }
            (ImputeStrategy::Constant(v), ColumnKind::Numeric) => Ok(ImputeValue::Numeric(*v)),
            (ImputeStrategy::MostFrequent, ColumnKind::Numeric) => {
                Ok(ImputeValue::Numeric(numeric_mode(series)?.unwrap_or(0.0)))
            }
            (ImputeStrategy::MostFrequent, ColumnKind::Categorical) => {
                Ok(ImputeValue::String(string_mode(series)?.unwrap_or_default()))
            }
            (_, ColumnKind::Categorical) => Err(numeric_only()),
        }
    }
}

/// Median of a slice, sorting it in place
pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        Some(values[n / 2])
    } else {
        Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
    }
}

fn numeric_mode(series: &Series) -> Result<Option<f64>> {
    let mut values = present_values(series)?;
    values.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < values.len() {
        let mut j = i;
        while j < values.len() && values[j] == values[i] {
            j += 1;
        }
        let count = j - i;
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((values[i], count));
        }
        i = j;
    }
    Ok(best.map(|(v, _)| v))
}

pub(crate) fn string_mode(series: &Series) -> Result<Option<String>> {
    let cast = series.cast(&DataType::String)?;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in cast.str()?.into_iter().flatten() {
        *counts.entry(val).or_insert(0) += 1;
    }

    // BTreeMap iterates in key order, so ties keep the smallest key
    let mut best: Option<(&str, usize)> = None;
    for (k, c) in counts {
        if best.map_or(true, |(_, bc)| c > bc) {
            best = Some((k, c));
        }
    }
    Ok(best.map(|(k, _)| k.to_string()))
}

fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
    match fill_value {
        ImputeValue::Numeric(val) => {
            let cast = series.cast(&DataType::Float64)?;
            let filled: Float64Chunked = cast
                .f64()?
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(*val)))
                .collect();
            Ok(filled.with_name(series.name().clone()).into_series())
        }
        ImputeValue::String(val) => {
            let cast = series.cast(&DataType::String)?;
            let filled: StringChunked = cast
                .str()?
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(val.as_str())))
                .collect();
            Ok(filled.with_name(series.name().clone()).into_series())
        }
    }
}
