//! Tabular data helpers: column typing, CSV loading, frame conversion

pub mod ingest;

pub use ingest::{DataIngestor, DataIngestorFactory, ZipDataIngestor};

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Semantic kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    /// Classify a polars dtype, `None` when the dtype is neither kind
    pub fn of(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean => Some(ColumnKind::Numeric),
            DataType::String | DataType::Categorical(_, _) => Some(ColumnKind::Categorical),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Look up a column, mapping absence to `ColumnNotFound`
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))
}

/// Semantic kind of a named column
pub fn column_kind(df: &DataFrame, name: &str) -> Result<ColumnKind> {
    let series = require_column(df, name)?;
    ColumnKind::of(series.dtype()).ok_or_else(|| PipelineError::ColumnType {
        column: name.to_string(),
        expected: "numeric or categorical".to_string(),
        actual: series.dtype().to_string(),
    })
}

/// Look up a column and check that it has the expected kind
pub fn require_kind<'a>(df: &'a DataFrame, name: &str, kind: ColumnKind) -> Result<&'a Series> {
    let actual = column_kind(df, name)?;
    if actual != kind {
        return Err(PipelineError::ColumnType {
            column: name.to_string(),
            expected: kind.to_string(),
            actual: actual.to_string(),
        });
    }
    require_column(df, name)
}

/// Names of all numeric columns, in frame order
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    columns_of_kind(df, ColumnKind::Numeric)
}

/// Names of all categorical columns, in frame order
pub fn categorical_columns(df: &DataFrame) -> Vec<String> {
    columns_of_kind(df, ColumnKind::Categorical)
}

fn columns_of_kind(df: &DataFrame, kind: ColumnKind) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| ColumnKind::of(c.dtype()) == Some(kind))
        .map(|c| c.name().to_string())
        .collect()
}

/// Values of a numeric series as nullable f64
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Non-null, non-NaN values of a numeric series
pub fn present_values(series: &Series) -> Result<Vec<f64>> {
    Ok(numeric_values(series)?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

/// Split a frame into features (every column but the target) and the target
pub fn split_features_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Series)> {
    let y = require_column(df, target)?.clone();
    let x = df.drop(target)?;
    Ok((x, y))
}

/// Convert a numeric target series to a dense vector, rejecting nulls
pub fn target_to_array1(y: &Series) -> Result<Array1<f64>> {
    if ColumnKind::of(y.dtype()) != Some(ColumnKind::Numeric) {
        return Err(PipelineError::ColumnType {
            column: y.name().to_string(),
            expected: ColumnKind::Numeric.to_string(),
            actual: y.dtype().to_string(),
        });
    }
    let values = numeric_values(y)?;
    let dense = values
        .into_iter()
        .map(|v| v.ok_or_else(|| PipelineError::InvalidInput(format!("target '{}' contains nulls", y.name()))))
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array1::from_vec(dense))
}

/// Convert the named columns of a frame into a row-major matrix.
///
/// Columns are cast to f64. Nulls are rejected, so callers impute first.
pub fn frame_to_array2(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let col_data = columns
        .iter()
        .map(|name| {
            let values = numeric_values(require_column(df, name)?)?;
            values
                .into_iter()
                .map(|v| {
                    v.ok_or_else(|| {
                        PipelineError::InvalidInput(format!("column '{}' contains nulls", name))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| col_refs[c][r]))
}

/// Gather rows by position, in the given order
pub fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&r| r as IdxSize).collect();
    Ok(df.take(&IdxCa::from_vec("idx".into(), idx))?)
}

/// Keep only rows whose mask entry is true
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    if keep.len() != df.height() {
        return Err(PipelineError::ShapeError {
            expected: format!("{} mask entries", df.height()),
            actual: keep.len().to_string(),
        });
    }
    let rows: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect();
    take_rows(df, &rows)
}

/// Tokens read as missing values
pub const CSV_NULL_VALUES: [&str; 2] = ["NA", ""];

/// Read a CSV file with a header row.
///
/// Column types are inferred from every row, and [`CSV_NULL_VALUES`] are
/// read as nulls, so `NA` in a numeric column keeps it numeric.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let file = File::open(path.as_ref())?;
    let null_values = NullValues::AllColumns(CSV_NULL_VALUES.iter().map(|v| (*v).into()).collect());
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| opts.with_null_values(Some(null_values.clone())))
        .into_reader_with_file_handle(file)
        .finish()?;
    Ok(df)
}
