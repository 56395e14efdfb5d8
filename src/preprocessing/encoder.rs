//! One-hot encoding of categorical columns

use crate::data::{require_kind, ColumnKind};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnCategories {
    column: String,
    /// Sorted categories that get an output column
    categories: Vec<String>,
    /// Reference category removed by drop-first, if any
    dropped: Option<String>,
}

/// One-hot encoder with optional drop-first.
///
/// Categories are sorted lexicographically. Each encoded column is named
/// `"{column}_{category}"` and holds 0.0/1.0. Unknown and null categories
/// encode as all zeros. Encoded columns replace their source column and are
/// appended after the remaining columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    drop_first: bool,
    columns: Vec<ColumnCategories>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OneHotEncoder {
    /// Encoder keeping every category
    pub fn new() -> Self {
        Self {
            drop_first: false,
            columns: Vec::new(),
            is_fitted: false,
        }
    }

    /// Drop the first sorted category of each column as the reference level
    pub fn with_drop_first(mut self, drop_first: bool) -> Self {
        self.drop_first = drop_first;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Source columns the encoder was fitted on
    pub fn input_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.as_str()).collect()
    }

    /// Names of the produced columns, in output order
    pub fn output_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| c.categories.iter().map(move |cat| format!("{}_{}", c.column, cat)))
            .collect()
    }

    /// Category dropped as the reference level of each column, if any
    pub fn reference_categories(&self) -> Vec<(&str, Option<&str>)> {
        self.columns
            .iter()
            .map(|c| (c.column.as_str(), c.dropped.as_deref()))
            .collect()
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let mut fitted = Vec::with_capacity(columns.len());
        for col_name in columns {
            let series = require_kind(df, col_name, ColumnKind::Categorical)?;
            let cast = series.cast(&DataType::String)?;
            let distinct: BTreeSet<&str> = cast.str()?.into_iter().flatten().collect();

            let mut categories: Vec<String> = distinct.into_iter().map(str::to_string).collect();
            let dropped = if self.drop_first && !categories.is_empty() {
                Some(categories.remove(0))
            } else {
                None
            };

            fitted.push(ColumnCategories {
                column: col_name.clone(),
                categories,
                dropped,
            });
        }
        self.columns = fitted;
        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut encoded: Vec<Column> = Vec::new();
        for fitted in &self.columns {
            let series = require_kind(df, &fitted.column, ColumnKind::Categorical)?;
            let cast = series.cast(&DataType::String)?;
            let ca = cast.str()?;

            for category in &fitted.categories {
                let values: Vec<f64> = ca
                    .into_iter()
                    .map(|v| if v == Some(category.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                let name = format!("{}_{}", fitted.column, category);
                encoded.push(Column::new(name.into(), values));
            }
        }

        let mut result = df.clone();
        for fitted in &self.columns {
            result = result.drop(&fitted.column)?;
        }
        result.hstack_mut(&encoded)?;
        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df! {
            "A" => [1.0, 2.0, 3.0, 4.0],
            "B" => ["z", "x", "y", "x"],
        }
        .unwrap()
    }

    #[test]
    fn test_drop_first_naming() {
        let mut encoder = OneHotEncoder::new().with_drop_first(true);
        let result = encoder.fit_transform(&sample(), &["B".to_string()]).unwrap();

        let names: Vec<String> = result.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["A", "B_y", "B_z"]);

        let b_z: Vec<f64> = result.column("B_z").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(b_z, vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(encoder.reference_categories(), vec![("B", Some("x"))]);
    }

    #[test]
    fn test_keep_all_categories() {
        let mut encoder = OneHotEncoder::new();
        let result = encoder.fit_transform(&sample(), &["B".to_string()]).unwrap();
        assert_eq!(result.width(), 4);
        assert!(result.column("B").is_err());
        assert_eq!(encoder.output_columns(), vec!["B_x", "B_y", "B_z"]);
        assert_eq!(encoder.reference_categories(), vec![("B", None)]);
    }

    #[test]
    fn test_unknown_and_null_encode_as_zeros() {
        let mut encoder = OneHotEncoder::new().with_drop_first(true);
        encoder.fit(&sample(), &["B".to_string()]).unwrap();

        let test = df! { "A" => [1.0, 2.0], "B" => [Some("w"), None] }.unwrap();
        let result = encoder.transform(&test).unwrap();
        for name in ["B_y", "B_z"] {
            let col = result.column(name).unwrap().f64().unwrap();
            assert!(col.into_iter().all(|v| v == Some(0.0)));
        }
    }

    #[test]
    fn test_numeric_column_rejected() {
        let mut encoder = OneHotEncoder::new();
        let err = encoder.fit(&sample(), &["A".to_string()]).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnType { .. }));
    }
}
