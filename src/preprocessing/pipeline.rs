//! Column-wise preprocessing applied in front of the regressor

use super::encoder::OneHotEncoder;
use super::imputer::{ImputeStrategy, Imputer};
use super::scaler::{Scaler, ScalerType};
use crate::data::{column_kind, require_column, ColumnKind};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Imputes, scales and encodes a feature frame.
///
/// Numeric columns get mean imputation then standard scaling. Categorical
/// columns get most-frequent imputation then drop-first one-hot encoding with
/// unknown categories ignored. The output holds the numeric columns in input
/// order followed by the encoded columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnPreprocessor {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Imputer,
    scaler: Scaler,
    categorical_imputer: Imputer,
    encoder: OneHotEncoder,
    is_fitted: bool,
}

impl ColumnPreprocessor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            numeric_columns: Vec::new(),
            categorical_columns: Vec::new(),
            numeric_imputer: Imputer::new(ImputeStrategy::Mean),
            scaler: Scaler::new(ScalerType::Standard)?,
            categorical_imputer: Imputer::new(ImputeStrategy::MostFrequent),
            encoder: OneHotEncoder::new().with_drop_first(true),
            is_fitted: false,
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    /// Input schema: every column the preprocessor reads, with its kind
    pub fn input_schema(&self) -> Vec<(String, ColumnKind)> {
        self.numeric_columns
            .iter()
            .map(|c| (c.clone(), ColumnKind::Numeric))
            .chain(
                self.categorical_columns
                    .iter()
                    .map(|c| (c.clone(), ColumnKind::Categorical)),
            )
            .collect()
    }

    /// Reference category of each encoded column; rows in that category
    /// encode as all zeros
    pub fn reference_categories(&self) -> Vec<(&str, Option<&str>)> {
        self.encoder.reference_categories()
    }

    /// Names of the produced feature columns, in output order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric_columns.clone();
        names.extend(self.encoder.output_columns());
        names
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.detect_column_types(df)?;

        let numeric = self.select(df, &self.numeric_columns)?;
        let imputed = self.numeric_imputer.fit_transform(&numeric, &self.numeric_columns)?;
        self.scaler.fit(&imputed, &self.numeric_columns)?;

        let categorical = self.select(df, &self.categorical_columns)?;
        let imputed = self
            .categorical_imputer
            .fit_transform(&categorical, &self.categorical_columns)?;
        self.encoder.fit(&imputed, &self.categorical_columns)?;

        self.is_fitted = true;
        debug!(
            numeric = self.numeric_columns.len(),
            categorical = self.categorical_columns.len(),
            features = self.feature_names().len(),
            "Fitted column preprocessor"
        );
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let numeric = self.select(df, &self.numeric_columns)?;
        let numeric = self.numeric_imputer.transform(&numeric)?;
        let numeric = self.scaler.transform(&numeric)?;

        let categorical = self.select(df, &self.categorical_columns)?;
        let categorical = self.categorical_imputer.transform(&categorical)?;
        let encoded = self.encoder.transform(&categorical)?;

        let mut columns: Vec<Column> = numeric.get_columns().to_vec();
        columns.extend(encoded.get_columns().iter().cloned());
        Ok(DataFrame::new(columns)?)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    fn detect_column_types(&mut self, df: &DataFrame) -> Result<()> {
        self.numeric_columns.clear();
        self.categorical_columns.clear();

        for col in df.get_columns() {
            let name = col.name().to_string();
            match column_kind(df, &name)? {
                ColumnKind::Numeric => self.numeric_columns.push(name),
                ColumnKind::Categorical => self.categorical_columns.push(name),
            }
        }
        Ok(())
    }

    fn select(&self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        let selected = columns
            .iter()
            .map(|name| require_column(df, name).map(|s| Column::from(s.clone())))
            .collect::<Result<Vec<Column>>>()?;
        Ok(DataFrame::new(selected)?)
    }
}
