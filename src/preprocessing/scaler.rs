//! Feature scaling

use crate::data::{require_column, require_kind, ColumnKind};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling with population std: (x - mean) / std
    Standard,
    /// Min-max scaling into `[low, high]`
    MinMax { low: f64, high: f64 },
}

impl ScalerType {
    /// Min-max scaling into the unit interval
    pub fn unit_min_max() -> Self {
        ScalerType::MinMax { low: 0.0, high: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    column: String,
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Per-column scaler. Parameters are learned in `fit` and reused by `transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Result<Self> {
        if let ScalerType::MinMax { low, high } = scaler_type {
            if !(low < high) {
                return Err(PipelineError::InvalidParameter {
                    name: "feature_range".to_string(),
                    value: format!("({}, {})", low, high),
                    reason: "low must be strictly less than high".to_string(),
                });
            }
        }
        Ok(Self {
            scaler_type,
            params: Vec::new(),
            is_fitted: false,
        })
    }

    pub fn scaler_type(&self) -> &ScalerType {
        &self.scaler_type
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Columns the scaler was fitted on
    pub fn columns(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.column.as_str()).collect()
    }

    /// Learn center and scale for each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let mut params = Vec::with_capacity(columns.len());
        for col_name in columns {
            let series = require_kind(df, col_name, ColumnKind::Numeric)?;
            params.push(self.compute_params(col_name, series)?);
        }
        self.params = params;
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns. Every fitted column must be present in `df`.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut result = df.clone();
        for params in &self.params {
            let scaled = self.scale_series(require_column(df, &params.column)?, params)?;
            result.with_column(scaled)?;
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut result = df.clone();
        for params in &self.params {
            let unscaled = self.unscale_series(require_column(df, &params.column)?, params)?;
            result.with_column(unscaled)?;
        }
        Ok(result)
    }

    fn compute_params(&self, column: &str, series: &Series) -> Result<ScalerParams> {
        let cast = series.cast(&DataType::Float64)?;
        let ca = cast.f64()?;

        let (center, scale) = match self.scaler_type {
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(0).unwrap_or(1.0);
                (mean, if std == 0.0 || !std.is_finite() { 1.0 } else { std })
            }
            ScalerType::MinMax { .. } => {
                let min = ca.min().unwrap_or(0.0);
                let max = ca.max().unwrap_or(1.0);
                let range = max - min;
                (min, if range == 0.0 { 1.0 } else { range })
            }
        };

        Ok(ScalerParams {
            column: column.to_string(),
            center,
            scale,
        })
    }

    fn scale_series(&self, series: &Series, params: &ScalerParams) -> Result<Series> {
        let cast = series.cast(&DataType::Float64)?;
        let (low, span) = self.output_range();

        let scaled: Float64Chunked = cast
            .f64()?
            .into_iter()
            .map(|opt| opt.map(|v| low + (v - params.center) / params.scale * span))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }

    fn unscale_series(&self, series: &Series, params: &ScalerParams) -> Result<Series> {
        let cast = series.cast(&DataType::Float64)?;
        let (low, span) = self.output_range();

        let unscaled: Float64Chunked = cast
            .f64()?
            .into_iter()
            .map(|opt| opt.map(|v| (v - low) / span * params.scale + params.center))
            .collect();

        Ok(unscaled.with_name(series.name().clone()).into_series())
    }

    fn output_range(&self) -> (f64, f64) {
        match self.scaler_type {
            ScalerType::Standard => (0.0, 1.0),
            ScalerType::MinMax { low, high } => (low, high - low),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_standard_scaler_population_std() {
        let df = df! { "a" => [1.0, 2.0, 3.0, 4.0, 5.0] }.unwrap();

        let mut scaler = Scaler::new(ScalerType::Standard).unwrap();
        let result = scaler.fit_transform(&df, &cols(&["a"])).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!(col.mean().unwrap().abs() < 1e-10);
        assert!((col.std(0).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_standard_scaler_constant_column() {
        let df = df! { "a" => [7.0, 7.0, 7.0] }.unwrap();
        let mut scaler = Scaler::new(ScalerType::Standard).unwrap();
        let result = scaler.fit_transform(&df, &cols(&["a"])).unwrap();
        let col = result.column("a").unwrap().f64().unwrap();
        assert!(col.into_iter().all(|v| v == Some(0.0)));
    }

    #[test]
    fn test_minmax_custom_range() {
        let df = df! { "a" => [1i64, 2, 3, 4, 5] }.unwrap();

        let mut scaler = Scaler::new(ScalerType::MinMax { low: -1.0, high: 1.0 }).unwrap();
        let result = scaler.fit_transform(&df, &cols(&["a"])).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!((col.min().unwrap() + 1.0).abs() < 1e-10);
        assert!((col.max().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_minmax_invalid_range() {
        let err = Scaler::new(ScalerType::MinMax { low: 1.0, high: 1.0 }).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter { .. }));
    }

    #[test]
    fn test_reuses_fitted_params() {
        let train = df! { "a" => [0.0, 10.0] }.unwrap();
        let test = df! { "a" => [5.0, 20.0] }.unwrap();

        let mut scaler = Scaler::new(ScalerType::unit_min_max()).unwrap();
        scaler.fit(&train, &cols(&["a"])).unwrap();
        let out = scaler.transform(&test).unwrap();
        let values: Vec<f64> = out.column("a").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![0.5, 2.0]);
    }

    #[test]
    fn test_inverse_transform() {
        let df = df! { "a" => [1.0, 2.0, 3.0, 4.0, 5.0] }.unwrap();

        let mut scaler = Scaler::new(ScalerType::Standard).unwrap();
        let scaled = scaler.fit_transform(&df, &cols(&["a"])).unwrap();
        let unscaled = scaler.inverse_transform(&scaled).unwrap();

        let original = df.column("a").unwrap().f64().unwrap();
        let restored = unscaled.column("a").unwrap().f64().unwrap();
        for (o, r) in original.into_iter().zip(restored.into_iter()) {
            assert!((o.unwrap() - r.unwrap()).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_requires_fitted_columns() {
        let train = df! { "a" => [1.0, 2.0, 3.0] }.unwrap();
        let mut scaler = Scaler::new(ScalerType::Standard).unwrap();
        scaler.fit(&train, &cols(&["a"])).unwrap();

        let other = df! { "b" => [1.0, 2.0] }.unwrap();
        assert!(matches!(
            scaler.transform(&other),
            Err(PipelineError::ColumnNotFound(name)) if name == "a"
        ));
        assert!(matches!(
            scaler.inverse_transform(&other),
            Err(PipelineError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_transform_before_fit() {
        let scaler = Scaler::new(ScalerType::Standard).unwrap();
        let df = df! { "a" => [1.0] }.unwrap();
        assert!(matches!(scaler.transform(&df), Err(PipelineError::ModelNotFitted)));
    }
}
