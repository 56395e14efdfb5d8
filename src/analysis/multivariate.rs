//! Multivariate analysis: correlation heatmap and pair plot

use super::{complete_pairs, fmt_opt, mean, pearson, Histogram};
use crate::data::{numeric_columns, numeric_values, present_values, require_kind, ColumnKind};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pairwise Pearson correlations over numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `None` where a pair has no defined correlation
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// One off-diagonal panel of a pair plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairPanel {
    pub x: String,
    pub y: String,
    pub pairs: usize,
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairPlot {
    /// Diagonal panels
    pub histograms: Vec<(String, Histogram)>,
    pub panels: Vec<PairPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultivariateReport {
    pub correlation: CorrelationMatrix,
    pub pairplot: PairPlot,
}

/// Template: heatmap, then pair plot
pub trait MultivariateAnalysis {
    fn generate_correlation_heatmap(&self, df: &DataFrame) -> Result<CorrelationMatrix>;

    fn generate_pairplot(&self, df: &DataFrame) -> Result<PairPlot>;

    fn analyze(&self, df: &DataFrame) -> Result<MultivariateReport> {
        Ok(MultivariateReport {
            correlation: self.generate_correlation_heatmap(df)?,
            pairplot: self.generate_pairplot(df)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SimpleMultivariateAnalysis {
    /// Columns to analyze; all numeric columns when unset
    pub columns: Option<Vec<String>>,
    pub bins: usize,
}

impl Default for SimpleMultivariateAnalysis {
    fn default() -> Self {
        Self {
            columns: None,
            bins: 20,
        }
    }
}

impl SimpleMultivariateAnalysis {
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns: Some(columns),
            ..Self::default()
        }
    }

    fn selected(&self, df: &DataFrame) -> Result<Vec<String>> {
        let columns = match &self.columns {
            Some(cols) => {
                for c in cols {
                    require_kind(df, c, ColumnKind::Numeric)?;
                }
                cols.clone()
            }
            None => numeric_columns(df),
        };
        if columns.is_empty() {
            return Err(PipelineError::InvalidInput(
                "multivariate analysis needs at least one numeric column".to_string(),
            ));
        }
        Ok(columns)
    }

    fn values(df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
        columns
            .iter()
            .map(|c| numeric_values(require_kind(df, c, ColumnKind::Numeric)?))
            .collect()
    }
}

impl MultivariateAnalysis for SimpleMultivariateAnalysis {
    fn generate_correlation_heatmap(&self, df: &DataFrame) -> Result<CorrelationMatrix> {
        let columns = self.selected(df)?;
        let data = Self::values(df, &columns)?;
        let n = columns.len();

        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let (xs, ys) = complete_pairs(&data[i], &data[j]);
                let r = if i == j {
                    (xs.len() >= 2).then_some(1.0)
                } else {
                    pearson(&xs, &ys)
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Ok(CorrelationMatrix { columns, values })
    }

    fn generate_pairplot(&self, df: &DataFrame) -> Result<PairPlot> {
        let columns = self.selected(df)?;
        let data = Self::values(df, &columns)?;

        let mut histograms = Vec::with_capacity(columns.len());
        for c in &columns {
            let present = present_values(require_kind(df, c, ColumnKind::Numeric)?)?;
            histograms.push((c.clone(), Histogram::new(&present, self.bins)));
        }

        let mut panels = Vec::new();
        for i in 0..columns.len() {
            for j in 0..columns.len() {
                if i == j {
                    continue;
                }
                let (xs, ys) = complete_pairs(&data[j], &data[i]);
                let (slope, intercept) = match fit_line(&xs, &ys) {
                    Some((s, b)) => (Some(s), Some(b)),
                    None => (None, None),
                };
                panels.push(PairPanel {
                    x: columns[j].clone(),
                    y: columns[i].clone(),
                    pairs: xs.len(),
                    slope,
                    intercept,
                    correlation: pearson(&xs, &ys),
                });
            }
        }
        Ok(PairPlot { histograms, panels })
    }
}

/// Least-squares line `y = slope * x + intercept`
fn fit_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<16}", "")?;
        for c in &self.columns {
            write!(f, " {:>10.10}", c)?;
        }
        writeln!(f)?;
        for (name, row) in self.columns.iter().zip(&self.values) {
            write!(f, "{:<16.16}", name)?;
            for v in row {
                match v {
                    Some(r) => write!(f, " {:>10.3}", r)?,
                    None => write!(f, " {:>10}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for MultivariateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Correlation heatmap")?;
        write!(f, "{}", self.correlation)?;
        writeln!(f)?;
        writeln!(f, "Pair plot")?;
        for (column, histogram) in &self.pairplot.histograms {
            writeln!(f, "{}", column)?;
            write!(f, "{}", histogram)?;
        }
        for p in &self.pairplot.panels {
            writeln!(
                f,
                "{} ~ {}: slope={} intercept={} r={} (n={})",
                p.y,
                p.x,
                fmt_opt(p.slope),
                fmt_opt(p.intercept),
                fmt_opt(p.correlation),
                p.pairs
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df! {
            "area" => [1.0, 2.0, 3.0, 4.0],
            "price" => [3.0, 5.0, 7.0, 9.0],
            "age" => [4.0, 3.0, 2.0, 1.0],
            "zone" => ["a", "b", "a", "b"],
        }
        .unwrap()
    }

    #[test]
    fn test_heatmap_uses_numeric_columns() {
        let matrix = SimpleMultivariateAnalysis::default()
            .generate_correlation_heatmap(&frame())
            .unwrap();
        assert_eq!(matrix.columns, vec!["area", "price", "age"]);
        assert!((matrix.get("area", "price").unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.get("area", "age").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("age", "age"), Some(1.0));
    }

    #[test]
    fn test_pairplot_regression_lines() {
        let analysis = SimpleMultivariateAnalysis::with_columns(vec!["area".into(), "price".into()]);
        let report = analysis.analyze(&frame()).unwrap();
        assert_eq!(report.pairplot.histograms.len(), 2);
        assert_eq!(report.pairplot.panels.len(), 2);

        let panel = report
            .pairplot
            .panels
            .iter()
            .find(|p| p.x == "area" && p.y == "price")
            .unwrap();
        assert!((panel.slope.unwrap() - 2.0).abs() < 1e-12);
        assert!((panel.intercept.unwrap() - 1.0).abs() < 1e-12);
        assert!(report.to_string().contains("Correlation heatmap"));
    }

    #[test]
    fn test_rejects_categorical_selection() {
        let analysis = SimpleMultivariateAnalysis::with_columns(vec!["zone".into()]);
        assert!(matches!(
            analysis.analyze(&frame()),
            Err(PipelineError::ColumnType { .. })
        ));
    }
}
