//! Two-feature analysis

use super::{complete_pairs, fmt_opt, pearson};
use crate::data::{numeric_values, require_kind, ColumnKind};
use crate::error::Result;
use crate::preprocessing::linear_quantile;
use crate::strategy::Strategy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BivariateAnalysisStrategy {
    NumericalVsNumerical,
    CategoricalVsNumerical,
}

/// Five-number summary of one category's values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub category: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BivariateReport {
    Correlation {
        x: String,
        y: String,
        pairs: usize,
        pearson: Option<f64>,
    },
    Boxes {
        category: String,
        value: String,
        groups: Vec<BoxStats>,
    },
}

impl BivariateAnalysisStrategy {
    pub fn analyze(&self, df: &DataFrame, feature1: &str, feature2: &str) -> Result<BivariateReport> {
        match self {
            BivariateAnalysisStrategy::NumericalVsNumerical => {
                let a = numeric_values(require_kind(df, feature1, ColumnKind::Numeric)?)?;
                let b = numeric_values(require_kind(df, feature2, ColumnKind::Numeric)?)?;
                let (xs, ys) = complete_pairs(&a, &b);
                Ok(BivariateReport::Correlation {
                    x: feature1.to_string(),
                    y: feature2.to_string(),
                    pairs: xs.len(),
                    pearson: pearson(&xs, &ys),
                })
            }
            BivariateAnalysisStrategy::CategoricalVsNumerical => {
                let cats = require_kind(df, feature1, ColumnKind::Categorical)?.cast(&DataType::String)?;
                let values = numeric_values(require_kind(df, feature2, ColumnKind::Numeric)?)?;

                let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
                for (cat, value) in cats.str()?.into_iter().zip(values) {
                    if let (Some(cat), Some(v)) = (cat, value) {
                        if !v.is_nan() {
                            grouped.entry(cat).or_default().push(v);
                        }
                    }
                }

                let groups = grouped
                    .into_iter()
                    .map(|(cat, mut vals)| {
                        vals.sort_by(|a, b| a.total_cmp(b));
                        BoxStats {
                            category: cat.to_string(),
                            count: vals.len(),
                            min: vals[0],
                            q1: linear_quantile(&vals, 0.25),
                            median: linear_quantile(&vals, 0.5),
                            q3: linear_quantile(&vals, 0.75),
                            max: vals[vals.len() - 1],
                        }
                    })
                    .collect();

                Ok(BivariateReport::Boxes {
                    category: feature1.to_string(),
                    value: feature2.to_string(),
                    groups,
                })
            }
        }
    }
}

impl Strategy for BivariateAnalysisStrategy {
    type Input<'a> = (&'a DataFrame, &'a str, &'a str);
    type Output = BivariateReport;

    fn execute(&self, (df, a, b): (&DataFrame, &str, &str)) -> Result<BivariateReport> {
        self.analyze(df, a, b)
    }
}

impl fmt::Display for BivariateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BivariateReport::Correlation { x, y, pairs, pearson } => {
                writeln!(f, "{} vs {}: pearson r = {} over {} pairs", x, y, fmt_opt(*pearson), pairs)
            }
            BivariateReport::Boxes { category, value, groups } => {
                writeln!(f, "{} by {}", value, category)?;
                writeln!(
                    f,
                    "{:<20} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12}",
                    "category", "count", "min", "q1", "median", "q3", "max"
                )?;
                for g in groups {
                    writeln!(
                        f,
                        "{:<20} {:>6} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3}",
                        g.category, g.count, g.min, g.q1, g.median, g.q3, g.max
                    )?;
                }
                Ok(())
            }
        }
    }
}
