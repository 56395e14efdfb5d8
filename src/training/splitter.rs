//! Train/test splitting

use crate::data::{require_column, split_features_target, take_rows};
use crate::error::{PipelineError, Result};
use crate::strategy::Strategy;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Features and target partitioned into train and test rows
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Series,
    pub y_test: Series,
}

impl SplitResult {
    pub fn n_train(&self) -> usize {
        self.x_train.height()
    }

    pub fn n_test(&self) -> usize {
        self.x_test.height()
    }
}

/// Splitting strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitStrategy {
    /// Single shuffled split
    SimpleTrainTest { test_size: f64, random_state: u64 },
}

impl Default for SplitStrategy {
    fn default() -> Self {
        SplitStrategy::SimpleTrainTest {
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl SplitStrategy {
    /// Row positions for the test and train partitions
    pub fn split_indices(&self, n_samples: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        match self {
            SplitStrategy::SimpleTrainTest {
                test_size,
                random_state,
            } => {
                if !(*test_size > 0.0 && *test_size < 1.0) {
                    return Err(PipelineError::InvalidParameter {
                        name: "test_size".to_string(),
                        value: test_size.to_string(),
                        reason: "must be in (0, 1)".to_string(),
                    });
                }

                let n_test = (test_size * n_samples as f64).ceil() as usize;
                let n_train = n_samples.saturating_sub(n_test);
                if n_test == 0 || n_train == 0 {
                    return Err(PipelineError::InvalidParameter {
                        name: "test_size".to_string(),
                        value: test_size.to_string(),
                        reason: format!(
                            "leaves an empty partition for {} samples (train={}, test={})",
                            n_samples, n_train, n_test
                        ),
                    });
                }

                let mut indices: Vec<usize> = (0..n_samples).collect();
                let mut rng = ChaCha8Rng::seed_from_u64(*random_state);
                indices.shuffle(&mut rng);

                let train = indices.split_off(n_test);
                Ok((indices, train))
            }
        }
    }

    /// Separate the target and partition rows
    pub fn split(&self, df: &DataFrame, target_column: &str) -> Result<SplitResult> {
        require_column(df, target_column)?;
        let (test_idx, train_idx) = self.split_indices(df.height())?;

        let (x, y) = split_features_target(df, target_column)?;
        let y_frame = DataFrame::new(vec![Column::from(y)])?;

        let result = SplitResult {
            x_train: take_rows(&x, &train_idx)?,
            x_test: take_rows(&x, &test_idx)?,
            y_train: take_rows(&y_frame, &train_idx)?
                .column(target_column)?
                .as_materialized_series()
                .clone(),
            y_test: take_rows(&y_frame, &test_idx)?
                .column(target_column)?
                .as_materialized_series()
                .clone(),
        };

        info!(
            train = result.n_train(),
            test = result.n_test(),
            target = target_column,
            "Split data"
        );
        Ok(result)
    }
}

impl Strategy for SplitStrategy {
    type Input<'a> = (&'a DataFrame, &'a str);
    type Output = SplitResult;

    fn execute(&self, (df, target): (&DataFrame, &str)) -> Result<SplitResult> {
        self.split(df, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn frame(n: usize) -> DataFrame {
        let a: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let b: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "x" } else { "y" }).collect();
        let target: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        df! { "A" => a, "B" => b, "target" => target }.unwrap()
    }

    #[test]
    fn test_eight_two_split() {
        let result = SplitStrategy::default().split(&frame(10), "target").unwrap();
        assert_eq!(result.n_train(), 8);
        assert_eq!(result.n_test(), 2);
        assert_eq!(result.y_train.len(), 8);
        assert_eq!(result.x_train.width(), 2);

        let train: HashSet<i64> = result
            .x_train
            .column("A")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .map(|v| v as i64)
            .collect();
        let test: HashSet<i64> = result
            .x_test
            .column("A")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .map(|v| v as i64)
            .collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 10);
    }

    #[test]
    fn test_rows_stay_aligned() {
        let result = SplitStrategy::default().split(&frame(20), "target").unwrap();
        let a = result.x_test.column("A").unwrap().f64().unwrap();
        let y = result.y_test.f64().unwrap();
        for (x, t) in a.into_no_null_iter().zip(y.into_no_null_iter()) {
            assert_eq!(t, 100.0 + x);
        }
    }

    #[test]
    fn test_deterministic() {
        let s = SplitStrategy::default();
        assert_eq!(s.split_indices(50).unwrap(), s.split_indices(50).unwrap());

        let other = SplitStrategy::SimpleTrainTest {
            test_size: 0.2,
            random_state: 7,
        };
        assert_ne!(s.split_indices(50).unwrap(), other.split_indices(50).unwrap());
    }

    #[test]
    fn test_invalid_test_size() {
        for test_size in [0.0, 1.0, -0.5, 1.5] {
            let s = SplitStrategy::SimpleTrainTest {
                test_size,
                random_state: 42,
            };
            assert!(matches!(
                s.split_indices(10),
                Err(PipelineError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_empty_partition_rejected() {
        assert!(SplitStrategy::default().split_indices(1).is_err());
        assert!(SplitStrategy::default().split_indices(0).is_err());
    }

    #[test]
    fn test_missing_target() {
        let err = SplitStrategy::default().split(&frame(10), "nope").unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(_)));
    }
}
