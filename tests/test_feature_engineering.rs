//! Integration test: feature engineering strategies and splitting

use prices_predictor::feature_engineering::FeatureEngineeringStrategy;
use prices_predictor::strategy::{Context, Strategy};
use prices_predictor::training::SplitStrategy;
use polars::prelude::*;
use std::collections::HashSet;

fn values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

fn scenario_frame() -> DataFrame {
    df!(
        "A" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "B" => ["x", "y", "z", "x", "y", "z", "x", "y", "z", "x"],
        "target" => [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
    )
    .unwrap()
}

#[test]
fn test_log_transform_inverts_with_expm1() {
    let df = df!("area" => [0.0, 1.0, 10.5, 1500.0]).unwrap();
    let out = FeatureEngineeringStrategy::Log {
        features: vec!["area".into()],
    }
    .apply_transformation(&df)
    .unwrap();

    for (orig, logged) in values(&df, "area").iter().zip(values(&out, "area")) {
        assert!((logged.exp_m1() - orig).abs() < 1e-9);
    }
}

#[test]
fn test_standard_scaling_moments() {
    let df = df!("a" => [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    let out = FeatureEngineeringStrategy::StandardScaling {
        features: vec!["a".into()],
    }
    .apply_transformation(&df)
    .unwrap();

    let v = values(&out, "a");
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    assert!(mean.abs() < 1e-12);
    assert!((var.sqrt() - 1.0).abs() < 1e-12);
}

#[test]
fn test_min_max_range_through_context() {
    let df = df!("a" => [3.0, -1.0, 7.0, 5.0]).unwrap();
    let mut context = Context::new(FeatureEngineeringStrategy::min_max(vec!["a".into()]));
    let out = context.execute(&df).unwrap();

    let v = values(&out, "a");
    assert_eq!(v[1], 0.0);
    assert_eq!(v[2], 1.0);
    assert!(v.iter().all(|x| (0.0..=1.0).contains(x)));

    context.set_strategy(FeatureEngineeringStrategy::MinMaxScaling {
        features: vec!["a".into()],
        feature_range: (-1.0, 1.0),
    });
    let v = values(&context.execute(&df).unwrap(), "a");
    assert_eq!(v[1], -1.0);
    assert_eq!(v[2], 1.0);
}

#[test]
fn test_one_hot_drops_first_category() {
    let df = scenario_frame();
    let out = FeatureEngineeringStrategy::OneHotEncoding {
        features: vec!["B".into()],
    }
    .execute(&df)
    .unwrap();

    let names = out.get_column_names_str();
    assert!(!names.contains(&"B"));
    assert!(!names.contains(&"B_x"));
    assert!(names.contains(&"B_y"));
    assert!(names.contains(&"B_z"));
    assert_eq!(out.height(), 10);
    assert_eq!(values(&out, "B_y"), vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_split_scenario() {
    let df = scenario_frame();
    let strategy = SplitStrategy::SimpleTrainTest {
        test_size: 0.2,
        random_state: 42,
    };
    let split = strategy.split(&df, "target").unwrap();

    assert_eq!(split.n_train(), 8);
    assert_eq!(split.n_test(), 2);
    assert_eq!(split.x_train.width(), 2);

    let train: HashSet<i64> = values(&split.x_train, "A").iter().map(|v| *v as i64).collect();
    let test: HashSet<i64> = values(&split.x_test, "A").iter().map(|v| *v as i64).collect();
    assert!(train.is_disjoint(&test));
    assert_eq!(train.len() + test.len(), 10);

    let again = strategy.split(&df, "target").unwrap();
    assert_eq!(values(&again.x_test, "A"), values(&split.x_test, "A"));
}
