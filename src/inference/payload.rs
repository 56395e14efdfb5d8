//! Split-orientation request payloads
//!
//! A payload looks like `{"columns": [...], "index": [...], "data": [[...]]}`.
//! `columns` and `index` are bookkeeping and are discarded; every row of
//! `data` is read positionally against [`AMES_INFERENCE_COLUMNS`].

use crate::data::ColumnKind;
use crate::error::{PipelineError, Result};
use crate::training::ModelPipeline;
use polars::prelude::*;
use serde_json::{json, Value};

/// Numeric house attributes accepted at inference, in payload order
pub const AMES_INFERENCE_COLUMNS: [&str; 38] = [
    "Order",
    "PID",
    "MS SubClass",
    "Lot Frontage",
    "Lot Area",
    "Overall Qual",
    "Overall Cond",
    "Year Built",
    "Year Remod/Add",
    "Mas Vnr Area",
    "BsmtFin SF 1",
    "BsmtFin SF 2",
    "Bsmt Unf SF",
    "Total Bsmt SF",
    "1st Flr SF",
    "2nd Flr SF",
    "Low Qual Fin SF",
    "Gr Liv Area",
    "Bsmt Full Bath",
    "Bsmt Half Bath",
    "Full Bath",
    "Half Bath",
    "Bedroom AbvGr",
    "Kitchen AbvGr",
    "TotRms AbvGrd",
    "Fireplaces",
    "Garage Yr Blt",
    "Garage Cars",
    "Garage Area",
    "Wood Deck SF",
    "Open Porch SF",
    "Enclosed Porch",
    "3Ssn Porch",
    "Screen Porch",
    "Pool Area",
    "Misc Val",
    "Mo Sold",
    "Yr Sold",
];

/// Read the `data` rows of a payload into a frame over [`AMES_INFERENCE_COLUMNS`]
pub fn parse_split_payload(payload: &Value) -> Result<DataFrame> {
    let mut object = payload
        .as_object()
        .cloned()
        .ok_or_else(|| PipelineError::InvalidInput("payload must be a JSON object".to_string()))?;
    object.remove("columns");
    object.remove("index");

    let data = object
        .remove("data")
        .ok_or_else(|| PipelineError::InvalidInput("payload has no 'data' field".to_string()))?;
    let rows: Vec<Vec<Option<f64>>> = serde_json::from_value(data).map_err(|e| {
        PipelineError::InvalidInput(format!("'data' must be an array of numeric rows: {}", e))
    })?;
    if rows.is_empty() {
        return Err(PipelineError::InvalidInput("'data' has no rows".to_string()));
    }

    let width = AMES_INFERENCE_COLUMNS.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(PipelineError::ShapeError {
            expected: format!("{} values per row", width),
            actual: format!("{} values in row {}", row.len(), i),
        });
    }

    let columns: Vec<Column> = AMES_INFERENCE_COLUMNS
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let values: Vec<Option<f64>> = rows.iter().map(|r| r[j]).collect();
            Column::new((*name).into(), values)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Reshape `df` to exactly the columns in `schema`, in schema order.
///
/// Columns the frame lacks are added as typed nulls so the model's imputers
/// fill them; columns outside the schema are dropped.
pub fn align_to_schema(df: &DataFrame, schema: &[(String, ColumnKind)]) -> Result<DataFrame> {
    let height = df.height();
    let columns = schema
        .iter()
        .map(|(name, kind)| {
            let dtype = match kind {
                ColumnKind::Numeric => DataType::Float64,
                ColumnKind::Categorical => DataType::String,
            };
            let series = match df.column(name) {
                Ok(col) => col.as_materialized_series().cast(&dtype)?,
                Err(_) => Series::full_null(name.as_str().into(), height, &dtype),
            };
            Ok(Column::from(series))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(DataFrame::new(columns)?)
}

/// Payload to a frame the model can predict on
pub fn payload_to_frame(payload: &Value, model: &ModelPipeline) -> Result<DataFrame> {
    let df = parse_split_payload(payload)?;
    align_to_schema(&df, &model.input_schema())
}

/// Sample two-row payload over [`AMES_INFERENCE_COLUMNS`]
pub fn sample_payload() -> Value {
    let rows: Vec<Vec<f64>> = vec![
        vec![
            1.0, 526301100.0, 20.0, 141.0, 31770.0, 6.0, 5.0, 1960.0, 1960.0, 112.0, 639.0, 0.0,
            441.0, 1080.0, 1656.0, 0.0, 0.0, 1656.0, 1.0, 0.0, 1.0, 0.0, 3.0, 1.0, 7.0, 2.0,
            1960.0, 2.0, 528.0, 210.0, 62.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0, 2010.0,
        ],
        vec![
            2.0, 526350040.0, 20.0, 80.0, 11622.0, 5.0, 6.0, 1961.0, 1961.0, 0.0, 468.0, 144.0,
            270.0, 882.0, 896.0, 0.0, 0.0, 896.0, 0.0, 0.0, 1.0, 0.0, 2.0, 1.0, 5.0, 0.0,
            1961.0, 1.0, 730.0, 140.0, 0.0, 0.0, 0.0, 120.0, 0.0, 0.0, 6.0, 2010.0,
        ],
    ];
    json!({
        "columns": AMES_INFERENCE_COLUMNS.to_vec(),
        "index": [0, 1],
        "data": rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_payload_parses() {
        let df = parse_split_payload(&sample_payload()).unwrap();
        assert_eq!(df.shape(), (2, 38));
        let area = df.column("Gr Liv Area").unwrap().as_materialized_series().f64().unwrap().get(1);
        assert_eq!(area, Some(896.0));
    }

    #[test]
    fn test_rejects_short_rows() {
        let payload = json!({ "data": [[1.0, 2.0]] });
        assert!(matches!(
            parse_split_payload(&payload),
            Err(PipelineError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_rejects_missing_data() {
        let payload = json!({ "columns": [], "index": [] });
        assert!(matches!(
            parse_split_payload(&payload),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_align_fills_and_drops() {
        let df = df! {
            "Lot Area" => [100i64, 200],
            "Extra" => [1.0, 2.0],
        }
        .unwrap();
        let schema = vec![
            ("Lot Area".to_string(), ColumnKind::Numeric),
            ("Neighborhood".to_string(), ColumnKind::Categorical),
        ];

        let aligned = align_to_schema(&df, &schema).unwrap();
        assert_eq!(aligned.get_column_names_str(), vec!["Lot Area", "Neighborhood"]);
        assert_eq!(aligned.column("Lot Area").unwrap().dtype(), &DataType::Float64);
        assert_eq!(aligned.column("Neighborhood").unwrap().dtype(), &DataType::String);
        assert_eq!(aligned.column("Neighborhood").unwrap().null_count(), 2);
    }
}
