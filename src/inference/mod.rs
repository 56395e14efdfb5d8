//! Inference: request payload decoding and the background prediction service

mod payload;
mod service;

pub use payload::{
    align_to_schema, parse_split_payload, payload_to_frame, sample_payload, AMES_INFERENCE_COLUMNS,
};
pub use service::PredictionService;
