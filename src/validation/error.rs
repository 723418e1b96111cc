//! Error types for upload validation.

use crate::model::PredictError;

/// A dataset or model was rejected before anything was serialized or sent.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("column '{0}' is declared in column types but not found in the dataframe")]
    UnknownColumn(String),

    #[error("target '{0}' must be a dataframe column declared in column types")]
    InvalidTarget(String),

    #[error("column '{column}' is declared numeric but has type {data_type}")]
    NonNumericColumn { column: String, data_type: String },

    #[error("feature '{0}' not found in the validation dataframe")]
    UnknownFeature(String),

    #[error("model has no feature names")]
    NoFeatures,

    #[error("feature '{0}' is listed more than once")]
    DuplicateFeature(String),

    #[error("prediction function reads column '{0}', which is not a declared feature")]
    UndeclaredInput(String),

    #[error("classification models require at least one classification label")]
    MissingClassificationLabels,

    #[error("classification label '{0}' is listed more than once")]
    DuplicateClassificationLabel(String),

    #[error("prediction function with {outputs} outputs does not fit a {model_type} model")]
    EstimatorMismatch {
        model_type: &'static str,
        outputs: usize,
    },

    #[error("prediction row {row} is not a probability vector (sum = {sum})")]
    InvalidProbabilities { row: usize, sum: f64 },

    #[error("prediction function failed on the validation dataframe: {0}")]
    PredictionFailed(#[from] PredictError),
}
