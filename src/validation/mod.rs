//! Checks run on datasets and models before anything is serialized or sent.

pub mod error;

pub use error::ValidationError;

use crate::dataframe::{ColumnType, ColumnTypes};
use crate::model::{Model, ModelType};
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;

/// Tolerance on the sum of a classification probability row.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Validate declared column types and the optional target against a dataframe.
///
/// - Every declared column must exist in the dataframe
/// - The target must be declared and present
/// - Columns declared numeric must hold a numeric Arrow type
pub fn validate_dataset(
    df: &RecordBatch,
    column_types: &ColumnTypes,
    target: Option<&str>,
) -> Result<(), ValidationError> {
    let schema = df.schema();

    for (column, column_type) in column_types {
        let (_, field) = schema
            .column_with_name(column)
            .ok_or_else(|| ValidationError::UnknownColumn(column.clone()))?;

        if *column_type == ColumnType::Numeric && !field.data_type().is_numeric() {
            return Err(ValidationError::NonNumericColumn {
                column: column.clone(),
                data_type: field.data_type().to_string(),
            });
        }
    }

    if let Some(target) = target {
        if !column_types.contains_key(target) || schema.column_with_name(target).is_none() {
            return Err(ValidationError::InvalidTarget(target.to_string()));
        }
    }

    Ok(())
}

/// Validate that every feature name is a column of the validation dataframe.
pub fn validate_model(feature_names: &[String], df: &RecordBatch) -> Result<(), ValidationError> {
    if feature_names.is_empty() {
        return Err(ValidationError::NoFeatures);
    }

    let schema = df.schema();
    let mut seen = HashSet::new();
    for name in feature_names {
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::DuplicateFeature(name.clone()));
        }
        if schema.column_with_name(name).is_none() {
            return Err(ValidationError::UnknownFeature(name.clone()));
        }
    }

    Ok(())
}

/// Run the model on the validation dataframe.
///
/// The output shape is fixed by [`Model::new`], so only the values are checked: each
/// classification row must be a probability vector.
pub fn validate_model_execution(model: &Model, df: &RecordBatch) -> Result<(), ValidationError> {
    let predictions = model.prediction_function().predict(df)?;

    if let ModelType::Classification { .. } = model.model_type() {
        for (row, values) in predictions.iter_rows().enumerate() {
            let sum: f64 = values.iter().sum();
            let in_range = values.iter().all(|v| (0.0..=1.0).contains(v));
            if !in_range || (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
                return Err(ValidationError::InvalidProbabilities { row, sum });
            }
        }
    }

    Ok(())
}
