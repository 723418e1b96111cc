//! Model descriptions uploaded to a project.

mod predict;

pub use predict::{
    Estimator, FeatureEncoding, FeatureInput, PredictError, PredictionFunction, Predictions,
};

use crate::validation::ValidationError;
use std::collections::HashSet;

/// What a model predicts, with the fields each kind requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelType {
    Regression,
    /// Labels in the order of the prediction function's probability columns.
    Classification { labels: Vec<String> },
}

impl ModelType {
    pub fn classification<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        ModelType::Classification {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Regression => "regression",
            ModelType::Classification { .. } => "classification",
        }
    }

    pub fn classification_labels(&self) -> Option<&[String]> {
        match self {
            ModelType::Regression => None,
            ModelType::Classification { labels } => Some(labels),
        }
    }

    /// Number of values the prediction function must return per row.
    pub fn prediction_width(&self) -> usize {
        match self {
            ModelType::Regression => 1,
            ModelType::Classification { labels } => labels.len(),
        }
    }
}

/// A prediction function together with its type and the features it was trained on.
#[derive(Debug, Clone)]
pub struct Model {
    model_type: ModelType,
    prediction_function: PredictionFunction,
    feature_names: Vec<String>,
}

impl Model {
    /// Build a model, checking that the model type fits the prediction function and
    /// that every column the function reads is a declared feature.
    pub fn new<S: Into<String>>(
        prediction_function: PredictionFunction,
        model_type: ModelType,
        feature_names: impl IntoIterator<Item = S>,
    ) -> Result<Self, ValidationError> {
        if let ModelType::Classification { labels } = &model_type {
            if labels.is_empty() {
                return Err(ValidationError::MissingClassificationLabels);
            }
            let mut seen = HashSet::new();
            if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
                return Err(ValidationError::DuplicateClassificationLabel(dup.clone()));
            }
        }

        let is_match = matches!(
            (&model_type, prediction_function.estimator()),
            (ModelType::Regression, Estimator::Linear { .. })
                | (ModelType::Classification { .. }, Estimator::Logistic { .. })
        ) && prediction_function.estimator().output_width() == model_type.prediction_width();
        if !is_match {
            return Err(ValidationError::EstimatorMismatch {
                model_type: model_type.as_str(),
                outputs: prediction_function.estimator().output_width(),
            });
        }

        let feature_names: Vec<String> = feature_names.into_iter().map(Into::into).collect();
        // The server calls the function with the declared features only
        if let Some(column) = prediction_function
            .input_columns()
            .find(|c| !feature_names.iter().any(|f| f == c))
        {
            return Err(ValidationError::UndeclaredInput(column.to_string()));
        }

        Ok(Self {
            model_type,
            prediction_function,
            feature_names,
        })
    }

    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    pub fn prediction_function(&self) -> &PredictionFunction {
        &self.prediction_function
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> PredictionFunction {
        PredictionFunction::new(
            vec![FeatureInput::numeric("bmi")],
            Estimator::Linear {
                intercept: 0.0,
                coefficients: vec![1.0],
            },
        )
        .unwrap()
    }

    fn logistic() -> PredictionFunction {
        PredictionFunction::new(
            vec![FeatureInput::numeric("duration")],
            Estimator::Logistic {
                intercepts: vec![0.0, 0.0],
                coefficients: vec![vec![0.1], vec![-0.1]],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_regression_model() {
        let model = Model::new(linear(), ModelType::Regression, ["bmi"]).unwrap();
        assert_eq!(model.model_type().as_str(), "regression");
        assert_eq!(model.feature_names(), &["bmi".to_string()]);
        assert!(model.model_type().classification_labels().is_none());
    }

    #[test]
    fn test_classification_model() {
        let model = Model::new(
            logistic(),
            ModelType::classification(["Default", "Not default"]),
            ["duration"],
        )
        .unwrap();
        assert_eq!(model.model_type().as_str(), "classification");
        assert_eq!(model.model_type().prediction_width(), 2);
    }

    #[test]
    fn test_classification_requires_labels() {
        let result = Model::new(
            logistic(),
            ModelType::Classification { labels: vec![] },
            ["duration"],
        );
        assert!(matches!(
            result,
            Err(ValidationError::MissingClassificationLabels)
        ));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let result = Model::new(
            logistic(),
            ModelType::classification(["yes", "yes"]),
            ["duration"],
        );
        assert!(matches!(
            result,
            Err(ValidationError::DuplicateClassificationLabel(l)) if l == "yes"
        ));
    }

    #[test]
    fn test_inputs_must_be_declared_features() {
        let result = Model::new(linear(), ModelType::Regression, ["age"]);
        assert!(matches!(
            result,
            Err(ValidationError::UndeclaredInput(c)) if c == "bmi"
        ));

        assert!(Model::new(linear(), ModelType::Regression, ["age", "bmi"]).is_ok());
    }

    #[test]
    fn test_estimator_must_match_model_type() {
        let result = Model::new(logistic(), ModelType::Regression, ["duration"]);
        assert!(matches!(
            result,
            Err(ValidationError::EstimatorMismatch {
                model_type: "regression",
                outputs: 2
            })
        ));

        let result = Model::new(
            logistic(),
            ModelType::classification(["a", "b", "c"]),
            ["duration"],
        );
        assert!(matches!(
            result,
            Err(ValidationError::EstimatorMismatch { outputs: 2, .. })
        ));
    }
}
