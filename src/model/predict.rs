//! Serializable prediction functions.

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("column '{0}' not found in dataframe")]
    MissingColumn(String),
    #[error("column '{column}' has a null value at row {row}")]
    NullValue { column: String, row: usize },
    #[error("column '{column}' cannot be read as {expected}: {source}")]
    Cast {
        column: String,
        expected: &'static str,
        source: ArrowError,
    },
    #[error("estimator expects {expected} encoded inputs, features encode to {actual}")]
    InputWidth { expected: usize, actual: usize },
    #[error("logistic estimator needs at least 2 classes, got {0}")]
    TooFewClasses(usize),
    #[error("logistic estimator has {intercepts} intercepts but {coefficients} coefficient rows")]
    ClassCountMismatch {
        intercepts: usize,
        coefficients: usize,
    },
}

/// How a dataframe column is turned into estimator inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureEncoding {
    /// One input, the value cast to f64.
    Numeric,
    /// One input per category, 1.0 for the matching category. Unknown values encode to zeros.
    OneHot { categories: Vec<String> },
}

impl FeatureEncoding {
    pub fn width(&self) -> usize {
        match self {
            FeatureEncoding::Numeric => 1,
            FeatureEncoding::OneHot { categories } => categories.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInput {
    pub column: String,
    pub encoding: FeatureEncoding,
}

impl FeatureInput {
    pub fn numeric(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            encoding: FeatureEncoding::Numeric,
        }
    }

    pub fn one_hot<S: Into<String>>(
        column: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            column: column.into(),
            encoding: FeatureEncoding::OneHot {
                categories: categories.into_iter().map(Into::into).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Estimator {
    /// `intercept + coefficients · x`, one output per row.
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    /// Multinomial logistic regression: softmax over one linear score per class.
    Logistic {
        intercepts: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
    },
}

impl Estimator {
    /// Number of encoded inputs the estimator consumes.
    pub fn input_width(&self) -> usize {
        match self {
            Estimator::Linear { coefficients, .. } => coefficients.len(),
            Estimator::Logistic { coefficients, .. } => {
                coefficients.first().map(Vec::len).unwrap_or(0)
            }
        }
    }

    /// Number of values produced per row.
    pub fn output_width(&self) -> usize {
        match self {
            Estimator::Linear { .. } => 1,
            Estimator::Logistic { intercepts, .. } => intercepts.len(),
        }
    }

    fn check(&self) -> Result<(), PredictError> {
        if let Estimator::Logistic {
            intercepts,
            coefficients,
        } = self
        {
            if intercepts.len() < 2 {
                return Err(PredictError::TooFewClasses(intercepts.len()));
            }
            if coefficients.len() != intercepts.len() {
                return Err(PredictError::ClassCountMismatch {
                    intercepts: intercepts.len(),
                    coefficients: coefficients.len(),
                });
            }
            let width = self.input_width();
            if let Some(row) = coefficients.iter().find(|row| row.len() != width) {
                return Err(PredictError::InputWidth {
                    expected: width,
                    actual: row.len(),
                });
            }
        }
        Ok(())
    }

    fn apply(&self, x: &[f64], out: &mut Vec<f64>) {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => out.push(intercept + dot(coefficients, x)),
            Estimator::Logistic {
                intercepts,
                coefficients,
            } => {
                let scores: Vec<f64> = intercepts
                    .iter()
                    .zip(coefficients)
                    .map(|(b, w)| b + dot(w, x))
                    .collect();
                let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
                let total: f64 = exps.iter().sum();
                out.extend(exps.iter().map(|e| e / total));
            }
        }
    }
}

fn dot(w: &[f64], x: &[f64]) -> f64 {
    w.iter().zip(x).map(|(a, b)| a * b).sum()
}

/// Row-major prediction output: `rows` x `width` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    rows: usize,
    width: usize,
    values: Vec<f64>,
}

impl Predictions {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.width..(index + 1) * self.width]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        self.values.chunks_exact(self.width.max(1))
    }
}

/// A prediction function that can be shipped to the server.
///
/// It selects its input columns by name, so it can be called on any dataframe that
/// carries them, including the full validation dataframe with its target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFunction {
    inputs: Vec<FeatureInput>,
    estimator: Estimator,
}

impl PredictionFunction {
    pub fn new(inputs: Vec<FeatureInput>, estimator: Estimator) -> Result<Self, PredictError> {
        let function = Self { inputs, estimator };
        function.check()?;
        Ok(function)
    }

    // Deserialized functions skip `new`, so `predict` re-checks the shape.
    fn check(&self) -> Result<(), PredictError> {
        self.estimator.check()?;
        let actual: usize = self.inputs.iter().map(|i| i.encoding.width()).sum();
        if actual != self.estimator.input_width() {
            return Err(PredictError::InputWidth {
                expected: self.estimator.input_width(),
                actual,
            });
        }
        Ok(())
    }

    pub fn inputs(&self) -> &[FeatureInput] {
        &self.inputs
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// Columns the function reads.
    pub fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|i| i.column.as_str())
    }

    pub fn predict(&self, df: &RecordBatch) -> Result<Predictions, PredictError> {
        self.check()?;
        let rows = df.num_rows();
        let design = self.design_matrix(df)?;
        let width = self.estimator.input_width();

        let mut values = Vec::with_capacity(rows * self.estimator.output_width());
        for row in 0..rows {
            self.estimator
                .apply(&design[row * width..(row + 1) * width], &mut values);
        }

        Ok(Predictions {
            rows,
            width: self.estimator.output_width(),
            values,
        })
    }

    /// Encode the input columns into a row-major matrix.
    fn design_matrix(&self, df: &RecordBatch) -> Result<Vec<f64>, PredictError> {
        let rows = df.num_rows();
        let width = self.estimator.input_width();
        let mut design = vec![0.0; rows * width];
        let mut offset = 0;

        for input in &self.inputs {
            let column = df
                .column_by_name(&input.column)
                .ok_or_else(|| PredictError::MissingColumn(input.column.clone()))?;

            match &input.encoding {
                FeatureEncoding::Numeric => {
                    let values = cast(column, &DataType::Float64).map_err(|source| {
                        PredictError::Cast {
                            column: input.column.clone(),
                            expected: "Float64",
                            source,
                        }
                    })?;
                    let values = values.as_primitive::<Float64Type>();
                    for row in 0..rows {
                        if values.is_null(row) {
                            return Err(PredictError::NullValue {
                                column: input.column.clone(),
                                row,
                            });
                        }
                        design[row * width + offset] = values.value(row);
                    }
                }
                FeatureEncoding::OneHot { categories } => {
                    let values = cast(column, &DataType::Utf8).map_err(|source| {
                        PredictError::Cast {
                            column: input.column.clone(),
                            expected: "Utf8",
                            source,
                        }
                    })?;
                    let values = values.as_string::<i32>();
                    for row in 0..rows {
                        if values.is_null(row) {
                            continue;
                        }
                        let value = values.value(row);
                        if let Some(k) = categories.iter().position(|c| c == value) {
                            design[row * width + offset + k] = 1.0;
                        }
                    }
                }
            }

            offset += input.encoding.width();
        }

        Ok(design)
    }
}
