//! Dataset and model uploads into a project.
//!
//! Each upload validates first, then serializes, then sends exactly one request. A
//! validation failure returns before any payload is built, so nothing reaches the server.

use crate::client::{Client, Identifier};
use crate::codec::serialize_compress;
use crate::compression::compress;
use crate::dataframe::{to_csv, ColumnTypes};
use crate::error::UploadError;
use crate::model::Model;
use crate::multipart::{build_multipart, Part, APPLICATION_OCTET_STREAM, TEXT_PLAIN};
use crate::validation::{validate_dataset, validate_model, validate_model_execution};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

pub const PATH_DATA_UPLOAD: &str = "project/data/upload";
pub const PATH_MODELS_UPLOAD: &str = "project/models/upload";

/// Value of the `language` metadata field for models built by this client.
pub const MODEL_LANGUAGE: &str = "RUST";

/// Metadata part of a dataset upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata<'a> {
    pub project_key: &'a str,
    pub name: &'a str,
    pub feature_types: &'a ColumnTypes,
    pub target: Option<&'a str>,
}

/// Metadata part of a model upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata<'a> {
    pub project_key: &'a str,
    pub name: &'a str,
    pub model_type: &'a str,
    pub feature_names: &'a [String],
    pub classification_labels: Option<&'a [String]>,
    pub language: &'a str,
    pub language_version: &'a str,
}

/// Uploads scoped to one project of a [`Client`].
#[derive(Debug, Clone)]
pub struct Project<'a> {
    client: &'a Client,
    key: String,
}

impl<'a> Project<'a> {
    pub fn new(client: &'a Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Upload a dataframe as compressed CSV and return the dataset identifier.
    #[tracing::instrument(
        name = "upload_df",
        skip(self, df, column_types),
        fields(
            giskard.project = %self.key,
            giskard.size_bytes = tracing::field::Empty,
            giskard.upload_id = tracing::field::Empty,
        )
    )]
    pub async fn upload_df(
        &self,
        df: &RecordBatch,
        column_types: &ColumnTypes,
        target: Option<&str>,
        name: &str,
    ) -> Result<Identifier, UploadError> {
        validate_dataset(df, column_types, target)?;

        let data = compress(&to_csv(df)?)?;
        let metadata = serde_json::to_value(DatasetMetadata {
            project_key: &self.key,
            name,
            feature_types: column_types,
            target,
        })?;

        let body = build_multipart(
            &metadata,
            vec![Part::file("file", "file", APPLICATION_OCTET_STREAM, data)],
        )?;
        tracing::Span::current().record("giskard.size_bytes", body.body.len());

        let id = self.client.post_multipart(PATH_DATA_UPLOAD, body).await?;

        tracing::Span::current().record("giskard.upload_id", tracing::field::display(&id));
        tracing::info!(rows = df.num_rows(), "Dataset uploaded");
        Ok(id)
    }

    /// Upload a model's prediction function and return the model identifier.
    ///
    /// The model is run on `validate_df` before upload; any failure there is a
    /// validation error.
    #[tracing::instrument(
        name = "upload_model",
        skip(self, model, validate_df),
        fields(giskard.project = %self.key)
    )]
    pub async fn upload_model(
        &self,
        model: &Model,
        name: &str,
        validate_df: &RecordBatch,
    ) -> Result<Identifier, UploadError> {
        validate_model(model.feature_names(), validate_df)?;
        validate_model_execution(model, validate_df)?;

        self.send_model(model, name).await
    }

    /// Validate both, then upload the dataset followed by the model.
    ///
    /// Returns `(dataset id, model id)`.
    #[tracing::instrument(
        name = "upload_model_and_df",
        skip(self, model, df, column_types),
        fields(
            giskard.project = %self.key,
            giskard.dataset_id = tracing::field::Empty,
            giskard.model_id = tracing::field::Empty,
        )
    )]
    pub async fn upload_model_and_df(
        &self,
        model: &Model,
        model_name: &str,
        df: &RecordBatch,
        column_types: &ColumnTypes,
        target: Option<&str>,
        dataset_name: &str,
    ) -> Result<(Identifier, Identifier), UploadError> {
        validate_dataset(df, column_types, target)?;
        validate_model(model.feature_names(), df)?;
        validate_model_execution(model, df)?;

        let dataset_id = self.upload_df(df, column_types, target, dataset_name).await?;
        tracing::Span::current().record("giskard.dataset_id", tracing::field::display(&dataset_id));

        let model_id = self.send_model(model, model_name).await?;
        tracing::Span::current().record("giskard.model_id", tracing::field::display(&model_id));

        tracing::info!("Dataset and model uploaded");
        Ok((dataset_id, model_id))
    }

    #[tracing::instrument(
        name = "send_model",
        skip(self, model),
        fields(
            giskard.project = %self.key,
            giskard.model_type = model.model_type().as_str(),
            giskard.size_bytes = tracing::field::Empty,
            giskard.upload_id = tracing::field::Empty,
        )
    )]
    async fn send_model(&self, model: &Model, name: &str) -> Result<Identifier, UploadError> {
        let model_file = serialize_compress(model.prediction_function())?;
        let requirements = self.client.requirements().as_bytes().to_vec();

        let metadata = serde_json::to_value(ModelMetadata {
            project_key: &self.key,
            name,
            model_type: model.model_type().as_str(),
            feature_names: model.feature_names(),
            classification_labels: model.model_type().classification_labels(),
            language: MODEL_LANGUAGE,
            language_version: env!("CARGO_PKG_VERSION"),
        })?;

        let body = build_multipart(
            &metadata,
            vec![
                Part::file("modelFile", "modelFile", APPLICATION_OCTET_STREAM, model_file),
                Part::file("requirementsFile", "requirements.txt", TEXT_PLAIN, requirements),
            ],
        )?;
        tracing::Span::current().record("giskard.size_bytes", body.body.len());

        let id = self.client.post_multipart(PATH_MODELS_UPLOAD, body).await?;

        tracing::Span::current().record("giskard.upload_id", tracing::field::display(&id));
        tracing::info!(features = model.feature_names().len(), "Model uploaded");
        Ok(id)
    }
}
