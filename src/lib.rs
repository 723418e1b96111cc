pub mod client;
pub mod codec;
pub mod compression;
pub mod config;
pub mod dataframe;
pub mod error;
pub mod id;
pub mod model;
pub mod multipart;
mod project;
pub mod requirements;
pub mod telemetry;
pub mod validation;

pub use client::{Client, ClientBuilder, ClientError, Identifier};
pub use dataframe::{ColumnType, ColumnTypes};
pub use error::{PayloadError, UploadError};
pub use model::{Model, ModelType, PredictionFunction};
pub use project::{DatasetMetadata, ModelMetadata, Project, PATH_DATA_UPLOAD, PATH_MODELS_UPLOAD};
pub use validation::ValidationError;
