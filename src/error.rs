//! Errors returned by the upload entry points.

use crate::client::ClientError;
use crate::codec::SerializationError;
use crate::compression::CompressionError;
use crate::dataframe::DataframeError;
use crate::multipart::MultipartError;
use crate::validation::ValidationError;
use reqwest::StatusCode;

/// Why an upload did not produce an identifier.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Rejected locally; no request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The payload could not be encoded; no request was sent.
    #[error("serialization failed: {0}")]
    Serialization(#[from] PayloadError),

    /// The client cannot address the upload route; no request was sent.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Connection, TLS, or timeout failure from the HTTP client.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server responded with {status}: {body}")]
    Server { status: StatusCode, body: String },

    /// The server answered 2xx without an identifier in its body.
    #[error("unexpected upload response: {0}")]
    MalformedResponse(String),
}

/// The part of an upload payload that could not be built.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("dataframe: {0}")]
    Dataframe(#[from] DataframeError),

    #[error("compression: {0}")]
    Compression(#[from] CompressionError),

    #[error("model: {0}")]
    Model(#[from] SerializationError),

    #[error("metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

impl UploadError {
    /// Returns true if nothing was sent to the server.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Serialization(_) | Self::Client(_)
        )
    }

    /// Status code of a server-side failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

impl From<DataframeError> for UploadError {
    fn from(e: DataframeError) -> Self {
        UploadError::Serialization(e.into())
    }
}

impl From<CompressionError> for UploadError {
    fn from(e: CompressionError) -> Self {
        UploadError::Serialization(e.into())
    }
}

impl From<SerializationError> for UploadError {
    fn from(e: SerializationError) -> Self {
        UploadError::Serialization(e.into())
    }
}

impl From<serde_json::Error> for UploadError {
    fn from(e: serde_json::Error) -> Self {
        UploadError::Serialization(e.into())
    }
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        UploadError::Serialization(e.into())
    }
}
