//! Authenticated HTTP access to a Giskard server.

use crate::config::ClientConfig;
use crate::error::UploadError;
use crate::multipart::MultipartBody;
use crate::project::Project;
use crate::requirements;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Prefix of every API route.
pub const API_PREFIX: &str = "api/v2/";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("API token cannot be empty")]
    EmptyToken,
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Server-assigned identifier of an uploaded dataset or model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Number(id) => write!(f, "{}", id),
            Identifier::Text(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: Identifier,
}

/// Connection to a server: base URL, bearer credential, and a reusable HTTP session.
///
/// The session is reused across sequential uploads.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_base: Url,
    token: String,
    requirements: String,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_base", &self.api_base.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Client {
    pub fn new(url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        ClientBuilder::new(url, token).build()
    }

    pub fn builder(url: &str, token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url, token)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = ClientBuilder::new(&config.url, config.token.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Handle for uploads into the project with the given key.
    pub fn project(&self, key: impl Into<String>) -> Project<'_> {
        Project::new(self, key)
    }

    /// Absolute URL of an API route such as `project/data/upload`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.api_base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl {
                url: format!("{}{}", self.api_base, path),
                reason: e.to_string(),
            })
    }

    pub fn requirements(&self) -> &str {
        &self.requirements
    }

    /// POST a multipart body and read the identifier from the response.
    pub(crate) async fn post_multipart(
        &self,
        path: &str,
        multipart: MultipartBody,
    ) -> Result<Identifier, UploadError> {
        let url = self.endpoint(path)?;
        let size = multipart.body.len();

        tracing::debug!(url = %url, size_bytes = size, parts = multipart.part_count, "Sending upload");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, multipart.content_type)
            .body(multipart.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, "Upload rejected by server");
            return Err(UploadError::Server { status, body });
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| UploadError::MalformedResponse(format!("{}: {:.256}", e, body)))?;

        Ok(parsed.id)
    }
}

pub struct ClientBuilder {
    url: String,
    token: String,
    timeout: Option<Duration>,
    requirements: Option<String>,
}

impl ClientBuilder {
    pub fn new(url: &str, token: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            token: token.into(),
            timeout: None,
            requirements: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the requirements listing captured at build time.
    pub fn requirements(mut self, requirements: impl Into<String>) -> Self {
        self.requirements = Some(requirements.into());
        self
    }

    pub fn build(self) -> Result<Client, ClientError> {
        if self.token.trim().is_empty() {
            return Err(ClientError::EmptyToken);
        }

        let invalid = |reason: String| ClientError::InvalidUrl {
            url: self.url.clone(),
            reason,
        };

        // Trailing slash so that joining keeps any path prefix of the base url
        let base = format!("{}/", self.url.trim_end_matches('/'));
        let base = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        let api_base = base.join(API_PREFIX).map_err(|e| invalid(e.to_string()))?;

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(Client {
            http: http.build()?,
            api_base,
            token: self.token,
            requirements: self.requirements.unwrap_or_else(requirements::capture),
        })
    }
}
