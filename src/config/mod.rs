use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Server base URL, e.g. "http://giskard-host:12345"
    #[serde(default)]
    pub url: String,
    /// API token sent as `Authorization: Bearer <token>`.
    #[serde(default)]
    pub token: String,
    /// Default project key for uploads.
    pub project: Option<String>,
    /// Request timeout in seconds. No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("project", &self.project)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from an optional file and environment variables
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Add environment variables with prefix GISKARD_
        // Example: GISKARD_TOKEN=... GISKARD_TIMEOUT_SECS=30
        builder = builder.add_source(config::Environment::with_prefix("GISKARD").try_parsing(true));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.url)
            .with_context(|| format!("Invalid server url '{}'", self.url))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => anyhow::bail!("Unsupported url scheme '{}': expected http or https", scheme),
        }

        if self.token.trim().is_empty() {
            anyhow::bail!("API token cannot be empty");
        }

        if let Some(project) = &self.project {
            if project.trim().is_empty() {
                anyhow::bail!("Project key cannot be empty");
            }
        }

        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout_secs must be greater than zero");
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
