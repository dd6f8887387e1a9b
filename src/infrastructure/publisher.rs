//! Pushes published artifacts to a running server and asks it to reload.

use crate::infrastructure::core::HttpClientFactory;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use reqwest_middleware::ClientWithMiddleware;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use url::Url;

pub const UPLOAD_ENDPOINT: &str = "api/fileuploader";
pub const RELOAD_ENDPOINT: &str = "api/stockprice/reloadmodel";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Invalid server URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to read artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("Server refused upload of '{file}'")]
    Rejected { file: String },

    #[error("{endpoint} answered {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },
}

pub struct ArtifactPublisher {
    base_url: Url,
    uploader: Client,
    admin: ClientWithMiddleware,
}

impl ArtifactPublisher {
    pub fn new(base_url: &str) -> Result<Self, PublishError> {
        // A trailing slash keeps `join` from dropping the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| PublishError::InvalidUrl {
            url: base_url.to_string(),
            source: e,
        })?;

        Ok(Self {
            base_url,
            uploader: HttpClientFactory::create_client(),
            admin: HttpClientFactory::create_retrying_client(),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, PublishError> {
        self.base_url
            .join(path)
            .map_err(|e| PublishError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                source: e,
            })
    }

    /// Uploads one file under its base name.
    pub async fn upload(&self, path: &Path) -> Result<(), PublishError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| PublishError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let size = bytes.len();
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.clone()));
        let accepted: bool = self
            .uploader
            .post(self.endpoint(UPLOAD_ENDPOINT)?)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !accepted {
            return Err(PublishError::Rejected { file: file_name });
        }
        info!("Uploaded {} ({} bytes)", file_name, size);
        Ok(())
    }

    pub async fn reload_model(&self) -> Result<(), PublishError> {
        let response = self.admin.get(self.endpoint(RELOAD_ENDPOINT)?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Status {
                endpoint: RELOAD_ENDPOINT.to_string(),
                status,
            });
        }
        info!("Server reloaded its model");
        Ok(())
    }

    /// Uploads `files` in order, then triggers a reload.
    pub async fn publish_all(&self, files: &[PathBuf]) -> Result<(), PublishError> {
        for file in files {
            self.upload(file).await?;
        }
        self.reload_model().await
    }
}
