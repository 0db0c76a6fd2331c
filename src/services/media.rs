use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::{SessionContext, SourceError};
use crate::services::backend::{ensure_success, BackendClient};

/// Errors that can occur when uploading or deleting images
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("backend error: {0}")]
    Backend(#[from] SourceError),

    #[error("empty image payload")]
    Empty,

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

/// Remote image storage; results are opaque URIs
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(
        &self,
        ctx: &SessionContext,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ImageError>;

    async fn delete(&self, ctx: &SessionContext, remote_id: &str) -> Result<(), ImageError>;
}

#[async_trait]
impl ImageStore for BackendClient {
    async fn upload(
        &self,
        ctx: &SessionContext,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let size = bytes.len();
        let request = self
            .http()
            .post(self.url("images"))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        let response = self.authorize(request, ctx).send().await?;
        let json: Value = ensure_success(response, "image upload").await?.json().await?;

        let url = json
            .get("url")
            .or_else(|| json.get("data").and_then(|d| d.get("url")))
            .and_then(|u| u.as_str())
            .ok_or_else(|| ImageError::InvalidResponse("missing url".into()))?;

        tracing::debug!("Uploaded {} byte image to {}", size, url);
        Ok(url.to_string())
    }

    async fn delete(&self, ctx: &SessionContext, remote_id: &str) -> Result<(), ImageError> {
        let url = self.url(&format!("images/{}", urlencoding::encode(remote_id)));
        let response = self.authorize(self.http().delete(url), ctx).send().await?;
        ensure_success(response, "image delete").await?;

        tracing::debug!("Deleted image {}", remote_id);
        Ok(())
    }
}
