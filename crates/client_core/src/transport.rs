//! HTTP client for the generation and export endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Serialize;
use shared::{
    domain::{BinaryArtifact, GenerationResult, Prompt},
    error::ApiError,
    protocol::{
        ExportAnimationRequest, GenerateAnimationRequest, GenerateAnimationResponse,
        EXPORT_ANIMATION_PATH, GENERATE_ANIMATION_PATH,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::error::{RequestFailure, RequestOutcome};

#[async_trait]
pub trait AnimationBackend: Send + Sync {
    async fn request_generation(&self, prompt: &Prompt) -> RequestOutcome<GenerationResult>;
    async fn request_export(&self, markup: &GenerationResult) -> RequestOutcome<BinaryArtifact>;
}

pub struct HttpAnimationBackend {
    http: Client,
    base_url: String,
}

impl HttpAnimationBackend {
    /// `timeout` of `None` waits on the backend indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let parsed = Url::parse(base_url.trim())
            .with_context(|| format!("invalid backend url '{base_url}'"))?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> RequestOutcome<Response> {
        let url = self.endpoint(path);
        debug!(%url, "sending backend request");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                warn!(%url, error = %err, "backend request failed without a response");
                RequestFailure::Transport(err.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = ApiError::from_body(&body)
            .map(|err| err.detail)
            .unwrap_or_else(|| format!("Server error ({})", status.as_u16()));
        warn!(%url, status = status.as_u16(), %message, "backend rejected request");
        Err(RequestFailure::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AnimationBackend for HttpAnimationBackend {
    async fn request_generation(&self, prompt: &Prompt) -> RequestOutcome<GenerationResult> {
        let response = self
            .post_json(
                GENERATE_ANIMATION_PATH,
                &GenerateAnimationRequest {
                    prompt: prompt.clone(),
                },
            )
            .await?;
        let body: GenerateAnimationResponse = response.json().await.map_err(|err| {
            warn!(error = %err, "generation response could not be decoded");
            RequestFailure::Transport(format!("malformed response: {err}"))
        })?;
        Ok(body.generated_markup)
    }

    async fn request_export(&self, markup: &GenerationResult) -> RequestOutcome<BinaryArtifact> {
        let response = self
            .post_json(
                EXPORT_ANIMATION_PATH,
                &ExportAnimationRequest {
                    markup: markup.clone(),
                },
            )
            .await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|err| {
            warn!(error = %err, "export response body could not be read");
            RequestFailure::Transport(err.to_string())
        })?;
        Ok(BinaryArtifact {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
