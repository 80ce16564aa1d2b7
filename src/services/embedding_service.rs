use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{AppConfig, EmbeddingConfig, ProviderKind};
use crate::error::AppError;
use crate::models::embedding::EmbeddingVector;
use crate::models::image_ref::ImageReference;
use crate::services::embedding_worker::WorkerEmbeddingProvider;

/// Turns a query image into an embedding. Implementations are selected once
/// from configuration; callers only ever see this trait.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, image: &ImageReference) -> Result<EmbeddingVector, AppError>;

    fn name(&self) -> &'static str;
}

pub fn build_provider(config: &AppConfig) -> Result<Box<dyn EmbeddingProvider>, AppError> {
    let provider: Box<dyn EmbeddingProvider> = match config.embedding.provider {
        ProviderKind::Remote => Box::new(RemoteEmbeddingProvider::new(
            config.embedding.clone(),
            config.request_timeout(),
        )?),
        ProviderKind::Local => Box::new(WorkerEmbeddingProvider::from_config(&config.embedding)),
    };
    debug!(provider = provider.name(), "embedding provider selected");
    Ok(provider)
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Hosted embeddings API. The image URL is sent as-is as the model input;
/// nothing is downloaded or decoded locally.
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl RemoteEmbeddingProvider {
    pub fn new(config: EmbeddingConfig, timeout: std::time::Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, image: &ImageReference) -> Result<EmbeddingVector, AppError> {
        let url = match image {
            ImageReference::RemoteUrl(url) => url,
            ImageReference::LocalBinary { filename, .. } => {
                return Err(AppError::provider(format!(
                    "remote embeddings need an image URL, got local file '{filename}'"
                )));
            }
        };
        let api_key = self.config.api_key()?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input: url,
            })
            .send()
            .await
            .map_err(|e| AppError::provider(e.to_string()).capture())?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::provider(e.to_string()).capture())?;

        if !status.is_success() {
            warn!(%status, "embedding request rejected");
            let body = body.trim();
            let reason = if body.is_empty() {
                format!("embedding request failed with status {status}")
            } else {
                format!("embedding request failed with status {status}: {body}")
            };
            return Err(AppError::provider(reason));
        }

        let parsed: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::provider(format!("malformed embedding response: {e}")))?;
        let values = parsed
            .data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or_else(|| AppError::provider("response missing embedding array"))?;

        EmbeddingVector::new(values, self.config.dimensions)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
