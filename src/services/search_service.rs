use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::candidate::Candidate;
use crate::models::facet::FacetFilter;
use crate::models::image_ref::ImageReference;
use crate::services::cloudinary;

pub const FETCHED_DISPLAY_CAP: usize = 16;
const SEARCH_PATH: &str = "/api/products/search";

#[derive(Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    backend_url: Option<String>,
}

impl SearchClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            backend_url: config.backend_url().ok().map(ToString::to_string),
        })
    }

    fn search_url(&self) -> Result<String, AppError> {
        let base = self.backend_url.as_deref().ok_or_else(|| {
            AppError::Config("backend URL is not configured".to_string())
        })?;
        Ok(format!("{base}{SEARCH_PATH}"))
    }

    pub async fn search(
        &self,
        image: &ImageReference,
        facets: &FacetFilter,
    ) -> Result<Vec<Candidate>, AppError> {
        let url = self.search_url()?;
        let form = build_form(image, facets)?;

        debug!(image = %image.describe(), "submitting search");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::SearchTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body.trim(), "search endpoint rejected request");
            return Err(AppError::SearchTransport(format!(
                "search endpoint returned {status}"
            )));
        }

        let mut candidates: Vec<Candidate> = response
            .json()
            .await
            .map_err(|e| AppError::SearchTransport(format!("malformed search response: {e}")))?;
        candidates.truncate(FETCHED_DISPLAY_CAP);
        Ok(candidates)
    }
}

fn build_form(image: &ImageReference, facets: &FacetFilter) -> Result<Form, AppError> {
    let form = match image {
        ImageReference::RemoteUrl(url) => Form::new().text("imageUrl", cloudinary::enhance_url(url)),
        ImageReference::LocalBinary { bytes, filename } => {
            let mime = image.mime_type().unwrap_or("application/octet-stream");
            let part = Part::bytes(bytes.clone())
                .file_name(filename.clone())
                .mime_str(mime)
                .map_err(|e| AppError::Usage(format!("invalid upload type '{mime}': {e}")))?;
            Form::new().part("file", part)
        }
    };
    Ok(form.text("filters", serde_json::to_string(facets)?))
}
