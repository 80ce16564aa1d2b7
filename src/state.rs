use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::candidate::Candidate;
use crate::models::facet::FacetFilter;
use crate::models::image_ref::ImageReference;
use crate::services::search_service::SearchClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Idle,
    Searching,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInput {
    pub url: String,
    pub file: Option<UploadedFile>,
}

impl ImageInput {
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.url.trim().is_empty()
    }

    pub fn to_reference(&self) -> Result<ImageReference, AppError> {
        match (&self.file, self.url.trim()) {
            (Some(file), "") => ImageReference::local(file.bytes.clone(), file.filename.clone()),
            (None, url) if !url.is_empty() => ImageReference::remote(url),
            (Some(_), _) => Err(AppError::Usage(
                "Use either an uploaded image or a URL, not both.".to_string(),
            )),
            (None, _) => Err(AppError::Usage(
                "Upload a file or enter a URL first!".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub all: Arc<[Candidate]>,
    pub displayed: Vec<Candidate>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ResultSet {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SearchStatus,
    pub image_url: String,
    pub file_name: Option<String>,
    pub facets: FacetFilter,
    pub total_candidates: usize,
    pub displayed: Vec<Candidate>,
    pub message: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

pub struct AppState {
    pub config: AppConfig,
    pub search_client: SearchClient,
    pub input: Mutex<ImageInput>,
    pub facets: Mutex<FacetFilter>,
    pub results: RwLock<ResultSet>,
    pub search_status: Mutex<SearchStatus>,
    pub search_sequence: AtomicU64,
    pub message: Mutex<Option<String>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let search_client = SearchClient::new(&config)?;
        Ok(Self {
            config,
            search_client,
            input: Mutex::new(ImageInput::default()),
            facets: Mutex::new(FacetFilter::default()),
            results: RwLock::new(ResultSet::default()),
            search_status: Mutex::new(SearchStatus::Idle),
            search_sequence: AtomicU64::new(0),
            message: Mutex::new(None),
        })
    }

    pub fn next_search_sequence(&self) -> u64 {
        self.search_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current_search(&self, sequence: u64) -> bool {
        self.search_sequence.load(Ordering::SeqCst) == sequence
    }

    pub fn set_status(&self, status: SearchStatus) {
        *self
            .search_status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = status;
    }

    pub fn status(&self) -> SearchStatus {
        *self
            .search_status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_message(&self, message: Option<String>) {
        *self
            .message
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = message;
    }

    pub fn message(&self) -> Option<String> {
        self.message
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn input(&self) -> ImageInput {
        self.input
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn facets(&self) -> FacetFilter {
        self.facets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn unfiltered(&self) -> Arc<[Candidate]> {
        self.results
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .all
            .clone()
    }

    pub fn displayed(&self) -> Vec<Candidate> {
        self.results
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .displayed
            .clone()
    }

    /// Drops fetched results and invalidates any search in flight.
    pub fn reset_session(&self) {
        let mut results = self
            .results
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.next_search_sequence();
        results.clear();
        *self
            .facets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = FacetFilter::default();
        self.set_message(None);
        self.set_status(SearchStatus::Idle);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let input = self.input();
        let results = self
            .results
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        SessionSnapshot {
            status: self.status(),
            image_url: input.url,
            file_name: input.file.map(|f| f.filename),
            facets: self.facets(),
            total_candidates: results.all.len(),
            displayed: results.displayed,
            message: self.message(),
            fetched_at: results.fetched_at,
        }
    }
}
