use chrono::Utc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::candidate::Candidate;
use crate::services::refine_service;
use crate::state::{AppState, SearchStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Applied(Vec<Candidate>),
    Superseded,
}

/// Fetch candidates for the current image input and facet draft. Results
/// only land if no newer search was started in the meantime.
pub async fn search(state: &AppState) -> Result<SearchOutcome, AppError> {
    let image = state.input().to_reference().inspect_err(|err| {
        state.set_message(Some(err.user_message()));
    })?;
    let facets = state.facets();
    let request_id = Uuid::new_v4();

    // Generation and clear must happen under one lock so a start can never
    // wipe results applied by a newer search.
    let sequence = {
        let mut results = state
            .results
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let sequence = state.next_search_sequence();
        results.clear();
        state.set_message(None);
        state.set_status(SearchStatus::Searching);
        sequence
    };

    let outcome = state
        .search_client
        .search(&image, &facets)
        .instrument(info_span!("search", %request_id, sequence))
        .await;

    let mut results = state
        .results
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if !state.is_current_search(sequence) {
        debug!(%request_id, sequence, "dropping superseded search response");
        return Ok(SearchOutcome::Superseded);
    }

    match outcome {
        Ok(candidates) => {
            results.all = candidates.clone().into();
            results.displayed = candidates.clone();
            results.fetched_at = Some(Utc::now());
            state.set_status(SearchStatus::Succeeded);
            info!(%request_id, count = candidates.len(), "search results applied");
            Ok(SearchOutcome::Applied(candidates))
        }
        Err(err) => {
            results.clear();
            state.set_status(SearchStatus::Failed);
            state.set_message(Some(err.user_message()));
            Err(err.capture())
        }
    }
}

pub fn apply_filters(state: &AppState) -> Result<Vec<Candidate>, AppError> {
    if state.input().is_empty() {
        let err = AppError::Usage(
            "Please upload an image or enter a URL to apply filters!".to_string(),
        );
        state.set_message(Some(err.user_message()));
        return Err(err);
    }

    let facets = state.facets();
    let mut results = state
        .results
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let refined = refine_service::refine(&results.all, &facets);
    results.displayed = refined.clone();

    if refined.is_empty() {
        let err = AppError::EmptyResult;
        state.set_message(Some(err.user_message()));
        return Err(err);
    }
    state.set_message(None);
    Ok(refined)
}
