use tracing::debug;

use crate::error::AppError;
use crate::models::facet::FacetFilter;
use crate::models::image_ref::validate_upload;
use crate::state::{AppState, SessionSnapshot, UploadedFile};

pub fn set_image_url(state: &AppState, url: String) -> Result<(), AppError> {
    {
        let mut input = state
            .input
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if input.file.is_some() {
            return Err(AppError::Usage(
                "Remove the uploaded image before entering a URL.".to_string(),
            ));
        }
        input.url = url;
        if !input.url.trim().is_empty() {
            return Ok(());
        }
    }
    debug!("image URL cleared, resetting session");
    state.reset_session();
    Ok(())
}

pub fn set_image_file(state: &AppState, bytes: Vec<u8>, filename: String) -> Result<(), AppError> {
    validate_upload(&bytes, &filename)?;

    let mut input = state
        .input
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if !input.url.trim().is_empty() {
        return Err(AppError::Usage(
            "Clear the image URL before uploading a file.".to_string(),
        ));
    }
    input.file = Some(UploadedFile { bytes, filename });
    Ok(())
}

pub fn remove_image_file(state: &AppState) {
    state
        .input
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .file = None;
    state.reset_session();
}

pub fn update_facets(state: &AppState, facets: FacetFilter) {
    let floor = facets.similarity_floor;
    let facets = facets.with_similarity_floor(floor);
    *state
        .facets
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = facets;
}

pub fn snapshot(state: &AppState) -> SessionSnapshot {
    state.snapshot()
}
