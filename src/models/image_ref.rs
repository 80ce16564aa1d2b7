use std::path::Path;

use crate::error::AppError;

pub const ACCEPTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Clone, PartialEq, Eq)]
pub enum ImageReference {
    RemoteUrl(String),
    LocalBinary { bytes: Vec<u8>, filename: String },
}

impl std::fmt::Debug for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteUrl(url) => f.debug_tuple("RemoteUrl").field(url).finish(),
            Self::LocalBinary { bytes, filename } => f
                .debug_struct("LocalBinary")
                .field("filename", filename)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

impl ImageReference {
    pub fn remote(url: impl Into<String>) -> Result<Self, AppError> {
        let url = url.into();
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(AppError::Usage("Image URL is empty".to_string()));
        }
        Ok(Self::RemoteUrl(trimmed.to_string()))
    }

    pub fn local(bytes: Vec<u8>, filename: impl Into<String>) -> Result<Self, AppError> {
        let filename = filename.into();
        validate_upload(&bytes, &filename)?;
        Ok(Self::LocalBinary { bytes, filename })
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Usage(format!("invalid image path: {}", path.display())))?
            .to_string();
        let bytes = std::fs::read(path)?;
        Self::local(bytes, filename)
    }

    pub fn describe(&self) -> String {
        match self {
            Self::RemoteUrl(url) => url.clone(),
            Self::LocalBinary { filename, bytes } => format!("{filename} ({} bytes)", bytes.len()),
        }
    }

    /// MIME type sniffed from the content, falling back to the generic
    /// binary type when the format is not recognised.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            Self::RemoteUrl(_) => None,
            Self::LocalBinary { bytes, .. } => Some(
                image::guess_format(bytes)
                    .map(|format| format.to_mime_type())
                    .unwrap_or(FALLBACK_MIME_TYPE),
            ),
        }
    }
}

pub fn validate_upload(bytes: &[u8], filename: &str) -> Result<(), AppError> {
    if !is_accepted_image_name(filename) {
        return Err(AppError::Usage(format!(
            "Unsupported image type for '{filename}'. Use one of: {}",
            ACCEPTED_IMAGE_EXTENSIONS.join(", ")
        )));
    }
    if bytes.is_empty() {
        return Err(AppError::Usage(format!("'{filename}' is empty")));
    }
    Ok(())
}

pub fn is_accepted_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
