use serde::Serialize;

pub const SEARCH_FAILED_MESSAGE: &str = "Failed to fetch results. Try again!";
pub const NO_MATCHES_MESSAGE: &str = "No products found matching your filters. Try changing them!";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),

    #[error("Embedding provider error: {reason}")]
    Provider { reason: String },

    #[error("Search request failed: {0}")]
    SearchTransport(String),

    #[error("No candidates match the current filters")]
    EmptyResult,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AppError {
    pub fn provider(reason: impl Into<String>) -> Self {
        Self::Provider {
            reason: reason.into(),
        }
    }

    pub fn capture(self) -> Self {
        tracing::error!(error = %self, "operation failed");
        self
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Usage(message) => message.clone(),
            Self::SearchTransport(_) => SEARCH_FAILED_MESSAGE.to_string(),
            Self::EmptyResult => NO_MATCHES_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
