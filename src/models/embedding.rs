use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>, expected_dimensions: Option<usize>) -> Result<Self, AppError> {
        if values.is_empty() {
            return Err(AppError::provider("no embedding returned"));
        }
        if let Some(expected) = expected_dimensions {
            if values.len() != expected {
                return Err(AppError::provider(format!(
                    "expected {expected} dimensions, got {}",
                    values.len()
                )));
            }
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(AppError::provider(format!(
                "non-finite value at index {index}"
            )));
        }
        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}
