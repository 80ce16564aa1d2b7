use serde::{Deserialize, Deserializer, Serialize};

use crate::services::cloudinary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(rename = "_id", alias = "id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "productDisplayName", alias = "name", default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub base_colour: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub master_category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub similarity: f64,
}

// Catalog rows may carry explicit nulls for descriptive fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchQuality {
    Excellent,
    Good,
    Fair,
    Basic,
}

impl std::fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent Match"),
            Self::Good => write!(f, "Good Match"),
            Self::Fair => write!(f, "Fair Match"),
            Self::Basic => write!(f, "Basic Match"),
        }
    }
}

impl Candidate {
    pub fn similarity_percent(&self) -> u32 {
        (self.similarity.clamp(0.0, 1.0) * 100.0).round() as u32
    }

    pub fn match_quality(&self) -> MatchQuality {
        match self.similarity_percent() {
            80.. => MatchQuality::Excellent,
            60..=79 => MatchQuality::Good,
            40..=59 => MatchQuality::Fair,
            _ => MatchQuality::Basic,
        }
    }

    pub fn thumbnail_url(&self, width: u32, height: u32) -> String {
        cloudinary::responsive_url(&self.image_url, width, height)
    }
}
