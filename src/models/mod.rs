pub mod candidate;
pub mod embedding;
pub mod facet;
pub mod image_ref;
