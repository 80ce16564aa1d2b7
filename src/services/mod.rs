pub mod cloudinary;
pub mod embedding_service;
pub mod embedding_worker;
pub mod refine_service;
pub mod search_service;
