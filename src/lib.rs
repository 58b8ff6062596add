pub mod app;
pub mod compose;
pub mod config;
pub mod domain;
pub mod error;
pub mod homology;
pub mod index;
pub mod ingest;
pub mod output;
pub mod store;
pub mod taxonomy;
