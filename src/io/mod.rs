//! Input/output: tidy-CSV ingestion and result exports.

pub mod export;
pub mod ingest;
