// src/utils/error.rs
#![allow(dead_code)]
use thiserror::Error;

// Define specific error types for different parts of the application.
// Per-table and per-row failures are deliberately NOT errors: they degrade
// to skipped tables / absent values inside the engine. Only document-level
// acquisition, parse and storage failures surface here.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found, 403 Forbidden

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Invalid listing URL: {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Document page dump could not be parsed: {0}")]
    DocumentUnreadable(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Document acquisition failed: {0}")]
    Acquire(#[from] AcquireError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
