//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image provider error: {0}")]
    AiProvider(String),

    #[error("Word selection error: {0}")]
    WordSelection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Generator is busy, try again later")]
    Busy,

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
