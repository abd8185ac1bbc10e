//! HTTP service that generates images of randomly assembled creatures.
//!
//! Each request samples a title and prompt from categorised word lists,
//! hands the prompt to an image model, stores the result on disk and
//! returns a descriptor pointing at the stored image.

pub mod ai;
pub mod config;
pub mod error;
pub mod image;
pub mod limiter;
pub mod models;
pub mod prompts;
pub mod service;
pub mod web;
pub mod words;

pub use error::{Error, Result};
