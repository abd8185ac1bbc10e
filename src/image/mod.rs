//! Generated image persistence
//!
//! Images are written once under a timestamp-derived name and never
//! modified or removed afterwards.

pub mod store;

pub use store::ImageStore;
