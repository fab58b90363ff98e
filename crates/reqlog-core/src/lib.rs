//! # Reqlog Core Library
//!
//! Persists the categorized log records a web framework collects during a
//! request, either to rotating flat files or to a datastore.
//!
//! ## Modules
//!
//! - `domain` - Log batches, configuration, request context, datastore records
//! - `repository` - Datastore sink trait
//! - `service` - Classifier, formatter, rotator and the `LogWriter` that composes them
//! - `error` - Error type for the file-logging path

pub mod domain;
pub mod error;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use domain::*;
pub use error::LogError;
pub use repository::*;
pub use service::*;
