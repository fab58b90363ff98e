//! Domain types
//!
//! - Log batches and entries handed over by the framework
//! - Writer configuration
//! - Request context (metadata + start-of-request snapshot)
//! - Datastore sink records

mod batch;
pub mod config;
mod record;
mod request;

pub use batch::*;
pub use config::*;
pub use record::*;
pub use request::*;
