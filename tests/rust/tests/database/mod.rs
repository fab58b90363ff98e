//! Storage integration tests: migrations and the datastore sink.

mod migrations;
mod sink;
