//! LogWriter integration tests: layout, rotation, routing and structured output.

mod rotation;
