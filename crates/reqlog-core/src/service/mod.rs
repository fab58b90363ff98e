//! Domain services
//!
//! The pieces a `LogWriter` composes for each save.

mod classifier;
mod clock;
mod db_sink;
mod diagnostics;
mod formatter;
mod log_writer;
pub mod rotator;

pub use classifier::*;
pub use clock::*;
pub use db_sink::*;
pub use diagnostics::*;
pub use formatter::{
    banner_line, render_template, FormatContext, Formatter, BANNER_SEPARATOR,
    RESERVED_ENVELOPE_KEYS,
};
pub use log_writer::*;
pub use rotator::{Destination, DestinationKind, EvictionOutcome, RotationOutcome};
