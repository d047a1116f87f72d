//! Log output: JSON lines for collection, or human-readable lines for a terminal.

mod subscriber;

pub use subscriber::StructuredLogger;
