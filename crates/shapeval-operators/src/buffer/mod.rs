//! Buffering operators: multi-consumer fan-out and single-cursor lookahead.

pub mod peek;
pub mod splitter;

pub use peek::PeekableCursor;
pub use splitter::BufferedSplitter;
