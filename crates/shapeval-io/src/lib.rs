#![forbid(unsafe_code)]
//! shapeval-io: statement sources the algebra can validate against.
//!
//! The real storage layer lives outside this workspace; `MemoryStore` is the
//! in-process implementation used by tests, benches and embedders that keep
//! their graph in memory. `Transaction` assembles the before/after/added/
//! removed views of one pending commit.

pub mod memory_store;
pub mod transaction;

pub use memory_store::MemoryStore;
pub use transaction::Transaction;
