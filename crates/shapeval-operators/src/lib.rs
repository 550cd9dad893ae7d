#![forbid(unsafe_code)]
//! shapeval-operators: the streaming operators validation plans are built from.
//!
//! Design intent:
//! - Pull-based and synchronous: a consumer calls `next()` on the root cursor
//!   and every operator pulls from its children until it has a tuple.
//! - Plan nodes are single-pass. `PlanNode::iterate` consumes the node, so the
//!   only way to read a result twice is through `BufferedSplitter`.
//! - Every stream is sorted by its columns (target first); merge joins and the
//!   k-way union depend on it.
//! - Declared `IteratorShape`s are checked when operators are constructed.

pub mod buffer;
pub mod enrich;
pub mod filter;
pub mod join;
pub mod plan;
pub mod project;
pub mod scan;
pub mod sort;
pub mod source;
pub mod traits;
pub mod union;
pub mod unique;

pub use buffer::{BufferedSplitter, PeekableCursor};
pub use enrich::{EnrichWithShape, ShapeOverride};
pub use filter::Filter;
pub use join::{AntiJoin, EqualsJoin, InnerJoin};
pub use plan::PlanGraph;
pub use project::Trim;
pub use scan::{CountValues, TargetMode, TargetScan, ValuesOf};
pub use sort::Sort;
pub use source::{EmptyNode, VecSource};
pub use traits::{
    collect, drain, BoxCursor, BoxPlan, Cursor, OpError, PlanFactory, PlanNode, TargetProvider,
};
pub use union::Union;
pub use unique::Unique;
