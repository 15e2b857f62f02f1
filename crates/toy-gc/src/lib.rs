//! Maintenance tools for a Toy repository: garbage collection, stripping,
//! and merging.

mod collector;
mod error;
mod merge;
mod strip;

pub use collector::collect;
pub use error::GcError;
pub use merge::{merge, MergeError};
pub use strip::strip;
