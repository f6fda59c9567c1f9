//! Query composition for filtered account listings.

pub mod predicate;
mod sort;

pub use predicate::{build, Predicate};
pub use sort::{AccountOrder, SortKey};
