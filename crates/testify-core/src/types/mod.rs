//! Data structure re-exports shared across Testify crates.

pub mod collections;

pub use collections::{FxHashMap, FxHashSet};
