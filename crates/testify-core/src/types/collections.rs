//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;

/// SmallVec for descriptor buckets (usually exactly one entry per key).
pub type SmallVec2<T> = SmallVec<[T; 2]>;

/// SmallVec for annotation lists (usually <4 per member).
pub type SmallVec4<T> = SmallVec<[T; 4]>;
