//! Note-level text operations: targeted patching and substring search.

pub mod patch;
pub mod search;
