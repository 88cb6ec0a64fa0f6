//! Pagination module
//!
//! Walks cursor-linked collections of the upstream API.
//!
//! # Overview
//!
//! A walk moves through `Start → FetchingPage → ResolvingItems` and repeats
//! until the collection has no `next` page or the item ceiling is reached
//! (`Done`), or a fetch fails (`Aborted`). Aborted walks still return every
//! item collected before the failure.

mod types;
mod walker;

pub use types::{Page, PageEntry, WalkConfig, WalkOutcome, WalkState, WalkStatus};
pub use walker::PaginationWalker;
