//! Deterministic ordering and offset/limit slicing
//!
//! The backend does not cursor every listing, so collections are fetched in
//! full, sorted by a per-entity default order, and sliced to
//! `[skip, skip + top)` in memory. Sorting is stable.

use std::cmp::Ordering;

use crate::models::{Comment, CommentThread, GitRef, GitRepository};

/// Default page size
pub const DEFAULT_TOP: usize = 100;

/// Offset/limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: usize,
    pub top: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            top: DEFAULT_TOP,
        }
    }
}

impl Page {
    pub fn new(skip: usize, top: usize) -> Self {
        Self { skip, top }
    }

    /// First `top` items
    pub fn first(top: usize) -> Self {
        Self { skip: 0, top }
    }

    /// Slice `items` to this window; out-of-range windows yield nothing
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.skip).take(self.top).collect()
    }
}

/// Default listing order of an entity
pub trait DefaultOrder {
    fn default_order(a: &Self, b: &Self) -> Ordering;
}

/// Repositories by name ascending, unnamed first
impl DefaultOrder for GitRepository {
    fn default_order(a: &Self, b: &Self) -> Ordering {
        a.name.as_deref().cmp(&b.name.as_deref())
    }
}

/// Branches by short name descending
impl DefaultOrder for GitRef {
    fn default_order(a: &Self, b: &Self) -> Ordering {
        let short = |r: &GitRef| r.branch_name().map(str::to_string).unwrap_or_else(|| r.name.clone());
        short(b).cmp(&short(a))
    }
}

impl DefaultOrder for CommentThread {
    fn default_order(a: &Self, b: &Self) -> Ordering {
        a.id.unwrap_or(0).cmp(&b.id.unwrap_or(0))
    }
}

impl DefaultOrder for Comment {
    fn default_order(a: &Self, b: &Self) -> Ordering {
        a.id.unwrap_or(0).cmp(&b.id.unwrap_or(0))
    }
}

/// Sort `items` by their default order and slice to `page`
pub fn paginate<T: DefaultOrder>(mut items: Vec<T>, page: Page) -> Vec<T> {
    items.sort_by(T::default_order);
    page.slice(items)
}
