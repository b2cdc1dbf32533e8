//! Cursor pagination primitives

use std::collections::HashSet;

use anyhow::Result;

use super::models::ListResponse;

/// Opaque continuation cursor. The empty cursor means "beginning of the collection".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Sentinel cursor for the first page
    pub fn begin() -> Self {
        Self(String::new())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_begin(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_begin() {
            write!(f, "<begin>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// One page of entities plus the continuation state
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub entities: Vec<T>,
    pub has_next: bool,
    /// Cursor for the following page; only meaningful when `has_next` is set
    pub next: Cursor,
}

#[cfg(test)]
impl<T> Page<T> {
    /// Final page with no continuation
    pub fn last(entities: Vec<T>) -> Self {
        Self {
            entities,
            has_next: false,
            next: Cursor::begin(),
        }
    }

    pub fn with_next(entities: Vec<T>, next: Cursor) -> Self {
        Self {
            entities,
            has_next: true,
            next,
        }
    }
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(response: ListResponse<T>) -> Self {
        Self {
            entities: response.data,
            has_next: response.has_next,
            next: response.next.map(Cursor::new).unwrap_or_default(),
        }
    }
}

/// Cursors requested so far while walking one collection.
///
/// A continuation must be non-empty and never seen before. Anything else
/// would restart or cycle the walk.
#[derive(Debug)]
pub struct CursorTrail {
    seen: HashSet<Cursor>,
}

impl CursorTrail {
    pub fn new() -> Self {
        Self {
            seen: HashSet::from([Cursor::begin()]),
        }
    }

    /// Accept `next` as the following request
    pub fn advance(&mut self, next: &Cursor) -> Result<()> {
        if next.is_begin() {
            anyhow::bail!("page reported more results but no next cursor");
        }
        if !self.seen.insert(next.clone()) {
            anyhow::bail!("pagination did not advance: cursor {} was already requested", next);
        }
        Ok(())
    }
}

impl Default for CursorTrail {
    fn default() -> Self {
        Self::new()
    }
}
