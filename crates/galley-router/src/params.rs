//! Fixed-capacity path parameter slots.
//!
//! Lookups do not copy parameter values. They record byte spans into the
//! request path, written positionally into a [`Params`] whose capacity is
//! fixed when the router is built. The slot array is reused across requests.

use smallvec::SmallVec;

/// Maximum number of parameter spans stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// A half-open byte range `[start, end)` into a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// First byte of the value.
    pub start: usize,
    /// One past the last byte of the value.
    pub end: usize,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the slice of `path` covered by this span.
    #[must_use]
    pub fn slice<'p>(&self, path: &'p str) -> Option<&'p str> {
        path.get(self.start..self.end)
    }
}

/// Positional parameter values bound by a lookup.
///
/// The capacity is fixed at construction. [`Params::push`] refuses to grow
/// past it, which is how the router fails closed on paths that carry more
/// parameter segments than any registered route.
///
/// # Example
///
/// ```rust
/// use galley_router::{Params, Span};
///
/// let path = "/users/42";
/// let mut params = Params::with_capacity(1);
/// assert!(params.push(Span::new(7, 9)));
/// assert!(!params.push(Span::new(0, 1)));
///
/// assert_eq!(params.value(path, 0), Some("42"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    spans: SmallVec<[Span; INLINE_PARAMS]>,
    capacity: usize,
}

impl Params {
    /// Creates an empty slot array holding at most `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            spans: SmallVec::with_capacity(capacity),
            capacity,
        }
    }

    /// Binds the next free slot. Returns false when every slot is taken.
    pub fn push(&mut self, span: Span) -> bool {
        if self.spans.len() >= self.capacity {
            return false;
        }
        self.spans.push(span);
        true
    }

    /// Drops bindings past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.spans.truncate(len);
    }

    /// Forgets all bindings, retaining allocated storage.
    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Returns the span bound at position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied()
    }

    /// Returns the value bound at `index`, sliced out of `path`.
    #[must_use]
    pub fn value<'p>(&self, path: &'p str, index: usize) -> Option<&'p str> {
        self.get(index).and_then(|span| span.slice(path))
    }

    /// Returns the number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Returns the fixed slot capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the bound spans in order.
    pub fn iter(&self) -> impl Iterator<Item = Span> + '_ {
        self.spans.iter().copied()
    }
}
