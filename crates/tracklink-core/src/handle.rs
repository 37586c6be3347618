//! Shared-ownership handles over implementation objects.
//!
//! Every public entity (frame, hand, finger, ...) is a [`Handle`] around an
//! `Arc` of its implementation. Handles are cheap to clone and never null:
//! building one from nothing allocates a fresh default implementation that
//! reports itself invalid, so callers never need a null check.
//!
//! # Invalid sentinels
//!
//! Each implementation type owns one canonical invalid handle, created on
//! first use in a process-lifetime `OnceLock` and never torn down. That is
//! intentional: sentinels must outlive every handle that might hand them out.
//!
//! # Equality
//!
//! Two handles are equal when they share the same implementation instance and
//! that instance is valid. The canonical sentinel is also equal to itself.
//! Independently constructed invalid handles never compare equal, neither to
//! each other nor to the sentinel.

use core::fmt;
use std::sync::Arc;

/// Backing store of a handle type.
pub trait Implementation: Default + Send + Sync + 'static {
    /// Whether this implementation describes a real entity.
    fn is_valid(&self) -> bool;

    /// Human-readable description used by `Display`.
    fn describe(&self) -> String;

    /// The canonical invalid handle for this implementation type.
    ///
    /// Implementors keep it in a function-local `static OnceLock`.
    fn sentinel() -> &'static Handle<Self>;
}

/// Value-semantic reference to a shared implementation.
pub struct Handle<I: Implementation> {
    inner: Arc<I>,
}

impl<I: Implementation> Handle<I> {
    /// Wrap an existing implementation, sharing ownership of it.
    #[must_use]
    pub fn new(inner: Arc<I>) -> Self {
        Self { inner }
    }

    /// Wrap an optional implementation; `None` yields a fresh invalid one.
    #[must_use]
    pub fn from_option(inner: Option<Arc<I>>) -> Self {
        inner.map_or_else(Self::default, Self::new)
    }

    /// The canonical invalid handle of this type.
    #[must_use]
    pub fn invalid() -> &'static Self {
        I::sentinel()
    }

    /// Whether the underlying implementation describes a real entity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    /// True if both handles share one implementation instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Borrow the implementation.
    #[must_use]
    pub fn implementation(&self) -> &I {
        &self.inner
    }

    /// Shared pointer to the implementation, for building weak back-references.
    #[must_use]
    pub fn arc(&self) -> &Arc<I> {
        &self.inner
    }

    fn is_sentinel(&self) -> bool {
        Arc::ptr_eq(&self.inner, &I::sentinel().inner)
    }
}

impl<I: Implementation> Default for Handle<I> {
    fn default() -> Self {
        Self {
            inner: Arc::new(I::default()),
        }
    }
}

impl<I: Implementation> Clone for Handle<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: Implementation> PartialEq for Handle<I> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) && (self.is_valid() || self.is_sentinel())
    }
}

impl<I: Implementation> fmt::Display for Handle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.describe())
    }
}

impl<I: Implementation> fmt::Debug for Handle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("description", &self.inner.describe())
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<I: Implementation> From<Arc<I>> for Handle<I> {
    fn from(inner: Arc<I>) -> Self {
        Self::new(inner)
    }
}
