//! Ordered, homogeneous collections of handles.
//!
//! [`List`] is one generic container for every handle type. Contents sit
//! behind an `Arc`, so copying a list is cheap and `append` copies on write:
//! a list never observes mutations made through another copy.
//!
//! # Index access
//!
//! Out-of-range access never panics. [`List::get`] and `list[i]` both return
//! the element type's canonical invalid handle when `i >= count()`.
//!
//! # Extremum queries
//!
//! `leftmost`, `rightmost` and `frontmost` share one linear scan,
//! [`List::min_by_score`]. The first element with the strictly smallest score
//! wins, and an empty list yields the invalid sentinel.

use core::ops::Index;
use std::sync::Arc;

use crate::handle::{Handle, Implementation};
use crate::math::Vector;

/// Implementations that have a representative position for extremum queries.
pub trait Positioned {
    /// Position used by `leftmost`, `rightmost` and `frontmost`.
    fn position(&self) -> Vector;
}

/// Ordered collection of handles of one type.
pub struct List<I: Implementation> {
    items: Arc<Vec<Handle<I>>>,
}

impl<I: Implementation> List<I> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(Vec::new()),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// True when the list has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`, or the invalid handle when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Handle<I> {
        self[index].clone()
    }

    /// Append every element of `other`, preserving order, and return `self`
    /// for chaining.
    pub fn append(&mut self, other: &Self) -> &mut Self {
        Arc::make_mut(&mut self.items).extend(other.items.iter().cloned());
        self
    }

    /// New list holding the elements that satisfy `predicate`, in order.
    #[must_use]
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&Handle<I>) -> bool,
    {
        self.items.iter().filter(|h| predicate(h)).cloned().collect()
    }

    /// Element with the strictly smallest score.
    ///
    /// Ties keep the first element encountered. Scores are compared against
    /// an initial `f32::MAX`, so an empty list (or one where no score is below
    /// `f32::MAX`) yields the invalid handle.
    #[must_use]
    pub fn min_by_score<F>(&self, mut score: F) -> Handle<I>
    where
        F: FnMut(&Handle<I>) -> f32,
    {
        let mut best = f32::MAX;
        let mut best_index = None;
        for (i, item) in self.items.iter().enumerate() {
            let s = score(item);
            if s < best {
                best = s;
                best_index = Some(i);
            }
        }
        best_index.map_or_else(|| Handle::invalid().clone(), |i| self.items[i].clone())
    }

    /// Iterator positioned at the first element.
    #[must_use]
    pub fn begin(&self) -> ListIter<I> {
        ListIter {
            list: Some(self.clone()),
            index: 0,
        }
    }

    /// Iterator positioned one past the last element.
    #[must_use]
    pub fn end(&self) -> ListIter<I> {
        ListIter {
            list: Some(self.clone()),
            index: self.count(),
        }
    }

    /// Iterate the elements by value.
    #[must_use]
    pub fn iter(&self) -> ListIter<I> {
        self.begin()
    }

    /// Borrow the elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Handle<I>] {
        &self.items
    }
}

impl<I: Implementation + Positioned> List<I> {
    /// Element with the smallest x coordinate.
    #[must_use]
    pub fn leftmost(&self) -> Handle<I> {
        self.min_by_score(|h| h.implementation().position().x)
    }

    /// Element with the largest x coordinate.
    #[must_use]
    pub fn rightmost(&self) -> Handle<I> {
        self.min_by_score(|h| -h.implementation().position().x)
    }

    /// Element with the smallest z coordinate (furthest from the user).
    #[must_use]
    pub fn frontmost(&self) -> Handle<I> {
        self.min_by_score(|h| h.implementation().position().z)
    }
}

impl<I: Implementation> Default for List<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Implementation> Clone for List<I> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<I: Implementation> core::fmt::Debug for List<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<I: Implementation> Index<usize> for List<I> {
    type Output = Handle<I>;

    fn index(&self, index: usize) -> &Handle<I> {
        self.items.get(index).unwrap_or_else(|| Handle::invalid())
    }
}

impl<I: Implementation> From<Vec<Handle<I>>> for List<I> {
    fn from(items: Vec<Handle<I>>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }
}

impl<I: Implementation> FromIterator<Handle<I>> for List<I> {
    fn from_iter<T: IntoIterator<Item = Handle<I>>>(iter: T) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a, I: Implementation> IntoIterator for &'a List<I> {
    type Item = Handle<I>;
    type IntoIter = ListIter<I>;

    fn into_iter(self) -> ListIter<I> {
        self.begin()
    }
}

// ============================================================================
// Iterator
// ============================================================================

/// Forward iterator over a [`List`], yielding handles by value.
///
/// A default-constructed iterator refers to no list; all such iterators
/// compare equal. Otherwise iterators are equal when they walk the same list
/// storage and sit at the same position.
pub struct ListIter<I: Implementation> {
    list: Option<List<I>>,
    index: usize,
}

impl<I: Implementation> ListIter<I> {
    /// Current position within the list.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }
}

impl<I: Implementation> Default for ListIter<I> {
    fn default() -> Self {
        Self {
            list: None,
            index: 0,
        }
    }
}

impl<I: Implementation> Clone for ListIter<I> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            index: self.index,
        }
    }
}

impl<I: Implementation> PartialEq for ListIter<I> {
    fn eq(&self, other: &Self) -> bool {
        let same_list = match (&self.list, &other.list) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(&a.items, &b.items),
            _ => false,
        };
        same_list && self.index == other.index
    }
}

impl<I: Implementation> core::fmt::Debug for ListIter<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListIter")
            .field("attached", &self.list.is_some())
            .field("index", &self.index)
            .finish()
    }
}

impl<I: Implementation> Iterator for ListIter<I> {
    type Item = Handle<I>;

    fn next(&mut self) -> Option<Handle<I>> {
        let item = self.list.as_ref()?.items.get(self.index)?.clone();
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .list
            .as_ref()
            .map_or(0, |l| l.count().saturating_sub(self.index));
        (remaining, Some(remaining))
    }
}

impl<I: Implementation> ExactSizeIterator for ListIter<I> {}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;

    #[derive(Default)]
    struct Marker {
        at: Option<Vector>,
    }

    impl Implementation for Marker {
        fn is_valid(&self) -> bool {
            self.at.is_some()
        }

        fn describe(&self) -> String {
            format!("Marker {:?}", self.at)
        }

        fn sentinel() -> &'static Handle<Self> {
            static INVALID: OnceLock<Handle<Marker>> = OnceLock::new();
            INVALID.get_or_init(Handle::default)
        }
    }

    impl Positioned for Marker {
        fn position(&self) -> Vector {
            self.at.unwrap_or_default()
        }
    }

    fn marker(x: f32, z: f32) -> Handle<Marker> {
        Handle::new(Arc::new(Marker {
            at: Some(Vector::new(x, 0.0, z)),
        }))
    }

    fn markers(xs: &[f32]) -> List<Marker> {
        xs.iter().map(|&x| marker(x, -x)).collect()
    }

    #[test]
    fn test_out_of_range_returns_sentinel() {
        let list = markers(&[1.0]);
        assert!(list.get(0).is_valid());
        assert_eq!(list.get(5), *Handle::<Marker>::invalid());
        assert_eq!(&list[7], Handle::<Marker>::invalid());
        assert_eq!(List::<Marker>::new().get(0), *Handle::<Marker>::invalid());
    }

    #[test]
    fn test_append_concatenates_in_order() {
        let mut a = markers(&[1.0, 2.0]);
        let b = markers(&[3.0, 4.0, 5.0]);
        let a_before = a.clone();
        let combined = a.append(&b).clone();

        assert_eq!(combined.count(), a_before.count() + b.count());
        for i in 0..combined.count() {
            let expected = if i < a_before.count() {
                a_before.get(i)
            } else {
                b.get(i - a_before.count())
            };
            assert_eq!(combined.get(i), expected);
        }
        // The copy taken before appending is untouched.
        assert_eq!(a_before.count(), 2);
    }

    #[test]
    fn test_append_chains() {
        let mut a = markers(&[1.0]);
        let b = markers(&[2.0]);
        a.append(&b).append(&b);
        assert_eq!(a.count(), 3);
    }

    #[test]
    fn test_filter_is_order_preserving_and_non_mutating() {
        let list = markers(&[5.0, -1.0, 3.0, -2.0, 4.0]);
        let positive = list.filter(|h| h.implementation().position().x > 0.0);

        assert!(positive.count() <= list.count());
        assert_eq!(positive.count(), 3);
        assert!(positive.iter().all(|h| h.implementation().position().x > 0.0));
        assert_eq!(positive.get(0), list.get(0));
        assert_eq!(positive.get(1), list.get(2));
        assert_eq!(positive.get(2), list.get(4));
        assert_eq!(list.count(), 5);
    }

    #[test]
    fn test_extremum_queries() {
        let list = markers(&[2.0, -3.0, 7.0, 0.5]);
        assert_eq!(list.leftmost(), list.get(1));
        assert_eq!(list.rightmost(), list.get(2));
        // z = -x, so the largest x is also the frontmost.
        assert_eq!(list.frontmost(), list.get(2));
    }

    #[test]
    fn test_extremum_tie_keeps_first() {
        let list: List<Marker> = vec![marker(1.0, 0.0), marker(-4.0, 0.0), marker(-4.0, 0.0)]
            .into_iter()
            .collect();
        let left = list.leftmost();
        assert_eq!(left, list.get(1));
        assert_ne!(left, list.get(2));
    }

    #[test]
    fn test_extremum_on_empty_list_is_sentinel() {
        let list = List::<Marker>::new();
        assert_eq!(list.leftmost(), *Handle::<Marker>::invalid());
        assert_eq!(list.rightmost(), *Handle::<Marker>::invalid());
        assert_eq!(list.frontmost(), *Handle::<Marker>::invalid());
    }

    #[test]
    fn test_iteration_visits_each_once() {
        let list = markers(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let mut visited = 0;
        for (i, item) in (&list).into_iter().enumerate() {
            assert_eq!(item, list.get(i));
            visited += 1;
        }
        assert_eq!(visited, 5);

        let mut it = list.begin();
        for _ in 0..5 {
            assert_ne!(it, list.end());
            it.next();
        }
        assert_eq!(it, list.end());
        assert_eq!(list.iter().len(), 5);
    }

    #[test]
    fn test_default_iterators_compare_equal() {
        let a = ListIter::<Marker>::default();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(ListIter::<Marker>::default(), ListIter::<Marker>::default());
        assert_ne!(a, markers(&[1.0]).begin());
    }
}
