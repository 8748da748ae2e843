//! Cache-line padding for per-worker round-output slots (spec.md §5: "False
//! sharing must be prevented by padding each slot to a cache-line boundary").
//!
//! Grounded on the `CachePadding` wrapper used for per-worker atomics in the
//! example pack's work-stealing iterator (`maneatingape-advent-of-code-rust`),
//! generalized here from a single atomic to an arbitrary `T`.

use std::ops::{Deref, DerefMut};

#[repr(align(64))]
pub struct CachePadded<T> {
    value: T,
}

impl<T> CachePadded<T> {
    pub fn new(value: T) -> Self {
        CachePadded { value }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
