//! Identity wrapper for GPU resources handed between stages.
//!
//! wgpu handles carry no cheap identity of their own, so texture views that
//! flow through the post-processing chain are wrapped in [`Tracked`]. The copy
//! pass uses the id to decide whether its cached bind group is still valid.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A resource paired with a process-unique id.
///
/// Clones share the id, so a stage can hand out clones of its output view
/// and consumers still recognise it as the same texture.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    inner: T,
    id: u64,
}

impl<T> Tracked<T> {
    /// Wraps a resource and assigns it a fresh id.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            id: next_id(),
        }
    }

    /// Unique id of the wrapped resource.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Tracked<T> {}
