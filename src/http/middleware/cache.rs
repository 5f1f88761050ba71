//! Upload middleware cache keyed by size limit.

use std::sync::Arc;

use dashmap::DashMap;

use crate::http::middleware::{FileUpload, MiddlewareRef};

/// A thread-safe get-or-create table of upload middleware.
///
/// Routes declaring the same limit share one middleware instance. The entry
/// API holds the shard lock while creating, so two callers racing on a new
/// limit still produce exactly one instance.
#[derive(Clone, Default)]
pub struct UploadMiddlewareCache {
    inner: Arc<DashMap<u64, MiddlewareRef>>,
}

impl UploadMiddlewareCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The middleware for `limit`, created on first use.
    pub fn get_or_create(&self, limit: u64) -> MiddlewareRef {
        self.inner
            .entry(limit)
            .or_insert_with(|| {
                tracing::debug!(limit, "Creating upload middleware");
                Arc::new(FileUpload::new(limit))
            })
            .value()
            .clone()
    }

    /// Number of distinct limits seen so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
