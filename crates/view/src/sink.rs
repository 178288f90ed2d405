//! List sink seam.
//!
//! The classifier hands the fragments of one bucket to a `ListSink` in a
//! single batch, so the rendering collaborator can attach them with one
//! document operation.

use crate::fragment::Fragment;
use core::cell::RefCell;
use std::rc::Rc;
use waitboard_core::{Bucket, EntryKey};

/// Fragments of one bucket, in display order.
pub struct RenderBatch<'a> {
    pub bucket: Bucket,
    pub items: Vec<(EntryKey, &'a dyn Fragment)>,
}

impl RenderBatch<'_> {
    pub fn keys(&self) -> Vec<EntryKey> {
        self.items.iter().map(|(key, _)| *key).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Receives rendered lists.
pub trait ListSink {
    fn attach(&mut self, batch: RenderBatch<'_>);
}

/// A sink that records what was attached.
///
/// Clones share the record.
#[derive(Clone, Debug, Default)]
pub struct MemoryList {
    attached: Rc<RefCell<Vec<(Bucket, Vec<EntryKey>)>>>,
}

impl MemoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every batch attached so far.
    pub fn batches(&self) -> Vec<(Bucket, Vec<EntryKey>)> {
        self.attached.borrow().clone()
    }

    /// Returns the keys of the latest batch.
    pub fn last(&self) -> Option<Vec<EntryKey>> {
        self.attached.borrow().last().map(|(_, keys)| keys.clone())
    }

    pub fn attach_count(&self) -> usize {
        self.attached.borrow().len()
    }
}

impl ListSink for MemoryList {
    fn attach(&mut self, batch: RenderBatch<'_>) {
        tracing::trace!(bucket = %batch.bucket, size = batch.len(), "attaching list");
        let keys = batch.keys();
        self.attached.borrow_mut().push((batch.bucket, keys));
    }
}
