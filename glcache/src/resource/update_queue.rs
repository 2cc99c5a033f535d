/// Deferred update queue shared by buffers and textures
///
/// Producers enqueue updates at any time; the queue is drained when the
/// resource is synchronized with the device. A full-replace update makes
/// every earlier pending update obsolete, so enqueueing one discards them.

use std::sync::Arc;
use bitflags::bitflags;

bitflags! {
    /// Per-update behaviour flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UpdateFlags: u8 {
        /// Replace the whole device store (size taken from the update)
        const REUPLOAD = 1 << 0;
        /// The source bytes outlive the update (kept by the resource or
        /// retained by the caller)
        const KEEP_SOURCE_DATA = 1 << 1;
    }
}

// ===== SOURCE DATA =====

/// Source bytes of an update, tagged with who owns them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceData {
    /// Owned by the queue, freed once the update is applied
    Owned(Vec<u8>),
    /// Owned by the queue, kept by the resource as its CPU-side copy once
    /// the update is applied
    Kept(Vec<u8>),
    /// Retained by the caller; the queue only holds a shared reference
    Shared(Arc<[u8]>),
}

impl SourceData {
    pub fn bytes(&self) -> &[u8] {
        match self {
            SourceData::Owned(bytes) | SourceData::Kept(bytes) => bytes,
            SourceData::Shared(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// Flags implied by the ownership tag
    pub fn flags(&self) -> UpdateFlags {
        match self {
            SourceData::Owned(_) => UpdateFlags::empty(),
            SourceData::Kept(_) | SourceData::Shared(_) => UpdateFlags::KEEP_SOURCE_DATA,
        }
    }

    /// Byte range `[offset, offset + len)`, `None` if it does not fit
    pub fn range(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        self.bytes().get(offset..end)
    }
}

impl From<Vec<u8>> for SourceData {
    fn from(bytes: Vec<u8>) -> Self {
        SourceData::Owned(bytes)
    }
}

impl From<Arc<[u8]>> for SourceData {
    fn from(bytes: Arc<[u8]>) -> Self {
        SourceData::Shared(bytes)
    }
}

// ===== QUEUE =====

/// An update that may supersede everything queued before it
pub trait PendingUpdate {
    fn is_full_replace(&self) -> bool;
}

/// FIFO of pending updates
#[derive(Debug, Clone)]
pub struct UpdateQueue<U: PendingUpdate> {
    updates: Vec<U>,
}

impl<U: PendingUpdate> UpdateQueue<U> {
    pub fn new() -> Self {
        Self { updates: Vec::new() }
    }

    /// Append an update, discarding every pending one if it is a full
    /// replace
    pub fn enqueue(&mut self, update: U) {
        if update.is_full_replace() {
            self.updates.clear();
        }
        self.updates.push(update);
    }

    /// Remove and return every pending update in enqueue order
    pub fn take(&mut self) -> Vec<U> {
        std::mem::take(&mut self.updates)
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, U> {
        self.updates.iter()
    }
}

impl<U: PendingUpdate> Default for UpdateQueue<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "update_queue_tests.rs"]
mod tests;
