//! Device buffer with deferred uploads
//!
//! Contents are staged through [`BufferUpdate`]s and pushed to the device
//! by [`Buffer::synchronize`], which expects the buffer to be bound.

use bytemuck::Pod;

use crate::device::{check_device_error, BufferTarget, BufferUsage, Device, Handle};
use crate::error::Result;
use crate::resource::lifecycle::DeviceObject;
use crate::resource::update_queue::{PendingUpdate, SourceData, UpdateFlags, UpdateQueue};

const SOURCE: &str = "glcache::Buffer";

// ===== BUFFER UPDATE =====

/// A pending write to a buffer store
#[derive(Debug, Clone)]
pub struct BufferUpdate {
    pub flags: UpdateFlags,
    /// Destination offset in bytes (ignored by full replaces)
    pub dst_offset: usize,
    /// Offset of the first byte used from `data`
    pub src_offset: usize,
    /// Number of bytes written (new store size for full replaces)
    pub size: usize,
    /// Source bytes, `None` to allocate a store with unspecified contents
    pub data: Option<SourceData>,
}

impl BufferUpdate {
    /// Replace the whole store with `data`
    pub fn reupload(data: SourceData) -> Self {
        Self {
            flags: UpdateFlags::REUPLOAD | data.flags(),
            dst_offset: 0,
            src_offset: 0,
            size: data.len(),
            data: Some(data),
        }
    }

    /// (Re)allocate a store of `size` bytes with unspecified contents
    pub fn allocate(size: usize) -> Self {
        Self {
            flags: UpdateFlags::REUPLOAD,
            dst_offset: 0,
            src_offset: 0,
            size,
            data: None,
        }
    }

    /// Overwrite `data.len()` bytes starting at `dst_offset`
    pub fn partial(dst_offset: usize, data: SourceData) -> Self {
        Self {
            flags: data.flags(),
            dst_offset,
            src_offset: 0,
            size: data.len(),
            data: Some(data),
        }
    }

    /// Only use `size` bytes of the source, starting at `src_offset`
    pub fn with_source_range(mut self, src_offset: usize, size: usize) -> Self {
        self.src_offset = src_offset;
        self.size = size;
        self
    }
}

impl PendingUpdate for BufferUpdate {
    fn is_full_replace(&self) -> bool {
        self.flags.contains(UpdateFlags::REUPLOAD) || self.data.is_none()
    }
}

// ===== BUFFER =====

/// Vertex or index buffer
#[derive(Debug)]
pub struct Buffer {
    target: BufferTarget,
    usage: BufferUsage,
    handle: Handle,
    /// Store size committed to the device
    size_bytes: usize,
    updates: UpdateQueue<BufferUpdate>,
    /// CPU-side copy, present after a full replace with `SourceData::Kept`
    shadow: Option<Vec<u8>>,
    desc: String,
}

impl Buffer {
    pub fn new(target: BufferTarget, usage: BufferUsage) -> Self {
        Self {
            target,
            usage,
            handle: Handle::NULL,
            size_bytes: 0,
            updates: UpdateQueue::new(),
            shadow: None,
            desc: "Buffer".to_string(),
        }
    }

    pub fn with_desc(mut self, desc: &str) -> Self {
        self.desc = format!("Buffer: {}", desc);
        self
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Store size committed by the last applied full replace
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn pending_updates(&self) -> &UpdateQueue<BufferUpdate> {
        &self.updates
    }

    pub fn shadow_data(&self) -> Option<&[u8]> {
        self.shadow.as_deref()
    }

    /// Queue an update for the next `synchronize`
    pub fn enqueue(&mut self, update: BufferUpdate) {
        self.updates.enqueue(update);
    }

    /// Bind to the buffer's target
    pub fn bind(&self, device: &mut dyn Device) -> Result<()> {
        if self.handle.is_null() {
            crate::glc_bail!(SOURCE, InvalidResource, "{}: tried to bind buffer 0", self.desc);
        }
        device.bind_buffer(self.target, self.handle);
        check_device_error(device, "Buffer::bind");
        Ok(())
    }

    /// Clear the binding of the buffer's target
    pub fn unbind(&self, device: &mut dyn Device) {
        device.bind_buffer(self.target, Handle::NULL);
        check_device_error(device, "Buffer::unbind");
    }

    /// Apply every pending update in enqueue order, then empty the queue
    ///
    /// The buffer must be bound. Updates whose source range does not fit
    /// the source bytes are logged and skipped.
    pub fn synchronize(&mut self, device: &mut dyn Device) {
        for update in self.updates.take() {
            let bytes = match &update.data {
                Some(data) => match data.range(update.src_offset, update.size) {
                    Some(bytes) => Some(bytes),
                    None => {
                        crate::glc_error!(
                            SOURCE,
                            "{}: source range {}+{} exceeds {} source bytes, update skipped",
                            self.desc,
                            update.src_offset,
                            update.size,
                            data.len()
                        );
                        continue;
                    }
                },
                None => None,
            };

            if update.is_full_replace() {
                device.buffer_data(self.target, update.size, bytes, self.usage);
                check_device_error(device, "Buffer::synchronize (upload)");
                self.size_bytes = update.size;
                self.shadow = None;
                if let Some(SourceData::Kept(mut kept)) = update.data {
                    if update.src_offset > 0 || update.size < kept.len() {
                        kept = kept[update.src_offset..update.src_offset + update.size].to_vec();
                    }
                    self.shadow = Some(kept);
                }
            } else if let Some(bytes) = bytes {
                device.buffer_sub_data(self.target, update.dst_offset, bytes);
                check_device_error(device, "Buffer::synchronize (sub data)");
                if let Some(shadow) = self.shadow.as_mut() {
                    let region = update
                        .dst_offset
                        .checked_add(bytes.len())
                        .and_then(|end| shadow.get_mut(update.dst_offset..end));
                    match region {
                        Some(region) => region.copy_from_slice(bytes),
                        None => {
                            crate::glc_warn!(
                                SOURCE,
                                "{}: write at {}+{} outside the {} byte shadow copy, shadow dropped",
                                self.desc,
                                update.dst_offset,
                                bytes.len(),
                                shadow.len()
                            );
                            self.shadow = None;
                        }
                    }
                }
            }
        }
    }

    // ===== ELEMENT HELPERS =====

    /// Append the raw bytes of `element` to `bytes`
    pub fn push_element<T: Pod>(bytes: &mut Vec<u8>, element: T) {
        bytes.extend_from_slice(bytemuck::bytes_of(&element));
    }

    /// Read the `index`-th element of type `T` from `bytes`
    pub fn element<T: Pod>(bytes: &[u8], index: usize) -> Option<T> {
        let size = std::mem::size_of::<T>();
        let start = index.checked_mul(size)?;
        let slice = bytes.get(start..start.checked_add(size)?)?;
        Some(bytemuck::pod_read_unaligned(slice))
    }
}

impl DeviceObject for Buffer {
    fn allocate(&mut self, device: &mut dyn Device) -> Result<()> {
        if !self.handle.is_null() {
            crate::glc_bail!(SOURCE, InvalidResource, "{}: already has handle {}", self.desc, self.handle);
        }

        let handle = device.create_buffer();
        check_device_error(device, "Buffer::allocate");
        if handle.is_null() {
            crate::glc_bail!(SOURCE, AllocationFailed, "{}: failed to create buffer", self.desc);
        }

        self.handle = handle;
        Ok(())
    }

    fn release(&mut self, device: &mut dyn Device) {
        self.updates.clear();
        if self.handle.is_null() {
            return;
        }

        device.delete_buffer(self.handle);
        check_device_error(device, "Buffer::release");
        self.handle = Handle::NULL;
        self.size_bytes = 0;
        self.shadow = None;
    }

    fn desc(&self) -> &str {
        &self.desc
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
