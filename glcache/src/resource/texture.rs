//! 2D texture with deferred image uploads
//!
//! Image data is staged through [`ImageUpdate`]s and pushed by
//! [`Texture2D::synchronize`]. Binding goes through the [`StateCache`] so
//! redundant unit switches and binds are skipped.

use glam::UVec2;

use crate::device::{
    check_device_error, Device, Handle, PixelStore, TextureFilter, TextureFormat, TextureParameter,
    TextureTarget, TextureWrap,
};
use crate::error::Result;
use crate::implementation::Implementation;
use crate::resource::lifecycle::{DeviceObject, Resource};
use crate::resource::update_queue::{PendingUpdate, SourceData, UpdateFlags, UpdateQueue};
use crate::state::StateCache;

const SOURCE: &str = "glcache::Texture2D";

// ===== IMAGE UPDATE =====

/// A pending write to level 0 of a texture
#[derive(Debug, Clone)]
pub struct ImageUpdate {
    pub flags: UpdateFlags,
    /// Region origin in pixels (ignored by full replaces)
    pub offset: UVec2,
    /// Region size in pixels (new image size for full replaces)
    pub extent: UVec2,
    /// Tightly packed pixels, `None` to allocate with unspecified contents
    pub data: Option<SourceData>,
}

impl ImageUpdate {
    /// Replace the whole image with `data`
    pub fn reupload(extent: UVec2, data: SourceData) -> Self {
        Self {
            flags: UpdateFlags::REUPLOAD | data.flags(),
            offset: UVec2::ZERO,
            extent,
            data: Some(data),
        }
    }

    /// (Re)allocate an image of `extent` pixels with unspecified contents
    pub fn allocate(extent: UVec2) -> Self {
        Self {
            flags: UpdateFlags::REUPLOAD,
            offset: UVec2::ZERO,
            extent,
            data: None,
        }
    }

    /// Overwrite the region at `offset` of size `extent`
    pub fn region(offset: UVec2, extent: UVec2, data: SourceData) -> Self {
        Self {
            flags: data.flags(),
            offset,
            extent,
            data: Some(data),
        }
    }
}

impl PendingUpdate for ImageUpdate {
    fn is_full_replace(&self) -> bool {
        self.flags.contains(UpdateFlags::REUPLOAD) || self.data.is_none()
    }
}

// ===== TEXTURE 2D =====

#[derive(Debug)]
pub struct Texture2D {
    format: TextureFormat,
    min_filter: TextureFilter,
    mag_filter: TextureFilter,
    wrap_s: TextureWrap,
    wrap_t: TextureWrap,
    handle: Handle,
    /// Image size committed by the last applied full replace
    extent: Option<UVec2>,
    updates: UpdateQueue<ImageUpdate>,
    desc: String,
}

impl Texture2D {
    /// Create an unallocated texture (linear filtering, clamped to edge)
    pub fn new(format: TextureFormat) -> Self {
        Self {
            format,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            handle: Handle::NULL,
            extent: None,
            updates: UpdateQueue::new(),
            desc: "Texture2D".to_string(),
        }
    }

    pub fn with_filters(mut self, min_filter: TextureFilter, mag_filter: TextureFilter) -> Self {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
        self
    }

    pub fn with_wrap(mut self, wrap_s: TextureWrap, wrap_t: TextureWrap) -> Self {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
        self
    }

    pub fn with_desc(mut self, desc: &str) -> Self {
        self.desc = format!("Texture2D: {}", desc);
        self
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Committed image size (`None` before the first full replace)
    pub fn extent(&self) -> Option<UVec2> {
        self.extent
    }

    pub fn pending_updates(&self) -> &UpdateQueue<ImageUpdate> {
        &self.updates
    }

    /// Queue an update for the next `synchronize`
    pub fn enqueue(&mut self, update: ImageUpdate) {
        self.updates.enqueue(update);
    }

    /// Apply every pending update in enqueue order, then empty the queue
    ///
    /// The texture must be bound to the active unit. Sampling parameters are
    /// (re)applied once after the pass when it contained a full replace.
    pub fn synchronize(&mut self, device: &mut dyn Device, state: &mut StateCache) {
        let mut replaced = false;

        for update in self.updates.take() {
            if !update.is_full_replace() && (update.extent.x == 0 || update.extent.y == 0) {
                continue;
            }

            let expected = self.format.image_size_bytes(update.extent.x, update.extent.y);
            let pixels = match &update.data {
                Some(data) if data.len() < expected => {
                    crate::glc_error!(
                        SOURCE,
                        "{}: {}x{} update needs {} bytes, got {}, update skipped",
                        self.desc,
                        update.extent.x,
                        update.extent.y,
                        expected,
                        data.len()
                    );
                    continue;
                }
                Some(data) => Some(&data.bytes()[..expected]),
                None => None,
            };

            if pixels.is_some() {
                let row_bytes = (update.extent.x as usize).saturating_mul(self.format.bytes_per_pixel() as usize);
                state.set_pixel_alignment(device, PixelStore::UnpackAlignment, unpack_alignment(row_bytes));
            }

            if update.is_full_replace() {
                device.tex_image_2d(TextureTarget::Texture2D, self.format, update.extent.x, update.extent.y, pixels);
                check_device_error(device, "Texture2D::synchronize (image)");
                self.extent = Some(update.extent);
                replaced = true;
            } else if let Some(pixels) = pixels {
                device.tex_sub_image_2d(
                    TextureTarget::Texture2D,
                    update.offset.x,
                    update.offset.y,
                    update.extent.x,
                    update.extent.y,
                    self.format,
                    pixels,
                );
                check_device_error(device, "Texture2D::synchronize (sub image)");
            }
        }

        if replaced {
            self.apply_sampling(device);
        }
    }

    fn apply_sampling(&self, device: &mut dyn Device) {
        let target = TextureTarget::Texture2D;
        device.tex_parameter(target, TextureParameter::MinFilter, self.min_filter.raw());
        device.tex_parameter(target, TextureParameter::MagFilter, self.mag_filter.raw());
        device.tex_parameter(target, TextureParameter::WrapS, self.wrap_s.raw());
        device.tex_parameter(target, TextureParameter::WrapT, self.wrap_t.raw());
        check_device_error(device, "Texture2D::apply_sampling");
    }
}

/// Largest of 4, 2, 1 that divides the row size
fn unpack_alignment(row_bytes: usize) -> i32 {
    if row_bytes % 4 == 0 {
        4
    } else if row_bytes % 2 == 0 {
        2
    } else {
        1
    }
}

impl DeviceObject for Texture2D {
    fn allocate(&mut self, device: &mut dyn Device) -> Result<()> {
        if !self.handle.is_null() {
            crate::glc_bail!(SOURCE, InvalidResource, "{}: already has handle {}", self.desc, self.handle);
        }

        let required = self.format.required_extensions();
        if !required.is_empty() {
            let supported = Implementation::get()
                .is_some_and(|implementation| implementation.any_extension_exists(required));
            if !supported {
                crate::glc_error!(
                    SOURCE,
                    "{}: format {:?} needs one of {:?}, which the device does not report",
                    self.desc,
                    self.format,
                    required
                );
            }
        }

        let handle = device.create_texture();
        check_device_error(device, "Texture2D::allocate");
        if handle.is_null() {
            crate::glc_bail!(SOURCE, AllocationFailed, "{}: failed to create texture", self.desc);
        }

        self.handle = handle;
        Ok(())
    }

    fn release(&mut self, device: &mut dyn Device) {
        self.updates.clear();
        if self.handle.is_null() {
            return;
        }

        device.delete_texture(self.handle);
        check_device_error(device, "Texture2D::release");
        self.handle = Handle::NULL;
        self.extent = None;
    }

    fn desc(&self) -> &str {
        &self.desc
    }
}

impl Resource<Texture2D> {
    /// Bind to `unit` through the state cache, keyed by the resource id
    pub fn bind(&self, device: &mut dyn Device, state: &mut StateCache, unit: u32) -> Result<()> {
        if self.handle().is_null() {
            crate::glc_bail!(SOURCE, InvalidResource, "{}: tried to bind with texture 0", self.desc());
        }
        state.bind_texture(device, unit, TextureTarget::Texture2D, self.handle(), self.resource_id())
    }

    /// Clear `unit` if this texture is bound there (or the binding is unknown)
    pub fn unbind(&self, device: &mut dyn Device, state: &mut StateCache, unit: u32) -> Result<()> {
        match state.bound_texture(unit) {
            Some(bound) if bound != self.resource_id() => Ok(()),
            _ => state.unbind_texture(device, unit, TextureTarget::Texture2D),
        }
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
