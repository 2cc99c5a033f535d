/// Resource lifecycle - reference counting around device objects
///
/// A [`Resource`] wraps any [`DeviceObject`] (buffer, texture, shader
/// program). The first reference allocates the device object and assigns a
/// process-wide [`ResourceId`]; dropping the last reference releases the
/// device object and resets the id to 0, leaving the wrapper reusable.
///
/// Resource ids are never reused, unlike device handles, so they are safe to
/// use as cache keys (see `StateCache::bind_texture`).

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use crate::device::Device;
use crate::error::Result;

/// Process-wide unique resource identifier (0 = no live reference)
pub type ResourceId = u64;

// 0 is reserved for "no resource"
static NEXT_RESOURCE_ID: Mutex<ResourceId> = Mutex::new(1);

fn next_resource_id() -> ResourceId {
    let mut next = match NEXT_RESOURCE_ID.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let id = *next;
    *next += 1;
    id
}

// ===== DEVICE OBJECT =====

/// Allocation and teardown hooks of a device-backed object
pub trait DeviceObject {
    /// Create the device-side object(s)
    ///
    /// On failure the object may hold partial device state; `release` must
    /// be able to clean it up.
    fn allocate(&mut self, device: &mut dyn Device) -> Result<()>;

    /// Delete the device-side object(s). Must be a no-op when nothing is
    /// allocated.
    fn release(&mut self, device: &mut dyn Device);

    /// Description used as log prefix
    fn desc(&self) -> &str;
}

// ===== RESOURCE =====

/// Reference-counted owner of a device object
///
/// Reference counting is not synchronized; a resource is owned by the
/// thread that holds the device context.
#[derive(Debug)]
pub struct Resource<T: DeviceObject> {
    object: T,
    resource_id: ResourceId,
    ref_count: u32,
}

impl<T: DeviceObject> Resource<T> {
    /// Wrap an inert (unallocated) device object
    pub fn new(object: T) -> Self {
        Self {
            object,
            resource_id: 0,
            ref_count: 0,
        }
    }

    /// Add a reference, allocating the device object on the first one
    ///
    /// When allocation fails the reference count stays incremented and the
    /// id stays 0. Later references keep failing until the count drops back
    /// to zero: the device may hold partial state, so there is no silent
    /// retry.
    pub fn add_reference(&mut self, device: &mut dyn Device) -> Result<ResourceId> {
        self.ref_count += 1;

        if self.ref_count > 1 {
            if self.resource_id == 0 {
                crate::glc_bail!(
                    "glcache::Resource",
                    AllocationFailed,
                    "{}: earlier allocation failed, release all references before retrying",
                    self.object.desc()
                );
            }
            return Ok(self.resource_id);
        }

        self.object.allocate(device)?;
        self.resource_id = next_resource_id();
        crate::glc_trace!(
            "glcache::Resource",
            "{}: allocated as resource {}",
            self.object.desc(),
            self.resource_id
        );
        Ok(self.resource_id)
    }

    /// Remove a reference, releasing the device object on the last one
    ///
    /// Extra calls once the count is zero do nothing.
    pub fn remove_reference(&mut self, device: &mut dyn Device) {
        if self.ref_count == 0 {
            return;
        }

        self.ref_count -= 1;
        if self.ref_count == 0 {
            self.object.release(device);
            self.resource_id = 0;
        }
    }

    /// Unique id, 0 while there is no live reference
    pub fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }
}

impl<T: DeviceObject> Deref for Resource<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object
    }
}

impl<T: DeviceObject> DerefMut for Resource<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.object
    }
}

impl<T: DeviceObject> Drop for Resource<T> {
    fn drop(&mut self) {
        if self.ref_count > 0 {
            crate::glc_warn!(
                "glcache::Resource",
                "{}: dropped with {} live reference(s), device object leaked",
                self.object.desc(),
                self.ref_count
            );
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
