use crate::device::Handle;

/// Hands out non-zero device handles and recycles released ones.
///
/// Released handles go on a free list and are handed out again before any
/// fresh value, the way drivers reuse object names after deletion. Zero is
/// never produced.
///
/// # Example
///
/// ```ignore
/// let mut handles = HandleAllocator::new();
/// let a = handles.alloc();  // Handle(1)
/// let b = handles.alloc();  // Handle(2)
/// handles.release(a);
/// let c = handles.alloc();  // Handle(1) again
/// ```
#[derive(Debug, Default)]
pub struct HandleAllocator {
    free_list: Vec<u32>,
    next: u32,
    live: u32,
}

impl HandleAllocator {
    /// Create an allocator with no live handles
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle, preferring the most recently released one
    pub fn alloc(&mut self) -> Handle {
        self.live += 1;
        let raw = self.free_list.pop().unwrap_or_else(|| {
            self.next += 1;
            self.next
        });
        Handle(raw)
    }

    /// Return a handle for reuse. Returns false for the null handle or a
    /// handle that is not currently live.
    pub fn release(&mut self, handle: Handle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        self.live -= 1;
        self.free_list.push(handle.raw());
        true
    }

    /// Whether `handle` was allocated and not yet released
    pub fn is_live(&self, handle: Handle) -> bool {
        !handle.is_null() && handle.raw() <= self.next && !self.free_list.contains(&handle.raw())
    }

    /// Number of live handles
    pub fn len(&self) -> u32 {
        self.live
    }
}

#[cfg(test)]
#[path = "handle_allocator_tests.rs"]
mod tests;
