/*!
# GLCache

Redundant-call elimination and deferred resource updates for stateful
immediate-mode graphics devices (OpenGL / OpenGL ES 2 style).

Every device call goes through the [`Device`](device::Device) trait, so the
cache and the resources run unchanged against a real context (see the
`glcache_device_gl` crate) or against [`MockDevice`](device::MockDevice).

## Architecture

- **StateCache**: mirrors device state, skips calls that would not change it
- **Implementation**: process-wide snapshot of vendor strings, extensions and limits
- **Resource**: reference counting around buffers, textures and shader programs
- **UpdateQueue**: pending updates, flushed on `synchronize`

With the `device-error-check` feature every device call is followed by an
error flag check.

## Example

```
use glcache::device::{BufferTarget, BufferUsage, MockDevice};
use glcache::resource::{Buffer, BufferUpdate, Resource, SourceData};

let mut device = MockDevice::new();
let mut buffer = Resource::new(Buffer::new(BufferTarget::Array, BufferUsage::Static));
buffer.add_reference(&mut device).unwrap();
buffer.bind(&mut device).unwrap();

buffer.enqueue(BufferUpdate::reupload(SourceData::Owned(vec![0u8; 64])));
buffer.synchronize(&mut device);
assert_eq!(buffer.size_bytes(), 64);
```
*/

// Internal modules
mod error;
mod runtime;
mod utils;
pub mod log;
pub mod config;
pub mod device;
pub mod implementation;
pub mod state;
pub mod resource;

// Main glc namespace module
pub mod glc {
    // Error types
    pub use crate::error::{Error, Result};

    // Process-wide logger access
    pub use crate::runtime::Runtime;

    pub use crate::config::Config;
    pub use crate::implementation::{Implementation, Limits};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device sub-module
    pub mod device {
        pub use crate::device::*;
    }

    // State cache sub-module
    pub mod state {
        pub use crate::state::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }
}

// Re-export math library at crate root
pub use glam;
