/*!
# GLCache - OpenGL Device Backend

OpenGL / OpenGL ES 2 implementation of the `glcache` [`Device`] trait, using
the `gl` crate for function loading.

The context is created by the application (windowing is out of scope); the
backend only needs a function loader for the context made current on the
calling thread.

```no_run
use glcache_device_gl::GlDevice;
# fn get_proc_address(_: &str) -> *const std::ffi::c_void { std::ptr::null() }

// Safety: a context is current on this thread and outlives the device
let mut device = unsafe { GlDevice::load_with(get_proc_address) };
```

[`Device`]: glcache::glc::device::Device
*/

mod gl_device;
mod debug;

pub use gl_device::GlDevice;

// Re-export debug utilities
pub use debug::{get_debug_stats, print_debug_stats_report, DebugConfig, DebugSeverity, DebugStats};
