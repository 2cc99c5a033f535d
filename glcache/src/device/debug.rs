/// Device-reported error checking
///
/// With the `device-error-check` feature enabled, [`check_device_error`]
/// drains the device error flags after a call, logs every error with the
/// context it was raised in and asserts in debug builds. Without the feature
/// the check compiles to nothing, so call sites stay free in release setups.

use crate::device::Device;

pub const NO_ERROR: u32 = 0;
pub const INVALID_ENUM: u32 = 0x0500;
pub const INVALID_VALUE: u32 = 0x0501;
pub const INVALID_OPERATION: u32 = 0x0502;
pub const OUT_OF_MEMORY: u32 = 0x0505;
pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;

/// Upper bound on flags drained per check (a lost context may keep
/// reporting an error forever)
#[cfg(feature = "device-error-check")]
const MAX_DRAINED_ERRORS: usize = 16;

/// Human-readable name of a raw device error
pub fn error_name(error: u32) -> String {
    match error {
        NO_ERROR => "GL_NO_ERROR".to_string(),
        INVALID_ENUM => "GL_INVALID_ENUM".to_string(),
        INVALID_VALUE => "GL_INVALID_VALUE".to_string(),
        INVALID_OPERATION => "GL_INVALID_OPERATION".to_string(),
        OUT_OF_MEMORY => "GL_OUT_OF_MEMORY".to_string(),
        INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION".to_string(),
        other => format!("UNKNOWN ERROR: {}", other),
    }
}

/// Drain and log device errors raised since the last check
///
/// # Arguments
///
/// * `device` - Device to query
/// * `context` - Description of the call(s) being checked (e.g. "Buffer::synchronize")
///
/// # Panics
///
/// In debug builds, when at least one error was pending.
#[cfg(feature = "device-error-check")]
pub fn check_device_error(device: &mut dyn Device, context: &str) {
    let mut error_count = 0;
    for _ in 0..MAX_DRAINED_ERRORS {
        let error = device.get_error();
        if error == NO_ERROR {
            break;
        }
        error_count += 1;
        crate::glc_error!("glcache::device", "{} in {}", error_name(error), context);
    }
    debug_assert!(error_count == 0, "device reported {} error(s) in {}", error_count, context);
}

/// Drain and log device errors raised since the last check (compiled out)
#[cfg(not(feature = "device-error-check"))]
#[inline(always)]
pub fn check_device_error(_device: &mut dyn Device, _context: &str) {}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
