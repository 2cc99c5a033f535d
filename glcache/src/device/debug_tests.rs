use super::*;
use crate::device::MockDevice;

// ============================================================================
// Error names
// ============================================================================

#[test]
fn test_error_name_known_errors() {
    assert_eq!(error_name(NO_ERROR), "GL_NO_ERROR");
    assert_eq!(error_name(INVALID_ENUM), "GL_INVALID_ENUM");
    assert_eq!(error_name(INVALID_VALUE), "GL_INVALID_VALUE");
    assert_eq!(error_name(INVALID_OPERATION), "GL_INVALID_OPERATION");
    assert_eq!(error_name(OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
    assert_eq!(error_name(INVALID_FRAMEBUFFER_OPERATION), "GL_INVALID_FRAMEBUFFER_OPERATION");
}

#[test]
fn test_error_name_unknown_error() {
    assert_eq!(error_name(0x1234), "UNKNOWN ERROR: 4660");
}

// ============================================================================
// Error checking
// ============================================================================

#[test]
fn test_check_without_errors_is_silent() {
    let mut device = MockDevice::new();
    check_device_error(&mut device, "test");
    assert_eq!(device.pending_error_count(), 0);
}

#[cfg(not(feature = "device-error-check"))]
#[test]
fn test_check_compiled_out_issues_no_calls() {
    let mut device = MockDevice::new();
    device.push_error(INVALID_VALUE);

    check_device_error(&mut device, "test");

    assert_eq!(device.call_count("get_error"), 0);
    assert_eq!(device.pending_error_count(), 1);
}

#[cfg(feature = "device-error-check")]
#[test]
fn test_check_queries_error_flag() {
    let mut device = MockDevice::new();
    check_device_error(&mut device, "test");
    assert_eq!(device.call_count("get_error"), 1);
}

#[cfg(all(feature = "device-error-check", debug_assertions))]
#[test]
#[should_panic(expected = "device reported 2 error(s) in upload")]
fn test_check_asserts_on_pending_errors() {
    let mut device = MockDevice::new();
    device.push_error(INVALID_VALUE);
    device.push_error(INVALID_OPERATION);

    check_device_error(&mut device, "upload");
}
