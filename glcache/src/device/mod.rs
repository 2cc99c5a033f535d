/// Device module - the command interface, its typed vocabulary, an in-memory
/// implementation and error checking

pub mod types;
pub mod device;
pub mod mock_device;
pub mod debug;

pub use types::*;
pub use device::Device;
pub use mock_device::MockDevice;
pub use debug::{
    check_device_error, error_name, INVALID_ENUM, INVALID_FRAMEBUFFER_OPERATION,
    INVALID_OPERATION, INVALID_VALUE, NO_ERROR, OUT_OF_MEMORY,
};
