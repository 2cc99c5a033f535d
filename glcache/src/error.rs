//! Error types for GLCache
//!
//! Every fallible operation in the crate reports failure inline through
//! [`Result`] and logs the details as a side effect. There is no retry or
//! recovery anywhere in the crate: the caller decides what to do.

use std::fmt;

/// Result type for GLCache operations
pub type Result<T> = std::result::Result<T, Error>;

/// GLCache errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The device failed to produce a non-zero handle for a new object
    AllocationFailed(String),

    /// A call was attempted against an invalid (zero) handle or an object
    /// that is not in a usable state
    InvalidResource(String),

    /// A named shader attribute or uniform does not exist
    NotFound(String),

    /// An argument is out of the range the device or the resource accepts
    InvalidArgument(String),

    /// A shader stage failed to compile (carries the device info log)
    ShaderCompilation(String),

    /// A shader program failed to link (carries the device info log)
    ShaderLink(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AllocationFailed(msg) => write!(f, "Allocation failed: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            Error::ShaderLink(msg) => write!(f, "Shader link failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error with file:line information and return it from the
/// enclosing function.
///
/// ```ignore
/// glc_bail!("glcache::Buffer", InvalidResource, "tried to bind buffer 0");
/// ```
#[macro_export]
macro_rules! glc_bail {
    ($source:expr, $variant:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::glc_error!($source, "{}", message);
        return Err($crate::glc::Error::$variant(message));
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
