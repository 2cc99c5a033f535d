/// Implementation snapshot - vendor strings, extensions and numeric limits
///
/// Captured once per process from the first device made current. The state
/// cache sizes its texture unit and vertex attribute tables from it, and
/// resources consult it to gate optional features (depth textures).

use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::FxHashSet;

use crate::device::{Device, DeviceString, Limit};

/// Process-wide snapshot, set by the first `capture`
static IMPLEMENTATION: Mutex<Option<Arc<Implementation>>> = Mutex::new(None);

fn snapshot_lock() -> MutexGuard<'static, Option<Arc<Implementation>>> {
    match IMPLEMENTATION.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Numeric implementation limits (negative reports clamp to zero)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_texture_size: u32,
    pub max_cube_map_texture_size: u32,
    pub max_vertex_attribs: u32,
    pub max_vertex_uniform_vectors: u32,
    pub max_varying_vectors: u32,
    pub max_combined_texture_image_units: u32,
    pub max_vertex_texture_image_units: u32,
    pub max_texture_image_units: u32,
    pub max_fragment_uniform_vectors: u32,
    pub max_renderbuffer_size: u32,
}

/// Read-only description of the device implementation
#[derive(Debug, Clone, Default)]
pub struct Implementation {
    vendor: String,
    renderer: String,
    version: String,
    shading_language_version: String,
    extensions: FxHashSet<String>,
    limits: Limits,
}

impl Implementation {
    /// Query every description string, the extension set and the limits
    pub fn from_device(device: &mut dyn Device) -> Self {
        let mut query = |limit: Limit| device.get_limit(limit).max(0) as u32;
        let limits = Limits {
            max_texture_size: query(Limit::MaxTextureSize),
            max_cube_map_texture_size: query(Limit::MaxCubeMapTextureSize),
            max_vertex_attribs: query(Limit::MaxVertexAttribs),
            max_vertex_uniform_vectors: query(Limit::MaxVertexUniformVectors),
            max_varying_vectors: query(Limit::MaxVaryingVectors),
            max_combined_texture_image_units: query(Limit::MaxCombinedTextureImageUnits),
            max_vertex_texture_image_units: query(Limit::MaxVertexTextureImageUnits),
            max_texture_image_units: query(Limit::MaxTextureImageUnits),
            max_fragment_uniform_vectors: query(Limit::MaxFragmentUniformVectors),
            max_renderbuffer_size: query(Limit::MaxRenderbufferSize),
        };

        Self {
            vendor: device.get_string(DeviceString::Vendor),
            renderer: device.get_string(DeviceString::Renderer),
            version: device.get_string(DeviceString::Version),
            shading_language_version: device.get_string(DeviceString::ShadingLanguageVersion),
            extensions: device.get_extensions().into_iter().collect(),
            limits,
        }
    }

    /// Capture the process-wide snapshot from `device`
    ///
    /// Only the first call queries the device; later calls return the
    /// snapshot already captured.
    pub fn capture(device: &mut dyn Device) -> Arc<Implementation> {
        let mut slot = snapshot_lock();
        if let Some(implementation) = slot.as_ref() {
            return Arc::clone(implementation);
        }

        let implementation = Arc::new(Self::from_device(device));
        crate::glc_info!(
            "glcache::Implementation",
            "Captured {} / {} ({}), GLSL {}",
            implementation.vendor,
            implementation.renderer,
            implementation.version,
            implementation.shading_language_version
        );
        crate::glc_debug!(
            "glcache::Implementation",
            "{} extensions, {} texture units, {} vertex attributes",
            implementation.extensions.len(),
            implementation.limits.max_combined_texture_image_units,
            implementation.limits.max_vertex_attribs
        );

        *slot = Some(Arc::clone(&implementation));
        implementation
    }

    /// The captured snapshot, if `capture` ran already
    pub fn get() -> Option<Arc<Implementation>> {
        snapshot_lock().clone()
    }

    /// Forget the captured snapshot (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        *snapshot_lock() = None;
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn renderer(&self) -> &str {
        &self.renderer
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn shading_language_version(&self) -> &str {
        &self.shading_language_version
    }

    pub fn extensions(&self) -> &FxHashSet<String> {
        &self.extensions
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Whether the named extension is supported
    pub fn extension_exists(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Whether at least one of the named extensions is supported
    pub fn any_extension_exists(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.extension_exists(name))
    }
}

#[cfg(test)]
#[path = "implementation_tests.rs"]
mod tests;
