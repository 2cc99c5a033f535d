/// Runtime configuration for device resources

/// Configuration consumed by resources that need platform-dependent choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Line prepended to every shader source when the source does not start
    /// with its own `#version` directive
    pub glsl_version_header: String,
    /// Detach and delete the shader stages right after a successful link.
    /// Some drivers misbehave when this is done, so by default the stages
    /// stay attached until the program is released.
    pub detach_shaders_after_link: bool,
}

impl Default for Config {
    fn default() -> Self {
        let glsl_version_header = if cfg!(any(target_os = "android", target_os = "ios")) {
            "#version 100\n"
        } else {
            "#version 120\n"
        };

        Self {
            glsl_version_header: glsl_version_header.to_string(),
            detach_shaders_after_link: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
