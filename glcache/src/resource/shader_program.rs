//! Shader program: compile, link, reflect, enable
//!
//! Allocation compiles both stages and links them. A program either links
//! completely or leaves no device objects behind; the device info log is
//! logged and carried by the returned error.

use crate::config::Config;
use crate::device::{check_device_error, ActiveVariable, Device, Handle, ShaderStage, UniformValue};
use crate::error::Result;
use crate::resource::lifecycle::DeviceObject;
use crate::resource::uniform::StagedUniform;
use crate::state::StateCache;

const SOURCE: &str = "glcache::ShaderProgram";

#[derive(Debug)]
pub struct ShaderProgram {
    vertex_source: String,
    fragment_source: String,
    config: Config,
    program: Handle,
    /// Stage handles, NULL once detached after link
    vertex_shader: Handle,
    fragment_shader: Handle,
    attributes: Vec<ActiveVariable>,
    uniforms: Vec<ActiveVariable>,
    desc: String,
}

impl ShaderProgram {
    pub fn new(vertex_source: &str, fragment_source: &str) -> Self {
        Self {
            vertex_source: vertex_source.to_string(),
            fragment_source: fragment_source.to_string(),
            config: Config::default(),
            program: Handle::NULL,
            vertex_shader: Handle::NULL,
            fragment_shader: Handle::NULL,
            attributes: Vec::new(),
            uniforms: Vec::new(),
            desc: "ShaderProgram".to_string(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_desc(mut self, desc: &str) -> Self {
        self.desc = format!("ShaderProgram: {}", desc);
        self
    }

    pub fn handle(&self) -> Handle {
        self.program
    }

    pub fn is_linked(&self) -> bool {
        !self.program.is_null()
    }

    /// Active attributes reported at link time
    pub fn attributes(&self) -> &[ActiveVariable] {
        &self.attributes
    }

    /// Active uniforms reported at link time
    pub fn uniforms(&self) -> &[ActiveVariable] {
        &self.uniforms
    }

    /// Location of the named attribute
    pub fn attribute_location(&self, name: &str) -> Result<i32> {
        match self.attributes.iter().find(|attribute| attribute.name == name) {
            Some(attribute) => Ok(attribute.location),
            None => crate::glc_bail!(SOURCE, NotFound, "{}: no active attribute named '{}'", self.desc, name),
        }
    }

    /// Location of the named uniform
    pub fn uniform_location(&self, name: &str) -> Result<i32> {
        match self.uniforms.iter().find(|uniform| uniform.name == name) {
            Some(uniform) => Ok(uniform.location),
            None => crate::glc_bail!(SOURCE, NotFound, "{}: no active uniform named '{}'", self.desc, name),
        }
    }

    /// Make the program current and enable exactly the attribute arrays it
    /// uses
    pub fn enable(&self, device: &mut dyn Device, state: &mut StateCache) -> Result<()> {
        if self.program.is_null() {
            crate::glc_bail!(SOURCE, InvalidResource, "{}: tried to enable program 0", self.desc);
        }

        state.set_program(device, self.program);
        for location in 0..state.vertex_attrib_count() {
            let used = self
                .attributes
                .iter()
                .any(|attribute| attribute.location >= 0 && attribute.location as u32 == location);
            state.set_vertex_attrib_array(device, location, used)?;
        }
        Ok(())
    }

    /// Clear the current program
    pub fn disable(&self, device: &mut dyn Device, state: &mut StateCache) {
        state.set_program(device, Handle::NULL);
    }

    /// Upload a uniform of the current program by name
    pub fn set_uniform(&self, device: &mut dyn Device, name: &str, value: UniformValue<'_>) -> Result<()> {
        let location = self.uniform_location(name)?;
        device.set_uniform(location, value);
        check_device_error(device, value.call_name());
        Ok(())
    }

    /// Commit every staged uniform and upload it to this program
    ///
    /// The program must be current. Stops at the first uniform the program
    /// does not have; the uniforms before it are already uploaded.
    pub fn sync_uniforms<'a>(
        &self,
        device: &mut dyn Device,
        uniforms: impl IntoIterator<Item = &'a mut dyn StagedUniform>,
    ) -> Result<()> {
        for uniform in uniforms {
            uniform.sync();
            uniform.upload(device, self)?;
        }
        Ok(())
    }

    /// Source with the configured version header, unless it has its own
    fn versioned_source(&self, source: &str) -> String {
        if source.trim_start().starts_with("#version") {
            source.to_string()
        } else {
            format!("{}{}", self.config.glsl_version_header, source)
        }
    }

    fn compile_stage(&self, device: &mut dyn Device, stage: ShaderStage) -> Result<Handle> {
        let source = match stage {
            ShaderStage::Vertex => self.versioned_source(&self.vertex_source),
            ShaderStage::Fragment => self.versioned_source(&self.fragment_source),
        };

        let shader = device.create_shader(stage);
        check_device_error(device, "ShaderProgram::compile_stage");
        if shader.is_null() {
            crate::glc_bail!(SOURCE, AllocationFailed, "{}: failed to create {:?} shader", self.desc, stage);
        }

        device.shader_source(shader, &source);
        if !device.compile_shader(shader) {
            let info_log = device.shader_info_log(shader);
            device.delete_shader(shader);
            crate::glc_bail!(
                SOURCE,
                ShaderCompilation,
                "{}: failed to compile {:?} shader: {}",
                self.desc,
                stage,
                info_log
            );
        }
        check_device_error(device, "ShaderProgram::compile_stage");
        Ok(shader)
    }
}

impl DeviceObject for ShaderProgram {
    fn allocate(&mut self, device: &mut dyn Device) -> Result<()> {
        if !self.program.is_null() {
            crate::glc_bail!(SOURCE, InvalidResource, "{}: already linked as {}", self.desc, self.program);
        }

        let vertex = self.compile_stage(device, ShaderStage::Vertex)?;
        let fragment = match self.compile_stage(device, ShaderStage::Fragment) {
            Ok(fragment) => fragment,
            Err(err) => {
                device.delete_shader(vertex);
                return Err(err);
            }
        };

        let program = device.create_program();
        if program.is_null() {
            device.delete_shader(vertex);
            device.delete_shader(fragment);
            crate::glc_bail!(SOURCE, AllocationFailed, "{}: failed to create program", self.desc);
        }

        device.attach_shader(program, vertex);
        device.attach_shader(program, fragment);
        if !device.link_program(program) {
            let mut info_log = device.program_info_log(program);
            if info_log.is_empty() {
                info_log = "no info log available".to_string();
            }
            device.delete_program(program);
            device.delete_shader(vertex);
            device.delete_shader(fragment);
            crate::glc_bail!(SOURCE, ShaderLink, "{}: failed to link: {}", self.desc, info_log);
        }

        self.attributes = device.active_attributes(program);
        self.uniforms = device.active_uniforms(program);

        if self.config.detach_shaders_after_link {
            device.detach_shader(program, vertex);
            device.detach_shader(program, fragment);
            device.delete_shader(vertex);
            device.delete_shader(fragment);
        } else {
            self.vertex_shader = vertex;
            self.fragment_shader = fragment;
        }
        check_device_error(device, "ShaderProgram::allocate");

        self.program = program;
        crate::glc_debug!(
            SOURCE,
            "{}: linked program {} ({} attributes, {} uniforms)",
            self.desc,
            program,
            self.attributes.len(),
            self.uniforms.len()
        );
        Ok(())
    }

    fn release(&mut self, device: &mut dyn Device) {
        for shader in [&mut self.vertex_shader, &mut self.fragment_shader] {
            if !shader.is_null() {
                device.delete_shader(*shader);
                *shader = Handle::NULL;
            }
        }
        if !self.program.is_null() {
            device.delete_program(self.program);
            self.program = Handle::NULL;
        }
        check_device_error(device, "ShaderProgram::release");

        self.attributes.clear();
        self.uniforms.clear();
    }

    fn desc(&self) -> &str {
        &self.desc
    }
}

#[cfg(test)]
#[path = "shader_program_tests.rs"]
mod tests;
