/// GlDevice - `Device` implementation over a current OpenGL context

use gl::types::{GLchar, GLenum, GLint, GLintptr, GLsizei, GLsizeiptr, GLubyte};
use glcache::glc::device::{
    ActiveVariable, BlendEquation, BlendFactor, BufferTarget, BufferUsage, Capability, CompareFunc,
    Device, DeviceString, Face, Handle, Limit, PixelStore, ShaderStage, StateParam, StencilOp,
    TextureFormat, TextureParameter, TextureTarget, UniformValue,
};
use std::ffi::{c_void, CStr, CString};
use std::marker::PhantomData;

use crate::debug::{self, DebugConfig};

const SOURCE: &str = "glcache::GlDevice";

/// OpenGL device bound to the context current on the creating thread
///
/// Every call goes straight to the driver. The device is neither `Send` nor
/// `Sync`: the context it drives is current on one thread only.
pub struct GlDevice {
    _thread_bound: PhantomData<*const ()>,
}

impl GlDevice {
    /// Load the GL entry points and create the device
    ///
    /// # Safety
    ///
    /// A context must be current on the calling thread for as long as the
    /// device is used, and `loader` must return that context's entry points.
    pub unsafe fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self { _thread_bound: PhantomData }
    }

    /// Route KHR_debug messages into the glcache logger
    ///
    /// Returns false when the context does not expose debug output.
    pub fn enable_debug_output(&mut self, config: DebugConfig) -> bool {
        if !gl::DebugMessageCallback::is_loaded() {
            glcache::glc_warn!(SOURCE, "Debug output is not supported by this context");
            return false;
        }

        debug::init_debug_config(config);
        unsafe {
            gl::Enable(gl::DEBUG_OUTPUT);
            gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
            gl::DebugMessageCallback(Some(debug::gl_debug_callback), std::ptr::null());
        }
        true
    }

    fn active_variables(&mut self, program: Handle, attributes: bool) -> Vec<ActiveVariable> {
        let (count_param, length_param) = if attributes {
            (gl::ACTIVE_ATTRIBUTES, gl::ACTIVE_ATTRIBUTE_MAX_LENGTH)
        } else {
            (gl::ACTIVE_UNIFORMS, gl::ACTIVE_UNIFORM_MAX_LENGTH)
        };

        let mut count = 0;
        let mut max_length = 0;
        unsafe {
            gl::GetProgramiv(program.raw(), count_param, &mut count);
            gl::GetProgramiv(program.raw(), length_param, &mut max_length);
        }

        let mut buffer = vec![0u8; max_length.max(1) as usize];
        (0..count.max(0) as u32)
            .map(|index| {
                let mut written: GLsizei = 0;
                let mut size: GLint = 0;
                let mut kind: GLenum = 0;
                let name_ptr = buffer.as_mut_ptr() as *mut GLchar;
                let capacity = buffer.len() as GLsizei;
                unsafe {
                    if attributes {
                        gl::GetActiveAttrib(program.raw(), index, capacity, &mut written, &mut size, &mut kind, name_ptr);
                    } else {
                        gl::GetActiveUniform(program.raw(), index, capacity, &mut written, &mut size, &mut kind, name_ptr);
                    }
                }

                let length = (written.max(0) as usize).min(buffer.len());
                let name = variable_base_name(&String::from_utf8_lossy(&buffer[..length]));
                let location = match CString::new(name.as_str()) {
                    Ok(c_name) => unsafe {
                        if attributes {
                            gl::GetAttribLocation(program.raw(), c_name.as_ptr())
                        } else {
                            gl::GetUniformLocation(program.raw(), c_name.as_ptr())
                        }
                    },
                    Err(_) => -1,
                };

                ActiveVariable { name, location, kind, size }
            })
            .collect()
    }
}

/// Strip the `[0]` suffix drivers report for array uniforms
fn variable_base_name(name: &str) -> String {
    name.strip_suffix("[0]").unwrap_or(name).to_string()
}

/// Copy a driver-owned string (`None` for a null pointer)
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn read_gl_string(ptr: *const GLubyte) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr as *const std::ffi::c_char).to_string_lossy().into_owned())
}

fn data_ptr(data: Option<&[u8]>) -> *const c_void {
    data.map_or(std::ptr::null(), |data| data.as_ptr() as *const c_void)
}

fn upload_floats(location: GLint, components: usize, values: &[f32]) {
    let count = (values.len() / components) as GLsizei;
    let values = values.as_ptr();
    unsafe {
        match components {
            1 => gl::Uniform1fv(location, count, values),
            2 => gl::Uniform2fv(location, count, values),
            3 => gl::Uniform3fv(location, count, values),
            4 => gl::Uniform4fv(location, count, values),
            _ => gl::UniformMatrix4fv(location, count, gl::FALSE, values),
        }
    }
}

impl Device for GlDevice {
    // ===== ERRORS =====

    fn get_error(&mut self) -> u32 {
        unsafe { gl::GetError() }
    }

    // ===== QUERIES =====

    fn get_string(&mut self, name: DeviceString) -> String {
        unsafe { read_gl_string(gl::GetString(name.raw())) }.unwrap_or_default()
    }

    fn get_extensions(&mut self) -> Vec<String> {
        if gl::GetStringi::is_loaded() {
            let mut count = 0;
            unsafe { gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut count) };
            (0..count.max(0) as u32)
                .filter_map(|index| unsafe { read_gl_string(gl::GetStringi(gl::EXTENSIONS, index)) })
                .collect()
        } else {
            unsafe { read_gl_string(gl::GetString(gl::EXTENSIONS)) }
                .map(|list| list.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default()
        }
    }

    fn get_integer(&mut self, param: StateParam) -> i32 {
        let mut value = 0;
        unsafe { gl::GetIntegerv(param.raw(), &mut value) };
        value
    }

    fn get_limit(&mut self, limit: Limit) -> i32 {
        let mut value = 0;
        unsafe { gl::GetIntegerv(limit.raw(), &mut value) };
        value
    }

    fn get_float(&mut self, param: StateParam) -> f32 {
        let mut value = 0.0;
        unsafe { gl::GetFloatv(param.raw(), &mut value) };
        value
    }

    fn get_float_array(&mut self, param: StateParam, out: &mut [f32]) {
        // Large enough for any float state the cache reads
        let mut values = [0.0f32; 16];
        unsafe { gl::GetFloatv(param.raw(), values.as_mut_ptr()) };
        let count = out.len().min(values.len());
        out[..count].copy_from_slice(&values[..count]);
    }

    fn is_enabled(&mut self, capability: Capability) -> bool {
        unsafe { gl::IsEnabled(capability.raw()) == gl::TRUE }
    }

    fn is_vertex_attrib_array_enabled(&mut self, index: u32) -> bool {
        let mut value = 0;
        unsafe { gl::GetVertexAttribiv(index, gl::VERTEX_ATTRIB_ARRAY_ENABLED, &mut value) };
        value != 0
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Handle {
        let mut buffer = 0;
        unsafe { gl::GenBuffers(1, &mut buffer) };
        Handle(buffer)
    }

    fn delete_buffer(&mut self, buffer: Handle) {
        unsafe { gl::DeleteBuffers(1, &buffer.raw()) };
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Handle) {
        unsafe { gl::BindBuffer(target.raw(), buffer.raw()) };
    }

    fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        unsafe { gl::BufferData(target.raw(), size as GLsizeiptr, data_ptr(data), usage.raw()) };
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe {
            gl::BufferSubData(
                target.raw(),
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            )
        };
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> Handle {
        let mut texture = 0;
        unsafe { gl::GenTextures(1, &mut texture) };
        Handle(texture)
    }

    fn delete_texture(&mut self, texture: Handle) {
        unsafe { gl::DeleteTextures(1, &texture.raw()) };
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) };
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Handle) {
        unsafe { gl::BindTexture(target.raw(), texture.raw()) };
    }

    fn tex_image_2d(
        &mut self,
        target: TextureTarget,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) {
        unsafe {
            gl::TexImage2D(
                target.raw(),
                0,
                format.pixel_format() as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                format.pixel_format(),
                format.data_type(),
                data_ptr(data),
            )
        };
    }

    fn tex_sub_image_2d(
        &mut self,
        target: TextureTarget,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) {
        unsafe {
            gl::TexSubImage2D(
                target.raw(),
                0,
                x as GLint,
                y as GLint,
                width as GLsizei,
                height as GLsizei,
                format.pixel_format(),
                format.data_type(),
                data.as_ptr() as *const c_void,
            )
        };
    }

    fn tex_parameter(&mut self, target: TextureTarget, param: TextureParameter, value: u32) {
        unsafe { gl::TexParameteri(target.raw(), param.raw(), value as GLint) };
    }

    // ===== SHADERS AND PROGRAMS =====

    fn create_shader(&mut self, stage: ShaderStage) -> Handle {
        Handle(unsafe { gl::CreateShader(stage.raw()) })
    }

    fn shader_source(&mut self, shader: Handle, source: &str) {
        let text = source.as_ptr() as *const GLchar;
        let length = source.len() as GLint;
        unsafe { gl::ShaderSource(shader.raw(), 1, &text, &length) };
    }

    fn compile_shader(&mut self, shader: Handle) -> bool {
        let mut status = 0;
        unsafe {
            gl::CompileShader(shader.raw());
            gl::GetShaderiv(shader.raw(), gl::COMPILE_STATUS, &mut status);
        }
        status != 0
    }

    fn shader_info_log(&mut self, shader: Handle) -> String {
        let mut length = 0;
        unsafe { gl::GetShaderiv(shader.raw(), gl::INFO_LOG_LENGTH, &mut length) };
        if length <= 0 {
            return String::new();
        }

        let mut buffer = vec![0u8; length as usize];
        let mut written = 0;
        unsafe { gl::GetShaderInfoLog(shader.raw(), length, &mut written, buffer.as_mut_ptr() as *mut GLchar) };
        buffer.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn delete_shader(&mut self, shader: Handle) {
        unsafe { gl::DeleteShader(shader.raw()) };
    }

    fn create_program(&mut self) -> Handle {
        Handle(unsafe { gl::CreateProgram() })
    }

    fn attach_shader(&mut self, program: Handle, shader: Handle) {
        unsafe { gl::AttachShader(program.raw(), shader.raw()) };
    }

    fn detach_shader(&mut self, program: Handle, shader: Handle) {
        unsafe { gl::DetachShader(program.raw(), shader.raw()) };
    }

    fn link_program(&mut self, program: Handle) -> bool {
        let mut status = 0;
        unsafe {
            gl::LinkProgram(program.raw());
            gl::GetProgramiv(program.raw(), gl::LINK_STATUS, &mut status);
        }
        status != 0
    }

    fn program_info_log(&mut self, program: Handle) -> String {
        let mut length = 0;
        unsafe { gl::GetProgramiv(program.raw(), gl::INFO_LOG_LENGTH, &mut length) };
        if length <= 0 {
            return String::new();
        }

        let mut buffer = vec![0u8; length as usize];
        let mut written = 0;
        unsafe { gl::GetProgramInfoLog(program.raw(), length, &mut written, buffer.as_mut_ptr() as *mut GLchar) };
        buffer.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn use_program(&mut self, program: Handle) {
        unsafe { gl::UseProgram(program.raw()) };
    }

    fn delete_program(&mut self, program: Handle) {
        unsafe { gl::DeleteProgram(program.raw()) };
    }

    fn active_attributes(&mut self, program: Handle) -> Vec<ActiveVariable> {
        self.active_variables(program, true)
    }

    fn active_uniforms(&mut self, program: Handle) -> Vec<ActiveVariable> {
        self.active_variables(program, false)
    }

    fn set_uniform(&mut self, location: i32, value: UniformValue<'_>) {
        match value {
            UniformValue::Int(value) => unsafe { gl::Uniform1i(location, value) },
            UniformValue::IntArray(values) => unsafe {
                gl::Uniform1iv(location, values.len() as GLsizei, values.as_ptr())
            },
            UniformValue::Float(value) => upload_floats(location, 1, &[value]),
            UniformValue::Vec2(value) => upload_floats(location, 2, &value.to_array()),
            UniformValue::Vec3(value) => upload_floats(location, 3, &value.to_array()),
            UniformValue::Vec4(value) => upload_floats(location, 4, &value.to_array()),
            UniformValue::Mat4(value) => upload_floats(location, 16, &value.to_cols_array()),
            UniformValue::FloatArray(values) => upload_floats(location, 1, values),
            UniformValue::Vec2Array(values) => upload_floats(location, 2, bytemuck::cast_slice(values)),
            UniformValue::Vec3Array(values) => upload_floats(location, 3, bytemuck::cast_slice(values)),
            UniformValue::Vec4Array(values) => upload_floats(location, 4, bytemuck::cast_slice(values)),
            UniformValue::Mat4Array(values) => upload_floats(location, 16, bytemuck::cast_slice(values)),
        }
    }

    // ===== STATE =====

    fn enable(&mut self, capability: Capability) {
        unsafe { gl::Enable(capability.raw()) };
    }

    fn disable(&mut self, capability: Capability) {
        unsafe { gl::Disable(capability.raw()) };
    }

    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        unsafe { gl::BlendFuncSeparate(src_rgb.raw(), dst_rgb.raw(), src_alpha.raw(), dst_alpha.raw()) };
    }

    fn blend_equation_separate(&mut self, rgb: BlendEquation, alpha: BlendEquation) {
        unsafe { gl::BlendEquationSeparate(rgb.raw(), alpha.raw()) };
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { gl::DepthMask(if write { gl::TRUE } else { gl::FALSE }) };
    }

    fn depth_func(&mut self, func: CompareFunc) {
        unsafe { gl::DepthFunc(func.raw()) };
    }

    fn depth_range(&mut self, near: f32, far: f32) {
        unsafe { gl::DepthRange(near as f64, far as f64) };
    }

    fn stencil_mask_separate(&mut self, face: Face, mask: u32) {
        unsafe { gl::StencilMaskSeparate(face.raw(), mask) };
    }

    fn stencil_func_separate(&mut self, face: Face, func: CompareFunc, reference: i32, mask: u32) {
        unsafe { gl::StencilFuncSeparate(face.raw(), func.raw(), reference, mask) };
    }

    fn stencil_op_separate(&mut self, face: Face, fail: StencilOp, depth_fail: StencilOp, depth_pass: StencilOp) {
        unsafe { gl::StencilOpSeparate(face.raw(), fail.raw(), depth_fail.raw(), depth_pass.raw()) };
    }

    fn cull_face(&mut self, face: Face) {
        unsafe { gl::CullFace(face.raw()) };
    }

    fn pixel_store(&mut self, param: PixelStore, value: i32) {
        unsafe { gl::PixelStorei(param.raw(), value) };
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        unsafe { gl::PolygonOffset(factor, units) };
    }

    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { gl::ClearColor(red, green, blue, alpha) };
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe { gl::ClearDepth(depth as f64) };
    }

    fn clear_stencil(&mut self, stencil: i32) {
        unsafe { gl::ClearStencil(stencil) };
    }

    fn bind_framebuffer(&mut self, framebuffer: Handle) {
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, framebuffer.raw()) };
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { gl::EnableVertexAttribArray(index) };
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { gl::DisableVertexAttribArray(index) };
    }
}

#[cfg(test)]
#[path = "gl_device_tests.rs"]
mod tests;
