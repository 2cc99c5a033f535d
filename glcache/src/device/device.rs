/// Device trait - the command interface every device call flows through

use crate::device::{
    ActiveVariable, BlendEquation, BlendFactor, BufferTarget, BufferUsage, Capability,
    CompareFunc, DeviceString, Face, Handle, Limit, PixelStore, ShaderStage, StateParam,
    StencilOp, TextureFormat, TextureParameter, TextureTarget, UniformValue,
};

/// Stateful immediate-mode graphics device
///
/// Mirrors the subset of the OpenGL (ES 2) command set the cache and the
/// resources drive. All calls assume a context is current on the calling
/// thread; implementations are therefore not required to be `Send`.
///
/// Creation calls report failure by returning [`Handle::NULL`]. Every other
/// call is fire-and-forget: misuse is reported through [`Device::get_error`].
pub trait Device {
    // ===== ERRORS =====

    /// Pop the oldest pending error flag (0 when none is set)
    fn get_error(&mut self) -> u32;

    // ===== QUERIES =====

    /// Query an implementation description string
    fn get_string(&mut self, name: DeviceString) -> String;

    /// Names of every supported extension
    fn get_extensions(&mut self) -> Vec<String>;

    /// Query an integer state parameter
    ///
    /// Masks are reported in two's complement (all ones reads as -1).
    fn get_integer(&mut self, param: StateParam) -> i32;

    /// Query an implementation limit
    fn get_limit(&mut self, limit: Limit) -> i32;

    /// Query a single-float state parameter
    fn get_float(&mut self, param: StateParam) -> f32;

    /// Query a multi-float state parameter into `out`
    fn get_float_array(&mut self, param: StateParam, out: &mut [f32]);

    /// Whether a capability is enabled
    fn is_enabled(&mut self, capability: Capability) -> bool;

    /// Whether the vertex attribute array at `index` is enabled
    fn is_vertex_attrib_array_enabled(&mut self, index: u32) -> bool;

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Handle;
    fn delete_buffer(&mut self, buffer: Handle);
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Handle);

    /// (Re)allocate the store of the buffer bound to `target`
    ///
    /// # Arguments
    ///
    /// * `size` - New store size in bytes
    /// * `data` - Initial contents, or `None` for unspecified contents
    /// * `usage` - Usage hint
    fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage);

    /// Overwrite part of the store of the buffer bound to `target`
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]);

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> Handle;
    fn delete_texture(&mut self, texture: Handle);

    /// Select the active texture unit (zero based, not `TEXTURE0` relative)
    fn active_texture(&mut self, unit: u32);

    fn bind_texture(&mut self, target: TextureTarget, texture: Handle);

    /// (Re)allocate level 0 of the texture bound to `target`
    fn tex_image_2d(
        &mut self,
        target: TextureTarget,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    );

    /// Overwrite a region of level 0 of the texture bound to `target`
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &mut self,
        target: TextureTarget,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    );

    /// Set a texture parameter to a raw enum value (filter or wrap mode)
    fn tex_parameter(&mut self, target: TextureTarget, param: TextureParameter, value: u32);

    // ===== SHADERS AND PROGRAMS =====

    fn create_shader(&mut self, stage: ShaderStage) -> Handle;
    fn shader_source(&mut self, shader: Handle, source: &str);

    /// Compile a shader, returning the compile status
    fn compile_shader(&mut self, shader: Handle) -> bool;

    fn shader_info_log(&mut self, shader: Handle) -> String;
    fn delete_shader(&mut self, shader: Handle);

    fn create_program(&mut self) -> Handle;
    fn attach_shader(&mut self, program: Handle, shader: Handle);
    fn detach_shader(&mut self, program: Handle, shader: Handle);

    /// Link a program, returning the link status
    fn link_program(&mut self, program: Handle) -> bool;

    fn program_info_log(&mut self, program: Handle) -> String;

    /// Make `program` current ([`Handle::NULL`] for none)
    fn use_program(&mut self, program: Handle);

    fn delete_program(&mut self, program: Handle);

    /// Active vertex attributes of a linked program
    fn active_attributes(&mut self, program: Handle) -> Vec<ActiveVariable>;

    /// Active uniforms of a linked program
    fn active_uniforms(&mut self, program: Handle) -> Vec<ActiveVariable>;

    /// Upload a value to a uniform location of the current program
    fn set_uniform(&mut self, location: i32, value: UniformValue<'_>);

    // ===== STATE =====

    fn enable(&mut self, capability: Capability);
    fn disable(&mut self, capability: Capability);

    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );
    fn blend_equation_separate(&mut self, rgb: BlendEquation, alpha: BlendEquation);

    fn depth_mask(&mut self, write: bool);
    fn depth_func(&mut self, func: CompareFunc);
    fn depth_range(&mut self, near: f32, far: f32);

    fn stencil_mask_separate(&mut self, face: Face, mask: u32);
    fn stencil_func_separate(&mut self, face: Face, func: CompareFunc, reference: i32, mask: u32);
    fn stencil_op_separate(&mut self, face: Face, fail: StencilOp, depth_fail: StencilOp, depth_pass: StencilOp);

    fn cull_face(&mut self, face: Face);
    fn pixel_store(&mut self, param: PixelStore, value: i32);
    fn polygon_offset(&mut self, factor: f32, units: f32);

    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32);
    fn clear_depth(&mut self, depth: f32);
    fn clear_stencil(&mut self, stencil: i32);

    /// Bind a framebuffer ([`Handle::NULL`] for the default framebuffer)
    fn bind_framebuffer(&mut self, framebuffer: Handle);

    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);
}
