/// Mock Device for tests (no GL context required)
///
/// Emulates the subset of device behaviour the cache and the resources rely
/// on: default state values, object namespaces with handle reuse, buffer and
/// texture storage, shader reflection and error flags. Every command is
/// recorded by name so tests can assert which calls reached the device.

use std::collections::VecDeque;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::device::{
    ActiveVariable, BlendEquation, BlendFactor, BufferTarget, BufferUsage, Capability,
    CompareFunc, Device, DeviceString, Face, Handle, Limit, PixelStore, ShaderStage,
    StateParam, StencilOp, TextureFormat, TextureParameter, TextureTarget, UniformValue,
    INVALID_ENUM, INVALID_OPERATION, INVALID_VALUE, NO_ERROR, TEXTURE0,
};
use crate::utils::HandleAllocator;

// ============================================================================
// Mock objects
// ============================================================================

#[derive(Debug, Clone, Default)]
struct MockBuffer {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
}

#[derive(Debug, Clone, Default)]
struct MockTexture {
    format: Option<TextureFormat>,
    width: u32,
    height: u32,
    data: Vec<u8>,
    parameters: FxHashMap<TextureParameter, u32>,
}

#[derive(Debug, Clone)]
struct MockShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Debug, Clone, Default)]
struct MockProgram {
    attached: Vec<Handle>,
    linked: bool,
    info_log: String,
    attributes: Vec<ActiveVariable>,
    uniforms: Vec<ActiveVariable>,
    uniform_values: FxHashMap<i32, Vec<f32>>,
}

// ============================================================================
// Mock Device
// ============================================================================

pub struct MockDevice {
    calls: Vec<String>,
    errors: VecDeque<u32>,

    strings: FxHashMap<DeviceString, String>,
    extensions: Vec<String>,
    limits: FxHashMap<Limit, i32>,

    integers: FxHashMap<StateParam, i32>,
    floats: FxHashMap<StateParam, Vec<f32>>,
    capabilities: FxHashSet<Capability>,
    attrib_arrays: Vec<bool>,

    buffer_handles: HandleAllocator,
    texture_handles: HandleAllocator,
    // Shaders and programs share one namespace
    object_handles: HandleAllocator,

    buffers: FxHashMap<Handle, MockBuffer>,
    bound_buffers: FxHashMap<BufferTarget, Handle>,
    textures: FxHashMap<Handle, MockTexture>,
    unit_bindings: Vec<Handle>,
    shaders: FxHashMap<Handle, MockShader>,
    programs: FxHashMap<Handle, MockProgram>,

    failing_allocations: u32,
    compile_failure: Option<String>,
    link_failure: Option<String>,
}

impl MockDevice {
    /// Create a mock device in the default state of a fresh context
    pub fn new() -> Self {
        let limits: FxHashMap<Limit, i32> = [
            (Limit::MaxTextureSize, 2048),
            (Limit::MaxCubeMapTextureSize, 2048),
            (Limit::MaxVertexAttribs, 16),
            (Limit::MaxVertexUniformVectors, 256),
            (Limit::MaxVaryingVectors, 8),
            (Limit::MaxCombinedTextureImageUnits, 8),
            (Limit::MaxVertexTextureImageUnits, 0),
            (Limit::MaxTextureImageUnits, 8),
            (Limit::MaxFragmentUniformVectors, 64),
            (Limit::MaxRenderbufferSize, 2048),
        ]
        .into_iter()
        .collect();

        let strings = [
            (DeviceString::Vendor, "GLCache"),
            (DeviceString::Renderer, "Mock Device"),
            (DeviceString::Version, "OpenGL ES 2.0 Mock"),
            (DeviceString::ShadingLanguageVersion, "OpenGL ES GLSL ES 1.00"),
        ]
        .into_iter()
        .map(|(name, value)| (name, value.to_string()))
        .collect();

        let mut device = Self {
            calls: Vec::new(),
            errors: VecDeque::new(),
            strings,
            extensions: vec!["GL_OES_depth_texture".to_string()],
            limits,
            integers: FxHashMap::default(),
            floats: FxHashMap::default(),
            capabilities: FxHashSet::default(),
            attrib_arrays: vec![false; 16],
            buffer_handles: HandleAllocator::new(),
            texture_handles: HandleAllocator::new(),
            object_handles: HandleAllocator::new(),
            buffers: FxHashMap::default(),
            bound_buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            unit_bindings: vec![Handle::NULL; 8],
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            failing_allocations: 0,
            compile_failure: None,
            link_failure: None,
        };
        device.reset_state();
        device
    }

    /// Restore every state parameter to its initial value (the effect of
    /// the context being lost and recreated, objects excluded)
    pub fn reset_state(&mut self) {
        use StateParam::*;

        let keep = StencilOp::Keep.raw() as i32;
        self.integers = [
            (BlendSrcRgb, BlendFactor::One.raw() as i32),
            (BlendDstRgb, BlendFactor::Zero.raw() as i32),
            (BlendSrcAlpha, BlendFactor::One.raw() as i32),
            (BlendDstAlpha, BlendFactor::Zero.raw() as i32),
            (BlendEquationRgb, BlendEquation::Add.raw() as i32),
            (BlendEquationAlpha, BlendEquation::Add.raw() as i32),
            (DepthWritemask, 1),
            (DepthFunc, CompareFunc::Less.raw() as i32),
            (StencilWritemask, -1),
            (StencilBackWritemask, -1),
            (StencilFunc, CompareFunc::Always.raw() as i32),
            (StencilValueMask, -1),
            (StencilRef, 0),
            (StencilBackFunc, CompareFunc::Always.raw() as i32),
            (StencilBackValueMask, -1),
            (StencilBackRef, 0),
            (StencilFail, keep),
            (StencilPassDepthFail, keep),
            (StencilPassDepthPass, keep),
            (StencilBackFail, keep),
            (StencilBackPassDepthFail, keep),
            (StencilBackPassDepthPass, keep),
            (CullFaceMode, Face::Back.raw() as i32),
            (PackAlignment, 4),
            (UnpackAlignment, 4),
            (StencilClearValue, 0),
            (FramebufferBinding, 0),
            (ActiveTexture, TEXTURE0 as i32),
            (CurrentProgram, 0),
        ]
        .into_iter()
        .collect();

        self.floats = [
            (DepthRange, vec![0.0, 1.0]),
            (PolygonOffsetFactor, vec![0.0]),
            (PolygonOffsetUnits, vec![0.0]),
            (ColorClearValue, vec![0.0, 0.0, 0.0, 0.0]),
            (DepthClearValue, vec![1.0]),
        ]
        .into_iter()
        .collect();

        self.capabilities.clear();
        self.attrib_arrays.iter_mut().for_each(|enabled| *enabled = false);
        self.unit_bindings.iter_mut().for_each(|bound| *bound = Handle::NULL);
        self.bound_buffers.clear();
    }

    // ===== CALL RECORDING =====

    fn record(&mut self, name: &str) {
        self.calls.push(name.to_string());
    }

    /// Every call issued since creation or the last `clear_calls`
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Number of recorded calls with the given name
    pub fn call_count(&self, name: &str) -> usize {
        self.calls.iter().filter(|call| call.as_str() == name).count()
    }

    /// Recorded calls that change device state or objects (queries and
    /// error checks excluded)
    pub fn issued_commands(&self) -> Vec<&str> {
        self.calls
            .iter()
            .map(String::as_str)
            .filter(|call| !call.starts_with("get_") && !call.starts_with("is_"))
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    // ===== FAULT INJECTION =====

    /// Make the next `count` object creations return the null handle
    pub fn fail_allocations(&mut self, count: u32) {
        self.failing_allocations = count;
    }

    /// Make the next shader compile fail with `info_log`
    pub fn fail_next_compile(&mut self, info_log: &str) {
        self.compile_failure = Some(info_log.to_string());
    }

    /// Make the next program link fail with `info_log`
    pub fn fail_next_link(&mut self, info_log: &str) {
        self.link_failure = Some(info_log.to_string());
    }

    /// Raise an error flag as if the last call had failed
    pub fn push_error(&mut self, error: u32) {
        self.errors.push_back(error);
    }

    /// Number of error flags not yet drained with `get_error`
    pub fn pending_error_count(&self) -> usize {
        self.errors.len()
    }

    // ===== CONFIGURATION / BACKDOOR =====

    /// Override an implementation limit; resizes the attribute and texture
    /// unit tables when those limits change
    pub fn set_limit(&mut self, limit: Limit, value: i32) {
        self.limits.insert(limit, value);
        let size = value.max(0) as usize;
        match limit {
            Limit::MaxVertexAttribs => self.attrib_arrays.resize(size, false),
            Limit::MaxCombinedTextureImageUnits => self.unit_bindings.resize(size, Handle::NULL),
            _ => {}
        }
    }

    pub fn set_extensions(&mut self, extensions: &[&str]) {
        self.extensions = extensions.iter().map(|name| name.to_string()).collect();
    }

    pub fn set_string(&mut self, name: DeviceString, value: &str) {
        self.strings.insert(name, value.to_string());
    }

    /// Write an integer state parameter without recording a call
    pub fn set_integer(&mut self, param: StateParam, value: i32) {
        self.integers.insert(param, value);
    }

    /// Integer state parameter as currently held by the device
    pub fn integer(&self, param: StateParam) -> i32 {
        self.integers.get(&param).copied().unwrap_or(0)
    }

    /// Float state parameter(s) as currently held by the device
    pub fn floats(&self, param: StateParam) -> &[f32] {
        self.floats.get(&param).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn capability_enabled(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn attrib_array_enabled(&self, index: u32) -> bool {
        self.attrib_arrays.get(index as usize).copied().unwrap_or(false)
    }

    // ===== OBJECT INSPECTION =====

    pub fn bound_buffer(&self, target: BufferTarget) -> Handle {
        self.bound_buffers.get(&target).copied().unwrap_or(Handle::NULL)
    }

    pub fn buffer_contents(&self, buffer: Handle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|object| object.data.as_slice())
    }

    pub fn buffer_usage(&self, buffer: Handle) -> Option<BufferUsage> {
        self.buffers.get(&buffer).and_then(|object| object.usage)
    }

    pub fn live_buffer_count(&self) -> u32 {
        self.buffer_handles.len()
    }

    /// Texture bound to a unit (zero based)
    pub fn bound_texture(&self, unit: u32) -> Handle {
        self.unit_bindings.get(unit as usize).copied().unwrap_or(Handle::NULL)
    }

    pub fn texture_contents(&self, texture: Handle) -> Option<&[u8]> {
        self.textures.get(&texture).map(|object| object.data.as_slice())
    }

    pub fn texture_extent(&self, texture: Handle) -> Option<(u32, u32)> {
        self.textures.get(&texture).map(|object| (object.width, object.height))
    }

    pub fn texture_format(&self, texture: Handle) -> Option<TextureFormat> {
        self.textures.get(&texture).and_then(|object| object.format)
    }

    pub fn texture_parameter(&self, texture: Handle, param: TextureParameter) -> Option<u32> {
        self.textures.get(&texture).and_then(|object| object.parameters.get(&param).copied())
    }

    pub fn live_texture_count(&self) -> u32 {
        self.texture_handles.len()
    }

    pub fn shader_text(&self, shader: Handle) -> Option<&str> {
        self.shaders.get(&shader).map(|object| object.source.as_str())
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn attached_shaders(&self, program: Handle) -> Vec<Handle> {
        self.programs
            .get(&program)
            .map(|object| object.attached.clone())
            .unwrap_or_default()
    }

    /// Last value uploaded to a uniform location of `program`
    pub fn uniform_value(&self, program: Handle, location: i32) -> Option<&[f32]> {
        self.programs
            .get(&program)
            .and_then(|object| object.uniform_values.get(&location))
            .map(Vec::as_slice)
    }

    // ===== HELPERS =====

    fn allocation_fails(&mut self) -> bool {
        if self.failing_allocations > 0 {
            self.failing_allocations -= 1;
            true
        } else {
            false
        }
    }

    fn active_unit(&self) -> usize {
        (self.integer(StateParam::ActiveTexture) as u32).saturating_sub(TEXTURE0) as usize
    }

    fn bound_buffer_mut(&mut self, target: BufferTarget) -> Option<&mut MockBuffer> {
        let handle = self.bound_buffer(target);
        self.buffers.get_mut(&handle)
    }

    fn bound_texture_mut(&mut self) -> Option<&mut MockTexture> {
        let handle = self.bound_texture(self.active_unit() as u32);
        self.textures.get_mut(&handle)
    }

    fn set_face_integers(&mut self, face: Face, front: &[(StateParam, i32)], back: &[(StateParam, i32)]) {
        if face.includes_front() {
            self.integers.extend(front.iter().copied());
        }
        if face.includes_back() {
            self.integers.extend(back.iter().copied());
        }
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Shader reflection
// ============================================================================

fn glsl_type_kind(type_name: &str) -> u32 {
    match type_name {
        "float" => 0x1406,
        "int" => 0x1404,
        "bool" => 0x8B56,
        "vec2" => 0x8B50,
        "vec3" => 0x8B51,
        "vec4" => 0x8B52,
        "mat2" => 0x8B5A,
        "mat3" => 0x8B5B,
        "mat4" => 0x8B5C,
        "sampler2D" => 0x8B5E,
        "samplerCube" => 0x8B60,
        _ => 0,
    }
}

/// Collect `<qualifier> [precision] <type> <name>[N];` declarations
fn reflect_declarations(source: &str, qualifiers: &[&str], out: &mut Vec<ActiveVariable>) {
    for line in source.lines() {
        let tokens: Vec<&str> = line
            .trim()
            .trim_end_matches(';')
            .split_whitespace()
            .collect();
        if tokens.len() < 3 || !qualifiers.contains(&tokens[0]) {
            continue;
        }

        let declared = tokens[tokens.len() - 1];
        let type_name = tokens[tokens.len() - 2];
        let (name, size) = match declared.split_once('[') {
            Some((name, rest)) => (name, rest.trim_end_matches(']').parse().unwrap_or(1)),
            None => (declared, 1),
        };

        if out.iter().any(|existing| existing.name == name) {
            continue;
        }
        out.push(ActiveVariable {
            name: name.to_string(),
            location: out.len() as i32,
            kind: glsl_type_kind(type_name),
            size,
        });
    }
}

// ============================================================================
// Device implementation
// ============================================================================

impl Device for MockDevice {
    fn get_error(&mut self) -> u32 {
        self.record("get_error");
        self.errors.pop_front().unwrap_or(NO_ERROR)
    }

    fn get_string(&mut self, name: DeviceString) -> String {
        self.record("get_string");
        self.strings.get(&name).cloned().unwrap_or_default()
    }

    fn get_extensions(&mut self) -> Vec<String> {
        self.record("get_extensions");
        self.extensions.clone()
    }

    fn get_integer(&mut self, param: StateParam) -> i32 {
        self.record("get_integer");
        match self.integers.get(&param) {
            Some(value) => *value,
            None => self.floats(param).first().map(|value| value.round() as i32).unwrap_or(0),
        }
    }

    fn get_limit(&mut self, limit: Limit) -> i32 {
        self.record("get_limit");
        self.limits.get(&limit).copied().unwrap_or(0)
    }

    fn get_float(&mut self, param: StateParam) -> f32 {
        self.record("get_float");
        match self.floats.get(&param) {
            Some(values) => values.first().copied().unwrap_or(0.0),
            None => self.integer(param) as f32,
        }
    }

    fn get_float_array(&mut self, param: StateParam, out: &mut [f32]) {
        self.record("get_float_array");
        let values = self.floats(param).to_vec();
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = value;
        }
    }

    fn is_enabled(&mut self, capability: Capability) -> bool {
        self.record("is_enabled");
        self.capabilities.contains(&capability)
    }

    fn is_vertex_attrib_array_enabled(&mut self, index: u32) -> bool {
        self.record("is_vertex_attrib_array_enabled");
        if index as usize >= self.attrib_arrays.len() {
            self.errors.push_back(INVALID_VALUE);
            return false;
        }
        self.attrib_arrays[index as usize]
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Handle {
        self.record("create_buffer");
        if self.allocation_fails() {
            return Handle::NULL;
        }
        let handle = self.buffer_handles.alloc();
        self.buffers.insert(handle, MockBuffer::default());
        handle
    }

    fn delete_buffer(&mut self, buffer: Handle) {
        self.record("delete_buffer");
        if self.buffer_handles.release(buffer) {
            self.buffers.remove(&buffer);
            self.bound_buffers.retain(|_, bound| *bound != buffer);
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Handle) {
        self.record("bind_buffer");
        if !buffer.is_null() && !self.buffer_handles.is_live(buffer) {
            self.errors.push_back(INVALID_OPERATION);
            return;
        }
        self.bound_buffers.insert(target, buffer);
    }

    fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        self.record("buffer_data");
        let Some(object) = self.bound_buffer_mut(target) else {
            self.errors.push_back(INVALID_OPERATION);
            return;
        };

        let mut bytes = vec![0u8; size];
        if let Some(data) = data {
            let count = data.len().min(size);
            bytes[..count].copy_from_slice(&data[..count]);
        }
        object.data = bytes;
        object.usage = Some(usage);
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        self.record("buffer_sub_data");
        let Some(object) = self.bound_buffer_mut(target) else {
            self.errors.push_back(INVALID_OPERATION);
            return;
        };

        let Some(end) = offset
            .checked_add(data.len())
            .filter(|end| *end <= object.data.len())
        else {
            self.errors.push_back(INVALID_VALUE);
            return;
        };
        object.data[offset..end].copy_from_slice(data);
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> Handle {
        self.record("create_texture");
        if self.allocation_fails() {
            return Handle::NULL;
        }
        let handle = self.texture_handles.alloc();
        self.textures.insert(handle, MockTexture::default());
        handle
    }

    fn delete_texture(&mut self, texture: Handle) {
        self.record("delete_texture");
        if self.texture_handles.release(texture) {
            self.textures.remove(&texture);
            for bound in self.unit_bindings.iter_mut().filter(|bound| **bound == texture) {
                *bound = Handle::NULL;
            }
        }
    }

    fn active_texture(&mut self, unit: u32) {
        self.record("active_texture");
        if unit as usize >= self.unit_bindings.len() {
            self.errors.push_back(INVALID_ENUM);
            return;
        }
        self.integers.insert(StateParam::ActiveTexture, (TEXTURE0 + unit) as i32);
    }

    fn bind_texture(&mut self, _target: TextureTarget, texture: Handle) {
        self.record("bind_texture");
        if !texture.is_null() && !self.texture_handles.is_live(texture) {
            self.errors.push_back(INVALID_OPERATION);
            return;
        }
        let unit = self.active_unit();
        if let Some(bound) = self.unit_bindings.get_mut(unit) {
            *bound = texture;
        }
    }

    fn tex_image_2d(
        &mut self,
        _target: TextureTarget,
        format: TextureFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) {
        self.record("tex_image_2d");
        let size = format.image_size_bytes(width, height);
        if data.is_some_and(|data| data.len() < size) {
            self.errors.push_back(INVALID_VALUE);
            return;
        }
        let Some(object) = self.bound_texture_mut() else {
            self.errors.push_back(INVALID_OPERATION);
            return;
        };

        object.format = Some(format);
        object.width = width;
        object.height = height;
        object.data = match data {
            Some(data) => data[..size].to_vec(),
            None => vec![0u8; size],
        };
    }

    fn tex_sub_image_2d(
        &mut self,
        _target: TextureTarget,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) {
        self.record("tex_sub_image_2d");
        let Some(object) = self.bound_texture_mut() else {
            self.errors.push_back(INVALID_OPERATION);
            return;
        };

        if object.format != Some(format) {
            self.errors.push_back(INVALID_OPERATION);
            return;
        }
        let fits = |start: u32, len: u32, limit: u32| start.checked_add(len).is_some_and(|end| end <= limit);
        if !fits(x, width, object.width)
            || !fits(y, height, object.height)
            || data.len() < format.image_size_bytes(width, height)
        {
            self.errors.push_back(INVALID_VALUE);
            return;
        }

        let bpp = format.bytes_per_pixel() as usize;
        let row_bytes = width as usize * bpp;
        let stride = object.width as usize * bpp;
        for row in 0..height as usize {
            let dst = (y as usize + row) * stride + x as usize * bpp;
            let src = row * row_bytes;
            object.data[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
        }
    }

    fn tex_parameter(&mut self, _target: TextureTarget, param: TextureParameter, value: u32) {
        self.record("tex_parameter");
        match self.bound_texture_mut() {
            Some(object) => {
                object.parameters.insert(param, value);
            }
            None => self.errors.push_back(INVALID_OPERATION),
        }
    }

    // ===== SHADERS AND PROGRAMS =====

    fn create_shader(&mut self, stage: ShaderStage) -> Handle {
        self.record("create_shader");
        if self.allocation_fails() {
            return Handle::NULL;
        }
        let handle = self.object_handles.alloc();
        self.shaders.insert(handle, MockShader {
            stage,
            source: String::new(),
            compiled: false,
            info_log: String::new(),
        });
        handle
    }

    fn shader_source(&mut self, shader: Handle, source: &str) {
        self.record("shader_source");
        match self.shaders.get_mut(&shader) {
            Some(object) => object.source = source.to_string(),
            None => self.errors.push_back(INVALID_VALUE),
        }
    }

    fn compile_shader(&mut self, shader: Handle) -> bool {
        self.record("compile_shader");
        let failure = self.compile_failure.take();
        let Some(object) = self.shaders.get_mut(&shader) else {
            self.errors.push_back(INVALID_VALUE);
            return false;
        };

        match failure {
            Some(info_log) => {
                object.compiled = false;
                object.info_log = info_log;
            }
            None => {
                object.compiled = true;
                object.info_log.clear();
            }
        }
        object.compiled
    }

    fn shader_info_log(&mut self, shader: Handle) -> String {
        self.record("shader_info_log");
        self.shaders.get(&shader).map(|object| object.info_log.clone()).unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: Handle) {
        self.record("delete_shader");
        if self.shaders.remove(&shader).is_some() {
            self.object_handles.release(shader);
        }
    }

    fn create_program(&mut self) -> Handle {
        self.record("create_program");
        if self.allocation_fails() {
            return Handle::NULL;
        }
        let handle = self.object_handles.alloc();
        self.programs.insert(handle, MockProgram::default());
        handle
    }

    fn attach_shader(&mut self, program: Handle, shader: Handle) {
        self.record("attach_shader");
        if !self.shaders.contains_key(&shader) {
            self.errors.push_back(INVALID_VALUE);
            return;
        }
        match self.programs.get_mut(&program) {
            Some(object) if !object.attached.contains(&shader) => object.attached.push(shader),
            Some(_) => self.errors.push_back(INVALID_OPERATION),
            None => self.errors.push_back(INVALID_VALUE),
        }
    }

    fn detach_shader(&mut self, program: Handle, shader: Handle) {
        self.record("detach_shader");
        match self.programs.get_mut(&program) {
            Some(object) if object.attached.contains(&shader) => {
                object.attached.retain(|attached| *attached != shader)
            }
            Some(_) => self.errors.push_back(INVALID_OPERATION),
            None => self.errors.push_back(INVALID_VALUE),
        }
    }

    fn link_program(&mut self, program: Handle) -> bool {
        self.record("link_program");
        let failure = self.link_failure.take();
        let Some(attached) = self.programs.get(&program).map(|object| object.attached.clone()) else {
            self.errors.push_back(INVALID_VALUE);
            return false;
        };

        let mut attributes = Vec::new();
        let mut uniforms = Vec::new();
        let mut stages_ok = !attached.is_empty();
        for shader in &attached {
            match self.shaders.get(shader) {
                Some(object) if object.compiled => {
                    if object.stage == ShaderStage::Vertex {
                        reflect_declarations(&object.source, &["attribute", "in"], &mut attributes);
                    }
                    reflect_declarations(&object.source, &["uniform"], &mut uniforms);
                }
                _ => stages_ok = false,
            }
        }

        let Some(object) = self.programs.get_mut(&program) else {
            return false;
        };
        match (failure, stages_ok) {
            (Some(info_log), _) => {
                object.linked = false;
                object.info_log = info_log;
            }
            (None, false) => {
                object.linked = false;
                object.info_log = "error: program has no compiled shaders attached".to_string();
            }
            (None, true) => {
                object.linked = true;
                object.info_log.clear();
                object.attributes = attributes;
                object.uniforms = uniforms;
            }
        }
        object.linked
    }

    fn program_info_log(&mut self, program: Handle) -> String {
        self.record("program_info_log");
        self.programs.get(&program).map(|object| object.info_log.clone()).unwrap_or_default()
    }

    fn use_program(&mut self, program: Handle) {
        self.record("use_program");
        let linked = self.programs.get(&program).is_some_and(|object| object.linked);
        if !program.is_null() && !linked {
            self.errors.push_back(INVALID_OPERATION);
            return;
        }
        self.integers.insert(StateParam::CurrentProgram, program.raw() as i32);
    }

    fn delete_program(&mut self, program: Handle) {
        self.record("delete_program");
        if self.programs.remove(&program).is_some() {
            self.object_handles.release(program);
        }
    }

    fn active_attributes(&mut self, program: Handle) -> Vec<ActiveVariable> {
        self.record("active_attributes");
        self.programs.get(&program).map(|object| object.attributes.clone()).unwrap_or_default()
    }

    fn active_uniforms(&mut self, program: Handle) -> Vec<ActiveVariable> {
        self.record("active_uniforms");
        self.programs.get(&program).map(|object| object.uniforms.clone()).unwrap_or_default()
    }

    fn set_uniform(&mut self, location: i32, value: UniformValue<'_>) {
        self.record("set_uniform");
        let current = Handle(self.integer(StateParam::CurrentProgram) as u32);
        let Some(object) = self.programs.get_mut(&current) else {
            self.errors.push_back(INVALID_OPERATION);
            return;
        };
        // Location -1 is silently ignored
        if location >= 0 {
            object.uniform_values.insert(location, value.to_floats());
        }
    }

    // ===== STATE =====

    fn enable(&mut self, capability: Capability) {
        self.record("enable");
        self.capabilities.insert(capability);
    }

    fn disable(&mut self, capability: Capability) {
        self.record("disable");
        self.capabilities.remove(&capability);
    }

    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.record("blend_func_separate");
        self.integers.extend([
            (StateParam::BlendSrcRgb, src_rgb.raw() as i32),
            (StateParam::BlendDstRgb, dst_rgb.raw() as i32),
            (StateParam::BlendSrcAlpha, src_alpha.raw() as i32),
            (StateParam::BlendDstAlpha, dst_alpha.raw() as i32),
        ]);
    }

    fn blend_equation_separate(&mut self, rgb: BlendEquation, alpha: BlendEquation) {
        self.record("blend_equation_separate");
        self.integers.extend([
            (StateParam::BlendEquationRgb, rgb.raw() as i32),
            (StateParam::BlendEquationAlpha, alpha.raw() as i32),
        ]);
    }

    fn depth_mask(&mut self, write: bool) {
        self.record("depth_mask");
        self.integers.insert(StateParam::DepthWritemask, write as i32);
    }

    fn depth_func(&mut self, func: CompareFunc) {
        self.record("depth_func");
        self.integers.insert(StateParam::DepthFunc, func.raw() as i32);
    }

    fn depth_range(&mut self, near: f32, far: f32) {
        self.record("depth_range");
        self.floats.insert(StateParam::DepthRange, vec![near.clamp(0.0, 1.0), far.clamp(0.0, 1.0)]);
    }

    fn stencil_mask_separate(&mut self, face: Face, mask: u32) {
        self.record("stencil_mask_separate");
        self.set_face_integers(
            face,
            &[(StateParam::StencilWritemask, mask as i32)],
            &[(StateParam::StencilBackWritemask, mask as i32)],
        );
    }

    fn stencil_func_separate(&mut self, face: Face, func: CompareFunc, reference: i32, mask: u32) {
        self.record("stencil_func_separate");
        self.set_face_integers(
            face,
            &[
                (StateParam::StencilFunc, func.raw() as i32),
                (StateParam::StencilRef, reference),
                (StateParam::StencilValueMask, mask as i32),
            ],
            &[
                (StateParam::StencilBackFunc, func.raw() as i32),
                (StateParam::StencilBackRef, reference),
                (StateParam::StencilBackValueMask, mask as i32),
            ],
        );
    }

    fn stencil_op_separate(&mut self, face: Face, fail: StencilOp, depth_fail: StencilOp, depth_pass: StencilOp) {
        self.record("stencil_op_separate");
        self.set_face_integers(
            face,
            &[
                (StateParam::StencilFail, fail.raw() as i32),
                (StateParam::StencilPassDepthFail, depth_fail.raw() as i32),
                (StateParam::StencilPassDepthPass, depth_pass.raw() as i32),
            ],
            &[
                (StateParam::StencilBackFail, fail.raw() as i32),
                (StateParam::StencilBackPassDepthFail, depth_fail.raw() as i32),
                (StateParam::StencilBackPassDepthPass, depth_pass.raw() as i32),
            ],
        );
    }

    fn cull_face(&mut self, face: Face) {
        self.record("cull_face");
        self.integers.insert(StateParam::CullFaceMode, face.raw() as i32);
    }

    fn pixel_store(&mut self, param: PixelStore, value: i32) {
        self.record("pixel_store");
        if ![1, 2, 4, 8].contains(&value) {
            self.errors.push_back(INVALID_VALUE);
            return;
        }
        let state = match param {
            PixelStore::PackAlignment => StateParam::PackAlignment,
            PixelStore::UnpackAlignment => StateParam::UnpackAlignment,
        };
        self.integers.insert(state, value);
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.record("polygon_offset");
        self.floats.insert(StateParam::PolygonOffsetFactor, vec![factor]);
        self.floats.insert(StateParam::PolygonOffsetUnits, vec![units]);
    }

    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.record("clear_color");
        self.floats.insert(StateParam::ColorClearValue, vec![red, green, blue, alpha]);
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record("clear_depth");
        self.floats.insert(StateParam::DepthClearValue, vec![depth.clamp(0.0, 1.0)]);
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.record("clear_stencil");
        self.integers.insert(StateParam::StencilClearValue, stencil);
    }

    fn bind_framebuffer(&mut self, framebuffer: Handle) {
        self.record("bind_framebuffer");
        self.integers.insert(StateParam::FramebufferBinding, framebuffer.raw() as i32);
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.record("enable_vertex_attrib_array");
        match self.attrib_arrays.get_mut(index as usize) {
            Some(enabled) => *enabled = true,
            None => self.errors.push_back(INVALID_VALUE),
        }
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.record("disable_vertex_attrib_array");
        match self.attrib_arrays.get_mut(index as usize) {
            Some(enabled) => *enabled = false,
            None => self.errors.push_back(INVALID_VALUE),
        }
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
