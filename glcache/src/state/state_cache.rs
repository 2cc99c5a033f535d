/// StateCache - client-side mirror of device state
///
/// Every tracked field is `None` until observed. A setter compares against
/// the cached value and only reaches the device when the value differs or is
/// unknown. Composite fields (blend function, stencil function, ...) are
/// compared and refreshed as a whole because the device sets them in one
/// call.
///
/// The cache is only as good as the discipline around it: a device call made
/// around the cache leaves the mirrored field stale until `set_state_invalid`
/// or `capture_state` is called.

use glam::Vec4;
use rustc_hash::FxHashMap;

use crate::device::{
    check_device_error, BlendEquation, BlendFactor, Capability, CompareFunc, Device, Face,
    Handle, PixelStore, StateParam, StencilOp, TextureTarget, TEXTURE0,
};
use crate::error::Result;
use crate::implementation::Implementation;
use crate::resource::ResourceId;

const SOURCE: &str = "glcache::StateCache";

// ============================================================================
// Composite state values
// ============================================================================

/// Separate RGB / alpha blend factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendFunc {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendFunc {
    /// Same factors for color and alpha
    pub fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src_rgb: src, dst_rgb: dst, src_alpha: src, dst_alpha: dst }
    }
}

/// Separate RGB / alpha blend equations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendEquations {
    pub rgb: BlendEquation,
    pub alpha: BlendEquation,
}

/// Stencil test function, reference value and compare mask of one face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFunc {
    pub func: CompareFunc,
    pub reference: i32,
    pub mask: u32,
}

/// Stencil operations of one face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilOps {
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub depth_pass: StencilOp,
}

const FRONT: usize = 0;
const BACK: usize = 1;

/// Smallest face selector covering every face in `face` whose cached value
/// differs from `value`
fn changed_faces<T: PartialEq>(cached: &[Option<T>; 2], face: Face, value: &T) -> Option<Face> {
    let front = face.includes_front() && cached[FRONT].as_ref() != Some(value);
    let back = face.includes_back() && cached[BACK].as_ref() != Some(value);
    match (front, back) {
        (true, true) => Some(Face::FrontAndBack),
        (true, false) => Some(Face::Front),
        (false, true) => Some(Face::Back),
        (false, false) => None,
    }
}

fn store_faces<T: Copy>(cached: &mut [Option<T>; 2], face: Face, value: T) {
    if face.includes_front() {
        cached[FRONT] = Some(value);
    }
    if face.includes_back() {
        cached[BACK] = Some(value);
    }
}

// ============================================================================
// StateCache
// ============================================================================

/// Mirror of the device state touched by the cache's setters
#[derive(Debug, Clone)]
pub struct StateCache {
    capabilities: FxHashMap<Capability, bool>,

    blend_func: Option<BlendFunc>,
    blend_equation: Option<BlendEquations>,

    depth_write: Option<bool>,
    depth_func: Option<CompareFunc>,
    depth_range: Option<[f32; 2]>,

    stencil_write_mask: [Option<u32>; 2],
    stencil_func: [Option<StencilFunc>; 2],
    stencil_ops: [Option<StencilOps>; 2],

    cull_face: Option<Face>,

    pack_alignment: Option<i32>,
    unpack_alignment: Option<i32>,

    polygon_offset: Option<[f32; 2]>,

    clear_color: Option<Vec4>,
    clear_depth: Option<f32>,
    clear_stencil: Option<i32>,

    framebuffer: Option<Handle>,
    program: Option<Handle>,

    active_texture_unit: Option<u32>,
    /// Resource id bound per texture unit (0 = nothing bound)
    texture_units: Vec<Option<ResourceId>>,
    vertex_attrib_arrays: Vec<Option<bool>>,
}

impl StateCache {
    /// Create an all-invalid cache with tables sized from the implementation
    pub fn new(implementation: &Implementation) -> Self {
        let limits = implementation.limits();
        Self::with_table_sizes(limits.max_texture_image_units, limits.max_vertex_attribs)
    }

    /// Create an all-invalid cache with explicit table sizes
    pub fn with_table_sizes(texture_units: u32, vertex_attribs: u32) -> Self {
        Self {
            capabilities: FxHashMap::default(),
            blend_func: None,
            blend_equation: None,
            depth_write: None,
            depth_func: None,
            depth_range: None,
            stencil_write_mask: [None; 2],
            stencil_func: [None; 2],
            stencil_ops: [None; 2],
            cull_face: None,
            pack_alignment: None,
            unpack_alignment: None,
            polygon_offset: None,
            clear_color: None,
            clear_depth: None,
            clear_stencil: None,
            framebuffer: None,
            program: None,
            active_texture_unit: None,
            texture_units: vec![None; texture_units as usize],
            vertex_attrib_arrays: vec![None; vertex_attribs as usize],
        }
    }

    // ===== WHOLESALE OPERATIONS =====

    /// Forget every cached value without querying the device
    ///
    /// Use after the context was replaced or reset externally.
    pub fn set_state_invalid(&mut self) {
        *self = Self::with_table_sizes(self.texture_unit_count(), self.vertex_attrib_count());
    }

    /// Read every tracked field back from the device
    ///
    /// Values the cache cannot decode stay invalid, as do the per-unit
    /// texture bindings (the device reports handles, the cache tracks
    /// resource ids).
    pub fn capture_state(&mut self, device: &mut dyn Device) {
        self.set_state_invalid();

        for capability in [
            Capability::Blend,
            Capability::DepthTest,
            Capability::StencilTest,
            Capability::CullFace,
            Capability::PolygonOffsetFill,
        ] {
            self.capabilities.insert(capability, device.is_enabled(capability));
        }

        let mut raw = |param: StateParam| device.get_integer(param) as u32;

        self.blend_func = (|| {
            Some(BlendFunc {
                src_rgb: BlendFactor::from_raw(raw(StateParam::BlendSrcRgb))?,
                dst_rgb: BlendFactor::from_raw(raw(StateParam::BlendDstRgb))?,
                src_alpha: BlendFactor::from_raw(raw(StateParam::BlendSrcAlpha))?,
                dst_alpha: BlendFactor::from_raw(raw(StateParam::BlendDstAlpha))?,
            })
        })();
        self.blend_equation = (|| {
            Some(BlendEquations {
                rgb: BlendEquation::from_raw(raw(StateParam::BlendEquationRgb))?,
                alpha: BlendEquation::from_raw(raw(StateParam::BlendEquationAlpha))?,
            })
        })();

        self.depth_write = Some(raw(StateParam::DepthWritemask) != 0);
        self.depth_func = CompareFunc::from_raw(raw(StateParam::DepthFunc));

        self.stencil_write_mask = [
            Some(raw(StateParam::StencilWritemask)),
            Some(raw(StateParam::StencilBackWritemask)),
        ];
        let mut stencil_func = |func: StateParam, reference: StateParam, mask: StateParam| {
            Some(StencilFunc {
                func: CompareFunc::from_raw(raw(func))?,
                reference: raw(reference) as i32,
                mask: raw(mask),
            })
        };
        self.stencil_func = [
            stencil_func(StateParam::StencilFunc, StateParam::StencilRef, StateParam::StencilValueMask),
            stencil_func(
                StateParam::StencilBackFunc,
                StateParam::StencilBackRef,
                StateParam::StencilBackValueMask,
            ),
        ];
        let mut stencil_ops = |fail: StateParam, depth_fail: StateParam, depth_pass: StateParam| {
            Some(StencilOps {
                fail: StencilOp::from_raw(raw(fail))?,
                depth_fail: StencilOp::from_raw(raw(depth_fail))?,
                depth_pass: StencilOp::from_raw(raw(depth_pass))?,
            })
        };
        self.stencil_ops = [
            stencil_ops(
                StateParam::StencilFail,
                StateParam::StencilPassDepthFail,
                StateParam::StencilPassDepthPass,
            ),
            stencil_ops(
                StateParam::StencilBackFail,
                StateParam::StencilBackPassDepthFail,
                StateParam::StencilBackPassDepthPass,
            ),
        ];

        self.cull_face = Face::from_raw(raw(StateParam::CullFaceMode));
        self.pack_alignment = Some(raw(StateParam::PackAlignment) as i32);
        self.unpack_alignment = Some(raw(StateParam::UnpackAlignment) as i32);
        self.clear_stencil = Some(raw(StateParam::StencilClearValue) as i32);
        self.framebuffer = Some(Handle(raw(StateParam::FramebufferBinding)));
        self.program = Some(Handle(raw(StateParam::CurrentProgram)));

        let unit_count = self.texture_units.len() as u32;
        self.active_texture_unit = raw(StateParam::ActiveTexture)
            .checked_sub(TEXTURE0)
            .filter(|unit| *unit < unit_count);

        let mut depth_range = [0.0; 2];
        device.get_float_array(StateParam::DepthRange, &mut depth_range);
        self.depth_range = Some(depth_range);

        self.polygon_offset = Some([
            device.get_float(StateParam::PolygonOffsetFactor),
            device.get_float(StateParam::PolygonOffsetUnits),
        ]);

        let mut clear_color = [0.0; 4];
        device.get_float_array(StateParam::ColorClearValue, &mut clear_color);
        self.clear_color = Some(Vec4::from_array(clear_color));
        self.clear_depth = Some(device.get_float(StateParam::DepthClearValue));

        check_device_error(device, "StateCache::capture_state (general state)");

        for (location, enabled) in self.vertex_attrib_arrays.iter_mut().enumerate() {
            *enabled = Some(device.is_vertex_attrib_array_enabled(location as u32));
        }

        check_device_error(device, "StateCache::capture_state (vertex attribute arrays)");

        crate::glc_debug!(SOURCE, "Captured device state");
    }

    // ===== CAPABILITIES =====

    /// Enable or disable a capability
    pub fn set_capability(&mut self, device: &mut dyn Device, capability: Capability, enabled: bool) {
        if self.capabilities.get(&capability) == Some(&enabled) {
            return;
        }

        if enabled {
            device.enable(capability);
        } else {
            device.disable(capability);
        }
        check_device_error(device, "StateCache::set_capability");
        self.capabilities.insert(capability, enabled);
    }

    // ===== BLEND =====

    pub fn set_blend_func(&mut self, device: &mut dyn Device, func: BlendFunc) {
        if self.blend_func == Some(func) {
            return;
        }

        device.blend_func_separate(func.src_rgb, func.dst_rgb, func.src_alpha, func.dst_alpha);
        check_device_error(device, "StateCache::set_blend_func");
        self.blend_func = Some(func);
    }

    pub fn set_blend_equation(&mut self, device: &mut dyn Device, equations: BlendEquations) {
        if self.blend_equation == Some(equations) {
            return;
        }

        device.blend_equation_separate(equations.rgb, equations.alpha);
        check_device_error(device, "StateCache::set_blend_equation");
        self.blend_equation = Some(equations);
    }

    // ===== DEPTH =====

    pub fn set_depth_write(&mut self, device: &mut dyn Device, write: bool) {
        if self.depth_write == Some(write) {
            return;
        }

        device.depth_mask(write);
        check_device_error(device, "StateCache::set_depth_write");
        self.depth_write = Some(write);
    }

    pub fn set_depth_func(&mut self, device: &mut dyn Device, func: CompareFunc) {
        if self.depth_func == Some(func) {
            return;
        }

        device.depth_func(func);
        check_device_error(device, "StateCache::set_depth_func");
        self.depth_func = Some(func);
    }

    pub fn set_depth_range(&mut self, device: &mut dyn Device, near: f32, far: f32) {
        if self.depth_range == Some([near, far]) {
            return;
        }

        device.depth_range(near, far);
        check_device_error(device, "StateCache::set_depth_range");
        self.depth_range = Some([near, far]);
    }

    // ===== STENCIL =====

    /// Set the stencil write mask of one or both faces
    pub fn set_stencil_write_mask(&mut self, device: &mut dyn Device, face: Face, mask: u32) {
        let Some(changed) = changed_faces(&self.stencil_write_mask, face, &mask) else {
            return;
        };

        device.stencil_mask_separate(changed, mask);
        check_device_error(device, "StateCache::set_stencil_write_mask");
        store_faces(&mut self.stencil_write_mask, changed, mask);
    }

    /// Set the stencil function of one or both faces
    pub fn set_stencil_func(&mut self, device: &mut dyn Device, face: Face, func: StencilFunc) {
        let Some(changed) = changed_faces(&self.stencil_func, face, &func) else {
            return;
        };

        device.stencil_func_separate(changed, func.func, func.reference, func.mask);
        check_device_error(device, "StateCache::set_stencil_func");
        store_faces(&mut self.stencil_func, changed, func);
    }

    /// Set the stencil operations of one or both faces
    pub fn set_stencil_ops(&mut self, device: &mut dyn Device, face: Face, ops: StencilOps) {
        let Some(changed) = changed_faces(&self.stencil_ops, face, &ops) else {
            return;
        };

        device.stencil_op_separate(changed, ops.fail, ops.depth_fail, ops.depth_pass);
        check_device_error(device, "StateCache::set_stencil_ops");
        store_faces(&mut self.stencil_ops, changed, ops);
    }

    // ===== CULLING =====

    pub fn set_cull_face(&mut self, device: &mut dyn Device, face: Face) {
        if self.cull_face == Some(face) {
            return;
        }

        device.cull_face(face);
        check_device_error(device, "StateCache::set_cull_face");
        self.cull_face = Some(face);
    }

    // ===== PIXEL STORAGE =====

    /// Set the pack or unpack row alignment (1, 2, 4 or 8)
    pub fn set_pixel_alignment(&mut self, device: &mut dyn Device, param: PixelStore, alignment: i32) {
        let cached = match param {
            PixelStore::PackAlignment => &mut self.pack_alignment,
            PixelStore::UnpackAlignment => &mut self.unpack_alignment,
        };
        if *cached == Some(alignment) {
            return;
        }

        device.pixel_store(param, alignment);
        *cached = Some(alignment);
        check_device_error(device, "StateCache::set_pixel_alignment");
    }

    // ===== POLYGON OFFSET =====

    pub fn set_polygon_offset(&mut self, device: &mut dyn Device, factor: f32, units: f32) {
        if self.polygon_offset == Some([factor, units]) {
            return;
        }

        device.polygon_offset(factor, units);
        check_device_error(device, "StateCache::set_polygon_offset");
        self.polygon_offset = Some([factor, units]);
    }

    // ===== CLEAR VALUES =====

    pub fn set_clear_color(&mut self, device: &mut dyn Device, color: Vec4) {
        if self.clear_color == Some(color) {
            return;
        }

        device.clear_color(color.x, color.y, color.z, color.w);
        check_device_error(device, "StateCache::set_clear_color");
        self.clear_color = Some(color);
    }

    pub fn set_clear_depth(&mut self, device: &mut dyn Device, depth: f32) {
        if self.clear_depth == Some(depth) {
            return;
        }

        device.clear_depth(depth);
        check_device_error(device, "StateCache::set_clear_depth");
        self.clear_depth = Some(depth);
    }

    pub fn set_clear_stencil(&mut self, device: &mut dyn Device, stencil: i32) {
        if self.clear_stencil == Some(stencil) {
            return;
        }

        device.clear_stencil(stencil);
        check_device_error(device, "StateCache::set_clear_stencil");
        self.clear_stencil = Some(stencil);
    }

    // ===== BINDINGS =====

    /// Bind a framebuffer ([`Handle::NULL`] for the default framebuffer)
    pub fn set_framebuffer(&mut self, device: &mut dyn Device, framebuffer: Handle) {
        if self.framebuffer == Some(framebuffer) {
            return;
        }

        device.bind_framebuffer(framebuffer);
        check_device_error(device, "StateCache::set_framebuffer");
        self.framebuffer = Some(framebuffer);
    }

    /// Make a program current ([`Handle::NULL`] for none)
    pub fn set_program(&mut self, device: &mut dyn Device, program: Handle) {
        if self.program == Some(program) {
            return;
        }

        device.use_program(program);
        check_device_error(device, "StateCache::set_program");
        self.program = Some(program);
    }

    /// Select the active texture unit
    pub fn set_active_texture_unit(&mut self, device: &mut dyn Device, unit: u32) -> Result<()> {
        if unit as usize >= self.texture_units.len() {
            crate::glc_bail!(
                SOURCE,
                InvalidArgument,
                "texture unit {} out of range (device has {})",
                unit,
                self.texture_units.len()
            );
        }
        if self.active_texture_unit == Some(unit) {
            return Ok(());
        }

        device.active_texture(unit);
        check_device_error(device, "StateCache::set_active_texture_unit");
        self.active_texture_unit = Some(unit);
        Ok(())
    }

    /// Bind a texture to a unit, making that unit active
    ///
    /// Bindings are tracked by `resource_id` rather than by handle: handles
    /// are reused by the device after deletion and would alias a stale entry.
    /// Each sub-step (select unit, bind) is skipped when already satisfied.
    ///
    /// # Arguments
    ///
    /// * `unit` - Texture unit (zero based)
    /// * `target` - Texture target
    /// * `texture` - Device handle to bind ([`Handle::NULL`] to unbind)
    /// * `resource_id` - Unique id of the bound resource (0 when unbinding)
    pub fn bind_texture(
        &mut self,
        device: &mut dyn Device,
        unit: u32,
        target: TextureTarget,
        texture: Handle,
        resource_id: ResourceId,
    ) -> Result<()> {
        self.set_active_texture_unit(device, unit)?;

        let slot = &mut self.texture_units[unit as usize];
        if *slot == Some(resource_id) {
            return Ok(());
        }

        device.bind_texture(target, texture);
        *slot = Some(resource_id);
        check_device_error(device, "StateCache::bind_texture");
        Ok(())
    }

    /// Bind texture 0 to `unit`, skipped when the unit is known to be empty
    pub fn unbind_texture(&mut self, device: &mut dyn Device, unit: u32, target: TextureTarget) -> Result<()> {
        if self.bound_texture(unit) == Some(0) {
            return Ok(());
        }
        self.set_active_texture_unit(device, unit)?;

        device.bind_texture(target, Handle::NULL);
        self.texture_units[unit as usize] = Some(0);
        check_device_error(device, "StateCache::unbind_texture");
        Ok(())
    }

    /// Enable or disable the vertex attribute array at `location`
    pub fn set_vertex_attrib_array(&mut self, device: &mut dyn Device, location: u32, enabled: bool) -> Result<()> {
        let Some(slot) = self.vertex_attrib_arrays.get_mut(location as usize) else {
            crate::glc_bail!(
                SOURCE,
                InvalidArgument,
                "vertex attribute location {} out of range (device has {})",
                location,
                self.vertex_attrib_arrays.len()
            );
        };
        if *slot == Some(enabled) {
            return Ok(());
        }

        if enabled {
            device.enable_vertex_attrib_array(location);
        } else {
            device.disable_vertex_attrib_array(location);
        }
        *slot = Some(enabled);
        check_device_error(device, "StateCache::set_vertex_attrib_array");
        Ok(())
    }

    // ===== ACCESSORS =====

    /// Cached capability state (`None` when unknown)
    pub fn capability(&self, capability: Capability) -> Option<bool> {
        self.capabilities.get(&capability).copied()
    }

    pub fn pack_alignment(&self) -> Option<i32> {
        self.pack_alignment
    }

    pub fn unpack_alignment(&self) -> Option<i32> {
        self.unpack_alignment
    }

    pub fn framebuffer(&self) -> Option<Handle> {
        self.framebuffer
    }

    pub fn program(&self) -> Option<Handle> {
        self.program
    }

    pub fn blend_func(&self) -> Option<BlendFunc> {
        self.blend_func
    }

    pub fn depth_func(&self) -> Option<CompareFunc> {
        self.depth_func
    }

    pub fn stencil_func(&self, face: Face) -> Option<StencilFunc> {
        match face {
            Face::Back => self.stencil_func[BACK],
            _ => self.stencil_func[FRONT],
        }
    }

    pub fn clear_color(&self) -> Option<Vec4> {
        self.clear_color
    }

    pub fn active_texture_unit(&self) -> Option<u32> {
        self.active_texture_unit
    }

    /// Resource id cached for a texture unit
    pub fn bound_texture(&self, unit: u32) -> Option<ResourceId> {
        self.texture_units.get(unit as usize).copied().flatten()
    }

    pub fn vertex_attrib_array(&self, location: u32) -> Option<bool> {
        self.vertex_attrib_arrays.get(location as usize).copied().flatten()
    }

    /// Number of texture units tracked
    pub fn texture_unit_count(&self) -> u32 {
        self.texture_units.len() as u32
    }

    /// Number of vertex attribute locations tracked
    pub fn vertex_attrib_count(&self) -> u32 {
        self.vertex_attrib_arrays.len() as u32
    }
}

#[cfg(test)]
#[path = "state_cache_tests.rs"]
mod tests;
