/// Handles and typed enumerations shared by every device implementation
///
/// Enumerations carry the raw value the device understands, so a backend can
/// forward them with `raw()` and the state cache can decode values read back
/// from the device with `from_raw()`.

use std::fmt;
use glam::{Mat4, Vec2, Vec3, Vec4};

// ============================================================================
// Handle
// ============================================================================

/// Opaque device object handle
///
/// Handles are assigned by the device and may be reused after the object
/// they referred to is deleted. Zero is never a valid object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Handle(pub u32);

impl Handle {
    /// The invalid / unallocated handle
    pub const NULL: Self = Self(0);

    /// Whether this is the invalid handle
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Raw handle value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Raw-valued enumerations
// ============================================================================

macro_rules! device_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )*
        }

        impl $name {
            /// Raw device value
            #[inline]
            pub fn raw(self) -> u32 {
                self as u32
            }

            /// Decode a raw device value; `None` for values this crate
            /// does not model
            pub fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $( v if v == $value => Some($name::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

device_enum! {
    /// Boolean device capabilities toggled with enable/disable
    pub enum Capability {
        Blend = 0x0BE2,
        DepthTest = 0x0B71,
        StencilTest = 0x0B90,
        CullFace = 0x0B44,
        PolygonOffsetFill = 0x8037,
    }
}

device_enum! {
    /// Source / destination blend factors
    pub enum BlendFactor {
        Zero = 0,
        One = 1,
        SrcColor = 0x0300,
        OneMinusSrcColor = 0x0301,
        SrcAlpha = 0x0302,
        OneMinusSrcAlpha = 0x0303,
        DstAlpha = 0x0304,
        OneMinusDstAlpha = 0x0305,
        DstColor = 0x0306,
        OneMinusDstColor = 0x0307,
        SrcAlphaSaturate = 0x0308,
        ConstantColor = 0x8001,
        OneMinusConstantColor = 0x8002,
        ConstantAlpha = 0x8003,
        OneMinusConstantAlpha = 0x8004,
    }
}

device_enum! {
    /// Blend equations
    pub enum BlendEquation {
        Add = 0x8006,
        Subtract = 0x800A,
        ReverseSubtract = 0x800B,
    }
}

device_enum! {
    /// Depth and stencil comparison functions
    pub enum CompareFunc {
        Never = 0x0200,
        Less = 0x0201,
        Equal = 0x0202,
        LessOrEqual = 0x0203,
        Greater = 0x0204,
        NotEqual = 0x0205,
        GreaterOrEqual = 0x0206,
        Always = 0x0207,
    }
}

device_enum! {
    /// Stencil buffer operations
    pub enum StencilOp {
        Zero = 0,
        Keep = 0x1E00,
        Replace = 0x1E01,
        Increment = 0x1E02,
        Decrement = 0x1E03,
        Invert = 0x150A,
        IncrementWrap = 0x8507,
        DecrementWrap = 0x8508,
    }
}

device_enum! {
    /// Polygon face selector (stencil state, culling)
    pub enum Face {
        Front = 0x0404,
        Back = 0x0405,
        FrontAndBack = 0x0408,
    }
}

impl Face {
    /// Whether this selector covers front faces
    #[inline]
    pub fn includes_front(self) -> bool {
        matches!(self, Face::Front | Face::FrontAndBack)
    }

    /// Whether this selector covers back faces
    #[inline]
    pub fn includes_back(self) -> bool {
        matches!(self, Face::Back | Face::FrontAndBack)
    }
}

device_enum! {
    /// Pixel storage parameters
    pub enum PixelStore {
        /// Row alignment used when reading pixels back
        PackAlignment = 0x0D05,
        /// Row alignment used when uploading texture data
        UnpackAlignment = 0x0CF5,
    }
}

device_enum! {
    /// Buffer binding targets
    pub enum BufferTarget {
        Array = 0x8892,
        ElementArray = 0x8893,
    }
}

device_enum! {
    /// Buffer usage hints
    pub enum BufferUsage {
        /// Specified once, drawn many times
        Static = 0x88E4,
        /// Respecified repeatedly, drawn many times
        Dynamic = 0x88E8,
        /// Specified once, drawn a few times
        Stream = 0x88E0,
    }
}

device_enum! {
    /// Texture binding targets
    pub enum TextureTarget {
        Texture2D = 0x0DE1,
    }
}

device_enum! {
    /// Texture filter modes
    pub enum TextureFilter {
        Nearest = 0x2600,
        Linear = 0x2601,
    }
}

device_enum! {
    /// Texture coordinate wrap modes
    pub enum TextureWrap {
        ClampToEdge = 0x812F,
        /// Power-of-two textures only on ES 2 class devices
        MirroredRepeat = 0x8370,
        /// Power-of-two textures only on ES 2 class devices
        Repeat = 0x2901,
    }
}

device_enum! {
    /// Texture object parameters
    pub enum TextureParameter {
        MinFilter = 0x2801,
        MagFilter = 0x2800,
        WrapS = 0x2802,
        WrapT = 0x2803,
    }
}

device_enum! {
    /// Shader stages
    pub enum ShaderStage {
        Vertex = 0x8B31,
        Fragment = 0x8B30,
    }
}

device_enum! {
    /// Queryable state parameters read back by the state cache
    pub enum StateParam {
        BlendSrcRgb = 0x80C9,
        BlendDstRgb = 0x80C8,
        BlendSrcAlpha = 0x80CB,
        BlendDstAlpha = 0x80CA,
        BlendEquationRgb = 0x8009,
        BlendEquationAlpha = 0x883D,
        DepthWritemask = 0x0B72,
        DepthFunc = 0x0B74,
        /// Two floats: near, far
        DepthRange = 0x0B70,
        StencilWritemask = 0x0B98,
        StencilBackWritemask = 0x8CA5,
        StencilFunc = 0x0B92,
        StencilValueMask = 0x0B93,
        StencilRef = 0x0B97,
        StencilBackFunc = 0x8800,
        StencilBackValueMask = 0x8CA4,
        StencilBackRef = 0x8CA3,
        StencilFail = 0x0B94,
        StencilPassDepthFail = 0x0B95,
        StencilPassDepthPass = 0x0B96,
        StencilBackFail = 0x8801,
        StencilBackPassDepthFail = 0x8802,
        StencilBackPassDepthPass = 0x8803,
        CullFaceMode = 0x0B45,
        PackAlignment = 0x0D05,
        UnpackAlignment = 0x0CF5,
        PolygonOffsetFactor = 0x8038,
        PolygonOffsetUnits = 0x2A00,
        /// Four floats: r, g, b, a
        ColorClearValue = 0x0C22,
        DepthClearValue = 0x0B73,
        StencilClearValue = 0x0B91,
        FramebufferBinding = 0x8CA6,
        /// Reported as `TEXTURE0 + unit`
        ActiveTexture = 0x84E0,
        CurrentProgram = 0x8B8D,
    }
}

device_enum! {
    /// Implementation-dependent numeric limits
    pub enum Limit {
        MaxTextureSize = 0x0D33,
        MaxCubeMapTextureSize = 0x851C,
        MaxVertexAttribs = 0x8869,
        MaxVertexUniformVectors = 0x8DFB,
        MaxVaryingVectors = 0x8DFC,
        MaxCombinedTextureImageUnits = 0x8B4D,
        MaxVertexTextureImageUnits = 0x8B4C,
        MaxTextureImageUnits = 0x8872,
        MaxFragmentUniformVectors = 0x8DFD,
        MaxRenderbufferSize = 0x84E8,
    }
}

device_enum! {
    /// Implementation description strings
    pub enum DeviceString {
        Vendor = 0x1F00,
        Renderer = 0x1F01,
        Version = 0x1F02,
        ShadingLanguageVersion = 0x8B8C,
    }
}

/// `TEXTURE0`: the active texture unit is reported relative to this
pub const TEXTURE0: u32 = 0x84C0;

// ============================================================================
// Texture formats
// ============================================================================

/// Texture storage formats
///
/// Each format maps to a (pixel format, component type) pair on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    RGBA8,
    RGB8,
    LUMINANCE8,
    RGBA4,
    RGB5_A1,
    RGB565,
    DEPTH_COMPONENT16,
    DEPTH_COMPONENT32,
    DEPTH24_STENCIL8,
}

impl TextureFormat {
    /// Device pixel format (also used as the internal format)
    pub fn pixel_format(&self) -> u32 {
        match self {
            TextureFormat::RGBA8 | TextureFormat::RGBA4 | TextureFormat::RGB5_A1 => 0x1908,
            TextureFormat::RGB8 | TextureFormat::RGB565 => 0x1907,
            TextureFormat::LUMINANCE8 => 0x1909,
            TextureFormat::DEPTH_COMPONENT16 | TextureFormat::DEPTH_COMPONENT32 => 0x1902,
            TextureFormat::DEPTH24_STENCIL8 => 0x84F9,
        }
    }

    /// Device component data type
    pub fn data_type(&self) -> u32 {
        match self {
            TextureFormat::RGBA8 | TextureFormat::RGB8 | TextureFormat::LUMINANCE8 => 0x1401,
            TextureFormat::RGBA4 => 0x8033,
            TextureFormat::RGB5_A1 => 0x8034,
            TextureFormat::RGB565 => 0x8363,
            TextureFormat::DEPTH_COMPONENT16 => 0x1403,
            TextureFormat::DEPTH_COMPONENT32 => 0x1405,
            TextureFormat::DEPTH24_STENCIL8 => 0x84FA,
        }
    }

    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::LUMINANCE8 => 1,
            TextureFormat::RGBA4
            | TextureFormat::RGB5_A1
            | TextureFormat::RGB565
            | TextureFormat::DEPTH_COMPONENT16 => 2,
            TextureFormat::RGB8 => 3,
            TextureFormat::RGBA8
            | TextureFormat::DEPTH_COMPONENT32
            | TextureFormat::DEPTH24_STENCIL8 => 4,
        }
    }

    /// Byte size of a `width` x `height` region in this format
    pub fn image_size_bytes(&self, width: u32, height: u32) -> usize {
        (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(self.bytes_per_pixel() as usize)
    }

    /// Extensions of which at least one must be present for this format
    /// to be usable (empty for core formats)
    pub fn required_extensions(&self) -> &'static [&'static str] {
        match self {
            TextureFormat::DEPTH_COMPONENT16 | TextureFormat::DEPTH_COMPONENT32 => {
                &["GL_OES_depth_texture", "GL_ARB_depth_texture"]
            }
            TextureFormat::DEPTH24_STENCIL8 => &[
                "GL_OES_packed_depth_stencil",
                "GL_EXT_packed_depth_stencil",
                "GL_ARB_framebuffer_object",
            ],
            _ => &[],
        }
    }
}

// ============================================================================
// Shader reflection and uniforms
// ============================================================================

/// An active attribute or uniform reported by a linked program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVariable {
    /// Name as declared in the shader source
    pub name: String,
    /// Bound location (-1 if the device reports none)
    pub location: i32,
    /// Raw device type of the variable
    pub kind: u32,
    /// Array size (1 for non-arrays)
    pub size: i32,
}

/// Value uploaded to a uniform location
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    IntArray(&'a [i32]),
    FloatArray(&'a [f32]),
    Vec2Array(&'a [Vec2]),
    Vec3Array(&'a [Vec3]),
    Vec4Array(&'a [Vec4]),
    Mat4Array(&'a [Mat4]),
}

impl UniformValue<'_> {
    /// Short name of the upload call, used in diagnostics
    pub fn call_name(&self) -> &'static str {
        match self {
            UniformValue::Int(_) | UniformValue::IntArray(_) => "uniform1iv",
            UniformValue::Float(_) | UniformValue::FloatArray(_) => "uniform1fv",
            UniformValue::Vec2(_) | UniformValue::Vec2Array(_) => "uniform2fv",
            UniformValue::Vec3(_) | UniformValue::Vec3Array(_) => "uniform3fv",
            UniformValue::Vec4(_) | UniformValue::Vec4Array(_) => "uniform4fv",
            UniformValue::Mat4(_) | UniformValue::Mat4Array(_) => "uniformMatrix4fv",
        }
    }

    /// Flattened float components (integers are converted)
    pub fn to_floats(&self) -> Vec<f32> {
        match self {
            UniformValue::Int(i) => vec![*i as f32],
            UniformValue::Float(f) => vec![*f],
            UniformValue::Vec2(v) => v.to_array().to_vec(),
            UniformValue::Vec3(v) => v.to_array().to_vec(),
            UniformValue::Vec4(v) => v.to_array().to_vec(),
            UniformValue::Mat4(m) => m.to_cols_array().to_vec(),
            UniformValue::IntArray(a) => a.iter().map(|i| *i as f32).collect(),
            UniformValue::FloatArray(a) => a.to_vec(),
            UniformValue::Vec2Array(a) => bytemuck::cast_slice::<Vec2, f32>(a).to_vec(),
            UniformValue::Vec3Array(a) => bytemuck::cast_slice::<Vec3, f32>(a).to_vec(),
            UniformValue::Vec4Array(a) => bytemuck::cast_slice::<Vec4, f32>(a).to_vec(),
            UniformValue::Mat4Array(a) => bytemuck::cast_slice::<Mat4, f32>(a).to_vec(),
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
