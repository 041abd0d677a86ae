//! The pluggable graphics-device collaborator.
//!
//! Everything backend-specific lives behind [`GraphicsDevice`]: buffer and
//! texture creation, program compilation, uniform/attribute assignment and
//! the actual draw calls. A browser canvas context, a desktop GL context or
//! a recording mock for tests all implement the same trait; the rest of the
//! crate never sees anything more concrete than the opaque handles below.
//!
//! All calls happen on the render thread. Implementations are not expected
//! to be thread-safe and the core never issues two calls concurrently.

/// Handle to a GPU buffer created by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Handle to a GPU texture created by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Handle to a compiled-and-linked shader program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Location of a uniform variable within a compiled program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Location of a vertex attribute within a compiled program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeLocation(pub u32);

/// What a buffer is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Primitive topology for a draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Points,
    Lines,
    Triangles,
}

/// Depth comparison function, applied when the depth test is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Source/destination factor for the blend equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend function as a factor pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendState {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendState {
    /// Standard alpha blending (`SrcAlpha`, `OneMinusSrcAlpha`).
    pub const ALPHA: BlendState = BlendState {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Additive blending (`SrcAlpha`, `One`), the usual choice for glow.
    pub const ADDITIVE: BlendState = BlendState {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::One,
    };
}

/// GPU pipeline state a [`SceneObject`](crate::data_structures::scene_object::SceneObject)
/// declares for its draw passes. `None` disables the respective stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineFlags {
    pub depth: Option<DepthFunc>,
    pub blend: Option<BlendState>,
}

impl Default for PipelineFlags {
    fn default() -> Self {
        Self {
            depth: Some(DepthFunc::Less),
            blend: None,
        }
    }
}

/// Component encoding of a bound vertex attribute.
///
/// The packed variants tell the backend to reinterpret the bytes of the
/// packed float slot produced by the geometry compiler: normalized u16
/// pairs for texture coordinates, normalized i8 triples for normals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeEncoding {
    Float32,
    PackedUnorm16,
    PackedSnorm8,
}

/// Full description of one vertex-attribute binding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributeBinding {
    pub buffer: BufferHandle,
    pub components: u32,
    pub encoding: AttributeEncoding,
    /// Distance between consecutive elements, in bytes.
    pub stride: u32,
    /// Offset of the first element within the buffer, in bytes.
    pub offset: u32,
    /// 0 advances per vertex, 1 advances per instance.
    pub divisor: u32,
}

/// Texture minification/magnification filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Texture addressing outside [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureWrap {
    Clamp,
    Repeat,
}

/// Sampling parameters applied to an uploaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureParams {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap: TextureWrap::Repeat,
        }
    }
}

/// What the backend is capable of.
///
/// Queried once at context creation; the renderer consults it before
/// selecting instanced draws or uploading large index ranges.
#[derive(Clone, Copy, Debug)]
pub struct DeviceCapabilities {
    pub supports_instancing: bool,
    /// Whether 32-bit element indices can be drawn directly.
    pub supports_large_indices: bool,
    pub max_texture_size: u32,
}

/// The raw draw primitives the render core consumes.
///
/// The contract mirrors what both targeted backends (browser canvas
/// context, desktop graphics context) natively offer: create/upload
/// resources, look up locations once per program, set values by location,
/// flip fixed-function state and issue draws.
pub trait GraphicsDevice {
    fn capabilities(&self) -> DeviceCapabilities;

    // Buffers
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> BufferHandle;
    fn update_buffer(&mut self, buffer: BufferHandle, contents: &[u8]);

    // Textures (always RGBA8, row-major, tightly packed)
    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> TextureHandle;
    fn set_texture_parameters(&mut self, texture: TextureHandle, params: &TextureParams);

    // Programs
    /// Compile and link a program. `Err` carries the backend's log text.
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle, String>;
    fn use_program(&mut self, program: ProgramHandle);
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn attribute_location(
        &mut self,
        program: ProgramHandle,
        name: &str,
    ) -> Option<AttributeLocation>;

    // Uniforms and attributes, by location
    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32);
    /// Vector uniforms; `value.len()` is 2, 3 or 4.
    fn set_uniform_vec(&mut self, location: UniformLocation, value: &[f32]);
    fn set_uniform_mat3(&mut self, location: UniformLocation, value: &[f32; 9]);
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &[f32; 16]);
    fn bind_texture(&mut self, location: UniformLocation, unit: u32, texture: TextureHandle);
    fn bind_attribute(&mut self, location: AttributeLocation, binding: &AttributeBinding);

    // Fixed-function state
    fn set_depth_test(&mut self, func: Option<DepthFunc>);
    fn set_blend(&mut self, blend: Option<BlendState>);
    fn set_viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, colour: [f32; 4]);

    // Draws
    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);
    fn draw_arrays_instanced(
        &mut self,
        primitive: Primitive,
        first: u32,
        count: u32,
        instances: u32,
    );
    fn draw_elements(&mut self, primitive: Primitive, indices: BufferHandle, count: u32);
    fn draw_elements_instanced(
        &mut self,
        primitive: Primitive,
        indices: BufferHandle,
        count: u32,
        instances: u32,
    );
}
