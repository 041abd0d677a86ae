//! Semantic shader bindings and their per-frame resolution.
//!
//! A shader declares, per variable, either a semantic binding key (what
//! data source populates it) or a literal constant. Keys use a small wire
//! syntax, `namespace.field[:param...]`:
//!
//! | key | resolves to |
//! |---|---|
//! | `material.color` | draw-mode-indexed colour of the active material |
//! | `material.texture[:unit]` | the material texture on the given unit |
//! | `renderer.aspect` | canvas aspect ratio |
//! | `renderer.pvm` | projection × view × model |
//! | `renderer.proj` | projection only |
//! | `renderer.vwmd` | view × model |
//! | `geometry.coords` | position sub-range of the vertex point buffer |
//! | `geometry.textuv` | packed texture-coordinate sub-range |
//! | `geometry.normal` | packed normal sub-range |
//! | `instance.pose:<stride>:<offset>` | divisor-1 instance attribute |
//!
//! Keys are parsed once, when the declaration is made; an unknown or
//! malformed key is a declare-time error instead of a silent per-frame
//! fallthrough. Per-frame resolution only re-reads dynamic values.

use cgmath::{Matrix3, Matrix4};

use crate::{
    data_structures::{
        geometry::{CompiledGeometry, VertexPointBuffer},
        material::Material,
        scene_object::Transform,
    },
    device::{
        AttributeBinding, AttributeEncoding, AttributeLocation, BufferHandle, GraphicsDevice,
        UniformLocation,
    },
    error::RenderError,
    render::DrawPass,
};

/// Declared numeric type of a shader variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Sampler,
}

impl VarType {
    /// Component count for the vector-like types.
    fn components(self) -> Option<u32> {
        match self {
            VarType::Scalar => Some(1),
            VarType::Vec2 => Some(2),
            VarType::Vec3 => Some(3),
            VarType::Vec4 => Some(4),
            VarType::Mat3 | VarType::Mat4 | VarType::Sampler => None,
        }
    }
}

/// A parsed semantic binding key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKey {
    MaterialColour,
    MaterialTexture { unit: u32 },
    RendererAspect,
    RendererPvm,
    RendererProj,
    RendererVwmd,
    GeometryCoords,
    GeometryTexUv,
    GeometryNormal,
    InstancePose { stride: u32, offset: u32 },
}

impl BindingKey {
    /// Parse the wire syntax. Errors name the offending key so a typo
    /// surfaces the moment the binding is declared.
    pub fn parse(key: &str) -> Result<BindingKey, RenderError> {
        let mut parts = key.split(':');
        let base = parts.next().unwrap_or_default();
        let params: Vec<&str> = parts.collect();
        let number = |raw: &str| {
            raw.parse::<u32>().map_err(|_| {
                RenderError::binding(key, format!("`{raw}` is not a valid number parameter"))
            })
        };
        match (base, params.as_slice()) {
            ("material.color", []) => Ok(BindingKey::MaterialColour),
            ("material.texture", []) => Ok(BindingKey::MaterialTexture { unit: 0 }),
            ("material.texture", [unit]) => Ok(BindingKey::MaterialTexture {
                unit: number(unit)?,
            }),
            ("renderer.aspect", []) => Ok(BindingKey::RendererAspect),
            ("renderer.pvm", []) => Ok(BindingKey::RendererPvm),
            ("renderer.proj", []) => Ok(BindingKey::RendererProj),
            ("renderer.vwmd", []) => Ok(BindingKey::RendererVwmd),
            ("geometry.coords", []) => Ok(BindingKey::GeometryCoords),
            ("geometry.textuv", []) => Ok(BindingKey::GeometryTexUv),
            ("geometry.normal", []) => Ok(BindingKey::GeometryNormal),
            ("instance.pose", [stride, offset]) => Ok(BindingKey::InstancePose {
                stride: number(stride)?,
                offset: number(offset)?,
            }),
            _ => Err(RenderError::binding(key, "unknown semantic binding key")),
        }
    }

    /// Whether the key binds a vertex attribute (everything else is a
    /// uniform).
    pub fn is_attribute(&self) -> bool {
        matches!(
            self,
            BindingKey::GeometryCoords
                | BindingKey::GeometryTexUv
                | BindingKey::GeometryNormal
                | BindingKey::InstancePose { .. }
        )
    }
}

/// What populates a declared shader variable.
#[derive(Clone, Debug, PartialEq)]
pub enum BindingSource {
    Semantic(BindingKey),
    /// Literal constants bypass semantic lookup entirely.
    Literal(Vec<f32>),
}

/// One declared shader variable.
#[derive(Clone, Debug)]
pub struct BindingDecl {
    pub name: String,
    pub ty: VarType,
    pub source: BindingSource,
}

/// Location slot cached by the validation phase, one per declaration.
#[derive(Clone, Copy, Debug)]
pub(crate) enum VarSlot {
    Uniform(Option<UniformLocation>),
    Attribute(Option<AttributeLocation>),
}

/// Per-instance attribute input for the resolver.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PoseBinding {
    pub buffer: BufferHandle,
    /// Stride of the underlying buffer, in floats.
    pub stride: u32,
}

/// Everything dynamic a draw pass resolves against.
pub(crate) struct DrawInputs<'a> {
    pub pass: DrawPass,
    pub aspect: f32,
    pub proj: Transform,
    pub view_model: Transform,
    pub pvm: Transform,
    pub geometry: &'a CompiledGeometry,
    pub material: &'a mut Material,
    pub poses: Option<PoseBinding>,
}

impl<'a> DrawInputs<'a> {
    /// The vertex buffer geometry attributes read from in this pass: the
    /// duplicated face region for the face pass, the original-order buffer
    /// otherwise.
    fn pass_buffer(&self) -> &VertexPointBuffer {
        match self.pass {
            DrawPass::Face => self.geometry.face_buffer(),
            DrawPass::Edge | DrawPass::Vertex => &self.geometry.points,
        }
    }
}

fn mat3_array(matrix: &Matrix3<f32>) -> [f32; 9] {
    let flat: &[f32; 9] = matrix.as_ref();
    *flat
}

fn mat4_array(matrix: &Matrix4<f32>) -> [f32; 16] {
    let flat: &[f32; 16] = matrix.as_ref();
    *flat
}

fn set_matrix(
    device: &mut dyn GraphicsDevice,
    name: &str,
    ty: VarType,
    location: UniformLocation,
    value: &Transform,
) -> Result<(), RenderError> {
    match (ty, value) {
        (VarType::Mat3, Transform::Planar(matrix)) => {
            device.set_uniform_mat3(location, &mat3_array(matrix));
            Ok(())
        }
        (VarType::Mat4, Transform::Spatial(matrix)) => {
            device.set_uniform_mat4(location, &mat4_array(matrix));
            Ok(())
        }
        (VarType::Mat3, Transform::Spatial(_)) | (VarType::Mat4, Transform::Planar(_)) => Err(
            RenderError::binding(name, "matrix arity does not match the active camera"),
        ),
        _ => Err(RenderError::binding(name, "expected a mat3 or mat4 variable")),
    }
}

/// Resolve every declaration of a shader into one device call. Fails fast
/// with a named error; the renderer turns that into a skipped pass.
pub(crate) fn resolve(
    declarations: &[BindingDecl],
    slots: &[VarSlot],
    inputs: &mut DrawInputs,
    device: &mut dyn GraphicsDevice,
) -> Result<(), RenderError> {
    for (declaration, slot) in declarations.iter().zip(slots) {
        resolve_one(declaration, slot, inputs, device)?;
    }
    Ok(())
}

fn uniform_slot(declaration: &BindingDecl, slot: &VarSlot) -> Result<UniformLocation, RenderError> {
    match slot {
        VarSlot::Uniform(Some(location)) => Ok(*location),
        VarSlot::Uniform(None) => Err(RenderError::binding(
            &declaration.name,
            "uniform not found in the compiled program",
        )),
        VarSlot::Attribute(_) => Err(RenderError::binding(
            &declaration.name,
            "declared as a uniform but bound as an attribute",
        )),
    }
}

fn attribute_slot(
    declaration: &BindingDecl,
    slot: &VarSlot,
) -> Result<AttributeLocation, RenderError> {
    match slot {
        VarSlot::Attribute(Some(location)) => Ok(*location),
        VarSlot::Attribute(None) => Err(RenderError::binding(
            &declaration.name,
            "attribute not found in the compiled program",
        )),
        VarSlot::Uniform(_) => Err(RenderError::binding(
            &declaration.name,
            "declared as an attribute but bound as a uniform",
        )),
    }
}

fn resolve_one(
    declaration: &BindingDecl,
    slot: &VarSlot,
    inputs: &mut DrawInputs,
    device: &mut dyn GraphicsDevice,
) -> Result<(), RenderError> {
    let name = declaration.name.as_str();
    let key = match &declaration.source {
        BindingSource::Literal(values) => {
            let location = uniform_slot(declaration, slot)?;
            return set_literal(device, name, declaration.ty, location, values);
        }
        BindingSource::Semantic(key) => *key,
    };

    match key {
        BindingKey::MaterialColour => {
            let location = uniform_slot(declaration, slot)?;
            let colour = inputs.material.colour(inputs.pass);
            match declaration.ty {
                VarType::Vec4 => device.set_uniform_vec(location, &colour),
                VarType::Vec3 => device.set_uniform_vec(location, &colour[..3]),
                _ => {
                    return Err(RenderError::binding(
                        name,
                        "material.color needs a vec3 or vec4 variable",
                    ));
                }
            }
        }
        BindingKey::MaterialTexture { unit } => {
            if declaration.ty != VarType::Sampler {
                return Err(RenderError::binding(
                    name,
                    "material.texture needs a sampler variable",
                ));
            }
            let location = uniform_slot(declaration, slot)?;
            let texture = inputs
                .material
                .texture_mut()
                .ok_or_else(|| RenderError::binding(name, "the active material has no texture"))?;
            let handle = texture.handle(device)?;
            device.bind_texture(location, unit, handle);
        }
        BindingKey::RendererAspect => {
            if declaration.ty != VarType::Scalar {
                return Err(RenderError::binding(
                    name,
                    "renderer.aspect needs a scalar variable",
                ));
            }
            let location = uniform_slot(declaration, slot)?;
            device.set_uniform_f32(location, inputs.aspect);
        }
        BindingKey::RendererPvm => {
            let location = uniform_slot(declaration, slot)?;
            set_matrix(device, name, declaration.ty, location, &inputs.pvm)?;
        }
        BindingKey::RendererProj => {
            let location = uniform_slot(declaration, slot)?;
            set_matrix(device, name, declaration.ty, location, &inputs.proj)?;
        }
        BindingKey::RendererVwmd => {
            let location = uniform_slot(declaration, slot)?;
            set_matrix(device, name, declaration.ty, location, &inputs.view_model)?;
        }
        BindingKey::GeometryCoords => {
            let location = attribute_slot(declaration, slot)?;
            let buffer = inputs.pass_buffer();
            device.bind_attribute(
                location,
                &AttributeBinding {
                    buffer: buffer.buffer,
                    components: buffer.layout.position_components,
                    encoding: AttributeEncoding::Float32,
                    stride: buffer.layout.stride * 4,
                    offset: 0,
                    divisor: 0,
                },
            );
        }
        BindingKey::GeometryTexUv => {
            let location = attribute_slot(declaration, slot)?;
            let buffer = inputs.pass_buffer();
            let offset = buffer.layout.uv_offset.ok_or_else(|| {
                RenderError::binding(name, "no texture coordinates compiled for this pass")
            })?;
            device.bind_attribute(
                location,
                &AttributeBinding {
                    buffer: buffer.buffer,
                    components: 2,
                    encoding: AttributeEncoding::PackedUnorm16,
                    stride: buffer.layout.stride * 4,
                    offset: offset * 4,
                    divisor: 0,
                },
            );
        }
        BindingKey::GeometryNormal => {
            let location = attribute_slot(declaration, slot)?;
            let buffer = inputs.pass_buffer();
            let offset = buffer
                .layout
                .normal_offset
                .ok_or_else(|| RenderError::binding(name, "no normals compiled for this pass"))?;
            device.bind_attribute(
                location,
                &AttributeBinding {
                    buffer: buffer.buffer,
                    components: 3,
                    encoding: AttributeEncoding::PackedSnorm8,
                    stride: buffer.layout.stride * 4,
                    offset: offset * 4,
                    divisor: 0,
                },
            );
        }
        BindingKey::InstancePose { stride, offset } => {
            let location = attribute_slot(declaration, slot)?;
            let poses = inputs
                .poses
                .ok_or_else(|| RenderError::binding(name, "the object has no instance poses"))?;
            let components = declaration.ty.components().ok_or_else(|| {
                RenderError::binding(name, "instance.pose needs a scalar or vector variable")
            })?;
            if stride != poses.stride {
                return Err(RenderError::binding(
                    name,
                    format!(
                        "declared stride {stride} does not match the pose buffer stride {}",
                        poses.stride
                    ),
                ));
            }
            if offset + components > stride {
                return Err(RenderError::binding(
                    name,
                    format!("offset {offset} plus {components} components exceeds stride {stride}"),
                ));
            }
            device.bind_attribute(
                location,
                &AttributeBinding {
                    buffer: poses.buffer,
                    components,
                    encoding: AttributeEncoding::Float32,
                    stride: stride * 4,
                    offset: offset * 4,
                    divisor: 1,
                },
            );
        }
    }
    Ok(())
}

fn set_literal(
    device: &mut dyn GraphicsDevice,
    name: &str,
    ty: VarType,
    location: UniformLocation,
    values: &[f32],
) -> Result<(), RenderError> {
    let expected = match ty {
        VarType::Scalar => 1,
        VarType::Vec2 => 2,
        VarType::Vec3 => 3,
        VarType::Vec4 => 4,
        VarType::Mat3 => 9,
        VarType::Mat4 => 16,
        VarType::Sampler => {
            return Err(RenderError::binding(name, "samplers cannot be literals"));
        }
    };
    if values.len() != expected {
        return Err(RenderError::binding(
            name,
            format!("literal has {} values but the type needs {expected}", values.len()),
        ));
    }
    match ty {
        VarType::Scalar => device.set_uniform_f32(location, values[0]),
        VarType::Vec2 | VarType::Vec3 | VarType::Vec4 => device.set_uniform_vec(location, values),
        VarType::Mat3 => {
            let mut matrix = [0.0; 9];
            matrix.copy_from_slice(values);
            device.set_uniform_mat3(location, &matrix);
        }
        VarType::Mat4 => {
            let mut matrix = [0.0; 16];
            matrix.copy_from_slice(values);
            device.set_uniform_mat4(location, &matrix);
        }
        VarType::Sampler => unreachable!(),
    }
    Ok(())
}
