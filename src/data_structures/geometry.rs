//! Declarative geometry and its GPU compilation.
//!
//! A [`Geometry`] holds raw vertex positions, polyline edges, polygon faces
//! and optional texture/normal attributes. Compilation turns that into the
//! packed buffers a draw pass consumes:
//!
//! - a vertex point buffer (interleaved positions + packed attribute slots)
//! - a line index buffer (index pairs per edge segment)
//! - a face index buffer (triangle triples, post-triangulation)
//!
//! Faces of arbitrary size are ear-clipped into triangles. When any
//! attribute is declared per face rather than per vertex, face vertices are
//! duplicated into a second buffer region so each copy can carry its own
//! attribute value; triangle indices are remapped into that region while
//! the line buffer keeps referencing the original vertices.
//!
//! Compiled state is cached and invalidated by every mutation; rebuilding
//! happens lazily on next use and always on the render thread.

use std::collections::HashMap;

use cgmath::{InnerSpace, Matrix3, Rad, Vector3};
use log::warn;

use crate::{
    device::{BufferHandle, BufferKind, GraphicsDevice},
    error::RenderError,
};

/// Dimensionality of a geometry: 2 or 3 position floats per vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dims {
    Two,
    Three,
}

impl Dims {
    pub fn floats(self) -> usize {
        match self {
            Dims::Two => 2,
            Dims::Three => 3,
        }
    }
}

/// Whether an attribute is defined once per vertex (shared) or once per
/// polygon face (forces vertex duplication at compile time).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeScope {
    PerVertex,
    PerFace,
}

#[derive(Clone, Debug)]
struct Attribute<T> {
    scope: AttributeScope,
    values: Vec<T>,
}

/// Quantize a UV pair into one float-sized slot: each component is clamped
/// to [0, 1], scaled to u16 and bit-packed little-endian with U in the low
/// 16 bits. The GPU-side unpack is the algebraic inverse, so byte order and
/// bit width are part of the buffer contract.
pub fn pack_uv(uv: [f32; 2]) -> f32 {
    let u = (uv[0].clamp(0.0, 1.0) * 65535.0).round() as u32;
    let v = (uv[1].clamp(0.0, 1.0) * 65535.0).round() as u32;
    f32::from_bits((v << 16) | u)
}

/// Inverse of [`pack_uv`]; round-trips within 1/65535 per component.
pub fn unpack_uv(packed: f32) -> [f32; 2] {
    let bits = packed.to_bits();
    [
        (bits & 0xFFFF) as f32 / 65535.0,
        (bits >> 16) as f32 / 65535.0,
    ]
}

/// Quantize a normal triple into one float-sized slot: each component is
/// clamped to [-1, 1] and scaled to i8, with x in the lowest byte.
pub fn pack_normal(normal: [f32; 3]) -> f32 {
    let q = |c: f32| ((c.clamp(-1.0, 1.0) * 127.0).round() as i32 as u32) & 0xFF;
    f32::from_bits(q(normal[0]) | (q(normal[1]) << 8) | (q(normal[2]) << 16))
}

/// Inverse of [`pack_normal`]; round-trips within 1/127 per component.
pub fn unpack_normal(packed: f32) -> [f32; 3] {
    let bits = packed.to_bits();
    let c = |byte: u32| (byte as u8 as i8) as f32 / 127.0;
    [c(bits & 0xFF), c((bits >> 8) & 0xFF), c((bits >> 16) & 0xFF)]
}

/// Field layout of an interleaved vertex point buffer. All measures are in
/// floats (one packed attribute occupies one float-sized slot).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub position_components: u32,
    pub uv_offset: Option<u32>,
    pub normal_offset: Option<u32>,
}

/// CPU-side interleaved vertex data plus its layout.
#[derive(Clone, Debug)]
pub struct VertexPointData {
    pub data: Vec<f32>,
    pub count: u32,
    pub layout: VertexLayout,
}

/// CPU-side compiled output of a geometry, before upload.
///
/// `face_points` is only present in per-face attribute mode; its vertices
/// are the duplicated copies and `face_indices` refer into it. Otherwise
/// `face_indices` refer into `points`, like `line_indices` always do.
#[derive(Clone, Debug)]
pub struct GeometryBuffers {
    pub points: VertexPointData,
    pub face_points: Option<VertexPointData>,
    pub line_indices: Vec<u32>,
    pub face_indices: Vec<u32>,
}

impl GeometryBuffers {
    /// The vertex buffer the face pass reads from.
    pub fn face_buffer(&self) -> &VertexPointData {
        self.face_points.as_ref().unwrap_or(&self.points)
    }

    pub fn triangle_count(&self) -> u32 {
        self.face_indices.len() as u32 / 3
    }
}

/// An uploaded vertex point buffer.
#[derive(Clone, Copy, Debug)]
pub struct VertexPointBuffer {
    pub buffer: BufferHandle,
    pub count: u32,
    pub layout: VertexLayout,
}

/// An uploaded index buffer with its element count.
#[derive(Clone, Copy, Debug)]
pub struct IndexRange {
    pub buffer: BufferHandle,
    pub count: u32,
}

/// GPU handles for a compiled geometry.
#[derive(Clone, Copy, Debug)]
pub struct CompiledGeometry {
    pub points: VertexPointBuffer,
    pub face_points: Option<VertexPointBuffer>,
    pub lines: Option<IndexRange>,
    pub faces: Option<IndexRange>,
}

impl CompiledGeometry {
    /// The vertex buffer the face pass reads from.
    pub fn face_buffer(&self) -> &VertexPointBuffer {
        self.face_points.as_ref().unwrap_or(&self.points)
    }
}

/// Raw scene geometry: positions, edges, faces and optional attributes.
///
/// Built through the `add_*`/`set_*` methods, mutated through the transform
/// operators, compiled on demand. Shared across scene objects via
/// `Rc<RefCell<Geometry>>`; compilation caches live inside and are dropped
/// on every mutation.
#[derive(Clone, Debug)]
pub struct Geometry {
    dims: Dims,
    positions: Vec<f32>,
    edges: Vec<Vec<u32>>,
    faces: Vec<Vec<u32>>,
    uvs: Option<Attribute<[f32; 2]>>,
    normals: Option<Attribute<[f32; 3]>>,
    buffers: Option<GeometryBuffers>,
    uploaded: Option<CompiledGeometry>,
}

impl Geometry {
    pub fn new(dims: Dims) -> Self {
        Self {
            dims,
            positions: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            uvs: None,
            normals: None,
            buffers: None,
            uploaded: None,
        }
    }

    /// Unit square in the plane: one quad face plus its outline.
    pub fn quad() -> Self {
        let mut geometry = Self::new(Dims::Two);
        for p in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]] {
            // adding in-range vertices cannot fail
            let _ = geometry.add_vertex(&p);
        }
        let _ = geometry.add_face(&[0, 1, 2, 3]);
        let _ = geometry.add_edge(&[0, 1, 2, 3, 0]);
        geometry
    }

    /// Axis-aligned unit box: six quad faces plus the twelve edges.
    pub fn cuboid() -> Self {
        let mut geometry = Self::new(Dims::Three);
        for z in [0.0, 1.0] {
            for p in [[0.0, 0.0, z], [1.0, 0.0, z], [1.0, 1.0, z], [0.0, 1.0, z]] {
                let _ = geometry.add_vertex(&p);
            }
        }
        // bottom, top, then the four sides; all wound facing outward
        for face in [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ] {
            let _ = geometry.add_face(&face);
        }
        let _ = geometry.add_edge(&[0, 1, 2, 3, 0]);
        let _ = geometry.add_edge(&[4, 5, 6, 7, 4]);
        for (bottom, top) in [(0, 4), (1, 5), (2, 6), (3, 7)] {
            let _ = geometry.add_edge(&[bottom, top]);
        }
        geometry
    }

    /// `n`×`n` unit-spaced line grid in the plane. Lines only, no faces.
    pub fn grid(n: u32) -> Self {
        let mut geometry = Self::new(Dims::Two);
        let extent = n as f32;
        for i in 0..=n {
            let offset = i as f32;
            let a = geometry.add_vertex(&[offset, 0.0]).unwrap_or(0);
            let b = geometry.add_vertex(&[offset, extent]).unwrap_or(0);
            let _ = geometry.add_edge(&[a, b]);
            let c = geometry.add_vertex(&[0.0, offset]).unwrap_or(0);
            let d = geometry.add_vertex(&[extent, offset]).unwrap_or(0);
            let _ = geometry.add_edge(&[c, d]);
        }
        geometry
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / self.dims.floats()) as u32
    }

    pub fn face_count(&self) -> u32 {
        self.faces.len() as u32
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, position: &[f32]) -> Result<u32, RenderError> {
        if position.len() != self.dims.floats() {
            return Err(RenderError::geometry(format!(
                "expected {} position components, got {}",
                self.dims.floats(),
                position.len()
            )));
        }
        let index = self.vertex_count();
        self.positions.extend_from_slice(position);
        self.invalidate();
        Ok(index)
    }

    /// Append a polyline edge over existing vertices.
    pub fn add_edge(&mut self, indices: &[u32]) -> Result<(), RenderError> {
        if indices.len() < 2 {
            return Err(RenderError::geometry("an edge needs at least 2 vertices"));
        }
        self.check_indices(indices)?;
        self.edges.push(indices.to_vec());
        self.invalidate();
        Ok(())
    }

    /// Append a polygon face (N >= 3, not required to be a triangle) over
    /// existing vertices.
    pub fn add_face(&mut self, indices: &[u32]) -> Result<(), RenderError> {
        if indices.len() < 3 {
            return Err(RenderError::geometry("a face needs at least 3 vertices"));
        }
        self.check_indices(indices)?;
        self.faces.push(indices.to_vec());
        self.invalidate();
        Ok(())
    }

    fn check_indices(&self, indices: &[u32]) -> Result<(), RenderError> {
        let count = self.vertex_count();
        match indices.iter().find(|&&i| i >= count) {
            Some(i) => Err(RenderError::geometry(format!(
                "index {i} out of range for {count} vertices"
            ))),
            None => Ok(()),
        }
    }

    /// Set texture coordinates, one pair per vertex or per face.
    pub fn set_uvs(&mut self, scope: AttributeScope, values: Vec<[f32; 2]>) -> Result<(), RenderError> {
        let expected = match scope {
            AttributeScope::PerVertex => self.vertex_count(),
            AttributeScope::PerFace => self.face_count(),
        };
        if values.len() as u32 != expected {
            return Err(RenderError::geometry(format!(
                "expected {expected} texture coordinate pairs, got {}",
                values.len()
            )));
        }
        self.uvs = Some(Attribute { scope, values });
        self.invalidate();
        Ok(())
    }

    /// Set normals, one triple per vertex or per face. 3D only.
    pub fn set_normals(
        &mut self,
        scope: AttributeScope,
        values: Vec<[f32; 3]>,
    ) -> Result<(), RenderError> {
        if self.dims != Dims::Three {
            return Err(RenderError::geometry("normals require a 3D geometry"));
        }
        let expected = match scope {
            AttributeScope::PerVertex => self.vertex_count(),
            AttributeScope::PerFace => self.face_count(),
        };
        if values.len() as u32 != expected {
            return Err(RenderError::geometry(format!(
                "expected {expected} normals, got {}",
                values.len()
            )));
        }
        self.normals = Some(Attribute { scope, values });
        self.invalidate();
        Ok(())
    }

    /// Move every vertex by `delta`.
    pub fn translate(&mut self, delta: &[f32]) -> Result<(), RenderError> {
        if delta.len() != self.dims.floats() {
            return Err(RenderError::geometry(format!(
                "expected {} translation components, got {}",
                self.dims.floats(),
                delta.len()
            )));
        }
        for chunk in self.positions.chunks_mut(delta.len()) {
            for (p, d) in chunk.iter_mut().zip(delta) {
                *p += d;
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Uniformly scale every vertex about the origin.
    pub fn scale(&mut self, factor: f32) {
        for p in self.positions.iter_mut() {
            *p *= factor;
        }
        self.invalidate();
    }

    /// Rotate about the z axis (the only rotation a planar geometry has).
    /// Normals rotate along.
    pub fn rotate_z(&mut self, angle: Rad<f32>) {
        let rotation = Matrix3::from_angle_z(angle);
        self.rotate_by(&rotation);
    }

    /// Rotate about an arbitrary axis. 3D only.
    pub fn rotate_axis(&mut self, axis: Vector3<f32>, angle: Rad<f32>) -> Result<(), RenderError> {
        if self.dims != Dims::Three {
            return Err(RenderError::geometry(
                "axis rotation requires a 3D geometry",
            ));
        }
        let rotation = Matrix3::from_axis_angle(axis.normalize(), angle);
        self.rotate_by(&rotation);
        Ok(())
    }

    fn rotate_by(&mut self, rotation: &Matrix3<f32>) {
        let floats = self.dims.floats();
        for chunk in self.positions.chunks_mut(floats) {
            let p = match self.dims {
                Dims::Two => Vector3::new(chunk[0], chunk[1], 0.0),
                Dims::Three => Vector3::new(chunk[0], chunk[1], chunk[2]),
            };
            let rotated = rotation * p;
            chunk[0] = rotated.x;
            chunk[1] = rotated.y;
            if floats == 3 {
                chunk[2] = rotated.z;
            }
        }
        if let Some(normals) = &mut self.normals {
            for n in normals.values.iter_mut() {
                let rotated = rotation * Vector3::from(*n);
                *n = rotated.into();
            }
        }
        self.invalidate();
    }

    /// Append all vertices, edges, faces and attributes of `other`,
    /// offsetting its indices. Dims and attribute scopes must match.
    pub fn merge(&mut self, other: &Geometry) -> Result<(), RenderError> {
        if self.dims != other.dims {
            return Err(RenderError::geometry("cannot merge 2D and 3D geometry"));
        }
        fn compatible<T>(ours: &Option<Attribute<T>>, theirs: &Option<Attribute<T>>) -> bool {
            match (ours, theirs) {
                (Some(a), Some(b)) => a.scope == b.scope,
                (None, None) => true,
                _ => false,
            }
        }
        if !compatible(&self.uvs, &other.uvs) || !compatible(&self.normals, &other.normals) {
            return Err(RenderError::geometry(
                "cannot merge geometries with mismatched attribute scopes",
            ));
        }
        let offset = self.vertex_count();
        self.positions.extend_from_slice(&other.positions);
        for edge in &other.edges {
            self.edges.push(edge.iter().map(|i| i + offset).collect());
        }
        for face in &other.faces {
            self.faces.push(face.iter().map(|i| i + offset).collect());
        }
        if let (Some(a), Some(b)) = (&mut self.uvs, &other.uvs) {
            a.values.extend_from_slice(&b.values);
        }
        if let (Some(a), Some(b)) = (&mut self.normals, &other.normals) {
            a.values.extend_from_slice(&b.values);
        }
        self.invalidate();
        Ok(())
    }

    /// Drop all compiled state. Called by every mutation; the next use of
    /// [`buffers`](Self::buffers) or [`compile`](Self::compile) rebuilds.
    pub fn invalidate(&mut self) {
        self.buffers = None;
        self.uploaded = None;
    }

    pub fn is_compiled(&self) -> bool {
        self.buffers.is_some()
    }

    /// The CPU-side compiled buffers, rebuilding them if stale.
    pub fn buffers(&mut self) -> &GeometryBuffers {
        if self.buffers.is_none() {
            let built = self.build_buffers();
            self.buffers = Some(built);
        }
        self.buffers.as_ref().unwrap()
    }

    /// The uploaded GPU buffers, compiling and uploading if stale.
    pub fn compile(&mut self, device: &mut dyn GraphicsDevice) -> &CompiledGeometry {
        if self.buffers.is_none() {
            let built = self.build_buffers();
            self.buffers = Some(built);
        }
        if self.uploaded.is_none() {
            let buffers = self.buffers.as_ref().unwrap();
            if !device.capabilities().supports_large_indices
                && buffers.face_buffer().count > u16::MAX as u32
            {
                warn!(
                    "geometry has {} vertices but the device cannot draw 32-bit indices",
                    buffers.face_buffer().count
                );
            }
            let upload_points = |device: &mut dyn GraphicsDevice, points: &VertexPointData| {
                VertexPointBuffer {
                    buffer: device.create_buffer(BufferKind::Vertex, bytemuck::cast_slice(&points.data)),
                    count: points.count,
                    layout: points.layout,
                }
            };
            let upload_indices = |device: &mut dyn GraphicsDevice, indices: &[u32]| {
                (!indices.is_empty()).then(|| IndexRange {
                    buffer: device.create_buffer(BufferKind::Index, bytemuck::cast_slice(indices)),
                    count: indices.len() as u32,
                })
            };
            self.uploaded = Some(CompiledGeometry {
                points: upload_points(device, &buffers.points),
                face_points: buffers
                    .face_points
                    .as_ref()
                    .map(|p| upload_points(device, p)),
                lines: upload_indices(device, &buffers.line_indices),
                faces: upload_indices(device, &buffers.face_indices),
            });
        }
        self.uploaded.as_ref().unwrap()
    }

    fn build_buffers(&self) -> GeometryBuffers {
        let uvs = self.checked_attribute(&self.uvs, "texture");
        let normals = self.checked_attribute(&self.normals, "normal");
        let per_face = uvs.map(|a| a.scope) == Some(AttributeScope::PerFace)
            || normals.map(|a| a.scope) == Some(AttributeScope::PerFace);

        let positions = self.dims.floats() as u32;
        let vertex_count = self.vertex_count();

        // The original-order buffer. In per-face mode it only carries
        // positions (shared vertices cannot hold per-face values) and the
        // attribute slots move to the duplicated face buffer.
        let point_layout = if per_face {
            interleaved_layout(positions, false, false)
        } else {
            interleaved_layout(positions, uvs.is_some(), normals.is_some())
        };
        let mut point_data = Vec::with_capacity((vertex_count * point_layout.stride) as usize);
        for vertex in 0..vertex_count {
            self.push_position(&mut point_data, vertex);
            if !per_face {
                if let Some(attribute) = uvs {
                    point_data.push(pack_uv(attribute.values[vertex as usize]));
                }
                if let Some(attribute) = normals {
                    point_data.push(pack_normal(attribute.values[vertex as usize]));
                }
            }
        }
        let points = VertexPointData {
            data: point_data,
            count: vertex_count,
            layout: point_layout,
        };

        // Line segments always reference the original vertices.
        let mut line_indices = Vec::new();
        for edge in &self.edges {
            for pair in edge.windows(2) {
                line_indices.extend_from_slice(pair);
            }
        }

        let mut face_indices = Vec::new();
        let mut face_points = per_face.then(|| VertexPointData {
            data: Vec::new(),
            count: 0,
            layout: interleaved_layout(positions, uvs.is_some(), normals.is_some()),
        });
        for (face_index, face) in self.faces.iter().enumerate() {
            let triangles = triangulate(face, &self.positions, self.dims);
            match &mut face_points {
                Some(duplicated) => {
                    // Copy this face's vertices into their own region and
                    // remember where each original id landed, so triangle
                    // indices can be remapped without rescanning the face.
                    let region_offset = duplicated.count;
                    let mut slot_of = HashMap::with_capacity(face.len());
                    for (slot, &vertex) in face.iter().enumerate() {
                        self.push_position(&mut duplicated.data, vertex);
                        if let Some(attribute) = uvs {
                            let uv = match attribute.scope {
                                AttributeScope::PerFace => attribute.values[face_index],
                                AttributeScope::PerVertex => attribute.values[vertex as usize],
                            };
                            duplicated.data.push(pack_uv(uv));
                        }
                        if let Some(attribute) = normals {
                            let normal = match attribute.scope {
                                AttributeScope::PerFace => attribute.values[face_index],
                                AttributeScope::PerVertex => attribute.values[vertex as usize],
                            };
                            duplicated.data.push(pack_normal(normal));
                        }
                        slot_of.entry(vertex).or_insert(slot as u32);
                    }
                    duplicated.count += face.len() as u32;
                    for triangle in &triangles {
                        for vertex in triangle {
                            // the triangulator only emits this face's ids
                            let slot = slot_of.get(vertex).copied().unwrap_or(0);
                            face_indices.push(region_offset + slot);
                        }
                    }
                }
                None => {
                    for triangle in &triangles {
                        face_indices.extend_from_slice(triangle);
                    }
                }
            }
        }

        GeometryBuffers {
            points,
            face_points,
            line_indices,
            face_indices,
        }
    }

    fn push_position(&self, out: &mut Vec<f32>, vertex: u32) {
        let floats = self.dims.floats();
        let start = vertex as usize * floats;
        out.extend_from_slice(&self.positions[start..start + floats]);
    }

    /// An attribute whose length no longer matches (vertices or faces were
    /// added after it was set) is skipped with a warning rather than
    /// shifting every value silently.
    fn checked_attribute<'a, T>(
        &self,
        attribute: &'a Option<Attribute<T>>,
        label: &str,
    ) -> Option<&'a Attribute<T>> {
        let attribute = attribute.as_ref()?;
        let expected = match attribute.scope {
            AttributeScope::PerVertex => self.vertex_count(),
            AttributeScope::PerFace => self.face_count(),
        } as usize;
        if attribute.values.len() != expected {
            warn!(
                "{label} attribute has {} values but {expected} are needed, skipping it",
                attribute.values.len()
            );
            return None;
        }
        Some(attribute)
    }
}

fn interleaved_layout(position_components: u32, uv: bool, normal: bool) -> VertexLayout {
    let mut stride = position_components;
    let uv_offset = uv.then(|| {
        let offset = stride;
        stride += 1;
        offset
    });
    let normal_offset = normal.then(|| {
        let offset = stride;
        stride += 1;
        offset
    });
    VertexLayout {
        stride,
        position_components,
        uv_offset,
        normal_offset,
    }
}

fn vertex_at(positions: &[f32], dims: Dims, index: u32) -> Vector3<f32> {
    let start = index as usize * dims.floats();
    match dims {
        Dims::Two => Vector3::new(positions[start], positions[start + 1], 0.0),
        Dims::Three => Vector3::new(
            positions[start],
            positions[start + 1],
            positions[start + 2],
        ),
    }
}

/// Orientation of the polygon: z-signed double area in 2D, Newell normal
/// in 3D. Only the direction matters.
fn polygon_normal(face: &[u32], positions: &[f32], dims: Dims) -> Vector3<f32> {
    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    for (k, &i) in face.iter().enumerate() {
        let a = vertex_at(positions, dims, i);
        let b = vertex_at(positions, dims, face[(k + 1) % face.len()]);
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// `p` strictly inside triangle `(a, b, c)` wound consistently with `n`:
/// all three edge cross products point the same way. Boundary points do
/// not count as inside, so shared polygon vertices never block an ear.
fn point_in_triangle(
    p: Vector3<f32>,
    a: Vector3<f32>,
    b: Vector3<f32>,
    c: Vector3<f32>,
    n: Vector3<f32>,
) -> bool {
    (b - a).cross(p - a).dot(n) > 0.0
        && (c - b).cross(p - b).dot(n) > 0.0
        && (a - c).cross(p - c).dot(n) > 0.0
}

/// Ear-clipping triangulation of one polygon face.
///
/// Walks the shrinking index list looking for a convex corner that holds no
/// other remaining vertex, emits it and removes the middle vertex. Bounded
/// at 10×N iterations; a polygon that defeats the walk (self-intersecting,
/// collinear runs) degrades to a logged best-effort fan over whatever is
/// left. Never fails.
fn triangulate(face: &[u32], positions: &[f32], dims: Dims) -> Vec<[u32; 3]> {
    let n = face.len();
    let mut triangles = Vec::with_capacity(n.saturating_sub(2));
    if n < 3 {
        return triangles;
    }
    if n == 3 {
        triangles.push([face[0], face[1], face[2]]);
        return triangles;
    }

    let normal = polygon_normal(face, positions, dims);
    let mut working: Vec<u32> = face.to_vec();
    let mut cursor = 0usize;
    let mut budget = 10 * n;

    while working.len() > 3 && budget > 0 {
        budget -= 1;
        let len = working.len();
        let i0 = cursor % len;
        let i1 = (cursor + 1) % len;
        let i2 = (cursor + 2) % len;
        let a = vertex_at(positions, dims, working[i0]);
        let b = vertex_at(positions, dims, working[i1]);
        let c = vertex_at(positions, dims, working[i2]);

        let convex = (b - a).cross(c - a).dot(normal) > 0.0;
        let ear = convex
            && working
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != i0 && *k != i1 && *k != i2)
                .all(|(_, &v)| {
                    !point_in_triangle(vertex_at(positions, dims, v), a, b, c, normal)
                });

        if ear {
            triangles.push([working[i0], working[i1], working[i2]]);
            working.remove(i1);
        } else {
            cursor += 1;
        }
        cursor %= working.len();
    }

    if working.len() == 3 {
        triangles.push([working[0], working[1], working[2]]);
    } else {
        warn!(
            "triangulation of a {n}-gon did not converge within {} iterations, emitting a fan over the remaining {} vertices",
            10 * n,
            working.len()
        );
        for k in 1..working.len() - 1 {
            triangles.push([working[0], working[k], working[k + 1]]);
        }
    }
    triangles
}
