//! Scene objects and the transform hierarchy.
//!
//! A [`SceneObject`] couples a shared [`Geometry`] and [`Material`] with up
//! to three shaders (one per draw pass), a model transform, an optional
//! instance pose buffer and child objects. Children inherit the composed
//! parent transform at render time.
//!
//! Geometry and material are `Rc<RefCell<..>>` so several objects can share
//! them read-mostly on the single render thread. Shaders are NOT shared:
//! each object keeps its own binding-value copies even when the compiled
//! program behind them is the same, so one object's bindings can never leak
//! into another object's draw call.

use std::{cell::RefCell, rc::Rc};

use cgmath::{Matrix3, Matrix4, Rad, Vector2, Vector3};
use log::warn;

use crate::{
    data_structures::{
        geometry::{Dims, Geometry},
        instance::InstancePoseBuffer,
        material::Material,
    },
    device::PipelineFlags,
    pipelines::shader::Shader,
    render::DrawPass,
};

/// A model or view transform: homogeneous 3×3 in the plane, 4×4 in space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    Planar(Matrix3<f32>),
    Spatial(Matrix4<f32>),
}

impl Transform {
    pub fn identity(dims: Dims) -> Self {
        match dims {
            Dims::Two => Transform::Planar(Matrix3::from_scale(1.0)),
            Dims::Three => Transform::Spatial(Matrix4::from_scale(1.0)),
        }
    }

    pub fn planar_translation(delta: Vector2<f32>) -> Self {
        Transform::Planar(Matrix3::from_translation(delta))
    }

    pub fn planar_rotation(angle: Rad<f32>) -> Self {
        Transform::Planar(Matrix3::from_angle_z(angle))
    }

    pub fn spatial_translation(delta: Vector3<f32>) -> Self {
        Transform::Spatial(Matrix4::from_translation(delta))
    }

    pub fn spatial_rotation(axis: Vector3<f32>, angle: Rad<f32>) -> Self {
        Transform::Spatial(Matrix4::from_axis_angle(axis, angle))
    }

    pub fn scaling(dims: Dims, factor: f32) -> Self {
        match dims {
            Dims::Two => Transform::Planar(Matrix3::from_scale(factor)),
            Dims::Three => Transform::Spatial(Matrix4::from_scale(factor)),
        }
    }

    /// `self * child`, the parent-to-world composition. Mixing planar and
    /// spatial transforms in one hierarchy is a modelling mistake; the
    /// child is kept unchanged and a warning is logged.
    pub fn compose(&self, child: &Transform) -> Transform {
        match (self, child) {
            (Transform::Planar(parent), Transform::Planar(local)) => {
                Transform::Planar(parent * local)
            }
            (Transform::Spatial(parent), Transform::Spatial(local)) => {
                Transform::Spatial(parent * local)
            }
            _ => {
                warn!("cannot compose a planar with a spatial transform, keeping the child as is");
                *child
            }
        }
    }

    pub fn as_planar(&self) -> Option<&Matrix3<f32>> {
        match self {
            Transform::Planar(matrix) => Some(matrix),
            Transform::Spatial(_) => None,
        }
    }

    pub fn as_spatial(&self) -> Option<&Matrix4<f32>> {
        match self {
            Transform::Planar(_) => None,
            Transform::Spatial(matrix) => Some(matrix),
        }
    }
}

/// One renderable node of the scene hierarchy.
pub struct SceneObject {
    pub geometry: Rc<RefCell<Geometry>>,
    pub material: Rc<RefCell<Material>>,
    shaders: [Option<Shader>; 3],
    pub transform: Transform,
    pub poses: Option<InstancePoseBuffer>,
    pub flags: PipelineFlags,
    pub children: Vec<SceneObject>,
}

impl SceneObject {
    /// Take sole ownership of a geometry and material.
    pub fn new(geometry: Geometry, material: Material) -> Self {
        let dims = geometry.dims();
        Self::shared(
            Rc::new(RefCell::new(geometry)),
            Rc::new(RefCell::new(material)),
            dims,
        )
    }

    /// Share an existing geometry and material with other objects.
    pub fn shared(
        geometry: Rc<RefCell<Geometry>>,
        material: Rc<RefCell<Material>>,
        dims: Dims,
    ) -> Self {
        Self {
            geometry,
            material,
            shaders: [None, None, None],
            transform: Transform::identity(dims),
            poses: None,
            flags: PipelineFlags::default(),
            children: Vec::new(),
        }
    }

    /// Assign the shader for one draw pass. The object takes its own copy
    /// of the binding values; clone a compiled [`Shader`] to share the
    /// program across objects.
    pub fn set_shader(&mut self, pass: DrawPass, shader: Shader) {
        self.shaders[pass.index()] = Some(shader);
    }

    /// Remove the shader for a pass; the pass is silently skipped from
    /// then on.
    pub fn clear_shader(&mut self, pass: DrawPass) {
        self.shaders[pass.index()] = None;
    }

    pub fn shader(&self, pass: DrawPass) -> Option<&Shader> {
        self.shaders[pass.index()].as_ref()
    }

    pub(crate) fn shader_mut(&mut self, pass: DrawPass) -> Option<&mut Shader> {
        self.shaders[pass.index()].as_mut()
    }

    /// Attach per-instance poses; the next draw of this object becomes an
    /// instanced draw.
    pub fn set_poses(&mut self, poses: InstancePoseBuffer) {
        self.poses = Some(poses);
    }

    pub fn poses_mut(&mut self) -> Option<&mut InstancePoseBuffer> {
        self.poses.as_mut()
    }

    pub fn add_child(&mut self, child: SceneObject) {
        self.children.push(child);
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Pre-multiply an incremental operator onto the current transform.
    pub fn apply(&mut self, operator: &Transform) {
        self.transform = operator.compose(&self.transform);
    }
}
