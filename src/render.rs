//! Per-frame draw orchestration.
//!
//! The [`Renderer`] walks scene objects, makes sure their geometry and
//! pose buffers are compiled, resolves shader bindings, applies the
//! object's pipeline flags and issues exactly one draw call per pass,
//! recursing into children with the composed parent transform.
//!
//! Passes run in the fixed order **face → edge → vertex**, so triangle
//! fills never occlude freshly drawn wireframe or point passes. A pass
//! with no shader is silently skipped; a pass whose binding resolution
//! fails is skipped for this frame only and logged, leaving sibling
//! passes, children and other objects untouched. No error ever unwinds
//! across a frame boundary.

use instant::{Duration, Instant};
use log::warn;

use crate::{
    camera::CameraMatrices,
    context::Context,
    data_structures::{
        geometry::CompiledGeometry,
        scene_object::{SceneObject, Transform},
    },
    device::{DeviceCapabilities, GraphicsDevice, Primitive},
    error::RenderError,
    pipelines::binding::{self, DrawInputs, PoseBinding},
};

/// One of the three rendering stages of a scene object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawPass {
    Face,
    Edge,
    Vertex,
}

impl DrawPass {
    /// Fixed per-frame execution order: fills first, lines and points on
    /// top.
    pub const ORDER: [DrawPass; 3] = [DrawPass::Face, DrawPass::Edge, DrawPass::Vertex];

    pub(crate) fn index(self) -> usize {
        match self {
            DrawPass::Face => 0,
            DrawPass::Edge => 1,
            DrawPass::Vertex => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            DrawPass::Face => "face",
            DrawPass::Edge => "edge",
            DrawPass::Vertex => "vertex",
        }
    }
}

/// The draw orchestrator. Holds no scene state of its own, only frame
/// statistics.
pub struct Renderer {
    frames: u64,
    last_frame: Option<Instant>,
    frame_time: Duration,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            frames: 0,
            last_frame: None,
            frame_time: Duration::ZERO,
        }
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Wall-clock duration between the two most recent
    /// [`render_scene`](Self::render_scene) calls.
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Clear the canvas to the context's clear colour.
    pub fn clear(&mut self, ctx: &mut Context) {
        let colour = ctx.clear_colour;
        ctx.device.clear(colour);
    }

    /// Render a whole scene: every root object and, recursively, its
    /// children.
    pub fn render_scene(&mut self, ctx: &mut Context, objects: &mut [SceneObject]) {
        let now = Instant::now();
        if let Some(last) = self.last_frame {
            self.frame_time = now - last;
        }
        self.last_frame = Some(now);
        self.frames += 1;

        let matrices = ctx.camera.matrices();
        let aspect = ctx.camera.aspect();
        let capabilities = ctx.capabilities;
        for object in objects {
            draw_node(
                ctx.device.as_mut(),
                &capabilities,
                object,
                None,
                &matrices,
                aspect,
            );
        }
    }

    /// Render a single object (and its children) with the current camera.
    pub fn render_object(&mut self, ctx: &mut Context, object: &mut SceneObject) {
        let matrices = ctx.camera.matrices();
        let aspect = ctx.camera.aspect();
        let capabilities = ctx.capabilities;
        draw_node(
            ctx.device.as_mut(),
            &capabilities,
            object,
            None,
            &matrices,
            aspect,
        );
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn draw_node(
    device: &mut dyn GraphicsDevice,
    capabilities: &DeviceCapabilities,
    object: &mut SceneObject,
    parent: Option<&Transform>,
    matrices: &CameraMatrices,
    aspect: f32,
) {
    let world = match parent {
        Some(parent) => parent.compose(&object.transform),
        None => object.transform,
    };

    // Lazy compile-on-first-use; both are cheap no-ops when clean.
    let compiled = *object.geometry.borrow_mut().compile(device);
    let instance_count = object.poses.as_ref().map(|poses| poses.count());
    let poses = object.poses.as_mut().map(|poses| PoseBinding {
        stride: poses.stride(),
        buffer: poses.ensure_uploaded(device),
    });

    let view_model = matrices.view.compose(&world);
    let pvm = matrices.proj.compose(&view_model);

    for pass in DrawPass::ORDER {
        if object.shader(pass).is_none() {
            // a pass without a shader is simply not drawn
            continue;
        }
        if let Err(e) = draw_pass(
            device,
            capabilities,
            object,
            pass,
            &compiled,
            poses,
            instance_count,
            aspect,
            &matrices.proj,
            &view_model,
            &pvm,
        ) {
            warn!("skipping {} pass for this frame: {e}", pass.label());
        }
    }

    for child in object.children.iter_mut() {
        draw_node(device, capabilities, child, Some(&world), matrices, aspect);
    }
}

fn draw_pass(
    device: &mut dyn GraphicsDevice,
    capabilities: &DeviceCapabilities,
    object: &mut SceneObject,
    pass: DrawPass,
    compiled: &CompiledGeometry,
    poses: Option<PoseBinding>,
    instance_count: Option<u32>,
    aspect: f32,
    proj: &Transform,
    view_model: &Transform,
    pvm: &Transform,
) -> Result<(), RenderError> {
    if instance_count.is_some() && !capabilities.supports_instancing {
        return Err(RenderError::binding(
            pass.label(),
            "instance poses are attached but the device does not support instancing",
        ));
    }
    if instance_count == Some(0) {
        warn!("you attempted to render something with zero instances");
        return Ok(());
    }

    let material = object.material.clone();
    let flags = object.flags;
    let shader = match object.shader_mut(pass) {
        Some(shader) => shader,
        None => return Ok(()),
    };

    let (program, slots) = shader.ensure_ready(device)?;
    let slots = slots.to_vec();
    device.use_program(program);

    {
        let mut material = material.borrow_mut();
        let mut inputs = DrawInputs {
            pass,
            aspect,
            proj: *proj,
            view_model: *view_model,
            pvm: *pvm,
            geometry: compiled,
            material: &mut *material,
            poses,
        };
        binding::resolve(shader.declarations(), &slots, &mut inputs, device)?;
    }

    device.set_depth_test(flags.depth);
    device.set_blend(flags.blend);

    match pass {
        DrawPass::Face => {
            let Some(faces) = compiled.faces else {
                return Ok(());
            };
            match instance_count {
                Some(instances) => {
                    device.draw_elements_instanced(
                        Primitive::Triangles,
                        faces.buffer,
                        faces.count,
                        instances,
                    );
                }
                None => device.draw_elements(Primitive::Triangles, faces.buffer, faces.count),
            }
        }
        DrawPass::Edge => {
            let Some(lines) = compiled.lines else {
                return Ok(());
            };
            match instance_count {
                Some(instances) => {
                    device.draw_elements_instanced(
                        Primitive::Lines,
                        lines.buffer,
                        lines.count,
                        instances,
                    );
                }
                None => device.draw_elements(Primitive::Lines, lines.buffer, lines.count),
            }
        }
        DrawPass::Vertex => {
            let count = compiled.points.count;
            if count == 0 {
                return Ok(());
            }
            match instance_count {
                Some(instances) => {
                    device.draw_arrays_instanced(Primitive::Points, 0, count, instances);
                }
                None => device.draw_arrays(Primitive::Points, 0, count),
            }
        }
    }
    Ok(())
}
