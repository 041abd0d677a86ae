//! Per-instance pose data for GPU instancing.
//!
//! An [`InstancePoseBuffer`] holds a flat array of fixed-stride float
//! tuples; one instanced draw call renders `count` copies of the owning
//! geometry, each instance reading its `stride`-wide slice through a
//! divisor-1 vertex attribute. What the floats mean (position, colour,
//! rotation, ...) is between the caller and the shader's
//! `instance.pose:<stride>:<offset>` bindings.

use log::warn;

use crate::{
    device::{BufferHandle, BufferKind, GraphicsDevice},
    error::RenderError,
};

/// Flat per-instance attribute storage with lazy, dirty-tracked upload.
///
/// Mutations only touch the CPU copy; the GPU buffer is created or
/// rewritten on the next draw that uses it. Growing the buffer recreates
/// it, in-place updates reuse it.
#[derive(Debug)]
pub struct InstancePoseBuffer {
    stride: u32,
    data: Vec<f32>,
    buffer: Option<BufferHandle>,
    uploaded_len: usize,
    dirty: bool,
}

impl InstancePoseBuffer {
    pub fn new(stride: u32) -> Self {
        Self {
            stride: stride.max(1),
            data: Vec::new(),
            buffer: None,
            uploaded_len: 0,
            dirty: false,
        }
    }

    /// Build from an existing flat array; its length must be a multiple of
    /// `stride`.
    pub fn from_data(stride: u32, data: Vec<f32>) -> Result<Self, RenderError> {
        let stride = stride.max(1);
        if data.len() % stride as usize != 0 {
            return Err(RenderError::geometry(format!(
                "pose data length {} is not a multiple of stride {stride}",
                data.len()
            )));
        }
        Ok(Self {
            stride,
            data,
            buffer: None,
            uploaded_len: 0,
            dirty: false,
        })
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn count(&self) -> u32 {
        (self.data.len() / self.stride as usize) as u32
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Append one instance; returns its index.
    pub fn push_pose(&mut self, pose: &[f32]) -> Result<u32, RenderError> {
        if pose.len() != self.stride as usize {
            return Err(RenderError::geometry(format!(
                "expected a pose of {} floats, got {}",
                self.stride,
                pose.len()
            )));
        }
        let index = self.count();
        self.data.extend_from_slice(pose);
        self.dirty = true;
        Ok(index)
    }

    /// Overwrite one instance in place. Cheap: re-uploads without
    /// recreating the GPU buffer.
    pub fn write_pose(&mut self, index: u32, pose: &[f32]) -> Result<(), RenderError> {
        if pose.len() != self.stride as usize {
            return Err(RenderError::geometry(format!(
                "expected a pose of {} floats, got {}",
                self.stride,
                pose.len()
            )));
        }
        if index >= self.count() {
            return Err(RenderError::geometry(format!(
                "pose index {index} out of range for {} instances",
                self.count()
            )));
        }
        let start = index as usize * self.stride as usize;
        self.data[start..start + pose.len()].copy_from_slice(pose);
        self.dirty = true;
        Ok(())
    }

    /// Drop the instance at `index`, shifting the remainder down.
    pub fn remove_pose(&mut self, index: u32) {
        if index >= self.count() {
            warn!(
                "tried to remove pose {index}, but there are only {} instances",
                self.count()
            );
            return;
        }
        let stride = self.stride as usize;
        let start = index as usize * stride;
        self.data.drain(start..start + stride);
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.dirty = true;
    }

    /// The GPU handle, creating or rewriting the buffer if the CPU copy
    /// changed since the last draw.
    pub(crate) fn ensure_uploaded(&mut self, device: &mut dyn GraphicsDevice) -> BufferHandle {
        match self.buffer {
            Some(buffer) if !self.dirty => buffer,
            Some(buffer) if self.data.len() == self.uploaded_len => {
                device.update_buffer(buffer, bytemuck::cast_slice(&self.data));
                self.dirty = false;
                buffer
            }
            _ => {
                let buffer =
                    device.create_buffer(BufferKind::Vertex, bytemuck::cast_slice(&self.data));
                self.buffer = Some(buffer);
                self.uploaded_len = self.data.len();
                self.dirty = false;
                buffer
            }
        }
    }
}
