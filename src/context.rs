//! Central rendering context.
//!
//! A [`Context`] owns everything one rendering surface needs: the boxed
//! [`GraphicsDevice`] backend, the active camera, the clear colour and the
//! cached device capabilities. Multiple contexts can coexist; nothing in
//! the crate is process-wide.

use crate::{
    camera::{Camera, SceneCamera},
    device::{DeviceCapabilities, GraphicsDevice},
};

pub struct Context {
    pub device: Box<dyn GraphicsDevice>,
    pub camera: SceneCamera,
    pub clear_colour: [f32; 4],
    pub(crate) capabilities: DeviceCapabilities,
    width: u32,
    height: u32,
}

impl Context {
    /// Wrap a backend device for a canvas of the given pixel size. Starts
    /// with a default perspective camera looking at the origin; swap it
    /// via [`set_camera`](Self::set_camera).
    pub fn new(mut device: Box<dyn GraphicsDevice>, width: u32, height: u32) -> Self {
        let capabilities = device.capabilities();
        device.set_viewport(width, height);
        let mut camera = Camera::perspective(width, height, 45.0, 0.1, 500.0);
        camera.look_at(
            cgmath::Point3::new(0.0, 5.0, 10.0),
            cgmath::Point3::new(0.0, 0.0, 0.0),
            cgmath::Vector3::unit_y(),
        );
        Self {
            device,
            camera: SceneCamera::Spatial(camera),
            clear_colour: [0.1, 0.1, 0.1, 1.0],
            capabilities,
            width,
            height,
        }
    }

    pub fn set_camera(&mut self, camera: SceneCamera) {
        self.camera = camera;
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Propagate a canvas resize to the viewport and the camera. Zero
    /// sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
            self.device.set_viewport(width, height);
            self.camera.resize(width, height);
        }
    }
}
