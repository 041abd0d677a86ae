//! Cameras: projection and pose for the planar and spatial cases.
//!
//! Both camera types share one contract: projection parameters plus a pose
//! produce cached projection/view matrices, invalidated whenever an input
//! changes and recomputed lazily on next use. Projection and unprojection
//! are exact algebraic inverses of each other (invert the projection
//! scale, then the view rotation by transpose, then the translation), so
//! pointer-driven pan and zoom do not drift over repeated interactions.
//!
//! - [`PlanarCamera`]: 2D, field-of-view expressed as clip-space width,
//!   pose built from rotation + translation.
//! - [`Camera`]: 3D, field-of-view in degrees, perspective or orthographic,
//!   pose built from an orthonormal `{eye, look_at, up}` basis.
//!
//! Incremental [`translate`](Camera::translate)/[`rotate`](Camera::rotate)
//! operators pre-multiply the existing view matrix instead of rebuilding
//! the pose from scratch.

use cgmath::{
    Angle, Deg, EuclideanSpace, InnerSpace, Matrix3, Matrix4, Point2, Point3, Rad, Vector2,
    Vector3, Vector4, ortho, perspective,
};

use crate::data_structures::scene_object::Transform;

/// Matrices the renderer feeds to the binding resolver each frame.
#[derive(Clone, Copy, Debug)]
pub struct CameraMatrices {
    pub proj: Transform,
    pub view: Transform,
}

/// A 2D camera over a canvas. The field of view is the width of the world
/// slice mapped to clip space at zoom 1.
#[derive(Clone, Debug)]
pub struct PlanarCamera {
    fov_width: f32,
    zoom: f32,
    aspect: f32,
    viewport: (f32, f32),
    view: Matrix3<f32>,
    proj: Option<Matrix3<f32>>,
    pv: Option<Matrix3<f32>>,
}

impl PlanarCamera {
    pub fn new(viewport_width: u32, viewport_height: u32, fov_width: f32) -> Self {
        Self {
            fov_width,
            zoom: 1.0,
            aspect: viewport_width as f32 / viewport_height.max(1) as f32,
            viewport: (viewport_width as f32, viewport_height as f32),
            view: Matrix3::from_scale(1.0),
            proj: None,
            pv: None,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
        self.viewport = (width as f32, height as f32);
        self.invalidate_projection();
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
        self.invalidate_projection();
    }

    pub fn set_fov_width(&mut self, fov_width: f32) {
        self.fov_width = fov_width;
        self.invalidate_projection();
    }

    /// Rebuild the pose from scratch: rotate by `-rotation`, then shift by
    /// `-position` (world to camera).
    pub fn set_pose(&mut self, position: Vector2<f32>, rotation: Rad<f32>) {
        self.view = Matrix3::from_angle_z(-rotation) * Matrix3::from_translation(-position);
        self.pv = None;
    }

    /// Move the camera by `delta`, given in view space.
    pub fn translate(&mut self, delta: Vector2<f32>) {
        self.view = Matrix3::from_translation(-delta) * self.view;
        self.pv = None;
    }

    /// Rotate the camera about its own origin.
    pub fn rotate(&mut self, angle: Rad<f32>) {
        self.view = Matrix3::from_angle_z(-angle) * self.view;
        self.pv = None;
    }

    fn invalidate_projection(&mut self) {
        self.proj = None;
        self.pv = None;
    }

    /// Clip-space scale per world unit, x and y.
    fn scale(&self) -> (f32, f32) {
        let sx = 2.0 * self.zoom / self.fov_width;
        (sx, sx * self.aspect)
    }

    pub fn proj_matrix(&mut self) -> Matrix3<f32> {
        if self.proj.is_none() {
            let (sx, sy) = self.scale();
            self.proj = Some(Matrix3::from_nonuniform_scale(sx, sy));
        }
        self.proj.unwrap()
    }

    pub fn view_matrix(&self) -> Matrix3<f32> {
        self.view
    }

    pub fn pv_matrix(&mut self) -> Matrix3<f32> {
        if self.pv.is_none() {
            self.pv = Some(self.proj_matrix() * self.view);
        }
        self.pv.unwrap()
    }

    /// World point to canvas pixel (origin top-left, y down).
    pub fn project(&mut self, world: Point2<f32>) -> Point2<f32> {
        let clip = self.pv_matrix() * Vector3::new(world.x, world.y, 1.0);
        let (vw, vh) = self.viewport;
        Point2::new((clip.x + 1.0) * 0.5 * vw, (1.0 - clip.y) * 0.5 * vh)
    }

    /// Canvas pixel to world point; the exact inverse of
    /// [`project`](Self::project).
    pub fn unproject(&mut self, canvas: Point2<f32>) -> Point2<f32> {
        let (vw, vh) = self.viewport;
        let ndc = Vector2::new(canvas.x / vw * 2.0 - 1.0, 1.0 - canvas.y / vh * 2.0);
        let (sx, sy) = self.scale();
        let eye = Vector2::new(ndc.x / sx, ndc.y / sy);
        // view = [R | t]; world = R^T (eye - t), R^T rows are the columns
        let t = Vector2::new(self.view.z.x, self.view.z.y);
        let d = eye - t;
        Point2::new(
            self.view.x.x * d.x + self.view.x.y * d.y,
            self.view.y.x * d.x + self.view.y.y * d.y,
        )
    }

    /// Canvas pixel delta to world delta, for drag-style panning.
    pub fn unproject_delta(&mut self, delta: Vector2<f32>) -> Vector2<f32> {
        let (vw, vh) = self.viewport;
        let ndc = Vector2::new(delta.x / vw * 2.0, -delta.y / vh * 2.0);
        let (sx, sy) = self.scale();
        let eye = Vector2::new(ndc.x / sx, ndc.y / sy);
        Vector2::new(
            self.view.x.x * eye.x + self.view.x.y * eye.y,
            self.view.y.x * eye.x + self.view.y.y * eye.y,
        )
    }
}

/// Perspective or orthographic projection for the spatial camera. Both
/// express their field of view in degrees; the orthographic form sizes its
/// box as the perspective frustum would be at unit distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionKind {
    Perspective,
    Orthographic,
}

/// A 3D camera over a canvas.
#[derive(Clone, Debug)]
pub struct Camera {
    kind: ProjectionKind,
    fov_deg: f32,
    near: f32,
    far: f32,
    zoom: f32,
    aspect: f32,
    viewport: (f32, f32),
    view: Matrix4<f32>,
    proj: Option<Matrix4<f32>>,
    pv: Option<Matrix4<f32>>,
}

impl Camera {
    pub fn perspective(
        viewport_width: u32,
        viewport_height: u32,
        fov_deg: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self::with_kind(
            ProjectionKind::Perspective,
            viewport_width,
            viewport_height,
            fov_deg,
            near,
            far,
        )
    }

    pub fn orthographic(
        viewport_width: u32,
        viewport_height: u32,
        fov_deg: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self::with_kind(
            ProjectionKind::Orthographic,
            viewport_width,
            viewport_height,
            fov_deg,
            near,
            far,
        )
    }

    fn with_kind(
        kind: ProjectionKind,
        viewport_width: u32,
        viewport_height: u32,
        fov_deg: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            kind,
            fov_deg,
            near,
            far,
            zoom: 1.0,
            aspect: viewport_width as f32 / viewport_height.max(1) as f32,
            viewport: (viewport_width as f32, viewport_height as f32),
            view: Matrix4::from_scale(1.0),
            proj: None,
            pv: None,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
        self.viewport = (width as f32, height as f32);
        self.invalidate_projection();
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
        self.invalidate_projection();
    }

    pub fn set_fov(&mut self, fov_deg: f32) {
        self.fov_deg = fov_deg;
        self.invalidate_projection();
    }

    pub fn set_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.invalidate_projection();
    }

    fn invalidate_projection(&mut self) {
        self.proj = None;
        self.pv = None;
    }

    /// Rebuild the pose from an eye point, a target and an up hint. The
    /// basis comes from cross products, with `up` re-orthogonalized
    /// against the computed forward and right axes.
    pub fn look_at(&mut self, eye: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) {
        let forward = (target - eye).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        self.view = Matrix4::new(
            right.x,
            up.x,
            -forward.x,
            0.0,
            right.y,
            up.y,
            -forward.y,
            0.0,
            right.z,
            up.z,
            -forward.z,
            0.0,
            -right.dot(eye.to_vec()),
            -up.dot(eye.to_vec()),
            forward.dot(eye.to_vec()),
            1.0,
        );
        self.pv = None;
    }

    /// Move the camera by `delta`, given in view space.
    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.view = Matrix4::from_translation(-delta) * self.view;
        self.pv = None;
    }

    /// Rotate the camera about its own origin.
    pub fn rotate(&mut self, axis: Vector3<f32>, angle: Rad<f32>) {
        self.view = Matrix4::from_axis_angle(axis.normalize(), -angle) * self.view;
        self.pv = None;
    }

    fn half_fov_tan(&self) -> f32 {
        (Rad::from(Deg(self.fov_deg)) / 2.0).tan()
    }

    pub fn proj_matrix(&mut self) -> Matrix4<f32> {
        if self.proj.is_none() {
            let matrix = match self.kind {
                ProjectionKind::Perspective => {
                    // zoom narrows the effective field of view
                    let half = (self.half_fov_tan() / self.zoom).atan();
                    perspective(Rad(2.0 * half), self.aspect, self.near, self.far)
                }
                ProjectionKind::Orthographic => {
                    let half_h = self.half_fov_tan() / self.zoom;
                    let half_w = half_h * self.aspect;
                    ortho(-half_w, half_w, -half_h, half_h, self.near, self.far)
                }
            };
            self.proj = Some(matrix);
        }
        self.proj.unwrap()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn pv_matrix(&mut self) -> Matrix4<f32> {
        if self.pv.is_none() {
            self.pv = Some(self.proj_matrix() * self.view);
        }
        self.pv.unwrap()
    }

    /// World point to canvas pixel (origin top-left, y down).
    pub fn project(&mut self, world: Point3<f32>) -> Point2<f32> {
        let clip = self.pv_matrix() * Vector4::new(world.x, world.y, world.z, 1.0);
        let w = if clip.w.abs() < f32::EPSILON { 1.0 } else { clip.w };
        let (vw, vh) = self.viewport;
        Point2::new(
            (clip.x / w + 1.0) * 0.5 * vw,
            (1.0 - clip.y / w) * 0.5 * vh,
        )
    }

    /// Distance of a world point in front of the camera; feeds
    /// [`unproject`](Self::unproject) for exact round trips.
    pub fn view_depth(&self, world: Point3<f32>) -> f32 {
        let v = self.view * Vector4::new(world.x, world.y, world.z, 1.0);
        -v.z
    }

    /// Canvas pixel to the world point at view-space depth `depth`; the
    /// exact inverse of [`project`](Self::project).
    pub fn unproject(&mut self, canvas: Point2<f32>, depth: f32) -> Point3<f32> {
        let (vw, vh) = self.viewport;
        let ndc = Vector2::new(canvas.x / vw * 2.0 - 1.0, 1.0 - canvas.y / vh * 2.0);
        let proj = self.proj_matrix();
        let eye = match self.kind {
            ProjectionKind::Perspective => {
                Vector3::new(ndc.x * depth / proj.x.x, ndc.y * depth / proj.y.y, -depth)
            }
            ProjectionKind::Orthographic => {
                Vector3::new(ndc.x / proj.x.x, ndc.y / proj.y.y, -depth)
            }
        };
        self.view_to_world(eye)
    }

    /// Canvas pixel delta to a world delta at view-space depth `depth`.
    pub fn unproject_delta(&mut self, delta: Vector2<f32>, depth: f32) -> Vector3<f32> {
        let (vw, vh) = self.viewport;
        let ndc = Vector2::new(delta.x / vw * 2.0, -delta.y / vh * 2.0);
        let proj = self.proj_matrix();
        let eye = match self.kind {
            ProjectionKind::Perspective => {
                Vector3::new(ndc.x * depth / proj.x.x, ndc.y * depth / proj.y.y, 0.0)
            }
            ProjectionKind::Orthographic => Vector3::new(ndc.x / proj.x.x, ndc.y / proj.y.y, 0.0),
        };
        self.rotate_back(eye)
    }

    /// view = [R | t] with orthonormal R; world = R^T (eye - t).
    fn view_to_world(&self, eye: Vector3<f32>) -> Point3<f32> {
        let t = self.view.w.truncate();
        let d = eye - t;
        let world = self.rotate_back(d);
        Point3::new(world.x, world.y, world.z)
    }

    fn rotate_back(&self, v: Vector3<f32>) -> Vector3<f32> {
        Vector3::new(
            self.view.x.truncate().dot(v),
            self.view.y.truncate().dot(v),
            self.view.z.truncate().dot(v),
        )
    }
}

/// The camera a [`Context`](crate::context::Context) currently renders
/// through.
#[derive(Clone, Debug)]
pub enum SceneCamera {
    Planar(PlanarCamera),
    Spatial(Camera),
}

impl SceneCamera {
    pub fn aspect(&self) -> f32 {
        match self {
            SceneCamera::Planar(camera) => camera.aspect(),
            SceneCamera::Spatial(camera) => camera.aspect(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        match self {
            SceneCamera::Planar(camera) => camera.resize(width, height),
            SceneCamera::Spatial(camera) => camera.resize(width, height),
        }
    }

    pub(crate) fn matrices(&mut self) -> CameraMatrices {
        match self {
            SceneCamera::Planar(camera) => CameraMatrices {
                proj: Transform::Planar(camera.proj_matrix()),
                view: Transform::Planar(camera.view_matrix()),
            },
            SceneCamera::Spatial(camera) => CameraMatrices {
                proj: Transform::Spatial(camera.proj_matrix()),
                view: Transform::Spatial(camera.view_matrix()),
            },
        }
    }
}
