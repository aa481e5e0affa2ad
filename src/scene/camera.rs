//! Camera with lazily recomputed matrices
//!
//! Every setter drops the cached matrices it affects; the getters rebuild
//! them on first use. The caches use `Cell`, so a `&Camera` is enough to
//! read matrices during a frame.

use std::cell::Cell;

use crate::rasterizer::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective { fov_y: f32, aspect: f32, near: f32, far: f32 },
    Orthographic { left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32 },
}

impl Projection {
    fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, near, far } => Mat4::perspective(fov_y, aspect, near, far),
            Projection::Orthographic { left, right, bottom, top, near, far } => {
                Mat4::orthographic(left, right, bottom, top, near, far)
            }
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    projection: Projection,

    view: Cell<Option<Mat4>>,
    proj: Cell<Option<Mat4>>,
    view_proj: Cell<Option<Mat4>>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::UP)
    }
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            position,
            target,
            up,
            projection: Projection::default(),
            view: Cell::new(None),
            proj: Cell::new(None),
            view_proj: Cell::new(None),
        }
    }

    pub fn with_perspective(mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        self.set_perspective(fov_y, aspect, near, far);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    fn invalidate_view(&self) {
        self.view.set(None);
        self.view_proj.set(None);
    }

    fn invalidate_projection(&self) {
        self.proj.set(None);
        self.view_proj.set(None);
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.invalidate_view();
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.invalidate_view();
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.invalidate_view();
    }

    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Projection::Perspective { fov_y, aspect, near, far };
        self.invalidate_projection();
    }

    pub fn set_orthographic(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.projection = Projection::Orthographic { left, right, bottom, top, near, far };
        self.invalidate_projection();
    }

    /// Update the aspect ratio of a perspective projection; no-op for orthographic
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective { fov_y, near, far, .. } = self.projection {
            self.set_perspective(fov_y, aspect, near, far);
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        cached(&self.view, || Mat4::look_at(self.position, self.target, self.up))
    }

    pub fn projection_matrix(&self) -> Mat4 {
        cached(&self.proj, || self.projection.matrix())
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        cached(&self.view_proj, || self.projection_matrix() * self.view_matrix())
    }

    #[cfg(test)]
    fn is_cached(&self) -> (bool, bool, bool) {
        (self.view.get().is_some(), self.proj.get().is_some(), self.view_proj.get().is_some())
    }
}

fn cached(slot: &Cell<Option<Mat4>>, build: impl FnOnce() -> Mat4) -> Mat4 {
    if let Some(m) = slot.get() {
        return m;
    }
    let m = build();
    slot.set(Some(m));
    m
}
