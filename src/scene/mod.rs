//! Scene description consumed by the renderer
//!
//! A `Scene` owns its camera and lights. Objects borrow their mesh and
//! material for the scene's lifetime.

mod camera;
mod mesh;

pub use camera::*;
pub use mesh::*;

use crate::rasterizer::{Color, Light, Mat4, Material};

/// One drawable instance
#[derive(Debug, Clone, Copy)]
pub struct SceneObject<'a> {
    pub mesh: &'a Mesh,
    pub transform: Mat4,
    /// Overrides the mesh's own material when set
    pub material: Option<&'a Material>,
    pub visible: bool,
}

impl<'a> SceneObject<'a> {
    /// Material used for shading: the override, else the mesh's material
    pub fn effective_material(&self) -> Option<&'a Material> {
        self.material.or(self.mesh.material.as_ref())
    }

    pub fn new(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            transform: Mat4::IDENTITY,
            material: None,
            visible: true,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: &'a Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Scene<'a> {
    pub camera: Option<Camera>,
    pub objects: Vec<SceneObject<'a>>,
    pub lights: Vec<Light>,
    pub background: Color,
    pub ambient: Color,
}

impl<'a> Default for Scene<'a> {
    fn default() -> Self {
        Self {
            camera: None,
            objects: Vec::new(),
            lights: Vec::new(),
            background: Color::BLACK,
            ambient: Color::splat(0.1),
        }
    }
}

impl<'a> Scene<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    pub fn add_object(&mut self, object: SceneObject<'a>) {
        self.objects.push(object);
    }

    pub fn add_light(&mut self, light: impl Into<Light>) {
        self.lights.push(light.into());
    }
}
