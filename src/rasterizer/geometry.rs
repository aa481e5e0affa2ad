//! Per-vertex stage: model -> world -> clip -> screen

use super::math::{Mat4, Vec2, Vec3, Vec4};
use super::types::{Color, Vertex};

/// Clip-space w at or below this is treated as behind the camera
pub const MIN_CLIP_W: f32 = 1e-6;

/// Per-frame transformed vertex with every attribute the rasterizer interpolates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeometryVertex {
    pub clip: Vec4,
    pub world: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub uv: Vec2,
    pub color: Color,
    pub reciprocal_w: f32,
    pub ndc_z: f32,
}

impl GeometryVertex {
    pub fn from_vertex(vertex: &Vertex, model: &Mat4, view_proj: &Mat4) -> Self {
        let world4 = *model * vertex.pos.extend(1.0);
        let clip = *view_proj * world4;

        let reciprocal_w = if clip.w.abs() > MIN_CLIP_W { 1.0 / clip.w } else { 0.0 };
        let ndc_z = if reciprocal_w != 0.0 { clip.z * reciprocal_w } else { 0.0 };

        Self {
            clip,
            world: world4.xyz(),
            normal: model.transform_direction(vertex.normal).normalize(),
            tangent: model.transform_direction(vertex.tangent).normalize(),
            bitangent: model.transform_direction(vertex.bitangent).normalize(),
            uv: vertex.uv,
            color: vertex.color,
            reciprocal_w,
            ndc_z,
        }
    }

    /// Blend three vertices with barycentric weights (a, b, c).
    ///
    /// With `perspective_correct` each weight is scaled by its vertex's 1/w
    /// and renormalized, which makes the result linear in world space.
    pub fn interpolate(
        v0: &GeometryVertex,
        v1: &GeometryVertex,
        v2: &GeometryVertex,
        a: f32,
        b: f32,
        c: f32,
        perspective_correct: bool,
    ) -> GeometryVertex {
        let (mut a, mut b, mut c) = (a, b, c);
        if perspective_correct {
            let denom = a * v0.reciprocal_w + b * v1.reciprocal_w + c * v2.reciprocal_w;
            if denom.abs() > 1e-8 {
                a = a * v0.reciprocal_w / denom;
                b = b * v1.reciprocal_w / denom;
                c = c * v2.reciprocal_w / denom;
            }
        }

        let v3 = |p: Vec3, q: Vec3, r: Vec3| p * a + q * b + r * c;
        GeometryVertex {
            clip: v0.clip * a + v1.clip * b + v2.clip * c,
            world: v3(v0.world, v1.world, v2.world),
            normal: v3(v0.normal, v1.normal, v2.normal).normalize(),
            tangent: v3(v0.tangent, v1.tangent, v2.tangent).normalize(),
            bitangent: v3(v0.bitangent, v1.bitangent, v2.bitangent).normalize(),
            uv: v0.uv * a + v1.uv * b + v2.uv * c,
            color: v0.color * a + v1.color * b + v2.color * c,
            reciprocal_w: v0.reciprocal_w * a + v1.reciprocal_w * b + v2.reciprocal_w * c,
            ndc_z: v0.ndc_z * a + v1.ndc_z * b + v2.ndc_z * c,
        }
    }
}

/// Geometry vertex placed on screen
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenVertex {
    pub attrs: GeometryVertex,
    pub x: f32,
    pub y: f32,
    /// False when clip-space w <= 0 (at or behind the camera)
    pub valid: bool,
}

impl ScreenVertex {
    pub const INVALID: ScreenVertex = ScreenVertex {
        attrs: GeometryVertex {
            clip: Vec4::new(0.0, 0.0, 0.0, 0.0),
            world: Vec3::ZERO,
            normal: Vec3::ZERO,
            tangent: Vec3::ZERO,
            bitangent: Vec3::ZERO,
            uv: Vec2::new(0.0, 0.0),
            color: Color::TRANSPARENT,
            reciprocal_w: 0.0,
            ndc_z: 0.0,
        },
        x: 0.0,
        y: 0.0,
        valid: false,
    };
}

/// Transforms mesh vertices into screen space for a `width` x `height` target
#[derive(Debug, Clone, Copy)]
pub struct GeometryProcessor {
    pub width: usize,
    pub height: usize,
}

impl GeometryProcessor {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// One screen vertex per input vertex, same order.
    ///
    /// No clipping happens here: a vertex with w <= epsilon is only marked
    /// invalid, and any triangle touching it is dropped at assembly.
    pub fn process(&self, vertices: &[Vertex], model: &Mat4, view: &Mat4, projection: &Mat4) -> Vec<ScreenVertex> {
        let view_proj = *projection * *view;
        vertices
            .iter()
            .map(|v| self.project(GeometryVertex::from_vertex(v, model, &view_proj)))
            .collect()
    }

    fn project(&self, attrs: GeometryVertex) -> ScreenVertex {
        let w = attrs.clip.w;
        if w <= MIN_CLIP_W {
            return ScreenVertex::INVALID;
        }

        let inv_w = 1.0 / w;
        let ndc = attrs.clip.xyz() * inv_w;
        ScreenVertex {
            attrs,
            x: (ndc.x * 0.5 + 0.5) * (self.width as f32 - 1.0),
            y: (1.0 - (ndc.y * 0.5 + 0.5)) * (self.height as f32 - 1.0),
            valid: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> (Mat4, Mat4) {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::UP);
        let proj = Mat4::perspective(60.0f32.to_radians(), 1.0, 0.1, 100.0);
        (view, proj)
    }

    #[test]
    fn test_center_maps_to_screen_center() {
        let (view, proj) = camera();
        let gp = GeometryProcessor::new(101, 51);
        let out = gp.process(&[Vertex::from_pos(0.0, 0.0, 0.0)], &Mat4::IDENTITY, &view, &proj);
        assert!(out[0].valid);
        assert_relative_eq!(out[0].x, 50.0, epsilon = 1e-4);
        assert_relative_eq!(out[0].y, 25.0, epsilon = 1e-4);
        assert_relative_eq!(out[0].attrs.reciprocal_w, 1.0 / 5.0, epsilon = 1e-6);
        assert!(out[0].attrs.ndc_z > -1.0 && out[0].attrs.ndc_z < 1.0);
    }

    #[test]
    fn test_up_is_screen_top() {
        let (view, proj) = camera();
        let gp = GeometryProcessor::new(100, 100);
        let out = gp.process(
            &[Vertex::from_pos(0.0, 1.0, 0.0), Vertex::from_pos(1.0, 0.0, 0.0)],
            &Mat4::IDENTITY,
            &view,
            &proj,
        );
        assert!(out[0].y < 49.5);
        assert!(out[1].x > 49.5);
    }

    #[test]
    fn test_vertex_behind_camera_is_invalid() {
        let (view, proj) = camera();
        let gp = GeometryProcessor::new(64, 64);
        let verts = [Vertex::from_pos(0.0, 0.0, 0.0), Vertex::from_pos(0.0, 0.0, 6.0), Vertex::from_pos(0.0, 0.0, 5.0)];
        let out = gp.process(&verts, &Mat4::IDENTITY, &view, &proj);
        assert!(out[0].valid);
        assert!(!out[1].valid);
        assert!(!out[2].valid);
    }

    #[test]
    fn test_model_transform_applies_to_normals() {
        let (view, proj) = camera();
        let model = Mat4::rotation_y(std::f32::consts::FRAC_PI_2) * Mat4::translation(Vec3::new(0.0, 0.0, 1.0));
        let v = Vertex::new(Vec3::ZERO, Vec2::default(), Vec3::new(0.0, 0.0, 1.0));
        let g = GeometryVertex::from_vertex(&v, &model, &(proj * view));
        assert_relative_eq!(g.world.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(g.normal.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_correct_interpolation_weights() {
        let mut v0 = GeometryVertex::default();
        let mut v1 = GeometryVertex::default();
        let v2 = GeometryVertex { reciprocal_w: 1.0, ..Default::default() };
        v0.reciprocal_w = 1.0;
        v0.uv = Vec2::new(0.0, 0.0);
        v1.reciprocal_w = 0.25;
        v1.uv = Vec2::new(1.0, 0.0);

        // Screen-space midpoint of an edge whose far end is 4x deeper
        let affine = GeometryVertex::interpolate(&v0, &v1, &v2, 0.5, 0.5, 0.0, false);
        let correct = GeometryVertex::interpolate(&v0, &v1, &v2, 0.5, 0.5, 0.0, true);
        assert_relative_eq!(affine.uv.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(correct.uv.x, 0.2, epsilon = 1e-6);
        assert_relative_eq!(correct.reciprocal_w, 0.85, epsilon = 1e-6);
    }
}
