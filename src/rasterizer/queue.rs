//! Primitive assembly, classification and the per-frame render queue

use super::geometry::ScreenVertex;
use super::math::Vec3;
use super::types::{Material, RasterDerivatives};

/// Effective alpha at or above this classifies a triangle as opaque
pub const OPAQUE_ALPHA: f32 = 0.999;

/// Squared face-normal length below which a triangle is degenerate
const DEGENERATE_AREA_SQ: f32 = 1e-8;

/// Screen-space determinant below which UV derivatives are zero
const DEGENERATE_SCREEN_DET: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Opaque,
    Transparent,
}

/// A triangle ready for rasterization; lives for one frame
#[derive(Debug, Clone, Copy)]
pub struct TriangleWorkItem<'a> {
    pub v0: ScreenVertex,
    pub v1: ScreenVertex,
    pub v2: ScreenVertex,
    pub material: Option<&'a Material>,
    pub derivs: RasterDerivatives,
    /// Mean NDC z of the three vertices
    pub depth_key: f32,
}

/// Why a triangle did not make it into the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// A vertex is at or behind the camera
    InvalidVertex,
    /// Zero world-space area
    Degenerate,
    /// Opaque and facing away from the camera
    BackFacing,
    /// UV derivatives came out NaN or infinite
    NonFinite,
}

/// Mean vertex alpha times the material's diffuse alpha (1 without a material)
pub fn effective_alpha(v0: &ScreenVertex, v1: &ScreenVertex, v2: &ScreenVertex, material: Option<&Material>) -> f32 {
    let vertex_alpha = (v0.attrs.color.a + v1.attrs.color.a + v2.attrs.color.a) / 3.0;
    let material_alpha = material.map_or(1.0, Material::diffuse_alpha);
    vertex_alpha * material_alpha
}

pub fn classify(alpha: f32) -> Coverage {
    if alpha >= OPAQUE_ALPHA {
        Coverage::Opaque
    } else {
        Coverage::Transparent
    }
}

/// Normalized world-space face normal, `None` for degenerate triangles
pub fn face_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Option<Vec3> {
    let n = (p1 - p0).cross(p2 - p0);
    if n.len_sq() < DEGENERATE_AREA_SQ {
        return None;
    }
    Some(n.normalize())
}

/// Solve the 2x2 system mapping screen-space edges onto UV deltas.
pub fn raster_derivatives(v0: &ScreenVertex, v1: &ScreenVertex, v2: &ScreenVertex) -> RasterDerivatives {
    let (x0, y0) = (v0.x, v0.y);
    let (x1, y1) = (v1.x, v1.y);
    let (x2, y2) = (v2.x, v2.y);

    let det = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
    if det.abs() < DEGENERATE_SCREEN_DET {
        return RasterDerivatives::default();
    }

    let (uv0, uv1, uv2) = (v0.attrs.uv, v1.attrs.uv, v2.attrs.uv);
    let (du1, du2) = (uv1.x - uv0.x, uv2.x - uv0.x);
    let (dv1, dv2) = (uv1.y - uv0.y, uv2.y - uv0.y);

    RasterDerivatives {
        dudx: (du1 * (y2 - y0) - du2 * (y1 - y0)) / det,
        dudy: (-du1 * (x2 - x0) + du2 * (x1 - x0)) / det,
        dvdx: (dv1 * (y2 - y0) - dv2 * (y1 - y0)) / det,
        dvdy: (-dv1 * (x2 - x0) + dv2 * (x1 - x0)) / det,
    }
}

/// Build a work item from three screen vertices, or say why it was dropped.
///
/// Only opaque triangles are culled by facing; transparent ones are always
/// kept.
pub fn assemble<'a>(
    v0: &ScreenVertex,
    v1: &ScreenVertex,
    v2: &ScreenVertex,
    material: Option<&'a Material>,
    camera_pos: Vec3,
    backface_culling: bool,
) -> Result<(TriangleWorkItem<'a>, Coverage), Rejection> {
    if !v0.valid || !v1.valid || !v2.valid {
        return Err(Rejection::InvalidVertex);
    }

    let p0 = v0.attrs.world;
    let normal = face_normal(p0, v1.attrs.world, v2.attrs.world).ok_or(Rejection::Degenerate)?;

    let coverage = classify(effective_alpha(v0, v1, v2, material));
    if coverage == Coverage::Opaque && backface_culling {
        let to_camera = (camera_pos - p0).normalize();
        if normal.dot(to_camera) <= 0.0 {
            return Err(Rejection::BackFacing);
        }
    }

    let derivs = raster_derivatives(v0, v1, v2);
    if !derivs.is_finite() {
        return Err(Rejection::NonFinite);
    }

    let item = TriangleWorkItem {
        v0: *v0,
        v1: *v1,
        v2: *v2,
        material,
        derivs,
        depth_key: (v0.attrs.ndc_z + v1.attrs.ndc_z + v2.attrs.ndc_z) / 3.0,
    };
    Ok((item, coverage))
}

/// Opaque and transparent buckets for one frame
#[derive(Debug, Default)]
pub struct RenderQueue<'a> {
    opaque: Vec<TriangleWorkItem<'a>>,
    transparent: Vec<TriangleWorkItem<'a>>,
}

impl<'a> RenderQueue<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
    }

    pub fn push(&mut self, item: TriangleWorkItem<'a>, coverage: Coverage) {
        match coverage {
            Coverage::Opaque => self.opaque.push(item),
            Coverage::Transparent => self.transparent.push(item),
        }
    }

    /// Opaque front to back, transparent back to front (farthest first).
    pub fn finalize(&mut self) {
        self.opaque.sort_by(|a, b| a.depth_key.total_cmp(&b.depth_key));
        self.transparent.sort_by(|a, b| b.depth_key.total_cmp(&a.depth_key));
    }

    pub fn opaque(&self) -> &[TriangleWorkItem<'a>] {
        &self.opaque
    }

    pub fn transparent(&self) -> &[TriangleWorkItem<'a>] {
        &self.transparent
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
