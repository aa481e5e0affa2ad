//! Scanline triangle rasterization with depth testing and "over" compositing

use super::geometry::GeometryVertex;
use super::light::Light;
use super::math::Vec3;
use super::queue::{TriangleWorkItem, OPAQUE_ALPHA};
use super::shading::ShadingPipeline;
use super::target::RenderTarget;
use super::types::{Color, RenderSettings};

const DEGENERATE_DENOM: f32 = 1e-6;

/// Premultiplied "over": `src + dst * (1 - src.a)`
pub fn composite_over(src: Color, dst: Color) -> Color {
    let a = src.a.clamp(0.0, 1.0);
    let k = 1.0 - a;
    Color::with_alpha(
        src.r + dst.r * k,
        src.g + dst.g * k,
        src.b + dst.b * k,
        a + dst.a * k,
    )
}

/// Scene state every fragment of a frame shades against
#[derive(Debug, Clone, Copy)]
pub struct ShadeContext<'a> {
    pub lights: &'a [Light],
    pub camera_pos: Vec3,
    pub ambient: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct TriangleRasterizer {
    pub perspective_correct: bool,
    pub shading: ShadingPipeline,
}

impl TriangleRasterizer {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            perspective_correct: settings.perspective_correct,
            shading: ShadingPipeline::new(settings),
        }
    }

    /// Rasterize one work item into `target`. Returns the number of
    /// fragments composited.
    pub fn rasterize(&self, target: &mut RenderTarget, tri: &TriangleWorkItem, ctx: &ShadeContext) -> usize {
        let (w, h) = (target.width(), target.height());
        if w == 0 || h == 0 {
            return 0;
        }

        let (x0, y0) = (tri.v0.x, tri.v0.y);
        let (x1, y1) = (tri.v1.x, tri.v1.y);
        let (x2, y2) = (tri.v2.x, tri.v2.y);

        let max_x = (w - 1) as f32;
        let max_y = (h - 1) as f32;
        let lo_x = x0.min(x1).min(x2).floor();
        let hi_x = x0.max(x1).max(x2).ceil();
        let lo_y = y0.min(y1).min(y2).floor();
        let hi_y = y0.max(y1).max(y2).ceil();
        if hi_x < 0.0 || hi_y < 0.0 || lo_x > max_x || lo_y > max_y {
            return 0;
        }
        let x_start = lo_x.clamp(0.0, max_x) as i32;
        let x_end = hi_x.clamp(0.0, max_x) as i32;
        let y_start = lo_y.clamp(0.0, max_y) as i32;
        let y_end = hi_y.clamp(0.0, max_y) as i32;

        let denom = (y1 - y2) * (x0 - x2) + (x2 - x1) * (y0 - y2);
        if denom.abs() < DEGENERATE_DENOM {
            return 0;
        }
        let inv_denom = 1.0 / denom;

        // Barycentric deltas for one step in +x
        let d_alpha = (y1 - y2) * inv_denom;
        let d_beta = (y2 - y0) * inv_denom;

        let (g0, g1, g2) = (&tri.v0.attrs, &tri.v1.attrs, &tri.v2.attrs);
        let mut written = 0;

        for y in y_start..=y_end {
            let px = x_start as f32 + 0.5;
            let py = y as f32 + 0.5;
            let mut alpha = ((y1 - y2) * (px - x2) + (x2 - x1) * (py - y2)) * inv_denom;
            let mut beta = ((y2 - y0) * (px - x2) + (x0 - x2) * (py - y2)) * inv_denom;

            for x in x_start..=x_end {
                let gamma = 1.0 - alpha - beta;
                let (a, b, c) = (alpha, beta, gamma);
                alpha += d_alpha;
                beta += d_beta;

                let has_neg = a < 0.0 || b < 0.0 || c < 0.0;
                let has_pos = a > 0.0 || b > 0.0 || c > 0.0;
                if has_neg && has_pos {
                    continue;
                }

                let inv_w = a * g0.reciprocal_w + b * g1.reciprocal_w + c * g2.reciprocal_w;
                if inv_w <= 0.0 {
                    continue;
                }

                let ndc_z = a * g0.ndc_z + b * g1.ndc_z + c * g2.ndc_z;
                if !ndc_z.is_finite() {
                    continue;
                }
                let depth = ndc_z * 0.5 + 0.5;
                if !target.depth_passes(x, y, depth) {
                    continue;
                }

                let frag = GeometryVertex::interpolate(g0, g1, g2, a, b, c, self.perspective_correct);
                let src = self
                    .shading
                    .shade(&frag, tri.material, ctx.lights, ctx.camera_pos, ctx.ambient, &tri.derivs);

                let dst = target.get_pixel(x, y);
                target.set_pixel(x, y, composite_over(src, dst));
                if src.a >= OPAQUE_ALPHA {
                    target.set_depth(x, y, depth);
                }
                written += 1;
            }
        }

        written
    }
}
