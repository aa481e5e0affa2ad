//! Per-fragment Blinn-Phong shading with optional Schlick Fresnel

use super::geometry::GeometryVertex;
use super::light::{Light, LightSource};
use super::math::Vec3;
use super::types::{Color, Material, RasterDerivatives, RenderSettings};

/// Specular color and exponent used when an object has no material
const FALLBACK_SPECULAR: Color = Color::WHITE;
const FALLBACK_SHININESS: f32 = 32.0;

/// Schlick's approximation: `f0 + (1 - f0)(1 - cos)^5` per channel
pub fn fresnel_schlick(f0: Color, cos_theta: f32) -> Color {
    let k = (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5);
    Color::with_alpha(
        f0.r + (1.0 - f0.r) * k,
        f0.g + (1.0 - f0.g) * k,
        f0.b + (1.0 - f0.b) * k,
        1.0,
    )
}

/// Stateless lighting model; holds only the Fresnel switches from the settings
#[derive(Debug, Clone, Copy)]
pub struct ShadingPipeline {
    pub fresnel: bool,
    pub fresnel_f0: f32,
}

impl ShadingPipeline {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            fresnel: settings.fresnel,
            fresnel_f0: settings.fresnel_f0,
        }
    }

    /// Shade one fragment. Returns premultiplied RGBA.
    pub fn shade(
        &self,
        frag: &GeometryVertex,
        material: Option<&Material>,
        lights: &[Light],
        camera_pos: Vec3,
        ambient: Color,
        derivs: &RasterDerivatives,
    ) -> Color {
        let base = match material {
            Some(mat) => frag.color * mat.sample_albedo(frag.uv, derivs),
            None => frag.color,
        };
        let base_alpha = base.a.clamp(0.0, 1.0);

        let normal = surface_normal(frag, material);
        let view_dir = (camera_pos - frag.world).normalize();

        let (specular_color, shininess) = match material {
            Some(mat) => (mat.specular, mat.shininess),
            None => (FALLBACK_SPECULAR, FALLBACK_SHININESS),
        };
        let f0 = if material.is_some() { specular_color } else { Color::splat(self.fresnel_f0) };

        let mut diffuse = Color::TRANSPARENT;
        let mut specular = Color::TRANSPARENT;

        for light in lights {
            if !light.is_visible(frag.world) {
                continue;
            }
            let att = light.attenuation(frag.world);
            if att <= 0.0 {
                continue;
            }
            let light_dir = light.direction(frag.world);
            let n_dot_l = normal.dot(light_dir);
            if n_dot_l <= 0.0 {
                continue;
            }

            let radiance = light.color() * (light.intensity() * att);
            diffuse = diffuse + base * radiance * n_dot_l;

            let half = (light_dir + view_dir).normalize();
            let highlight = normal.dot(half).max(0.0).powf(shininess);
            let spec_color = if self.fresnel {
                fresnel_schlick(f0, half.dot(view_dir).max(0.0))
            } else {
                specular_color
            };
            specular = specular + spec_color * radiance * highlight;
        }

        let ambient_term = ambient * base;
        let lit = (diffuse + ambient_term).clamp_rgb() * base_alpha;
        let color = lit + specular.clamp_rgb();
        color.clamp_rgb().alpha(base_alpha)
    }
}

/// World-space shading normal, perturbed by the normal map when there is one
fn surface_normal(frag: &GeometryVertex, material: Option<&Material>) -> Vec3 {
    match material {
        Some(mat) if mat.normal_map.is_some() => {
            let n_ts = mat.sample_normal(frag.uv);
            let t = frag.tangent.normalize();
            let b = frag.bitangent.normalize();
            let n = frag.normal.normalize();
            (t * n_ts.x + b * n_ts.y + n * n_ts.z).normalize()
        }
        _ => frag.normal.normalize(),
    }
}
