//! Core types for the rasterizer

use std::ops::{Add, Mul};
use serde::{Serialize, Deserialize};

use super::math::{Vec2, Vec3};

/// Linear RGBA color, f32 per channel.
///
/// Colors leaving the shading pipeline are premultiplied: rgb already
/// carries the alpha factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const GREEN: Color = Color { r: 0.0, g: 1.0, b: 0.0, a: 1.0 };
    pub const BLUE: Color = Color { r: 0.0, g: 0.0, b: 1.0, a: 1.0 };
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn splat(v: f32) -> Self {
        Self { r: v, g: v, b: v, a: v }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Same color with alpha replaced.
    pub fn alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Clamp rgb to [0,1], leaving alpha untouched
    pub fn clamp_rgb(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a,
        }
    }

    /// Quantize rgb to 8 bits per channel
    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0) as u8,
            (self.g.clamp(0.0, 1.0) * 255.0) as u8,
            (self.b.clamp(0.0, 1.0) * 255.0) as u8,
        ]
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, o: Color) -> Color {
        Color::with_alpha(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }
}

impl Mul for Color {
    type Output = Color;
    fn mul(self, o: Color) -> Color {
        Color::with_alpha(self.r * o.r, self.g * o.g, self.b * o.b, self.a * o.a)
    }
}

impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, s: f32) -> Color {
        Color::with_alpha(self.r * s, self.g * s, self.b * s, self.a * s)
    }
}

/// A mesh vertex: immutable input to the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub uv: Vec2,
    pub color: Color,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            normal: Vec3::new(0.0, 0.0, 1.0),
            tangent: Vec3::new(1.0, 0.0, 0.0),
            bitangent: Vec3::new(0.0, 1.0, 0.0),
            uv: Vec2::default(),
            color: Color::WHITE,
        }
    }
}

impl Vertex {
    pub fn new(pos: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self { pos, uv, normal, ..Default::default() }
    }

    pub fn from_pos(x: f32, y: f32, z: f32) -> Self {
        Self {
            pos: Vec3::new(x, y, z),
            ..Default::default()
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }
}

/// Screen-space texture coordinate gradients of one triangle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RasterDerivatives {
    pub dudx: f32,
    pub dudy: f32,
    pub dvdx: f32,
    pub dvdy: f32,
}

impl RasterDerivatives {
    pub fn is_finite(&self) -> bool {
        self.dudx.is_finite() && self.dudy.is_finite() && self.dvdx.is_finite() && self.dvdy.is_finite()
    }
}

/// One level of a mip chain
#[derive(Debug, Clone)]
pub struct MipLevel {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
}

impl MipLevel {
    fn new(width: usize, height: usize, fill: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    /// Fetch with coordinates clamped to the edge
    fn texel(&self, x: isize, y: isize) -> Color {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.pixels[y * self.width + x]
    }

    fn sample_bilinear(&self, u: f32, v: f32) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::BLACK;
        }

        let u = u - u.floor();
        let v = v - v.floor();

        let x = u * (self.width - 1) as f32;
        let y = v * (self.height - 1) as f32;

        let x0 = x.floor() as isize;
        let y0 = y.floor() as isize;
        let x1 = (x0 + 1).min(self.width as isize - 1);
        let y1 = (y0 + 1).min(self.height as isize - 1);

        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let c0 = self.texel(x0, y0) * (1.0 - fx) + self.texel(x1, y0) * fx;
        let c1 = self.texel(x0, y1) * (1.0 - fx) + self.texel(x1, y1) * fx;
        c0 * (1.0 - fy) + c1 * fy
    }
}

/// Texture with an optional mip chain (level 0 is the base image)
#[derive(Debug, Clone)]
pub struct Texture {
    pub levels: Vec<MipLevel>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            levels: vec![MipLevel::new(width.max(1), height.max(1), Color::WHITE)],
            name: String::new(),
        }
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color>, name: String) -> Self {
        let mut tex = Self::new(width, height);
        let base = &mut tex.levels[0];
        let n = pixels.len().min(base.pixels.len());
        base.pixels[..n].copy_from_slice(&pixels[..n]);
        tex.name = name;
        tex
    }

    /// Load texture from an image file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, String> {
        use image::GenericImageView;

        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?;

        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::from_rgba8(p[0], p[1], p[2], p[3]))
            .collect();

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        log::info!("Loaded texture: {} ({}x{})", name, width, height);
        Ok(Self::from_pixels(width as usize, height as usize, pixels, name))
    }

    pub fn solid(color: Color, width: usize, height: usize) -> Self {
        let mut tex = Self::new(width, height);
        tex.levels[0].pixels.fill(color);
        tex.name = "solid".to_string();
        tex
    }

    /// Create a checkerboard texture
    pub fn checkerboard(width: usize, height: usize, square: usize, color1: Color, color2: Color) -> Self {
        let square = square.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / square) + (y / square)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self::from_pixels(width, height, pixels, "checkerboard".to_string())
    }

    /// Vertical gradient from `top` (row 0) to `bottom`
    pub fn gradient(width: usize, height: usize, top: Color, bottom: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let t = if height > 1 { y as f32 / (height - 1) as f32 } else { 0.0 };
            let row = top * (1.0 - t) + bottom * t;
            pixels.extend(std::iter::repeat(row).take(width));
        }
        Self::from_pixels(width, height, pixels, "gradient".to_string())
    }

    pub fn width(&self) -> usize {
        self.levels[0].width
    }

    pub fn height(&self) -> usize {
        self.levels[0].height
    }

    /// Rebuild levels 1.. from the base image by 2x2 box averaging down to 1x1.
    pub fn build_mipmaps(&mut self) {
        self.levels.truncate(1);
        loop {
            let prev = &self.levels[self.levels.len() - 1];
            if prev.width == 1 && prev.height == 1 {
                break;
            }
            let mut next = MipLevel::new((prev.width / 2).max(1), (prev.height / 2).max(1), Color::BLACK);
            for y in 0..next.height {
                for x in 0..next.width {
                    let sx = (x * 2) as isize;
                    let sy = (y * 2) as isize;
                    let sum = prev.texel(sx, sy)
                        + prev.texel(sx + 1, sy)
                        + prev.texel(sx, sy + 1)
                        + prev.texel(sx + 1, sy + 1);
                    next.pixels[y * next.width + x] = sum * 0.25;
                }
            }
            self.levels.push(next);
        }
    }

    /// Level of detail for the given screen-space UV gradients
    pub fn pick_mip_level(&self, derivs: &RasterDerivatives) -> usize {
        if self.levels.len() <= 1 {
            return 0;
        }
        let rho = derivs
            .dudx
            .abs()
            .max(derivs.dudy.abs())
            .max(derivs.dvdx.abs())
            .max(derivs.dvdy.abs());
        if rho < 1e-8 {
            return 0;
        }

        let base = self.width().max(self.height()) as f32;
        let lambda = (rho * base).max(1.0).log2();
        (lambda.floor() as usize).min(self.levels.len() - 1)
    }

    /// Bilinear sample of the base level
    pub fn sample(&self, u: f32, v: f32) -> Color {
        self.sample_level(u, v, 0)
    }

    /// Bilinear sample of the level chosen from `derivs`
    pub fn sample_lod(&self, u: f32, v: f32, derivs: &RasterDerivatives) -> Color {
        self.sample_level(u, v, self.pick_mip_level(derivs))
    }

    pub fn sample_level(&self, u: f32, v: f32, level: usize) -> Color {
        let level = level.min(self.levels.len() - 1);
        self.levels[level].sample_bilinear(u, v)
    }

    /// Get base-level pixel at x,y coordinates
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        let base = &self.levels[0];
        if x < base.width && y < base.height {
            base.pixels[y * base.width + x]
        } else {
            Color::BLACK
        }
    }
}

/// Surface material: Blinn-Phong colors plus optional albedo and normal maps
#[derive(Debug, Clone)]
pub struct Material {
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f32,
    pub diffuse_map: Option<Texture>,
    pub normal_map: Option<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new(
            Color::new(0.8, 0.8, 0.8),
            Color::new(0.5, 0.5, 0.5),
            32.0,
        )
    }
}

impl Material {
    pub fn new(diffuse: Color, specular: Color, shininess: f32) -> Self {
        Self {
            diffuse,
            specular,
            shininess,
            diffuse_map: None,
            normal_map: None,
        }
    }

    pub fn red_plastic() -> Self {
        Self::new(
            Color::new(0.8, 0.1, 0.1),
            Color::new(0.9, 0.9, 0.9),
            64.0,
        )
    }

    pub fn blue_metal() -> Self {
        Self::new(
            Color::new(0.1, 0.2, 0.8),
            Color::new(0.8, 0.8, 0.9),
            128.0,
        )
    }

    pub fn white_diffuse() -> Self {
        Self::new(
            Color::new(0.9, 0.9, 0.9),
            Color::new(0.1, 0.1, 0.1),
            8.0,
        )
    }

    /// Alpha used to classify triangles as opaque or transparent
    pub fn diffuse_alpha(&self) -> f32 {
        self.diffuse.a
    }

    /// Albedo at `uv`: the mip-selected map sample, or the flat diffuse color
    pub fn sample_albedo(&self, uv: Vec2, derivs: &RasterDerivatives) -> Color {
        match &self.diffuse_map {
            Some(tex) => tex.sample_lod(uv.x, uv.y, derivs),
            None => self.diffuse,
        }
    }

    /// Tangent-space normal at `uv`, (0,0,1) without a normal map
    pub fn sample_normal(&self, uv: Vec2) -> Vec3 {
        match &self.normal_map {
            Some(tex) => {
                let c = tex.sample(uv.x, uv.y);
                Vec3::new(c.r * 2.0 - 1.0, c.g * 2.0 - 1.0, c.b * 2.0 - 1.0).normalize()
            }
            None => Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Rasterizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output width in pixels
    pub width: usize,
    /// Output height in pixels
    pub height: usize,
    /// Perspective-correct attribute interpolation (false = affine)
    pub perspective_correct: bool,
    /// Cull back faces of opaque triangles
    pub backface_culling: bool,
    /// Supersampling factor per axis (1 = off)
    pub ssaa_factor: usize,
    /// Schlick Fresnel weighting of the specular term
    pub fresnel: bool,
    /// Normal-incidence reflectance used when no material specular is bound
    pub fresnel_f0: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            perspective_correct: true,
            backface_culling: true,
            ssaa_factor: 1,
            fresnel: false,
            fresnel_f0: 0.04,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mip_chain_reaches_one_by_one() {
        let mut tex = Texture::solid(Color::RED, 8, 4);
        tex.build_mipmaps();
        let dims: Vec<_> = tex.levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
        assert_eq!(tex.levels[3].pixels[0], Color::RED);
    }

    #[test]
    fn test_mip_level_averages_checkerboard() {
        let mut tex = Texture::checkerboard(2, 2, 1, Color::WHITE, Color::BLACK);
        tex.build_mipmaps();
        let avg = tex.levels[1].pixels[0];
        assert_relative_eq!(avg.r, 0.5, epsilon = 1e-6);
        assert_relative_eq!(avg.a, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pick_mip_level() {
        let mut tex = Texture::solid(Color::WHITE, 64, 64);
        assert_eq!(tex.pick_mip_level(&RasterDerivatives { dudx: 1.0, ..Default::default() }), 0);

        tex.build_mipmaps();
        // Magnified: less than one texel per pixel
        let near = RasterDerivatives { dudx: 1.0 / 128.0, ..Default::default() };
        assert_eq!(tex.pick_mip_level(&near), 0);
        // Four texels per pixel -> level 2
        let far = RasterDerivatives { dvdy: 4.0 / 64.0, ..Default::default() };
        assert_eq!(tex.pick_mip_level(&far), 2);
        // Zero gradients pick the base level
        assert_eq!(tex.pick_mip_level(&RasterDerivatives::default()), 0);
        // Extreme minification clamps to the last level
        let huge = RasterDerivatives { dudy: 1000.0, ..Default::default() };
        assert_eq!(tex.pick_mip_level(&huge), tex.levels.len() - 1);
    }

    #[test]
    fn test_bilinear_wraps_and_blends() {
        let tex = Texture::from_pixels(2, 1, vec![Color::BLACK, Color::WHITE], String::new());
        assert_eq!(tex.sample(0.0, 0.0), Color::BLACK);
        assert_relative_eq!(tex.sample(0.5, 0.0).r, 0.5, epsilon = 1e-6);
        // 1.25 wraps to 0.25
        assert_relative_eq!(tex.sample(1.25, 0.0).r, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_gradient_rows() {
        let tex = Texture::gradient(2, 3, Color::BLACK, Color::WHITE);
        assert_eq!(tex.get_pixel(1, 0), Color::BLACK);
        assert_relative_eq!(tex.get_pixel(0, 1).g, 0.5, epsilon = 1e-6);
        assert_eq!(tex.get_pixel(0, 2), Color::WHITE);
        assert_eq!(tex.get_pixel(5, 5), Color::BLACK);
    }

    #[test]
    fn test_material_albedo_falls_back_to_diffuse() {
        let mat = Material::red_plastic();
        let albedo = mat.sample_albedo(Vec2::new(0.3, 0.7), &RasterDerivatives::default());
        assert_eq!(albedo, mat.diffuse);
        assert_eq!(mat.sample_normal(Vec2::default()), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_material_decodes_normal_map() {
        let mut mat = Material::default();
        mat.normal_map = Some(Texture::solid(Color::new(1.0, 0.5, 0.5), 2, 2));
        let n = mat.sample_normal(Vec2::new(0.5, 0.5));
        assert_relative_eq!(n.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(n.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(n.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_color_quantization_clamps() {
        assert_eq!(Color::with_alpha(1.5, -0.2, 0.5, 1.0).to_rgb8(), [255, 0, 127]);
    }
}
