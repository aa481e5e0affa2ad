//! Render target: paired color and depth buffers
//!
//! Depth values live in [0,1] with 0 nearest. Every accessor is bounds
//! checked: out-of-range reads return black / far depth and writes are
//! ignored.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::types::Color;

/// Depth a cleared target starts from
pub const FAR_DEPTH: f32 = 1.0;

/// Error type for image export
#[derive(Debug)]
pub enum ExportError {
    IoError(std::io::Error),
    ImageError(image::ImageError),
    EmptyTarget,
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::IoError(e)
    }
}

impl From<image::ImageError> for ExportError {
    fn from(e: image::ImageError) -> Self {
        ExportError::ImageError(e)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::IoError(e) => write!(f, "IO error: {}", e),
            ExportError::ImageError(e) => write!(f, "Image error: {}", e),
            ExportError::EmptyTarget => write!(f, "render target has zero size"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Color + depth buffer for software rendering
#[derive(Debug, Clone)]
pub struct RenderTarget {
    width: usize,
    height: usize,
    color: Vec<Color>,
    depth: Vec<f32>,
}

impl RenderTarget {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![Color::BLACK; width * height],
            depth: vec![FAR_DEPTH; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major color buffer
    pub fn pixels(&self) -> &[Color] {
        &self.color
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.color
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.color.resize(width * height, Color::BLACK);
        self.depth.resize(width * height, FAR_DEPTH);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn clear_color(&mut self, color: Color) {
        self.color.fill(color);
    }

    pub fn clear_depth(&mut self, depth: f32) {
        self.depth.fill(depth);
    }

    pub fn clear(&mut self, color: Color, depth: f32) {
        self.clear_color(color);
        self.clear_depth(depth);
    }

    /// Store `depth` if it is nearer than the current value; true when stored
    pub fn depth_test_and_set(&mut self, x: i32, y: i32, depth: f32) -> bool {
        match self.index(x, y) {
            Some(i) if depth < self.depth[i] => {
                self.depth[i] = depth;
                true
            }
            _ => false,
        }
    }

    /// Depth test without writing
    pub fn depth_passes(&self, x: i32, y: i32, depth: f32) -> bool {
        match self.index(x, y) {
            Some(i) => depth < self.depth[i],
            None => false,
        }
    }

    pub fn set_depth(&mut self, x: i32, y: i32, depth: f32) {
        if let Some(i) = self.index(x, y) {
            self.depth[i] = depth;
        }
    }

    pub fn get_depth(&self, x: i32, y: i32) -> f32 {
        self.index(x, y).map_or(FAR_DEPTH, |i| self.depth[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.color[i] = color;
        }
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        self.index(x, y).map_or(Color::BLACK, |i| self.color[i])
    }

    /// Packed 8-bit RGB triples, row-major
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.color.iter().flat_map(|c| c.to_rgb8()).collect()
    }

    /// Binary PPM: `P6\n{w} {h}\n255\n` followed by raw RGB bytes
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> Result<(), ExportError> {
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::EmptyTarget);
        }
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        out.write_all(&self.to_rgb8())?;
        Ok(())
    }

    pub fn save_ppm<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_ppm(&mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::EmptyTarget);
        }
        let img = image::RgbImage::from_raw(self.width as u32, self.height as u32, self.to_rgb8())
            .ok_or(ExportError::EmptyTarget)?;
        img.save(path)?;
        Ok(())
    }
}
