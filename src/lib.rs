//! softrender: a CPU-only 3D rasterizer
//!
//! - Perspective-correct attribute interpolation
//! - Blinn-Phong shading with optional Schlick Fresnel, albedo and normal maps
//! - Ordered transparency with premultiplied "over" compositing
//! - Supersampling with a separable box-filter resolve
//! - PPM / PNG frame export

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod rasterizer;
pub mod scene;
