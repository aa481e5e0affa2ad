//! Software rasterization pipeline
//!
//! Per frame:
//! - transform and project every vertex (`geometry`)
//! - assemble triangles, cull opaque back faces, split opaque from transparent (`queue`)
//! - sort opaque front to back and transparent back to front
//! - rasterize with depth testing and premultiplied "over" compositing (`raster`, `shading`)
//! - box-filter the supersampled target down to output size (`ssaa`)

mod geometry;
mod light;
mod math;
mod queue;
mod raster;
mod render;
mod shading;
mod ssaa;
mod target;
mod types;

pub use geometry::*;
pub use light::*;
pub use math::*;
pub use queue::*;
pub use raster::*;
pub use render::*;
pub use shading::*;
pub use ssaa::*;
pub use target::*;
pub use types::*;
