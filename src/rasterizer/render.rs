//! Frame orchestration: geometry -> assembly -> queue -> raster -> resolve

use log::{debug, trace, warn};

use super::geometry::GeometryProcessor;
use super::queue::{assemble, Rejection, RenderQueue};
use super::raster::{ShadeContext, TriangleRasterizer};
use super::ssaa::resolve_box;
use super::target::{RenderTarget, FAR_DEPTH};
use super::types::RenderSettings;
use crate::scene::Scene;

/// Counters for one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Objects that reached the geometry stage
    pub objects: usize,
    /// Index triples submitted for assembly
    pub triangles: usize,
    /// Dropped for invalid vertices, zero area, bad indices or non-finite derivatives
    pub skipped: usize,
    /// Opaque triangles dropped by backface culling
    pub culled: usize,
    pub opaque: usize,
    pub transparent: usize,
    /// Fragments composited into the target
    pub fragments: usize,
}

pub struct SoftwareRenderer {
    settings: RenderSettings,
    target: RenderTarget,
    /// Oversized target used when supersampling
    samples: RenderTarget,
}

impl SoftwareRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        let target = RenderTarget::new(settings.width, settings.height);
        Self {
            settings,
            target,
            samples: RenderTarget::new(0, 0),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: RenderSettings) {
        if settings.width != self.target.width() || settings.height != self.target.height() {
            self.target.resize(settings.width, settings.height);
        }
        self.settings = settings;
    }

    /// Final, base-resolution output of the last frame
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Render `scene` into the target. Without a camera nothing is drawn and
    /// the target keeps its previous contents.
    pub fn render(&mut self, scene: &Scene) -> FrameStats {
        let mut stats = FrameStats::default();
        let Some(camera) = scene.camera.as_ref() else {
            warn!("render called without a camera; frame skipped");
            return stats;
        };

        let factor = self.settings.ssaa_factor.max(1);
        let width = self.settings.width * factor;
        let height = self.settings.height * factor;

        let target = if factor > 1 {
            if self.samples.width() != width || self.samples.height() != height {
                self.samples.resize(width, height);
            }
            &mut self.samples
        } else {
            &mut self.target
        };
        target.clear(scene.background, FAR_DEPTH);

        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let camera_pos = camera.position();

        let geometry = GeometryProcessor::new(width, height);
        let mut queue = RenderQueue::new();

        for (index, object) in scene.objects.iter().enumerate() {
            let mesh = object.mesh;
            if !object.visible || mesh.vertices.is_empty() || mesh.indices.len() < 3 {
                trace!("object {} skipped (hidden or empty)", index);
                continue;
            }
            stats.objects += 1;

            let material = object.effective_material();
            let screen = geometry.process(&mesh.vertices, &object.transform, &view, &projection);
            for [a, b, c] in mesh.triangles() {
                stats.triangles += 1;
                let (Some(v0), Some(v1), Some(v2)) = (screen.get(a), screen.get(b), screen.get(c)) else {
                    stats.skipped += 1;
                    continue;
                };
                match assemble(v0, v1, v2, material, camera_pos, self.settings.backface_culling) {
                    Ok((item, coverage)) => queue.push(item, coverage),
                    Err(Rejection::BackFacing) => stats.culled += 1,
                    Err(_) => stats.skipped += 1,
                }
            }
        }

        queue.finalize();
        stats.opaque = queue.opaque().len();
        stats.transparent = queue.transparent().len();

        let rasterizer = TriangleRasterizer::new(&self.settings);
        let ctx = ShadeContext {
            lights: &scene.lights,
            camera_pos,
            ambient: scene.ambient,
        };
        for tri in queue.opaque().iter().chain(queue.transparent()) {
            stats.fragments += rasterizer.rasterize(target, tri, &ctx);
        }

        if factor > 1 {
            self.target.clear(scene.background, FAR_DEPTH);
            resolve_box(&self.samples, &mut self.target, factor);
        }

        debug!(
            "frame: {} objects, {} triangles ({} culled, {} skipped), {} opaque, {} transparent, {} fragments",
            stats.objects,
            stats.triangles,
            stats.culled,
            stats.skipped,
            stats.opaque,
            stats.transparent,
            stats.fragments
        );
        stats
    }
}
