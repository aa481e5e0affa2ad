//! Offline frame renderer
//!
//! Usage: `softrender [config.ron]`. Without a config the built-in demo
//! scene is rendered.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use softrender::config::{load_config, ImageFormat, RenderConfig};
use softrender::rasterizer::{FrameStats, SoftwareRenderer};
use softrender::scene::{Mesh, Scene, SceneObject};
use softrender::VERSION;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    info!("softrender v{}", VERSION);

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => load_config(&path).with_context(|| format!("loading config {}", path.display()))?,
        None => {
            info!("No config given, rendering the demo scene");
            RenderConfig::default()
        }
    };

    let output = &config.output;
    fs::create_dir_all(&output.directory)
        .with_context(|| format!("creating output directory {}", output.directory.display()))?;

    // Meshes outlive every per-frame scene that borrows them
    let objects = &config.scene.objects;
    let meshes: Vec<Mesh> = objects
        .iter()
        .map(|o| Mesh {
            material: o.build_material(),
            ..o.build_mesh()
        })
        .collect();

    let settings = config.settings.clone();
    let aspect = settings.width as f32 / settings.height.max(1) as f32;
    let camera = config.scene.camera.as_ref().map(|c| c.build(aspect));
    if camera.is_none() {
        log::warn!("Config has no camera; frames will only show the cleared target");
    }

    let mut renderer = SoftwareRenderer::new(settings);
    let bar = ProgressBar::new(output.frames as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} frames ({eta})",
    )?);

    let mut totals = FrameStats::default();
    for frame in 0..output.frames {
        let mut scene = Scene {
            camera: camera.clone(),
            lights: config.scene.lights.clone(),
            background: config.scene.background,
            ambient: config.scene.ambient,
            ..Scene::new()
        };
        for (obj, mesh) in objects.iter().zip(&meshes) {
            let mut instance = SceneObject::new(mesh).with_transform(obj.transform(frame));
            instance.visible = obj.visible;
            scene.add_object(instance);
        }

        let stats = renderer.render(&scene);
        totals.triangles += stats.triangles;
        totals.fragments += stats.fragments;

        let path = output.frame_path(frame);
        let target = renderer.target();
        match output.format {
            ImageFormat::Ppm => target.save_ppm(&path),
            ImageFormat::Png => target.save_png(&path),
        }
        .with_context(|| format!("writing {}", path.display()))?;

        bar.inc(1);
    }
    bar.finish();

    info!(
        "Wrote {} frame(s) to {} ({} triangles, {} fragments)",
        output.frames,
        output.directory.display(),
        totals.triangles,
        totals.fragments
    );
    Ok(())
}
