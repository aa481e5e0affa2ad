//! Render configuration
//!
//! Uses RON for human-readable config files: render settings, output
//! naming and a declarative scene (camera, lights, primitive objects).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::rasterizer::{Color, DirectionalLight, Light, Mat4, Material, PointLight, RenderSettings, Texture, Vec3};
use crate::scene::{Camera, Mesh};

/// Error type for config loading and saving
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::SerializeError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RenderConfig {
    pub settings: RenderSettings,
    pub output: OutputConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Ppm,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Ppm => "ppm",
            ImageFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub prefix: String,
    pub format: ImageFormat,
    pub frames: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("frames"),
            prefix: "frame".to_string(),
            format: ImageFormat::Png,
            frames: 1,
        }
    }
}

impl OutputConfig {
    /// `{directory}/{prefix}_{frame:04}.{ext}`
    pub fn frame_path(&self, frame: usize) -> PathBuf {
        self.directory
            .join(format!("{}_{:04}.{}", self.prefix, frame, self.format.extension()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::UP,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraConfig {
    pub fn build(&self, aspect: f32) -> Camera {
        Camera::new(self.position, self.target, self.up)
            .with_perspective(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshKind {
    Cube,
    Quad,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialPreset {
    /// Vertex colors only
    Unlit,
    Default,
    RedPlastic,
    BlueMetal,
    WhiteDiffuse,
}

impl MaterialPreset {
    pub fn build(self) -> Option<Material> {
        match self {
            MaterialPreset::Unlit => None,
            MaterialPreset::Default => Some(Material::default()),
            MaterialPreset::RedPlastic => Some(Material::red_plastic()),
            MaterialPreset::BlueMetal => Some(Material::blue_metal()),
            MaterialPreset::WhiteDiffuse => Some(Material::white_diffuse()),
        }
    }
}

/// Procedural checkerboard albedo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerConfig {
    pub size: usize,
    pub square: usize,
    pub color1: Color,
    pub color2: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectConfig {
    pub mesh: MeshKind,
    pub size: f32,
    pub translation: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
    pub spin_degrees_per_frame: Vec3,
    pub material: MaterialPreset,
    /// Material diffuse alpha, or vertex alpha for unlit objects
    pub alpha: f32,
    pub checker: Option<CheckerConfig>,
    /// Image file used as albedo map; takes precedence over `checker`
    pub texture: Option<PathBuf>,
    pub visible: bool,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            mesh: MeshKind::Cube,
            size: 1.0,
            translation: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
            scale: Vec3::ONE,
            spin_degrees_per_frame: Vec3::ZERO,
            material: MaterialPreset::Default,
            alpha: 1.0,
            checker: None,
            texture: None,
            visible: true,
        }
    }
}

impl ObjectConfig {
    pub fn build_mesh(&self) -> Mesh {
        let mesh = match self.mesh {
            MeshKind::Cube => Mesh::cube(self.size),
            MeshKind::Quad => Mesh::quad(self.size),
            MeshKind::Triangle => Mesh::triangle(self.size),
        };
        if self.material == MaterialPreset::Unlit {
            mesh.with_color(Color::WHITE.alpha(self.alpha))
        } else {
            mesh
        }
    }

    /// Material with alpha and albedo map applied. A texture that fails to
    /// load is reported and left out.
    pub fn build_material(&self) -> Option<Material> {
        let mut material = self.material.build()?;
        material.diffuse.a = self.alpha;

        let mut map = match (&self.texture, &self.checker) {
            (Some(path), _) => match Texture::from_file(path) {
                Ok(tex) => Some(tex),
                Err(e) => {
                    log::warn!("{}; continuing without albedo map", e);
                    None
                }
            },
            (None, Some(c)) => Some(Texture::checkerboard(c.size, c.size, c.square, c.color1, c.color2)),
            (None, None) => None,
        };
        if let Some(tex) = map.as_mut() {
            tex.build_mipmaps();
        }
        material.diffuse_map = map;
        Some(material)
    }

    /// Model matrix at `frame`, with spin accumulated onto the base rotation
    pub fn transform(&self, frame: usize) -> Mat4 {
        let degrees = self.rotation_degrees + self.spin_degrees_per_frame * frame as f32;
        let radians = Vec3::new(degrees.x.to_radians(), degrees.y.to_radians(), degrees.z.to_radians());
        Mat4::from_trs(self.translation, radians, self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub background: Color,
    pub ambient: Color,
    pub camera: Option<CameraConfig>,
    pub lights: Vec<Light>,
    pub objects: Vec<ObjectConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: Color::new(0.05, 0.05, 0.08),
            ambient: Color::splat(0.15),
            camera: Some(CameraConfig {
                position: Vec3::new(0.0, 1.5, 5.0),
                ..Default::default()
            }),
            lights: vec![
                PointLight::new(Vec3::new(2.0, 3.0, 4.0), Color::WHITE, 1.0).into(),
                DirectionalLight::new(Vec3::new(-0.5, -1.0, -0.3), Color::new(0.6, 0.7, 1.0), 0.4).into(),
            ],
            objects: vec![
                ObjectConfig {
                    mesh: MeshKind::Cube,
                    size: 1.5,
                    rotation_degrees: Vec3::new(20.0, 30.0, 0.0),
                    spin_degrees_per_frame: Vec3::new(0.0, 3.0, 0.0),
                    material: MaterialPreset::RedPlastic,
                    checker: Some(CheckerConfig {
                        size: 64,
                        square: 8,
                        color1: Color::WHITE,
                        color2: Color::splat(0.3).alpha(1.0),
                    }),
                    ..Default::default()
                },
                ObjectConfig {
                    mesh: MeshKind::Quad,
                    size: 2.0,
                    translation: Vec3::new(0.6, 0.2, 1.6),
                    material: MaterialPreset::BlueMetal,
                    alpha: 0.5,
                    ..Default::default()
                },
            ],
        }
    }
}

/// Load a config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config = load_config_from_str(&contents)?;
    log::info!("Loaded config: {}", path.as_ref().display());
    Ok(config)
}

/// Load a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<RenderConfig, ConfigError> {
    let config: RenderConfig = ron::from_str(s)?;
    if config.settings.ssaa_factor == 0 {
        log::warn!("ssaa_factor 0 treated as 1");
    }
    Ok(config)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &RenderConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg = load_config_from_str("(settings: (width: 320, ssaa_factor: 2))").unwrap();
        assert_eq!(cfg.settings.width, 320);
        assert_eq!(cfg.settings.height, 600);
        assert_eq!(cfg.settings.ssaa_factor, 2);
        assert!(cfg.settings.perspective_correct);
        assert_eq!(cfg.output, OutputConfig::default());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = load_config_from_str("(settings: (width: \"wide\"))").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_save_and_reload_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.ron");
        let cfg = RenderConfig::default();
        save_config(&cfg, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.scene.objects.len(), 2);
        assert_eq!(loaded.scene.lights.len(), 2);
        assert_eq!(loaded.output.format, ImageFormat::Png);
    }

    #[test]
    fn test_scene_from_ron() {
        let src = r#"(
            scene: (
                camera: Some((position: (x: 0.0, y: 0.0, z: 8.0))),
                lights: [Point((position: (x: 1.0, y: 2.0, z: 3.0), intensity: 2.0))],
                objects: [(mesh: Quad, material: Unlit, alpha: 0.25)],
            ),
            output: (frames: 3, format: Ppm),
        )"#;
        let cfg = load_config_from_str(src).unwrap();
        let cam = cfg.scene.camera.as_ref().unwrap();
        assert_relative_eq!(cam.position.z, 8.0);
        assert_relative_eq!(cam.fov_degrees, 45.0);

        match &cfg.scene.lights[0] {
            Light::Point(p) => {
                assert_relative_eq!(p.intensity, 2.0);
                assert_relative_eq!(p.range, 100.0);
            }
            other => panic!("unexpected light {:?}", other),
        }

        let obj = &cfg.scene.objects[0];
        assert!(obj.build_material().is_none());
        assert!(obj.build_mesh().vertices.iter().all(|v| v.color.a == 0.25));
        assert_eq!(cfg.output.frame_path(2), PathBuf::from("frames").join("frame_0002.ppm"));
    }

    #[test]
    fn test_object_material_and_transform() {
        let obj = ObjectConfig {
            material: MaterialPreset::BlueMetal,
            alpha: 0.5,
            checker: Some(CheckerConfig { size: 8, square: 2, color1: Color::WHITE, color2: Color::BLACK }),
            translation: Vec3::new(1.0, 0.0, 0.0),
            spin_degrees_per_frame: Vec3::new(0.0, 0.0, 90.0),
            ..Default::default()
        };
        let mat = obj.build_material().unwrap();
        assert_eq!(mat.diffuse_alpha(), 0.5);
        let map = mat.diffuse_map.as_ref().unwrap();
        assert_eq!(map.levels.len(), 4);

        // One frame of spin turns +x onto +y before translating
        let p = obj.transform(1) * Vec3::new(1.0, 0.0, 0.0).extend(1.0);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_unreadable_texture_falls_back() {
        let obj = ObjectConfig {
            texture: Some(PathBuf::from("/nonexistent/albedo.png")),
            ..Default::default()
        };
        let mat = obj.build_material().unwrap();
        assert!(mat.diffuse_map.is_none());
    }
}
