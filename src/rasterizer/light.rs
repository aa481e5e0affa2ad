//! Light sources
//!
//! A closed set of variants dispatched through [`Light`]; each variant also
//! implements [`LightSource`] on its own.

use serde::{Serialize, Deserialize};

use super::math::Vec3;
use super::types::Color;

/// Per-position queries the shading pipeline makes against a light
pub trait LightSource {
    /// Unit vector from `point` towards the light
    fn direction(&self, point: Vec3) -> Vec3;
    /// Attenuation factor in [0,1]
    fn attenuation(&self, point: Vec3) -> f32;
    /// Whether `point` receives any light at all
    fn is_visible(&self, point: Vec3) -> bool;
    fn color(&self) -> Color;
    fn intensity(&self) -> f32;
}

/// Omnidirectional light with distance falloff and a hard range cutoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Color::WHITE,
            intensity: 1.0,
            range: 100.0,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            ..Default::default()
        }
    }

    pub fn with_attenuation(mut self, constant: f32, linear: f32, quadratic: f32) -> Self {
        self.constant = constant;
        self.linear = linear;
        self.quadratic = quadratic;
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }
}

impl LightSource for PointLight {
    fn direction(&self, point: Vec3) -> Vec3 {
        (self.position - point).normalize()
    }

    fn attenuation(&self, point: Vec3) -> f32 {
        let d = (self.position - point).len();
        if d > self.range {
            return 0.0;
        }
        let att = 1.0 / (self.constant + self.linear * d + self.quadratic * d * d);
        att.clamp(0.0, 1.0)
    }

    fn is_visible(&self, point: Vec3) -> bool {
        (self.position - point).len() <= self.range
    }

    fn color(&self) -> Color {
        self.color
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }
}

/// Light at infinity; `direction` is the direction the light travels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Color,
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            intensity,
        }
    }
}

impl LightSource for DirectionalLight {
    fn direction(&self, _point: Vec3) -> Vec3 {
        -self.direction.normalize()
    }

    fn attenuation(&self, _point: Vec3) -> f32 {
        1.0
    }

    fn is_visible(&self, _point: Vec3) -> bool {
        true
    }

    fn color(&self) -> Color {
        self.color
    }

    fn intensity(&self) -> f32 {
        self.intensity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Point(PointLight),
    Directional(DirectionalLight),
}

impl Light {
    fn source(&self) -> &dyn LightSource {
        match self {
            Light::Point(l) => l,
            Light::Directional(l) => l,
        }
    }
}

impl LightSource for Light {
    fn direction(&self, point: Vec3) -> Vec3 {
        self.source().direction(point)
    }

    fn attenuation(&self, point: Vec3) -> f32 {
        self.source().attenuation(point)
    }

    fn is_visible(&self, point: Vec3) -> bool {
        self.source().is_visible(point)
    }

    fn color(&self) -> Color {
        self.source().color()
    }

    fn intensity(&self) -> f32 {
        self.source().intensity()
    }
}

impl From<PointLight> for Light {
    fn from(l: PointLight) -> Self {
        Light::Point(l)
    }
}

impl From<DirectionalLight> for Light {
    fn from(l: DirectionalLight) -> Self {
        Light::Directional(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_light_attenuation() {
        let light = PointLight::new(Vec3::ZERO, Color::WHITE, 1.0);
        // At the light position the formula gives 1/constant
        assert_relative_eq!(light.attenuation(Vec3::ZERO), 1.0);

        let p = Vec3::new(10.0, 0.0, 0.0);
        let expected = 1.0 / (1.0 + 0.09 * 10.0 + 0.032 * 100.0);
        assert_relative_eq!(light.attenuation(p), expected, epsilon = 1e-6);
        assert_relative_eq!(light.direction(p).x, -1.0);
    }

    #[test]
    fn test_point_light_clamps_to_one() {
        let light = PointLight::default().with_attenuation(0.5, 0.0, 0.0);
        assert_relative_eq!(light.attenuation(Vec3::new(1.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_point_light_range_cutoff() {
        let light = PointLight::default().with_range(5.0);
        let inside = Vec3::new(0.0, 4.9, 0.0);
        let outside = Vec3::new(0.0, 5.1, 0.0);
        assert!(light.is_visible(inside));
        assert!(!light.is_visible(outside));
        assert_eq!(light.attenuation(outside), 0.0);
    }

    #[test]
    fn test_directional_light_is_constant() {
        let light: Light = DirectionalLight::new(Vec3::new(0.0, -2.0, 0.0), Color::WHITE, 0.5).into();
        for p in [Vec3::ZERO, Vec3::new(100.0, -50.0, 3.0)] {
            assert_eq!(light.direction(p), Vec3::new(0.0, 1.0, 0.0));
            assert_eq!(light.attenuation(p), 1.0);
            assert!(light.is_visible(p));
        }
        assert_eq!(light.intensity(), 0.5);
    }
}
