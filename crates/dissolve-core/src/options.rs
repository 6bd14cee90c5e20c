//! Scene configuration for the dissolve viewer.
//!
//! These options describe the scene a host engine builds around the dissolving
//! subject: camera, lights and shadow map, ground plane, and the per-frame time step.
//! Defaults reproduce the reference scene.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{DissolveError, Result};
use crate::uniform::color_from_hex;

/// Complete scene configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Perspective camera and orbit controls.
    pub camera: CameraConfig,
    /// Renderer output settings.
    pub renderer: RendererConfig,
    /// Shadow-receiving ground plane.
    pub ground: GroundConfig,
    /// Ambient light.
    pub ambient: AmbientLightConfig,
    /// Shadow-casting spotlight.
    pub spotlight: SpotLightConfig,
    /// The mesh that dissolves.
    pub subject: Subject,
    /// Base surface color of the subject (linear RGB).
    pub diffuse_color: Vec3,
    /// Amount added to the `time` uniform on every frame.
    pub time_step: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            renderer: RendererConfig::default(),
            ground: GroundConfig::default(),
            ambient: AmbientLightConfig::default(),
            spotlight: SpotLightConfig::default(),
            subject: Subject::default(),
            diffuse_color: color_from_hex(0xadadff),
            time_step: 0.01,
        }
    }
}

impl SceneConfig {
    /// Parses a configuration from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that values are usable by a renderer.
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(DissolveError::InvalidConfig(format!(
                "camera fov {} must be in (0, 180)",
                camera.fov_degrees
            )));
        }
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(DissolveError::InvalidConfig(format!(
                "camera clip range [{}, {}] is invalid",
                camera.near, camera.far
            )));
        }

        let shadow = &self.spotlight.shadow;
        if shadow.map_size == 0 {
            return Err(DissolveError::InvalidConfig(
                "shadow map size must be non-zero".into(),
            ));
        }
        if !(shadow.near > 0.0 && shadow.near < shadow.far) {
            return Err(DissolveError::InvalidConfig(format!(
                "shadow clip range [{}, {}] is invalid",
                shadow.near, shadow.far
            )));
        }

        if let Subject::Model { scale, .. } = &self.subject {
            if *scale <= 0.0 {
                return Err(DissolveError::InvalidConfig(format!(
                    "model scale {scale} must be positive"
                )));
            }
        }

        if self.time_step < 0.0 {
            return Err(DissolveError::InvalidConfig(format!(
                "time step {} must not be negative",
                self.time_step
            )));
        }

        Ok(())
    }
}

/// Perspective camera with damped orbit controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
    /// Initial camera position.
    pub position: Vec3,
    /// Whether orbit controls apply inertia.
    pub damping: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.01,
            far: 100.0,
            position: Vec3::new(0.0, 0.0, 12.0),
            damping: true,
        }
    }
}

/// Renderer output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Upper bound on the device pixel ratio.
    pub max_pixel_ratio: f32,
    /// Whether shadow maps are rendered.
    pub shadows_enabled: bool,
    /// Whether output is written in linear color space (no sRGB encode).
    pub linear_output: bool,
    /// Whether to use multisample antialiasing.
    pub antialias: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            shadows_enabled: true,
            linear_output: true,
            antialias: true,
        }
    }
}

/// Ground plane that receives the subject's shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Plane width and depth.
    pub size: f32,
    /// Plane height (world Y).
    pub height: f32,
    /// Plane color (linear RGB).
    pub color: Vec3,
    /// Whether the plane receives shadows.
    pub receive_shadow: bool,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            height: -3.0,
            color: Vec3::ONE,
            receive_shadow: true,
        }
    }
}

/// Uniform ambient light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLightConfig {
    /// Light color (linear RGB).
    pub color: Vec3,
    /// Light intensity.
    pub intensity: f32,
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 0.9,
        }
    }
}

/// Spotlight casting the subject's shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotLightConfig {
    /// Light color (linear RGB).
    pub color: Vec3,
    /// Light intensity.
    pub intensity: f32,
    /// Maximum range (0 = unlimited).
    pub distance: f32,
    /// Cone half-angle in radians.
    pub angle: f32,
    /// Fraction of the cone attenuated by the penumbra.
    pub penumbra: f32,
    /// Light position.
    pub position: Vec3,
    /// Point the light aims at.
    pub target: Vec3,
    /// Shadow map settings.
    pub shadow: ShadowConfig,
}

impl Default for SpotLightConfig {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 40.0,
            distance: 0.0,
            angle: std::f32::consts::PI / 5.0,
            penumbra: 0.1,
            position: Vec3::new(0.0, 4.0, 4.0),
            target: Vec3::ZERO,
            shadow: ShadowConfig::default(),
        }
    }
}

/// Shadow map settings for a light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Shadow camera near plane.
    pub near: f32,
    /// Shadow camera far plane.
    pub far: f32,
    /// Depth bias.
    pub bias: f32,
    /// Shadow map resolution (square).
    pub map_size: u32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            near: 1.0,
            far: 20.0,
            bias: 0.0001,
            map_size: 1024,
        }
    }
}

/// The mesh that dissolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    /// A subdivided icosahedron.
    Icosahedron {
        /// Sphere radius.
        radius: f32,
        /// Subdivision detail level.
        detail: u32,
    },
    /// A model supplied by the host's asset loader.
    Model {
        /// Asset path.
        path: String,
        /// Name of the mesh node inside the asset.
        mesh_name: String,
        /// Uniform scale applied to the node.
        scale: f32,
    },
}

impl Default for Subject {
    fn default() -> Self {
        Self::Icosahedron {
            radius: 1.0,
            detail: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.spotlight.shadow.map_size, 1024);
        assert_eq!(config.camera.position, Vec3::new(0.0, 0.0, 12.0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SceneConfig::from_json(
            r#"{
                "camera": { "fov_degrees": 35.0 },
                "subject": {
                    "kind": "model",
                    "path": "assets/figure-of-a-dancer.gltf",
                    "mesh_name": "mesh_0",
                    "scale": 0.0135
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.camera.fov_degrees, 35.0);
        assert_eq!(config.camera.far, 100.0);
        assert!(matches!(config.subject, Subject::Model { .. }));
        assert_eq!(config.time_step, 0.01);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SceneConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(SceneConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_camera_range() {
        let mut config = SceneConfig::default();
        config.camera.near = 200.0;
        assert!(matches!(config.validate(), Err(DissolveError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_shadow_map() {
        let mut config = SceneConfig::default();
        config.spotlight.shadow.map_size = 0;
        assert!(matches!(config.validate(), Err(DissolveError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SceneConfig::from_json("{ not json"),
            Err(DissolveError::Json(_))
        ));
    }
}
