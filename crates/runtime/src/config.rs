//! Demo configuration, loadable from YAML.
//!
//! Every section and field is optional; anything missing falls back to the
//! built-in demo (a salmon capsule lit by one white point light, spinning
//! 0.01 rad per tick about X and Y).

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub camera: CameraConfig,
    pub renderer: RendererConfig,
    pub capsule: CapsuleConfig,
    pub light: LightConfig,
    pub animation: AnimationConfig,
    pub controls: ControlsConfig,
}

impl DemoConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded demo config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub antialias: bool,
    /// Initial surface size for hosts that create their own window.
    pub width: u32,
    pub height: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapsuleConfig {
    pub radius: f32,
    pub length: f32,
    pub cap_segments: u32,
    pub radial_segments: u32,
    /// 0xRRGGBB.
    pub color: u32,
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for CapsuleConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            length: 2.0,
            cap_segments: 20,
            radial_segments: 30,
            color: 0xfa8072,
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightConfig {
    pub color: u32,
    pub intensity: f32,
    pub position: Vec3,
    /// Cutoff range; 0 means unlimited.
    pub distance: f32,
    pub decay: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            intensity: 40.0,
            position: Vec3::new(5.0, 5.0, 5.0),
            distance: 0.0,
            decay: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    /// Euler step added to the capsule's rotation each tick, in radians.
    pub spin: Vec3,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            spin: Vec3::new(0.01, 0.01, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    /// Unlimited when absent.
    pub max_distance: Option<f32>,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 0.01,
            max_distance: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_reproduce_demo() {
        let config = DemoConfig::default();
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.camera.position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(config.capsule.color, 0xfa8072);
        assert_eq!(config.capsule.cap_segments, 20);
        assert_eq!(config.capsule.radial_segments, 30);
        assert_eq!(config.light.intensity, 40.0);
        assert_eq!(config.light.position, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(config.animation.spin, Vec3::new(0.01, 0.01, 0.0));
        assert!(config.renderer.antialias);
        assert!(config.controls.enable_damping);
        assert_eq!(config.controls.damping_factor, 0.05);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(DemoConfig::from_yaml_str("{}").unwrap(), DemoConfig::default());
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let yaml = "
camera:
  fov: 60.0
  position: [0.0, 2.0, 8.0]
capsule:
  radius: 0.5
  color: 0x00ff00
animation:
  spin: [0.0, 0.02, 0.0]
controls:
  enable_damping: false
";
        let config = DemoConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.camera.position, Vec3::new(0.0, 2.0, 8.0));
        assert_eq!(config.capsule.radius, 0.5);
        assert_eq!(config.capsule.length, 2.0);
        assert_eq!(config.capsule.color, 0x00ff00);
        assert_eq!(config.animation.spin, Vec3::new(0.0, 0.02, 0.0));
        assert!(!config.controls.enable_damping);
        assert_eq!(config.light, LightConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = DemoConfig::from_yaml_str("camera:\n  zoom: 3.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn yaml_round_trips() {
        let config = DemoConfig::default();
        let text = config.to_yaml_string().unwrap();
        assert_eq!(DemoConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "light:\n  intensity: 12.5\nrenderer:\n  antialias: false").unwrap();
        let config = DemoConfig::load(file.path()).unwrap();
        assert_eq!(config.light.intensity, 12.5);
        assert!(!config.renderer.antialias);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DemoConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.yaml"));
    }
}
