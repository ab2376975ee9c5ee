//! Application settings with TOML support.
//!
//! Every section uses `#[serde(default)]`, so a file only needs the values it
//! overrides. Defaults reproduce the reference room: a red room and an egg
//! model, a video screen high on the far wall, and the user standing two
//! units in from the origin.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables of the wall-avoiding walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Units per second while select is held.
    pub speed: f32,
    /// Minimum distance kept between the probe origin and any collider.
    pub wall_limit: f32,
    /// Height of the forward probe above the dolly.
    pub eye_height: f32,
    /// The dolly's Y after every step.
    pub ground_level: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            wall_limit: 1.3,
            eye_height: 1.0,
            ground_level: 0.0,
        }
    }
}

impl LocomotionConfig {
    pub fn new(speed: f32, wall_limit: f32) -> Self {
        Self {
            speed,
            wall_limit,
            ..Default::default()
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_wall_limit(mut self, wall_limit: f32) -> Self {
        self.wall_limit = wall_limit;
        self
    }

    pub fn with_eye_height(mut self, eye_height: f32) -> Self {
        self.eye_height = eye_height;
        self
    }

    pub fn with_ground_level(mut self, ground_level: f32) -> Self {
        self.ground_level = ground_level;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Offset from the dolly.
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(0.0, 1.6, 3.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DollyConfig {
    pub position: Vec3,
}

impl Default for DollyConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// 0xRRGGBB
    pub background: u32,
    pub hemisphere_sky: u32,
    pub hemisphere_ground: u32,
    pub directional_color: u32,
    pub directional_position: Vec3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: 0x505050,
            hemisphere_sky: 0x606060,
            hemisphere_ground: 0x404040,
            directional_color: 0xffffff,
            directional_position: Vec3::ONE.normalize(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Id of the page's `<video>` element (web builds).
    pub element_id: String,
    pub radius: f32,
    pub segments: u32,
    pub position: Vec3,
    pub color: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            element_id: "video".to_string(),
            radius: 6.5,
            segments: 64,
            position: Vec3::new(-3.5, 12.25, -50.0),
            color: 0xaaaaaa,
        }
    }
}

/// One model to load and where to put it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPlacement {
    pub file: String,
    #[serde(default)]
    pub position: Vec3,
    /// Whether the model's triangles join the collider set once loaded.
    #[serde(default)]
    pub collidable: bool,
}

impl ModelPlacement {
    pub fn new(file: impl Into<String>, position: Vec3) -> Self {
        Self {
            file: file.into(),
            position,
            collidable: false,
        }
    }

    pub fn collidable(mut self) -> Self {
        self.collidable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub base_path: PathBuf,
    pub models: Vec<ModelPlacement>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("assets"),
            models: vec![
                ModelPlacement::new("redroom.glb", Vec3::ZERO).collidable(),
                ModelPlacement::new("egg.glb", Vec3::new(-3.5, 0.0, -25.0)),
            ],
        }
    }
}

impl AssetsConfig {
    pub fn resolve(&self, placement: &ModelPlacement) -> PathBuf {
        self.base_path.join(&placement.file)
    }
}

/// Static collider declared in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ColliderConfig {
    Box { center: Vec3, half_extents: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub locomotion: LocomotionConfig,
    pub camera: CameraConfig,
    pub dolly: DollyConfig,
    pub scene: SceneConfig,
    pub video: VideoConfig,
    pub assets: AssetsConfig,
    pub colliders: Vec<ColliderConfig>,
}

impl AppConfig {
    /// Load settings from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let loco = &self.locomotion;
        if !loco.speed.is_finite() || loco.speed < 0.0 {
            return Err(invalid("locomotion.speed", format!("{} is not a non-negative speed", loco.speed)));
        }
        if !loco.wall_limit.is_finite() || loco.wall_limit <= 0.0 {
            return Err(invalid("locomotion.wall_limit", format!("{} must be positive", loco.wall_limit)));
        }
        if !loco.eye_height.is_finite() {
            return Err(invalid("locomotion.eye_height", format!("{} is not finite", loco.eye_height)));
        }
        if !loco.ground_level.is_finite() {
            return Err(invalid("locomotion.ground_level", format!("{} is not finite", loco.ground_level)));
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(invalid("camera.fov_degrees", format!("{} is outside (0, 180)", self.camera.fov_degrees)));
        }
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return Err(invalid(
                "camera.near",
                format!("expected 0 < near < far, got {} and {}", self.camera.near, self.camera.far),
            ));
        }
        if self.video.segments < 3 {
            return Err(invalid("video.segments", format!("{} is fewer than 3", self.video.segments)));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_room() {
        let config = AppConfig::default();
        assert_eq!(config.locomotion.speed, 2.0);
        assert_eq!(config.locomotion.wall_limit, 1.3);
        assert_eq!(config.dolly.position, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(config.assets.models.len(), 2);
        assert!(config.assets.models[0].collidable);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [locomotion]
            speed = 3.5

            [[colliders]]
            shape = "box"
            center = [0.0, 1.5, -6.0]
            half_extents = [6.0, 1.5, 0.1]
            "#,
        )
        .unwrap();

        assert_eq!(config.locomotion.speed, 3.5);
        assert_eq!(config.locomotion.wall_limit, 1.3);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(
            config.colliders,
            vec![ColliderConfig::Box {
                center: Vec3::new(0.0, 1.5, -6.0),
                half_extents: Vec3::new(6.0, 1.5, 0.1),
            }]
        );
    }

    #[test]
    fn rejects_non_positive_wall_limit() {
        let err = AppConfig::from_toml_str("[locomotion]\nwall_limit = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "locomotion.wall_limit", .. }));
    }

    #[test]
    fn rejects_nan_heights() {
        let err = AppConfig::from_toml_str("[locomotion]\nground_level = nan\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "locomotion.ground_level", .. }));

        let err = AppConfig::from_toml_str("[locomotion]\neye_height = inf\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "locomotion.eye_height", .. }));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[assets]\nbase_path = \"media\"\nmodels = []").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.assets.base_path, PathBuf::from("media"));
        assert!(config.assets.models.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
