//! TOML configuration.
//!
//! Every field is optional; anything missing takes its default. A minimal
//! file looks like:
//!
//! ```toml
//! [scene]
//! seed = 7
//! clear_color = "#07001c"
//!
//! [[blobs]]
//! name = "core"
//! particles_count = 20000
//! color1 = "#dc00ff"
//! ```

use std::{path::Path, time::Duration};

use log::info;
use serde::Deserialize;

use crate::{
    blob::{BlobParams, DEFAULT_BLOB_SIZE},
    component::{Bloom, Camera, Orbit, Rgb, Vignette},
    error::{ensure_non_negative, ensure_positive, ConfigError},
};

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub window: WindowConfig,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    pub bloom: Bloom,
    pub vignette: Vignette,
    /// Blobs present at start-up, spawned in order.
    pub blobs: Vec<BlobParams>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Celestial Body".to_owned(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Fixed RNG seed; a time-based seed is used when absent.
    pub seed: Option<u64>,
    pub clear_color: Rgb,
    pub fade_out_secs: f32,
    /// Radius used for blobs spawned with random parameters.
    pub blob_size: f32,
    /// Spawn one random blob when `blobs` is empty.
    pub spawn_random_when_empty: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: None,
            clear_color: Rgb::from_u8(0x07, 0x00, 0x1c),
            fade_out_secs: 1.5,
            blob_size: DEFAULT_BLOB_SIZE,
            spawn_random_when_empty: true,
        }
    }
}

impl SceneConfig {
    pub fn fade_out(&self) -> Result<Duration, ConfigError> {
        ensure_positive("scene.fade_out_secs", self.fade_out_secs)?;
        Duration::try_from_secs_f32(self.fade_out_secs).map_err(|e| {
            ConfigError::invalid(
                "scene.fade_out_secs",
                format!("{} is not a representable duration: {}", self.fade_out_secs, e),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 1.0,
            far: 5000.0,
            distance: 2000.0,
            min_distance: 100.0,
            max_distance: 4000.0,
        }
    }
}

impl CameraConfig {
    pub fn camera(&self, aspect_ratio: f32) -> Camera {
        Camera {
            fov: self.fov_degrees,
            aspect_ratio,
            near: self.near,
            far: self.far,
        }
    }

    pub fn orbit(&self) -> Orbit {
        Orbit {
            yaw: 0.0,
            pitch: 0.0,
            distance: self.distance,
            min_distance: self.min_distance,
            max_distance: self.max_distance,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(
            "Loaded config from {} ({} blobs)",
            path.display(),
            config.blobs.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::invalid(
                "window",
                format!("{}x{} is not a drawable size", self.window.width, self.window.height),
            ));
        }

        self.scene.fade_out()?;
        ensure_positive("scene.blob_size", self.scene.blob_size)?;

        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::invalid(
                "camera.fov_degrees",
                format!("{} is outside (0, 180)", camera.fov_degrees),
            ));
        }
        ensure_positive("camera.near", camera.near)?;
        if !(camera.far > camera.near) {
            return Err(ConfigError::invalid(
                "camera.far",
                format!("{} must be greater than near ({})", camera.far, camera.near),
            ));
        }
        ensure_positive("camera.min_distance", camera.min_distance)?;
        if !(camera.min_distance <= camera.distance && camera.distance <= camera.max_distance) {
            return Err(ConfigError::invalid(
                "camera.distance",
                format!(
                    "{} is outside [{}, {}]",
                    camera.distance, camera.min_distance, camera.max_distance
                ),
            ));
        }

        ensure_non_negative("bloom.intensity", self.bloom.intensity)?;
        ensure_non_negative("bloom.threshold", self.bloom.threshold)?;
        ensure_non_negative("bloom.smoothing", self.bloom.smoothing)?;
        ensure_non_negative("vignette.offset", self.vignette.offset)?;
        ensure_non_negative("vignette.darkness", self.vignette.darkness)?;

        for (i, params) in self.blobs.iter().enumerate() {
            params.validate().map_err(|e| {
                ConfigError::invalid(
                    "blobs",
                    format!(
                        "record {} ({}): {}",
                        i,
                        params.name.as_deref().unwrap_or("unnamed"),
                        e
                    ),
                )
            })?;
        }

        Ok(())
    }
}
