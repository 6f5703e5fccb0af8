use std::{f32::consts::PI, fmt, str::FromStr};

use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Linear RGB triple with components in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255., g as f32 / 255., b as f32 / 255.)
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: 1.0,
        }
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    /// Parses `#RRGGBB` or `#RGB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::Parse(format!("invalid hex color: {}", s));

        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);

        match hex.len() {
            6 => {
                let r = channel(0..2).map_err(|_| invalid())?;
                let g = channel(2..4).map_err(|_| invalid())?;
                let b = channel(4..6).map_err(|_| invalid())?;
                Ok(Self::from_u8(r, g, b))
            }
            3 => {
                let r = channel(0..1).map_err(|_| invalid())?;
                let g = channel(1..2).map_err(|_| invalid())?;
                let b = channel(2..3).map_err(|_| invalid())?;
                Ok(Self::from_u8(r * 17, g * 17, b * 17))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b)
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio.max(f32::EPSILON),
            self.near,
            self.far,
        )
    }
}

/// Camera placement orbiting the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Orbit {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Orbit {
    const PITCH_LIMIT: f32 = PI * 0.49;

    pub fn eye(&self) -> Vec3 {
        let rotation = Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(-self.pitch);
        rotation * (Vec3::Z * self.distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance + delta).clamp(self.min_distance, self.max_distance);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bloom {
    pub intensity: f32,
    pub threshold: f32,
    pub smoothing: f32,
}

impl Default for Bloom {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            threshold: 0.18,
            smoothing: 0.087,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Vignette {
    pub offset: f32,
    pub darkness: f32,
}

impl Default for Vignette {
    fn default() -> Self {
        Self {
            offset: 0.0,
            darkness: 0.35,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PostProcessing {
    pub clear_color: Rgb,
    pub bloom: Bloom,
    pub vignette: Vignette,
}

impl Default for PostProcessing {
    fn default() -> Self {
        Self {
            clear_color: Rgb::from_u8(0x07, 0x00, 0x1c),
            bloom: Bloom::default(),
            vignette: Vignette::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!("#ff0000".parse::<Rgb>().unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!("#0f0".parse::<Rgb>().unwrap(), Rgb::new(0.0, 1.0, 0.0));
        let purple: Rgb = "#dc00ff".parse().unwrap();
        assert_eq!(purple.to_string(), "#dc00ff");
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["dc00ff", "#dc00f", "#gg0000", "#", "#ff00ff00", "#é00"] {
            assert!(bad.parse::<Rgb>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn orbit_pitch_is_clamped() {
        let mut orbit = Orbit {
            yaw: 0.0,
            pitch: 0.0,
            distance: 10.0,
            min_distance: 1.0,
            max_distance: 20.0,
        };
        orbit.rotate(0.0, 100.0);
        assert!(orbit.pitch < PI / 2.0);
        orbit.zoom(100.0);
        assert_eq!(orbit.distance, 20.0);
        orbit.zoom(-100.0);
        assert_eq!(orbit.distance, 1.0);
        assert!((orbit.eye().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn default_transform_is_identity() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }
}
