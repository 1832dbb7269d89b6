//! Session configuration.
//!
//! Loaded once from TOML at startup; every section falls back to the tuned
//! defaults so a partial file is enough.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Scalar, SetupError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub restrictor: RestrictorConfig,
    pub prediction: PredictionConfig,
    pub locomotion: LocomotionConfig,
    pub display: DisplayConfig,
}

/// FOV sizes are measured in tan(theta / 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictorConfig {
    pub fov_restrictor_size: Scalar,
    pub fov_outer_size: Scalar,
    pub fov_max: Scalar,
    pub trans_fov_restrictor_size: Scalar,
    pub trans_fov_outer_size: Scalar,
    pub turn_fov_restrictor_size: Scalar,
    pub turn_fov_outer_size: Scalar,
    pub fov_restrictor_shift: Scalar,
    pub fov_restrictor_x_scale: Scalar,
    pub trans_sqlr_pow: Scalar,
    pub turn_sqlr_pow: Scalar,
    /// Seconds to ease between open and restricted.
    pub transition_interval: Scalar,
    /// Seconds for the shift to travel from 0 to full.
    pub shift_interval: Scalar,
    /// m/s below which translation is noise.
    pub min_trans_threshold: Scalar,
    /// deg/s below which rotation is noise.
    pub min_rot_threshold: Scalar,
    pub force_turn_on: bool,
    pub force_turn_off: bool,
    pub force_whole_screen: bool,
    pub force_black_periphery: bool,
    /// Device builds sample the eye image bottom-up.
    pub reverse_y: bool,
}

impl Default for RestrictorConfig {
    fn default() -> Self {
        Self {
            fov_restrictor_size: 0.577, // tan 30 deg
            fov_outer_size: 0.637,      // tan 32.5 deg
            fov_max: 1.4,
            trans_fov_restrictor_size: 0.577,
            trans_fov_outer_size: 0.637,
            turn_fov_restrictor_size: 0.45,
            turn_fov_outer_size: 0.5,
            fov_restrictor_shift: 0.0,
            fov_restrictor_x_scale: 1.0,
            trans_sqlr_pow: 2.0,
            turn_sqlr_pow: 2.0,
            transition_interval: 0.01,
            shift_interval: 0.25,
            min_trans_threshold: 1.0,
            min_rot_threshold: 1.0,
            force_turn_on: false,
            force_turn_off: false,
            force_whole_screen: false,
            force_black_periphery: false,
            reverse_y: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Seconds per teleport cycle.
    pub teleport_interval: Scalar,
    /// Postural sway amplification for the periphery.
    pub peri_scale: Scalar,
    pub peri_rot_scale: Scalar,
    /// m/s; per-axis velocity below this counts as a sway stop.
    pub sway_threshold: Scalar,
    pub dither_space: bool,
    pub dither_time: bool,
    pub pause: bool,
    pub show_current_only: bool,
    pub show_predicted_only: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            teleport_interval: 1.0,
            peri_scale: 1.0,
            peri_rot_scale: 1.0,
            sway_threshold: 0.01,
            dither_space: true,
            dither_time: false,
            pause: false,
            show_current_only: false,
            show_predicted_only: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub move_speed: Scalar,
    pub turn_speed: Scalar,
}

impl Default for LocomotionConfig {
    fn default() -> Self { Self { move_speed: 2.0, turn_speed: 90.0 } }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GraphicsApi {
    #[serde(rename = "d3d11")] Direct3D11,
    #[serde(rename = "d3d12")] Direct3D12,
    #[serde(rename = "metal")] Metal,
    #[serde(rename = "vulkan")] Vulkan,
    #[serde(rename = "opengl_core")] OpenGlCore,
    #[serde(rename = "opengl_es3")] OpenGlEs3,
}

impl GraphicsApi {
    /// APIs whose clip space is not top-left origin once the GPU projection is inverted.
    pub fn needs_y_flip(self) -> bool {
        !matches!(self, GraphicsApi::Vulkan | GraphicsApi::OpenGlCore | GraphicsApi::OpenGlEs3)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Hz; 0 falls back to 90.
    pub refresh_rate: Scalar,
    pub graphics_api: GraphicsApi,
}

impl Default for DisplayConfig {
    fn default() -> Self { Self { refresh_rate: 90.0, graphics_api: GraphicsApi::Vulkan } }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| SetupError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, SetupError> {
        let cfg: SessionConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        self.restrictor.validate()?;
        self.prediction.validate()?;
        self.locomotion.validate()
    }
}

fn positive(field: &'static str, v: Scalar) -> Result<(), SetupError> {
    if v.is_finite() && v > 0.0 { Ok(()) } else { Err(SetupError::invalid(field, format!("must be > 0, got {v}"))) }
}
fn non_negative(field: &'static str, v: Scalar) -> Result<(), SetupError> {
    if v.is_finite() && v >= 0.0 { Ok(()) } else { Err(SetupError::invalid(field, format!("must be >= 0, got {v}"))) }
}

impl RestrictorConfig {
    pub fn validate(&self) -> Result<(), SetupError> {
        positive("restrictor.transition_interval", self.transition_interval)?;
        positive("restrictor.shift_interval", self.shift_interval)?;
        positive("restrictor.fov_max", self.fov_max)?;
        non_negative("restrictor.fov_restrictor_shift", self.fov_restrictor_shift)?;
        non_negative("restrictor.min_trans_threshold", self.min_trans_threshold)?;
        non_negative("restrictor.min_rot_threshold", self.min_rot_threshold)?;
        for (field, inner, outer) in [
            ("restrictor.fov_outer_size", self.fov_restrictor_size, self.fov_outer_size),
            ("restrictor.trans_fov_outer_size", self.trans_fov_restrictor_size, self.trans_fov_outer_size),
            ("restrictor.turn_fov_outer_size", self.turn_fov_restrictor_size, self.turn_fov_outer_size),
        ] {
            non_negative(field, inner)?;
            if outer < inner {
                return Err(SetupError::invalid(field, format!("outer {outer} is inside restrictor {inner}")));
            }
            if inner >= self.fov_max {
                return Err(SetupError::invalid(field, format!("restrictor {inner} is not below fov_max {}", self.fov_max)));
            }
        }
        Ok(())
    }
}

impl PredictionConfig {
    pub fn validate(&self) -> Result<(), SetupError> {
        positive("prediction.teleport_interval", self.teleport_interval)?;
        positive("prediction.peri_scale", self.peri_scale)?;
        positive("prediction.peri_rot_scale", self.peri_rot_scale)?;
        non_negative("prediction.sway_threshold", self.sway_threshold)
    }
}

impl LocomotionConfig {
    pub fn validate(&self) -> Result<(), SetupError> {
        non_negative("locomotion.move_speed", self.move_speed)?;
        non_negative("locomotion.turn_speed", self.turn_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn defaults_validate() {
        SessionConfig::default().validate().unwrap();
    }
    #[test] fn partial_toml_keeps_defaults() {
        let cfg = SessionConfig::from_toml(
            "[prediction]\nteleport_interval = 0.5\n[display]\ngraphics_api = \"d3d11\"\n",
        ).unwrap();
        assert_eq!(cfg.prediction.teleport_interval, 0.5);
        assert_eq!(cfg.restrictor.fov_max, 1.4);
        assert_eq!(cfg.display.graphics_api, GraphicsApi::Direct3D11);
        assert!(cfg.display.graphics_api.needs_y_flip());
    }
    #[test] fn zero_interval_is_fatal() {
        let err = SessionConfig::from_toml("[prediction]\nteleport_interval = 0.0\n").unwrap_err();
        assert!(matches!(err, SetupError::Invalid { field: "prediction.teleport_interval", .. }));
    }
    #[test] fn inverted_fov_is_fatal() {
        let mut cfg = SessionConfig::default();
        cfg.restrictor.turn_fov_outer_size = 0.1;
        assert!(cfg.validate().is_err());
    }
    #[test] fn y_flip_by_api() {
        assert!(!GraphicsApi::Vulkan.needs_y_flip());
        assert!(!GraphicsApi::OpenGlCore.needs_y_flip());
        assert!(GraphicsApi::Metal.needs_y_flip());
        assert!(GraphicsApi::Direct3D12.needs_y_flip());
    }
}
