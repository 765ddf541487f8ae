//! Viewer configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```ignore
//! use lifeview::ViewConfig;
//!
//! let config = ViewConfig::from_json_str(r#"{ "frame_rate_limit": 30, "lit_opacity": 0.6 }"#)?;
//! assert_eq!(config.zoom_max, 3.0);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// An axis-aligned screen rectangle in physical pixels.
///
/// Used to mark control surfaces (button bars, panels) where pointer input
/// must not rotate or zoom the view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether the point lies inside the rectangle (edges inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// All tunables of a render session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Cells encoded by one packed integer unit (8 for byte rows, 53 for hex-compat).
    pub unit_bit_width: u32,
    /// Opacity of a live voxel particle.
    pub lit_opacity: f32,
    /// Autonomous rotation speed in radians per second.
    pub angular_speed: f32,
    /// Idle time after which autonomous rotation resumes.
    pub auto_rotate_resume_threshold_ms: u64,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,
    /// Fraction of the remaining zoom distance covered each tick.
    pub zoom_smoothing_factor: f32,
    /// Maximum frames per second; 0 renders on every display refresh.
    pub frame_rate_limit: u32,
    /// Alpha rungs a dying cell steps through, starting with the live alpha.
    pub decay_ladder: Vec<u8>,
    /// RGB of a live cell.
    pub brand_color: [u8; 3],
    /// Radians of rotation per pixel of drag.
    pub drag_sensitivity: f32,
    /// World distance between neighboring particles within a plane.
    pub cell_spacing: f32,
    /// World distance between neighboring particle planes.
    pub plane_spacing: f32,
    /// Number of translucent backdrop planes drawn behind the particles.
    pub background_planes: u32,
    /// Opacity of each backdrop plane.
    pub plane_opacity: f32,
    /// Fixed downward tilt of the camera.
    pub camera_tilt_degrees: f32,
    /// Vertical field of view.
    pub camera_fov_degrees: f32,
    /// Camera distance at zoom 1.0.
    pub base_camera_distance: f32,
    /// Screen regions that swallow pointer input.
    pub control_surfaces: Vec<ScreenRect>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            unit_bit_width: 53,
            lit_opacity: 0.8,
            angular_speed: 0.03 * std::f32::consts::TAU,
            auto_rotate_resume_threshold_ms: 10_000,
            zoom_min: 0.3,
            zoom_max: 3.0,
            zoom_step: 0.1,
            zoom_smoothing_factor: 0.1,
            frame_rate_limit: 0,
            decay_ladder: vec![255, 180, 140, 100, 50],
            brand_color: [0x77, 0xCA, 0xE6],
            drag_sensitivity: 0.005,
            cell_spacing: 3.0,
            plane_spacing: 10.0,
            background_planes: 20,
            plane_opacity: 0.02,
            camera_tilt_degrees: 35.0,
            camera_fov_degrees: 16.0,
            base_camera_distance: 1570.0,
            control_surfaces: Vec::new(),
        }
    }
}

impl ViewConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ViewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Idle threshold as a [`Duration`].
    pub fn resume_threshold(&self) -> Duration {
        Duration::from_millis(self.auto_rotate_resume_threshold_ms)
    }

    /// Minimum time between rendered frames, if a limit is set.
    pub fn min_frame_interval(&self) -> Option<Duration> {
        (self.frame_rate_limit > 0).then(|| Duration::from_nanos(1_000_000_000 / u64::from(self.frame_rate_limit)))
    }

    /// Reject values the session cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if !(1..=64).contains(&self.unit_bit_width) {
            return Err(invalid("unit_bit_width", format!("{} is outside 1..=64", self.unit_bit_width)));
        }
        if !(self.zoom_min > 0.0 && self.zoom_min <= self.zoom_max) {
            return Err(invalid(
                "zoom_min",
                format!("bounds [{}, {}] are empty or non-positive", self.zoom_min, self.zoom_max),
            ));
        }
        if !(self.zoom_smoothing_factor > 0.0 && self.zoom_smoothing_factor <= 1.0) {
            return Err(invalid("zoom_smoothing_factor", "must lie in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.lit_opacity) {
            return Err(invalid("lit_opacity", "must lie in [0, 1]"));
        }
        match self.decay_ladder.first() {
            None => return Err(invalid("decay_ladder", "needs at least the live alpha")),
            Some(&first) if first != 255 => {
                return Err(invalid("decay_ladder", format!("live alpha must be 255, got {}", first)))
            }
            Some(_) => {}
        }
        if self.decay_ladder.windows(2).any(|w| w[1] >= w[0]) {
            return Err(invalid("decay_ladder", "rungs must strictly decrease"));
        }
        Ok(())
    }
}
