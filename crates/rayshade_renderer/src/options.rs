//! Global render options supplied by the scene builder.

use rayshade_math::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Color;

/// Errors produced while loading or validating options.
#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("invalid render options JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid option `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Shadow ray behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowOptions {
    /// Cast shadow rays at all.
    pub enabled: bool,
    /// Let light through transparent occluders, filtered by their body color.
    pub transparent: bool,
    /// Remember the last occluder per light and ray depth.
    pub cache: bool,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            transparent: true,
            cache: true,
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Maximum recursion depth for reflected and refracted rays
    pub max_depth: u32,
    /// Minimum per-channel contribution a secondary ray must be able to make
    pub cutoff: Color,
    pub shadows: ShadowOptions,
    /// Samples per pixel for the render loop
    pub samples: u32,
    /// Global ambient light
    pub ambient: Color,
    /// Color of rays that hit nothing
    pub background: Color,
    /// Time at which the shutter opens
    pub shutter_start: f64,
    /// How long the shutter stays open; zero disables motion blur
    pub shutter_duration: f64,
    /// Time samples used when bounding animated objects
    pub time_samples: usize,
    /// Default voxel resolution for grids built by helpers
    pub grid_resolution: [usize; 3],
    /// Maximum number of nodes on one hit path
    pub hit_path_capacity: usize,
    /// Report inconsistent shading normals as advisories
    pub normal_advisories: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            cutoff: DVec3::splat(0.002),
            shadows: ShadowOptions::default(),
            samples: 1,
            ambient: DVec3::ZERO,
            background: DVec3::ZERO,
            shutter_start: 0.0,
            shutter_duration: 0.0,
            time_samples: 5,
            grid_resolution: [16, 16, 16],
            hit_path_capacity: 32,
            normal_advisories: true,
        }
    }
}

impl RenderOptions {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        let options: RenderOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values the tracer cannot work with.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !self.cutoff.is_finite() || self.cutoff.min_element() < 0.0 {
            return Err(invalid("cutoff", format!("{:?} must be finite and non-negative", self.cutoff)));
        }
        if self.samples == 0 {
            return Err(invalid("samples", "at least one sample per pixel is required".into()));
        }
        if self.time_samples < 2 {
            return Err(invalid("time_samples", "both shutter endpoints must be sampled".into()));
        }
        if self.shutter_duration < 0.0 || !self.shutter_duration.is_finite() {
            return Err(invalid("shutter_duration", format!("{} is not a valid duration", self.shutter_duration)));
        }
        if self.hit_path_capacity < 2 {
            return Err(invalid("hit_path_capacity", "a hit path needs room for a primitive and the world".into()));
        }
        if self.grid_resolution.contains(&0) {
            return Err(invalid("grid_resolution", format!("{:?} has a zero axis", self.grid_resolution)));
        }
        Ok(())
    }

    /// The time at which a given sample of the shutter interval is taken.
    pub fn sample_time(&self, fraction: f64) -> f64 {
        self.shutter_start + fraction.clamp(0.0, 1.0) * self.shutter_duration
    }
}

fn invalid(field: &'static str, reason: String) -> OptionsError {
    OptionsError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = RenderOptions::default();
        assert!(options.validate().is_ok());
        assert!(options.shadows.enabled && options.shadows.cache);
    }

    #[test]
    fn test_from_json_partial() {
        let options = RenderOptions::from_json_str(
            r#"{ "max_depth": 2, "cutoff": [0.1, 0.1, 0.1], "shadows": { "cache": false } }"#,
        )
        .unwrap();

        assert_eq!(options.max_depth, 2);
        assert_eq!(options.cutoff, DVec3::splat(0.1));
        assert!(!options.shadows.cache);
        assert!(options.shadows.transparent);
        assert_eq!(options.samples, 1);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = RenderOptions::from_json_str(r#"{ "samples": 0 }"#).unwrap_err();
        assert!(matches!(err, OptionsError::Invalid { field: "samples", .. }));

        let err = RenderOptions::from_json_str(r#"{ "cutoff": [-1, 0, 0] }"#).unwrap_err();
        assert!(matches!(err, OptionsError::Invalid { field: "cutoff", .. }));

        assert!(matches!(
            RenderOptions::from_json_str("{ not json").unwrap_err(),
            OptionsError::Json(_)
        ));
    }

    #[test]
    fn test_sample_time() {
        let options = RenderOptions {
            shutter_start: 1.0,
            shutter_duration: 0.5,
            ..Default::default()
        };
        assert_eq!(options.sample_time(0.0), 1.0);
        assert_eq!(options.sample_time(1.0), 1.5);
        assert_eq!(options.sample_time(2.0), 1.5);
    }
}
