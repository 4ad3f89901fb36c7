use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

/// Thresholds deciding whether a track counts as static.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MotionPolicy {
    /// Minimum total distance (px) travelled along the trajectory.
    pub min_distance: f32,
    /// Maximum distance (px) between first and last centroid.
    pub min_static_distance: f32,
}

impl MotionPolicy {
    pub const DEFAULT_MIN_DISTANCE: f32 = 500.0;
    pub const DEFAULT_MIN_STATIC_DISTANCE: f32 = 100.0;

    pub fn new(min_distance: f32, min_static_distance: f32) -> Self {
        Self {
            min_distance,
            min_static_distance,
        }
    }

    #[inline]
    pub fn is_static(&self, cumulative_distance: f32, net_displacement: f32) -> bool {
        net_displacement <= self.min_static_distance && cumulative_distance >= self.min_distance
    }
}

impl Default for MotionPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_DISTANCE, Self::DEFAULT_MIN_STATIC_DISTANCE)
    }
}

/// Lightness and saturation cut points of the color naming scheme, all in `0..=1`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ColorNameThresholds {
    pub black_lightness: f32,
    pub dark_lightness: f32,
    pub light_lightness: f32,
    pub white_lightness: f32,
    pub grey_saturation: f32,
    pub dull_saturation: f32,
}

impl ColorNameThresholds {
    pub const BLACK_LIGHTNESS: f32 = 0.12;
    pub const DARK_LIGHTNESS: f32 = 0.44;
    pub const LIGHT_LIGHTNESS: f32 = 1.0 - Self::DARK_LIGHTNESS;
    pub const WHITE_LIGHTNESS: f32 = 1.0 - Self::BLACK_LIGHTNESS;
    pub const GREY_SATURATION: f32 = 0.28;
    pub const DULL_SATURATION: f32 = 0.51;
}

impl Default for ColorNameThresholds {
    fn default() -> Self {
        Self {
            black_lightness: Self::BLACK_LIGHTNESS,
            dark_lightness: Self::DARK_LIGHTNESS,
            light_lightness: Self::LIGHT_LIGHTNESS,
            white_lightness: Self::WHITE_LIGHTNESS,
            grey_saturation: Self::GREY_SATURATION,
            dull_saturation: Self::DULL_SATURATION,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    pub enabled: bool,
    /// Existing tracks get a new color sample every `prediction_interval` observations.
    pub prediction_interval: u32,
    pub min_clusters: usize,
    pub max_clusters: usize,
    /// Fraction of the box width/height removed in total, half on each side.
    pub crop_reduction: f32,
    /// Region scale in `(0, 1)`; anything else keeps full resolution.
    pub downsample_factor: f32,
    /// Inertia gain, relative to the `min_clusters` fit, below which one more cluster is not worth it.
    pub elbow_threshold: f32,
    /// Added to `elbow_threshold`, larger values favour fewer clusters.
    pub increase_elbow: f32,
    pub max_iterations: usize,
    pub seed: u64,
    pub names: ColorNameThresholds,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prediction_interval: 1,
            min_clusters: 1,
            max_clusters: 6,
            crop_reduction: 0.0,
            downsample_factor: 0.5,
            elbow_threshold: 0.1,
            increase_elbow: 0.0,
            max_iterations: 50,
            seed: 0,
            names: ColorNameThresholds::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Frames per second actually classified out of the source stream.
    pub fps: f32,
    /// Detections below this confidence never reach the tracks.
    pub threshold: f32,
    pub max_predictions: u64,
    /// Tracks seen fewer times are left out of the report.
    pub min_detections: usize,
    /// Raw detector labels to keep, `None` keeps everything.
    pub allowed_labels: Option<Vec<String>>,
    pub translate_labels: bool,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            fps: 3.0,
            threshold: 0.3,
            max_predictions: 50,
            min_detections: 5,
            allowed_labels: None,
            translate_labels: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub classification: ClassificationConfig,
    pub motion: MotionPolicy,
    pub color: ColorConfig,
}

fn env_var<T: FromStr>(name: &str) -> Result<Option<T>, Error> {
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("cannot parse {}={:?}", name, raw))),
        Err(_) => Ok(None),
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| v.trim() == "True")
}

impl Config {
    pub fn from_json(src: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    /// Defaults overridden by whatever of the service environment variables are set.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();

        let cls = &mut config.classification;
        if let Some(v) = env_var("CLASSIFICATION_FPS")? {
            cls.fps = v;
        }
        if let Some(v) = env_var("CLASSIFICATION_THRESHOLD")? {
            cls.threshold = v;
        }
        if let Some(v) = env_var("MAX_NUMBER_OF_PREDICTIONS")? {
            cls.max_predictions = v;
        }
        if let Some(v) = env_var("MIN_DETECTIONS")? {
            cls.min_detections = v;
        }
        if let Ok(raw) = std::env::var("ALLOWED_CLASSIFICATIONS") {
            let labels: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            cls.allowed_labels = if labels.is_empty() { None } else { Some(labels) };
        }

        if let Some(v) = env_var("MIN_DISTANCE")? {
            config.motion.min_distance = v;
            config.motion.min_static_distance = v;
        }
        if let Some(v) = env_var("MIN_STATIC_DISTANCE")? {
            config.motion.min_static_distance = v;
        }

        let color = &mut config.color;
        if let Some(v) = env_flag("FIND_DOMINANT_COLORS") {
            color.enabled = v;
        }
        if let Some(v) = env_var("COLOR_PREDICTION_INTERVAL")? {
            color.prediction_interval = v;
        }
        if let Some(v) = env_var("MIN_CLUSTERS")? {
            color.min_clusters = v;
        }
        if let Some(v) = env_var("MAX_CLUSTERS")? {
            color.max_clusters = v;
        }

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let cls = &self.classification;
        if !(cls.fps > 0.0) {
            return Err(Error::Config(format!("classification fps must be positive, got {}", cls.fps)));
        }
        if !(0.0..=1.0).contains(&cls.threshold) {
            return Err(Error::Config(format!("classification threshold {} outside [0, 1]", cls.threshold)));
        }

        let color = &self.color;
        if color.min_clusters == 0 || color.min_clusters > color.max_clusters {
            return Err(Error::Config(format!(
                "invalid cluster bounds [{}, {}]",
                color.min_clusters, color.max_clusters
            )));
        }
        if color.prediction_interval == 0 {
            return Err(Error::Config("color prediction interval must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&color.crop_reduction) {
            return Err(Error::Config(format!("crop reduction {} outside [0, 1)", color.crop_reduction)));
        }
        if color.downsample_factor < 0.0 || color.elbow_threshold < 0.0 {
            return Err(Error::Config("downsample factor and elbow threshold must not be negative".into()));
        }

        Ok(())
    }
}
