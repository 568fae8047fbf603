//! Configuration shared by sampling, projection and rendering.
//!
//! A [`Config`] is built once (from defaults, builder calls or a JSON file) and
//! handed to each component by reference. Nothing in the crate reads global
//! state.
//!
//! ```
//! use vantage::config::{Config, CameraSettings};
//!
//! let config = Config::default()
//!     .with_camera(CameraSettings::default().with_resolution(640, 480))
//!     .with_threads(4);
//! assert_eq!(config.camera.width, 640);
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inclusive `[low, high]` range a value is drawn uniformly from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound.
    pub low: f64,
    /// Upper bound.
    pub high: f64,
}

impl Bounds {
    /// Create a new range.
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Draw a value uniformly from the range. An empty or inverted range yields `low`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if !(self.high > self.low) {
            return self.low;
        }
        if (self.high - self.low).is_finite() {
            rng.gen_range(self.low..=self.high)
        } else {
            // width overflows f64; interpolate the endpoints instead
            let t: f64 = rng.gen();
            self.low * (1.0 - t) + self.high * t
        }
    }

    /// Check that both ends are finite.
    pub fn validate(&self, name: &'static str) -> Result<()> {
        if self.low.is_finite() && self.high.is_finite() {
            Ok(())
        } else {
            Err(Error::invalid_param(
                name,
                format!("[{}, {}]", self.low, self.high),
                "bounds must be finite",
            ))
        }
    }

    /// Whether `value` lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Uniform bounds used when no empirical view distribution is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewBounds {
    /// Azimuth range in degrees.
    pub azimuth: Bounds,
    /// Elevation range in degrees.
    pub elevation: Bounds,
    /// In-plane tilt range in degrees.
    pub tilt: Bounds,
    /// Camera distance range.
    pub distance: Bounds,
    /// Smallest distance a sampled camera may have.
    pub min_distance: f64,
}

impl Default for ViewBounds {
    fn default() -> Self {
        Self {
            azimuth: Bounds::new(0.0, 360.0),
            elevation: Bounds::new(-5.0, 30.0),
            tilt: Bounds::new(-15.0, 15.0),
            distance: Bounds::new(1.5, 3.0),
            min_distance: 0.01,
        }
    }
}

impl ViewBounds {
    /// Set the azimuth range.
    pub fn with_azimuth(mut self, low: f64, high: f64) -> Self {
        self.azimuth = Bounds::new(low, high);
        self
    }

    /// Set the elevation range.
    pub fn with_elevation(mut self, low: f64, high: f64) -> Self {
        self.elevation = Bounds::new(low, high);
        self
    }

    /// Set the tilt range.
    pub fn with_tilt(mut self, low: f64, high: f64) -> Self {
        self.tilt = Bounds::new(low, high);
        self
    }

    /// Set the distance range.
    pub fn with_distance(mut self, low: f64, high: f64) -> Self {
        self.distance = Bounds::new(low, high);
        self
    }
}

/// Where pixel row zero lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImageOrigin {
    /// Rows grow upwards from the bottom edge (the renderer's camera-view convention).
    #[default]
    BottomLeft,
    /// Rows grow downwards from the top edge.
    TopLeft,
}

/// Pinhole camera settings. These must match the renderer exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Field of view in degrees, spanning the larger image dimension.
    pub fov_degrees: f64,
    /// Pixel row convention for labels.
    pub origin: ImageOrigin,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            // 35 mm lens on a 32 mm sensor
            fov_degrees: 2.0 * (16.0_f64 / 35.0).atan().to_degrees(),
            origin: ImageOrigin::BottomLeft,
        }
    }
}

impl CameraSettings {
    /// Set the image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the field of view in degrees.
    pub fn with_fov_degrees(mut self, fov: f64) -> Self {
        self.fov_degrees = fov;
        self
    }

    /// Set the pixel row convention.
    pub fn with_origin(mut self, origin: ImageOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Focal length in pixels. Pixels are square; the field of view spans the
    /// larger of width and height.
    pub fn focal_length_px(&self) -> f64 {
        let span = self.width.max(self.height) as f64;
        0.5 * span / (0.5 * self.fov_degrees.to_radians()).tan()
    }

    /// Check that the settings describe a usable camera.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_param(
                "resolution",
                format!("{}x{}", self.width, self.height),
                "must be non-zero",
            ));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(Error::invalid_param(
                "fov_degrees",
                self.fov_degrees,
                "must be in (0, 180)",
            ));
        }
        Ok(())
    }
}

/// Bounds for the randomised light rig handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Minimum number of point lights.
    pub min_lights: usize,
    /// Maximum number of point lights.
    pub max_lights: usize,
    /// Light distance from the object origin.
    pub distance: Bounds,
    /// Light azimuth in degrees.
    pub azimuth: Bounds,
    /// Light elevation in degrees.
    pub elevation: Bounds,
    /// Mean point light energy.
    pub energy_mean: f64,
    /// Standard deviation of point light energy.
    pub energy_std: f64,
    /// Environment light energy.
    pub environment_energy: Bounds,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            min_lights: 0,
            max_lights: 6,
            distance: Bounds::new(8.0, 20.0),
            azimuth: Bounds::new(0.0, 360.0),
            elevation: Bounds::new(-90.0, 90.0),
            energy_mean: 2.0,
            energy_std: 2.0,
            environment_energy: Bounds::new(0.0, 1.0),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Uniform view bounds.
    pub views: ViewBounds,
    /// Camera model shared with the renderer.
    pub camera: CameraSettings,
    /// Light rig bounds.
    pub lighting: LightingConfig,
    /// Worker threads for batch processing (0 = one per core).
    pub threads: usize,
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let config: Config = serde_json::from_reader(reader).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every camera setting, range and energy parameter.
    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;

        let views = &self.views;
        views.azimuth.validate("views.azimuth")?;
        views.elevation.validate("views.elevation")?;
        views.tilt.validate("views.tilt")?;
        views.distance.validate("views.distance")?;
        if !(views.min_distance.is_finite() && views.min_distance > 0.0) {
            return Err(Error::invalid_param(
                "views.min_distance",
                views.min_distance,
                "must be positive",
            ));
        }

        let lighting = &self.lighting;
        lighting.distance.validate("lighting.distance")?;
        lighting.azimuth.validate("lighting.azimuth")?;
        lighting.elevation.validate("lighting.elevation")?;
        lighting.environment_energy.validate("lighting.environment_energy")?;
        if !lighting.energy_mean.is_finite() {
            return Err(Error::invalid_param(
                "lighting.energy_mean",
                lighting.energy_mean,
                "must be finite",
            ));
        }
        if !(lighting.energy_std.is_finite() && lighting.energy_std >= 0.0) {
            return Err(Error::invalid_param(
                "lighting.energy_std",
                lighting.energy_std,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Replace the view bounds.
    pub fn with_views(mut self, views: ViewBounds) -> Self {
        self.views = views;
        self
    }

    /// Replace the camera settings.
    pub fn with_camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    /// Replace the lighting bounds.
    pub fn with_lighting(mut self, lighting: LightingConfig) -> Self {
        self.lighting = lighting;
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}
