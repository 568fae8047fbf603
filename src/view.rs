//! Viewpoints and viewpoint sampling.
//!
//! A [`Viewpoint`] places a camera on a sphere around the object origin. A
//! [`ViewSampler`] draws viewpoints either from an empirical distribution (rows
//! of previously observed viewpoints) or from independent uniform bounds.
//!
//! Sampling is not seeded by the library; pass a seeded RNG when a test needs
//! a reproducible sequence.
//!
//! ```
//! use vantage::config::ViewBounds;
//! use vantage::view::ViewSampler;
//!
//! let sampler = ViewSampler::new(Vec::new(), ViewBounds::default());
//! let views = sampler.sample(10, &mut rand::thread_rng());
//! assert_eq!(views.len(), 10);
//! ```

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ViewBounds;
use crate::error::Result;
use crate::io::views::read_distribution;

/// Spherical camera placement around the object origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    /// Azimuth in degrees, measured in the horizontal plane.
    pub azimuth: f64,
    /// Elevation in degrees above the horizontal plane.
    pub elevation: f64,
    /// In-plane rotation about the viewing axis, in degrees.
    pub tilt: f64,
    /// Distance from the origin.
    pub distance: f64,
}

impl Viewpoint {
    /// Create a viewpoint.
    pub const fn new(azimuth: f64, elevation: f64, tilt: f64, distance: f64) -> Self {
        Self {
            azimuth,
            elevation,
            tilt,
            distance,
        }
    }

    /// Raise the distance to at least `floor`.
    pub fn with_min_distance(mut self, floor: f64) -> Self {
        self.distance = self.distance.max(floor);
        self
    }
}

/// One view to process: a viewpoint plus optional explicit output paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    /// Camera placement.
    pub viewpoint: Viewpoint,
    /// Rendered image path, overriding the batch naming convention.
    pub image: Option<PathBuf>,
    /// Label file path, overriding the batch naming convention.
    pub label: Option<PathBuf>,
}

impl ViewSpec {
    /// A view without explicit outputs.
    pub fn new(viewpoint: Viewpoint) -> Self {
        Self {
            viewpoint,
            image: None,
            label: None,
        }
    }

    /// A view with explicit image and label paths.
    pub fn with_outputs<P: Into<PathBuf>, Q: Into<PathBuf>>(
        viewpoint: Viewpoint,
        image: P,
        label: Q,
    ) -> Self {
        Self {
            viewpoint,
            image: Some(image.into()),
            label: Some(label.into()),
        }
    }

    /// Batch file stem `<prefix>_aAAA_eEEE_tTTT_dDDD`.
    ///
    /// Angles and distance are rounded; the tilt is written negated, the
    /// same sign the camera roll uses.
    pub fn output_stem(&self, prefix: &str) -> String {
        let v = &self.viewpoint;
        format!(
            "{}_a{:03}_e{:03}_t{:03}_d{:03}",
            prefix,
            v.azimuth.round() as i64,
            v.elevation.round() as i64,
            (-v.tilt).round() as i64,
            v.distance.round() as i64
        )
    }

    /// Image path: the explicit one, or `<dir>/<stem>.png`.
    pub fn image_path(&self, dir: &Path, prefix: &str) -> PathBuf {
        self.image
            .clone()
            .unwrap_or_else(|| dir.join(format!("{}.png", self.output_stem(prefix))))
    }

    /// Label path: the explicit one, or `<dir>/<stem>.txt`.
    pub fn label_path(&self, dir: &Path, prefix: &str) -> PathBuf {
        self.label
            .clone()
            .unwrap_or_else(|| dir.join(format!("{}.txt", self.output_stem(prefix))))
    }

    /// Sweep file stem `<prefix>_aAAA_eEEE_tTTT_dDDDD`, distance in thousandths.
    ///
    /// Sweep distances are fractional (1, 1.25, 1.5, ...), so whole-unit
    /// rounding would merge neighbouring rings.
    pub fn sweep_stem(&self, prefix: &str) -> String {
        let v = &self.viewpoint;
        format!(
            "{}_a{:03}_e{:03}_t{:03}_d{:04}",
            prefix,
            v.azimuth.round() as i64,
            v.elevation.round() as i64,
            (-v.tilt).round() as i64,
            (1000.0 * v.distance).round() as i64
        )
    }

    /// A sweep view writing `<dir>/images/<stem>.png` and
    /// `<dir>/labels/<stem>.txt`, named by [`ViewSpec::sweep_stem`].
    pub fn sweep_outputs(viewpoint: Viewpoint, dir: &Path, prefix: &str) -> Self {
        let stem = Self::new(viewpoint).sweep_stem(prefix);
        Self::with_outputs(
            viewpoint,
            dir.join("images").join(format!("{}.png", stem)),
            dir.join("labels").join(format!("{}.txt", stem)),
        )
    }
}

/// Source of sampled viewpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewDistribution {
    /// Draw whole rows from previously observed viewpoints.
    Empirical(Vec<Viewpoint>),
    /// Draw each field independently from uniform bounds.
    Uniform(ViewBounds),
}

/// Draws viewpoints from a [`ViewDistribution`].
#[derive(Debug, Clone)]
pub struct ViewSampler {
    distribution: ViewDistribution,
    min_distance: f64,
}

impl ViewSampler {
    /// Sample from `rows` when there are any, otherwise from `bounds`.
    pub fn new(rows: Vec<Viewpoint>, bounds: ViewBounds) -> Self {
        let min_distance = bounds.min_distance;
        let distribution = if rows.is_empty() {
            ViewDistribution::Uniform(bounds)
        } else {
            ViewDistribution::Empirical(rows)
        };
        Self {
            distribution,
            min_distance,
        }
    }

    /// The distribution in use.
    pub fn distribution(&self) -> &ViewDistribution {
        &self.distribution
    }

    /// Draw a single viewpoint. The distance is floored at the configured minimum.
    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Viewpoint {
        let view = match &self.distribution {
            ViewDistribution::Empirical(rows) => match rows.choose(rng) {
                Some(row) => *row,
                None => Viewpoint::new(0.0, 0.0, 0.0, self.min_distance),
            },
            ViewDistribution::Uniform(bounds) => Viewpoint::new(
                bounds.azimuth.sample(rng),
                bounds.elevation.sample(rng),
                bounds.tilt.sample(rng),
                bounds.distance.sample(rng),
            ),
        };
        view.with_min_distance(self.min_distance)
    }

    /// Draw `n` viewpoints.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Viewpoint> {
        (0..n).map(|_| self.sample_one(rng)).collect()
    }
}

/// Views spread over the upper hemisphere at each listed distance.
///
/// For every distance, `per_distance` views are drawn with azimuth
/// `360 * acos(2v - 1) / pi`, elevation `floor(90 u)` and zero tilt, `u` and `v`
/// uniform in `[0, 1)`.
pub fn sweep<R: Rng + ?Sized>(distances: &[f64], per_distance: usize, rng: &mut R) -> Vec<Viewpoint> {
    let mut views = Vec::with_capacity(distances.len() * per_distance);
    for &d in distances {
        for _ in 0..per_distance {
            let u: f64 = rng.gen();
            let v: f64 = rng.gen();
            let elevation = (90.0 * u).floor();
            let azimuth = 360.0 * (2.0 * v - 1.0).acos() / std::f64::consts::PI;
            views.push(Viewpoint::new(azimuth, elevation, 0.0, d));
        }
    }
    views
}

/// Per-category empirical distribution files, `<dir>/<category>.txt`.
#[derive(Debug, Clone)]
pub struct CategoryDistributions {
    dir: PathBuf,
    proxy: Option<String>,
}

impl CategoryDistributions {
    /// Look up distribution files in `dir`.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            proxy: None,
        }
    }

    /// Use `category`'s file when a requested category has none.
    pub fn with_proxy<S: Into<String>>(mut self, category: S) -> Self {
        self.proxy = Some(category.into());
        self
    }

    /// Path of a category's distribution file.
    pub fn path_for(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", category))
    }

    /// Rows for `category`, falling back to the proxy category.
    ///
    /// A missing file is not an error: it is logged and an empty row list is
    /// returned, which makes [`ViewSampler::new`] use uniform bounds. A file
    /// that exists but fails to parse is an error.
    pub fn resolve(&self, category: &str) -> Result<Vec<Viewpoint>> {
        let path = self.path_for(category);
        if path.is_file() {
            return read_distribution(&path);
        }

        match &self.proxy {
            Some(proxy) if self.path_for(proxy).is_file() => {
                log::warn!(
                    "no view distribution at {} for '{}', using proxy category '{}'",
                    path.display(),
                    category,
                    proxy
                );
                read_distribution(self.path_for(proxy))
            }
            _ => {
                log::warn!(
                    "no view distribution at {} for '{}', using uniform bounds",
                    path.display(),
                    category
                );
                Ok(Vec::new())
            }
        }
    }
}
