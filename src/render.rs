//! Boundary to the external renderer.
//!
//! Rendering itself happens out of process. A [`RenderJob`] carries everything
//! the renderer needs for one image: the mesh, the solved camera pose, the
//! camera intrinsics and a randomised [`LightRig`]. Implementations of
//! [`Renderer`] turn a job into an image file at `job.output`.

use std::path::{Path, PathBuf};
use std::process::Command;

use nalgebra::Point3;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::camera::{object_centered_position, CameraPose};
use crate::config::{CameraSettings, LightingConfig};
use crate::error::{Error, Result};

/// A point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World-space position.
    pub position: Point3<f64>,
    /// Emitted energy.
    pub energy: f64,
}

/// Environment light plus a set of point lights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightRig {
    /// Uniform environment light energy.
    pub environment_energy: f64,
    /// Point lights.
    pub lights: Vec<PointLight>,
}

impl LightRig {
    /// Draw a rig from the lighting bounds.
    ///
    /// The light count is uniform over `min_lights..=max_lights`. Lights are
    /// placed on spheres around the origin like cameras are, and their energy
    /// is normally distributed.
    pub fn sample<R: Rng + ?Sized>(config: &LightingConfig, rng: &mut R) -> Self {
        let count = if config.max_lights > config.min_lights {
            rng.gen_range(config.min_lights..=config.max_lights)
        } else {
            config.min_lights
        };

        let lights = (0..count)
            .map(|_| {
                let azimuth = config.azimuth.sample(rng);
                let elevation = config.elevation.sample(rng);
                let distance = config.distance.sample(rng);
                let z: f64 = rng.sample(StandardNormal);
                PointLight {
                    position: object_centered_position(distance, azimuth, elevation),
                    energy: config.energy_mean + config.energy_std * z,
                }
            })
            .collect();

        Self {
            environment_energy: config.environment_energy.sample(rng),
            lights,
        }
    }
}

/// Everything needed to render one view.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Index of the view in its batch.
    pub view: usize,
    /// Mesh file to render.
    pub mesh: PathBuf,
    /// Uniform scale applied to the mesh on import.
    pub scale: f64,
    /// Solved camera pose.
    pub pose: CameraPose,
    /// Intrinsics, shared with the label projection.
    pub camera: CameraSettings,
    /// Lights for this view.
    pub lights: LightRig,
    /// Where the image must be written.
    pub output: PathBuf,
}

impl RenderJob {
    /// Encode the job as command-line arguments.
    ///
    /// ```text
    /// --mesh PATH --scale S --output PATH
    /// --position X Y Z --orientation W I J K
    /// --resolution W H --fov DEG --environment E
    /// [--light X Y Z ENERGY]...
    /// ```
    pub fn to_args(&self) -> Vec<String> {
        let p = &self.pose.position;
        let q = self.pose.orientation.quaternion();
        let mut args = vec![
            "--mesh".to_string(),
            self.mesh.display().to_string(),
            "--scale".to_string(),
            self.scale.to_string(),
            "--output".to_string(),
            self.output.display().to_string(),
            "--position".to_string(),
            p.x.to_string(),
            p.y.to_string(),
            p.z.to_string(),
            "--orientation".to_string(),
            q.w.to_string(),
            q.i.to_string(),
            q.j.to_string(),
            q.k.to_string(),
            "--resolution".to_string(),
            self.camera.width.to_string(),
            self.camera.height.to_string(),
            "--fov".to_string(),
            self.camera.fov_degrees.to_string(),
            "--environment".to_string(),
            self.lights.environment_energy.to_string(),
        ];
        for light in &self.lights.lights {
            args.push("--light".to_string());
            args.extend([
                light.position.x.to_string(),
                light.position.y.to_string(),
                light.position.z.to_string(),
                light.energy.to_string(),
            ]);
        }
        args
    }
}

/// Produces one image per job.
pub trait Renderer: Send + Sync {
    /// Render `job`, writing the image to `job.output`.
    fn render(&self, job: &RenderJob) -> Result<()>;
}

/// Runs an external program once per view.
///
/// The program receives its configured leading arguments followed by
/// [`RenderJob::to_args`]. A spawn failure, a non-zero exit status or a
/// missing output file is reported as [`Error::RenderFailed`].
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Create a renderer for `program`.
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the job arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program being run.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, job: &RenderJob) -> Result<()> {
        let failed = |message: String| Error::RenderFailed {
            view: job.view,
            message,
        };

        if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        log::debug!("rendering view {} with {}", job.view, self.program.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(job.to_args())
            .output()
            .map_err(|e| failed(format!("could not run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("{} ({})", output.status, stderr.trim())));
        }
        if !job.output.is_file() {
            return Err(failed(format!("no image written to {}", job.output.display())));
        }
        Ok(())
    }
}
