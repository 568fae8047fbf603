//! Batch processing of views.
//!
//! A [`Batch`] takes one indexed mesh, one keypoint set and a list of views.
//! Each view is independent: solve the pose, optionally render, project the
//! keypoints and write the label file. Views run on a bounded rayon pool that
//! also caps the number of concurrent renderer processes.
//!
//! A failing view never aborts the batch. It is logged, recorded in the
//! [`BatchReport`] and produces no label file.
//!
//! Derived file names round angles to whole degrees, so distinct views can
//! share outputs. The last view in list order that writes a path keeps it, as
//! a sequential run would; earlier ones fail with [`Error::DuplicateOutput`]
//! and are never rendered.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::camera;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::io::write_labels;
use crate::mesh::{KeypointSet, MeshIndex};
use crate::progress::Progress;
use crate::render::{LightRig, RenderJob, Renderer};
use crate::view::ViewSpec;
use crate::visibility::{VisibilityOptions, VisibilityProjector};

/// The mesh file a renderer should load, with its import scale.
#[derive(Clone)]
pub struct RenderSource<'a> {
    /// Renderer to run.
    pub renderer: &'a dyn Renderer,
    /// Mesh file handed to the renderer.
    pub mesh: PathBuf,
    /// Import scale, the same one used to build the [`MeshIndex`].
    pub scale: f64,
}

impl std::fmt::Debug for RenderSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSource")
            .field("mesh", &self.mesh)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// `(view index, label path)` of every written label file, in view order.
    pub written: Vec<(usize, PathBuf)>,
    /// `(view index, error)` of every failed view, in view order.
    pub failed: Vec<(usize, Error)>,
}

impl BatchReport {
    /// Whether every view succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of views processed.
    pub fn len(&self) -> usize {
        self.written.len() + self.failed.len()
    }

    /// Whether the batch had no views.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Processes a list of views for one mesh.
#[derive(Debug)]
pub struct Batch {
    config: Config,
    output_dir: PathBuf,
    prefix: String,
    seed: Option<u64>,
    progress: Progress,
}

impl Batch {
    /// Create a batch writing derived outputs to `output_dir`.
    pub fn new<P: Into<PathBuf>>(config: Config, output_dir: P) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            prefix: "view".to_string(),
            seed: None,
            progress: Progress::none(),
        }
    }

    /// File name prefix for views without explicit outputs.
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Seed the per-view light sampling. View `i` uses seed `seed + i`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Report progress after every view.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Batch configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory for derived outputs.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run every view.
    ///
    /// Fails up front for an invalid configuration, a keypoint that is not a
    /// vertex of `mesh`, or a worker pool that cannot start. Everything after
    /// that is per view and ends up in the report.
    pub fn run(
        &self,
        mesh: &MeshIndex,
        keypoints: &KeypointSet,
        views: &[ViewSpec],
        render: Option<&RenderSource<'_>>,
    ) -> Result<BatchReport> {
        self.config.validate()?;
        if let Some(id) = keypoints.iter().find(|&id| !mesh.contains(id)) {
            return Err(Error::UnknownKeypoint { id: id.index() });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|_| Error::invalid_param("threads", self.config.threads, "could not start worker pool"))?;

        // views already run in parallel
        let projector = VisibilityProjector::new(mesh, &self.config.camera)
            .with_options(VisibilityOptions::default().sequential());

        info!(
            "processing {} view(s), {} keypoint(s), {} thread(s)",
            views.len(),
            keypoints.len(),
            pool.current_num_threads()
        );

        let superseded = self.superseded(views, render.is_some());
        if !superseded.is_empty() {
            warn!("{} view(s) share output files with later views", superseded.len());
        }

        let done = AtomicUsize::new(0);
        let results: Vec<(usize, Result<PathBuf>)> = pool.install(|| {
            views
                .par_iter()
                .enumerate()
                .map(|(index, spec)| {
                    let result = match superseded.get(&index) {
                        Some((path, later)) => Err(Error::DuplicateOutput {
                            path: path.clone(),
                            later: *later,
                        }),
                        None => self.run_view(index, spec, &projector, keypoints, render),
                    };
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    self.progress
                        .report(finished, views.len(), &spec.output_stem(&self.prefix));
                    (index, result)
                })
                .collect()
        });

        let mut report = BatchReport::default();
        for (index, result) in results {
            match result {
                Ok(label) => report.written.push((index, label)),
                Err(e) => {
                    warn!("view {} skipped: {}", index, e);
                    report.failed.push((index, e));
                }
            }
        }

        info!(
            "wrote {} label file(s), {} view(s) failed",
            report.written.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Views whose label or image path is claimed by a later view, with the
    /// shared path and the later view's index.
    fn superseded(&self, views: &[ViewSpec], rendering: bool) -> HashMap<usize, (PathBuf, usize)> {
        let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
        let mut superseded = HashMap::new();
        for (index, spec) in views.iter().enumerate().rev() {
            let mut outputs = vec![spec.label_path(&self.output_dir, &self.prefix)];
            if rendering {
                outputs.push(spec.image_path(&self.output_dir, &self.prefix));
            }
            if let Some((path, &later)) = outputs
                .iter()
                .find_map(|p| claimed.get_key_value(p))
            {
                superseded.insert(index, (path.clone(), later));
                continue;
            }
            for path in outputs {
                claimed.insert(path, index);
            }
        }
        superseded
    }

    fn run_view(
        &self,
        index: usize,
        spec: &ViewSpec,
        projector: &VisibilityProjector<'_>,
        keypoints: &KeypointSet,
        render: Option<&RenderSource<'_>>,
    ) -> Result<PathBuf> {
        let pose = camera::pose(&spec.viewpoint)?;

        if let Some(source) = render {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                None => StdRng::from_entropy(),
            };
            let job = RenderJob {
                view: index,
                mesh: source.mesh.clone(),
                scale: source.scale,
                pose,
                camera: self.config.camera.clone(),
                lights: LightRig::sample(&self.config.lighting, &mut rng),
                output: spec.image_path(&self.output_dir, &self.prefix),
            };
            source.renderer.render(&job)?;
        }

        let records = projector.project(&pose, keypoints)?;
        let label = spec.label_path(&self.output_dir, &self.prefix);
        write_labels(&label, &records)?;
        log::debug!(
            "view {}: {}/{} keypoints visible -> {}",
            index,
            records.iter().filter(|r| r.is_visible()).count(),
            records.len(),
            label.display()
        );
        Ok(label)
    }
}
