//! Vantage CLI - viewpoint sampling and keypoint label generation.
//!
//! Usage: vantage <COMMAND> [OPTIONS]
//!
//! Run `vantage --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use vantage::camera::{self, Camera};
use vantage::config::{Config, ImageOrigin};
use vantage::io;
use vantage::pipeline::{Batch, RenderSource};
use vantage::progress::Progress;
use vantage::render::CommandRenderer;
use vantage::view::{self, CategoryDistributions, ViewSampler, ViewSpec, Viewpoint};
use vantage::visibility::{Visibility, VisibilityProjector};

#[derive(Parser)]
#[command(name = "vantage")]
#[command(author, version, about = "Viewpoint sampling and keypoint labels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Uniform scale applied on import
        #[arg(long, default_value = "1.0")]
        scale: f64,
    },

    /// Sample viewpoints into a view parameter file
    Sample {
        /// Number of views
        #[arg(short = 'n', long)]
        count: usize,

        /// Output view parameter file
        #[arg(short, long)]
        output: PathBuf,

        /// Empirical distribution file
        #[arg(long, conflicts_with = "category")]
        distribution: Option<PathBuf>,

        /// Category whose distribution is looked up in --distribution-dir
        #[arg(long, requires = "distribution_dir")]
        category: Option<String>,

        /// Directory of per-category distribution files
        #[arg(long)]
        distribution_dir: Option<PathBuf>,

        /// Category to use when the requested one has no distribution file
        #[arg(long)]
        proxy: Option<String>,

        /// JSON configuration (uniform bounds)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Sample views over the upper hemisphere at fixed distances
    Sweep {
        /// Camera distances
        #[arg(long, value_delimiter = ',', required = true)]
        distances: Vec<f64>,

        /// Views per distance
        #[arg(short = 'n', long)]
        count: usize,

        /// Directory for images and labels
        #[arg(long)]
        output_dir: PathBuf,

        /// File name prefix for images and labels
        #[arg(long, default_value = "syn")]
        prefix: String,

        /// Output view parameter file
        #[arg(short, long)]
        output: PathBuf,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the label file for a single view, without rendering
    Label {
        /// Input mesh file
        mesh: PathBuf,

        /// Keypoint file
        keypoints: PathBuf,

        /// Azimuth in degrees
        #[arg(short, long, allow_negative_numbers = true)]
        azimuth: f64,

        /// Elevation in degrees
        #[arg(short, long, allow_negative_numbers = true)]
        elevation: f64,

        /// Tilt in degrees
        #[arg(short, long, default_value = "0.0", allow_negative_numbers = true)]
        tilt: f64,

        /// Camera distance
        #[arg(short, long)]
        distance: f64,

        /// Output label file
        #[arg(short, long)]
        label: PathBuf,

        /// Uniform scale applied on import
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// JSON configuration (camera settings)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pixel row origin
        #[arg(long, value_enum)]
        origin: Option<Origin>,

        /// Print one line per keypoint
        #[arg(short, long)]
        verbose: bool,
    },

    /// Render views and write their label files
    Batch {
        /// Input mesh file
        mesh: PathBuf,

        /// Keypoint file
        keypoints: PathBuf,

        /// View parameter file
        views: PathBuf,

        /// Directory for views without explicit outputs
        #[arg(long)]
        output_dir: PathBuf,

        /// File name prefix for views without explicit outputs
        #[arg(long, default_value = "view")]
        prefix: String,

        /// Renderer program; labels only when omitted
        #[arg(long)]
        renderer: Option<PathBuf>,

        /// Argument passed to the renderer before the job (repeatable)
        #[arg(long = "renderer-arg", allow_hyphen_values = true)]
        renderer_args: Vec<String>,

        /// Uniform scale applied on import
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// JSON configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Worker threads (default: from config, else one per core)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Seed for light sampling
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Origin {
    /// Rows grow upwards from the bottom edge
    BottomLeft,
    /// Rows grow downwards from the top edge
    TopLeft,
}

impl From<Origin> for ImageOrigin {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::BottomLeft => ImageOrigin::BottomLeft,
            Origin::TopLeft => ImageOrigin::TopLeft,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, scale } => {
            cmd_info(&input, scale)?;
        }

        Commands::Sample {
            count,
            output,
            distribution,
            category,
            distribution_dir,
            proxy,
            config,
            seed,
        } => {
            let rows = match (distribution, category, distribution_dir) {
                (Some(path), _, _) => io::read_distribution(&path)?,
                (None, Some(category), Some(dir)) => {
                    let mut lookup = CategoryDistributions::new(dir);
                    if let Some(proxy) = proxy {
                        lookup = lookup.with_proxy(proxy);
                    }
                    lookup.resolve(&category)?
                }
                _ => Vec::new(),
            };
            let config = load_config(config.as_deref())?;
            let sampler = ViewSampler::new(rows, config.views);

            let mut rng = make_rng(seed);
            let views: Vec<ViewSpec> = sampler
                .sample(count, &mut rng)
                .into_iter()
                .map(ViewSpec::new)
                .collect();
            io::write_view_file(&output, &views)?;
            println!("Wrote {} views to {}", views.len(), output.display());
        }

        Commands::Sweep {
            distances,
            count,
            output_dir,
            prefix,
            output,
            seed,
        } => {
            let mut rng = make_rng(seed);
            let views: Vec<ViewSpec> = view::sweep(&distances, count, &mut rng)
                .into_iter()
                .map(|v| ViewSpec::sweep_outputs(v, &output_dir, &prefix))
                .collect();
            io::write_view_file(&output, &views)?;
            println!("Wrote {} views to {}", views.len(), output.display());
        }

        Commands::Label {
            mesh,
            keypoints,
            azimuth,
            elevation,
            tilt,
            distance,
            label,
            scale,
            config,
            origin,
            verbose,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(origin) = origin {
                config.camera.origin = origin.into();
            }
            let viewpoint = Viewpoint::new(azimuth, elevation, tilt, distance);
            cmd_label(&mesh, &keypoints, viewpoint, &label, scale, &config, verbose)?;
        }

        Commands::Batch {
            mesh,
            keypoints,
            views,
            output_dir,
            prefix,
            renderer,
            renderer_args,
            scale,
            config,
            threads,
            seed,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(threads) = threads {
                config.threads = threads;
            }

            let start = Instant::now();
            let index = io::load_mesh(&mesh, scale)?;
            let keypoints = io::read_keypoints(&keypoints)?;
            let views = io::read_view_file(&views)?;

            let mut batch = Batch::new(config, &output_dir)
                .with_prefix(prefix)
                .with_progress(create_progress());
            if let Some(seed) = seed {
                batch = batch.with_seed(seed);
            }

            let command = renderer.map(|program| CommandRenderer::new(program).with_args(renderer_args));
            let source = command.as_ref().map(|renderer| RenderSource {
                renderer,
                mesh: mesh.clone(),
                scale,
            });

            let report = batch.run(&index, &keypoints, &views, source.as_ref())?;
            let elapsed = start.elapsed();

            println!(
                "Labels: {} written, {} failed ({:.2?})",
                report.written.len(),
                report.failed.len(),
                elapsed
            );
            for (view, error) in &report.failed {
                println!("  view {}: {}", view, error);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> vantage::error::Result<Config> {
    match path {
        Some(path) => Config::from_json_file(path),
        None => Ok(Config::default()),
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Create a progress reporter that displays a progress bar.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // views finish out of order; never move backwards
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }
        let percent = raw_percent.max(previous);

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path, scale: f64) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load_mesh(input, scale)?;

    println!("File: {}", input.display());
    println!("Parts: {}", mesh.part_names().len());
    for name in mesh.part_names() {
        println!("  {}", name);
    }
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    Ok(())
}

fn cmd_label(
    mesh_path: &Path,
    keypoints_path: &Path,
    viewpoint: Viewpoint,
    label: &Path,
    scale: f64,
    config: &Config,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load_mesh(mesh_path, scale)?;
    let keypoints = io::read_keypoints(keypoints_path)?;
    config.camera.validate()?;

    let pose = camera::pose(&viewpoint)?;
    let projector = VisibilityProjector::new(&mesh, &config.camera);
    let records = projector.project(&pose, &keypoints)?;
    io::write_labels(label, &records)?;

    let visible = records.iter().filter(|r| r.is_visible()).count();
    println!(
        "{}/{} keypoints visible -> {}",
        visible,
        records.len(),
        label.display()
    );

    if verbose {
        let camera = Camera::new(pose, &config.camera);
        for (line, record) in records.iter().enumerate() {
            let position = mesh.position(record.keypoint);
            let status = match record.visibility {
                Visibility::Visible { x, y } => format!("({}, {})", x, y),
                Visibility::Occluded => "occluded".to_string(),
                Visibility::OutOfFrame => match camera.project(position) {
                    Some(p) => format!("out of frame at ({:.1}, {:.1})", p.x, p.y),
                    None => "behind camera".to_string(),
                },
            };
            println!("  {:4} vertex {:6}: {}", line, record.keypoint.index(), status);
        }
    }

    Ok(())
}
