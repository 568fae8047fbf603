//! # Vantage
//!
//! Viewpoint sampling and keypoint visibility labels for synthetic renderings
//! of 3D meshes.
//!
//! For every sampled viewpoint, Vantage solves the camera pose, hands it to an
//! external renderer and records which designated mesh keypoints are visible
//! and where they land in the image.
//!
//! ## Features
//!
//! - **Canonical vertex ids**: stable across re-exports and vertex reordering
//! - **Exact occlusion**: segment-versus-triangle tests against every face
//! - **Multiple file formats**: OBJ, STL, PLY, glTF
//! - **Parallel batches**: bounded worker pool, per-view failure isolation
//!
//! ## Quick Start
//!
//! ```no_run
//! use vantage::prelude::*;
//!
//! let mesh = vantage::io::load_mesh("model.obj", 1.0).unwrap();
//! let keypoints = vantage::io::read_keypoints("model_keypoints.txt").unwrap();
//!
//! let settings = CameraSettings::default();
//! let pose = camera::pose(&Viewpoint::new(45.0, 20.0, 0.0, 2.0)).unwrap();
//! let records = visibility::project(&mesh, &settings, &pose, &keypoints).unwrap();
//!
//! vantage::io::write_labels("labels/view_0.txt", &records).unwrap();
//! ```
//!
//! ## Batches
//!
//! ```no_run
//! use vantage::pipeline::Batch;
//! use vantage::prelude::*;
//!
//! let mesh = vantage::io::load_mesh("model.obj", 1.0).unwrap();
//! let keypoints = vantage::io::read_keypoints("model_keypoints.txt").unwrap();
//! let views = vantage::io::read_view_file("views.txt").unwrap();
//!
//! let report = Batch::new(Config::default(), "out")
//!     .with_prefix("model")
//!     .run(&mesh, &keypoints, &views, None)
//!     .unwrap();
//! println!("{} labels written", report.written.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod camera;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod view;
pub mod visibility;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use vantage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::{self, Camera, CameraPose};
    pub use crate::config::{CameraSettings, Config, ImageOrigin, ViewBounds};
    pub use crate::error::{Error, Result};
    pub use crate::mesh::{KeypointSet, MeshIndex, MeshPart, Vertex, VertexId};
    pub use crate::view::{ViewSampler, ViewSpec, Viewpoint};
    pub use crate::visibility::{self, Visibility, VisibilityProjector, VisibilityRecord};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_unit_cube_seen_from_above() {
        // unit cube, corners named by bit pattern (x, y, z)
        let vertices: Vec<Point3<f64>> = (0..8)
            .map(|i| Point3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64))
            .collect();
        let faces = vec![
            [0, 2, 1], [1, 2, 3], // bottom
            [4, 5, 7], [4, 7, 6], // top
            [0, 1, 5], [0, 5, 4], // front
            [2, 6, 7], [2, 7, 3], // back
            [0, 4, 6], [0, 6, 2], // left
            [1, 3, 7], [1, 7, 5], // right
        ];
        let mesh = MeshIndex::from_triangles(&vertices, &faces).unwrap();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_faces(), 12);

        let keypoints: KeypointSet = mesh.vertices().iter().map(|v| v.id).collect();
        let pose = camera::pose(&Viewpoint::new(0.0, 90.0, 0.0, 20.0)).unwrap();
        let records = visibility::project(&mesh, &CameraSettings::default(), &pose, &keypoints).unwrap();

        let visible: Vec<_> = records.iter().filter(|r| r.is_visible()).collect();
        assert_eq!(visible.len(), 4);
        for record in &records {
            let top = mesh.position(record.keypoint).z == 1.0;
            assert_eq!(record.is_visible(), top, "corner {:?}", record.keypoint);
            if !top {
                assert_eq!(record.pixel_or_sentinel(), (-1, -1));
            }
        }
    }
}
