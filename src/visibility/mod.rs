//! Keypoint visibility and projection.
//!
//! For one camera pose, every keypoint is either reported at a rounded pixel
//! position or as hidden. A keypoint is visible when it projects inside the
//! frame and the segment from it to the eye crosses no other triangle.
//!
//! ```
//! use vantage::prelude::*;
//! use vantage::visibility::VisibilityProjector;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(-0.5, -0.5, 0.0),
//!     Point3::new(0.5, -0.5, 0.0),
//!     Point3::new(0.0, 0.5, 0.0),
//! ];
//! let mesh = MeshIndex::from_triangles(&positions, &[[0, 1, 2]]).unwrap();
//! let keypoints = KeypointSet::from_indices(0..3).unwrap();
//!
//! let settings = CameraSettings::default().with_resolution(640, 480);
//! let projector = VisibilityProjector::new(&mesh, &settings);
//! let pose = camera::pose(&Viewpoint::new(0.0, 90.0, 0.0, 5.0)).unwrap();
//!
//! let records = projector.project(&pose, &keypoints).unwrap();
//! assert!(records.iter().all(|r| r.is_visible()));
//! ```

pub mod occlusion;

use nalgebra::Point2;
use rayon::prelude::*;

use crate::camera::{Camera, CameraPose};
use crate::config::CameraSettings;
use crate::error::{Error, Result};
use crate::mesh::{KeypointSet, MeshIndex, VertexId};

pub use occlusion::{is_occluded, Triangle, SEGMENT_EPSILON};

/// Outcome for one keypoint in one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Unoccluded and inside the frame, at this rounded pixel.
    Visible {
        /// Column.
        x: i64,
        /// Row, counted from the configured image origin.
        y: i64,
    },
    /// Another triangle lies between the keypoint and the eye.
    Occluded,
    /// Outside the frame, or on or behind the camera plane.
    OutOfFrame,
}

/// Visibility of one keypoint in one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityRecord {
    /// Canonical vertex id of the keypoint.
    pub keypoint: VertexId,
    /// What the projector found.
    pub visibility: Visibility,
}

impl VisibilityRecord {
    /// A visible keypoint at pixel `(x, y)`.
    pub fn visible(keypoint: VertexId, x: i64, y: i64) -> Self {
        Self {
            keypoint,
            visibility: Visibility::Visible { x, y },
        }
    }

    /// An occluded keypoint.
    pub fn hidden(keypoint: VertexId) -> Self {
        Self {
            keypoint,
            visibility: Visibility::Occluded,
        }
    }

    /// A keypoint that does not land in the frame.
    pub fn out_of_frame(keypoint: VertexId) -> Self {
        Self {
            keypoint,
            visibility: Visibility::OutOfFrame,
        }
    }

    /// Whether the keypoint has a pixel position.
    #[inline]
    pub fn is_visible(&self) -> bool {
        matches!(self.visibility, Visibility::Visible { .. })
    }

    /// Pixel position if visible.
    pub fn pixel(&self) -> Option<(i64, i64)> {
        match self.visibility {
            Visibility::Visible { x, y } => Some((x, y)),
            _ => None,
        }
    }

    /// Pixel position, or `(-1, -1)` when not visible.
    pub fn pixel_or_sentinel(&self) -> (i64, i64) {
        self.pixel().unwrap_or((-1, -1))
    }
}

/// Options for [`VisibilityProjector`].
#[derive(Debug, Clone)]
pub struct VisibilityOptions {
    /// Parametric margin at both ends of the keypoint-to-eye segment.
    pub epsilon: f64,

    /// Whether to test keypoints in parallel (default: true).
    pub parallel: bool,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            epsilon: SEGMENT_EPSILON,
            parallel: true,
        }
    }
}

impl VisibilityOptions {
    /// Set the segment margin.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Projects keypoints of one mesh for any number of camera poses.
///
/// Holds precomputed triangles, so build one per mesh and share it across
/// views; it is `Sync`.
#[derive(Debug, Clone)]
pub struct VisibilityProjector<'a> {
    mesh: &'a MeshIndex,
    triangles: Vec<Triangle>,
    settings: CameraSettings,
    options: VisibilityOptions,
}

impl<'a> VisibilityProjector<'a> {
    /// Create a projector with default options.
    pub fn new(mesh: &'a MeshIndex, settings: &CameraSettings) -> Self {
        Self {
            mesh,
            triangles: occlusion::triangles(mesh),
            settings: settings.clone(),
            options: VisibilityOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: VisibilityOptions) -> Self {
        self.options = options;
        self
    }

    /// The mesh being projected.
    pub fn mesh(&self) -> &MeshIndex {
        self.mesh
    }

    /// Camera settings used for projection.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Sub-pixel position of every vertex, in canonical id order.
    ///
    /// `None` for vertices on or behind the camera plane.
    pub fn project_vertices(&self, pose: &CameraPose) -> Vec<Option<Point2<f64>>> {
        let camera = Camera::new(*pose, &self.settings);
        self.mesh
            .vertices()
            .iter()
            .map(|v| camera.project(&v.position))
            .collect()
    }

    /// One record per keypoint, in ascending id order.
    ///
    /// The frame test runs first; only keypoints that land in the frame are
    /// tested for occlusion. Fails with [`Error::UnknownKeypoint`] for an id
    /// outside the mesh and [`Error::DegenerateGeometry`] when a keypoint
    /// coincides with the eye.
    pub fn project(&self, pose: &CameraPose, keypoints: &KeypointSet) -> Result<Vec<VisibilityRecord>> {
        if self.triangles.is_empty() {
            return Err(Error::EmptyMesh);
        }
        if let Some(id) = keypoints.iter().find(|&id| !self.mesh.contains(id)) {
            return Err(Error::UnknownKeypoint { id: id.index() });
        }

        let camera = Camera::new(*pose, &self.settings);
        let ids: Vec<VertexId> = keypoints.iter().collect();

        if self.options.parallel {
            ids.par_iter().map(|&id| self.classify(&camera, id)).collect()
        } else {
            ids.iter().map(|&id| self.classify(&camera, id)).collect()
        }
    }

    fn classify(&self, camera: &Camera, id: VertexId) -> Result<VisibilityRecord> {
        let position = self.mesh.position(id);
        let eye = camera.eye();
        if (eye - position).norm_squared() == 0.0 {
            return Err(Error::DegenerateGeometry(format!(
                "keypoint {} coincides with the camera eye",
                id
            )));
        }

        let Some((x, y)) = camera.pixel(position) else {
            return Ok(VisibilityRecord::out_of_frame(id));
        };

        if is_occluded(&self.triangles, id, position, eye, self.options.epsilon) {
            Ok(VisibilityRecord::hidden(id))
        } else {
            Ok(VisibilityRecord::visible(id, x, y))
        }
    }
}

/// Project keypoints for a single pose.
///
/// Convenience wrapper that builds a [`VisibilityProjector`] for one call.
pub fn project(
    mesh: &MeshIndex,
    settings: &CameraSettings,
    pose: &CameraPose,
    keypoints: &KeypointSet,
) -> Result<Vec<VisibilityRecord>> {
    VisibilityProjector::new(mesh, settings).project(pose, keypoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera;
    use crate::view::Viewpoint;
    use nalgebra::Point3;

    fn cube() -> MeshIndex {
        let positions: Vec<Point3<f64>> = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { -0.5 } else { 0.5 },
                    if i & 2 == 0 { -0.5 } else { 0.5 },
                    if i & 4 == 0 { -0.5 } else { 0.5 },
                )
            })
            .collect();
        let triangles = vec![
            [0, 2, 1], [1, 2, 3], // z-
            [4, 5, 6], [5, 7, 6], // z+
            [0, 1, 4], [1, 5, 4], // y-
            [2, 6, 3], [3, 6, 7], // y+
            [0, 4, 2], [2, 4, 6], // x-
            [1, 3, 5], [3, 7, 5], // x+
        ];
        MeshIndex::from_triangles(&positions, &triangles).unwrap()
    }

    fn all_vertices(mesh: &MeshIndex) -> KeypointSet {
        mesh.vertices().iter().map(|v| v.id).collect()
    }

    #[test]
    fn test_cube_from_above() {
        let mesh = cube();
        let settings = CameraSettings::default().with_resolution(640, 480);
        let pose = camera::pose(&Viewpoint::new(0.0, 90.0, 0.0, 10.0)).unwrap();

        for parallel in [true, false] {
            let projector = VisibilityProjector::new(&mesh, &settings)
                .with_options(VisibilityOptions::default().with_parallel(parallel));
            let records = projector.project(&pose, &all_vertices(&mesh)).unwrap();
            assert_eq!(records.len(), 8);

            for record in &records {
                let z = mesh.position(record.keypoint).z;
                if z > 0.0 {
                    let (x, y) = record.pixel().expect("top corner should be visible");
                    assert!((0..640).contains(&x) && (0..480).contains(&y));
                } else {
                    assert_eq!(record.visibility, Visibility::Occluded);
                    assert_eq!(record.pixel_or_sentinel(), (-1, -1));
                }
            }
        }
    }

    #[test]
    fn test_records_follow_keypoint_order() {
        let mesh = cube();
        let keypoints = KeypointSet::from_indices([6, 1, 3]).unwrap();
        let pose = camera::pose(&Viewpoint::new(30.0, 20.0, 0.0, 4.0)).unwrap();
        let records = project(&mesh, &CameraSettings::default(), &pose, &keypoints).unwrap();
        let ids: Vec<usize> = records.iter().map(|r| r.keypoint.index()).collect();
        assert_eq!(ids, vec![1, 3, 6]);
    }

    #[test]
    fn test_isolated_triangle_is_visible() {
        let positions = vec![
            Point3::new(-0.2, -0.2, 0.0),
            Point3::new(0.2, -0.2, 0.0),
            Point3::new(0.0, 0.2, 0.0),
        ];
        let mesh = MeshIndex::from_triangles(&positions, &[[0, 1, 2]]).unwrap();
        let pose = camera::pose(&Viewpoint::new(45.0, 30.0, 10.0, 3.0)).unwrap();
        let records = project(&mesh, &CameraSettings::default(), &pose, &all_vertices(&mesh)).unwrap();
        assert!(records.iter().all(|r| r.is_visible()));
    }

    #[test]
    fn test_occluder_hides_keypoint() {
        // a lone point-like sliver at the origin behind a large triangle facing +Z
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.01, 0.0, 0.0),
            Point3::new(0.0, 0.01, 0.0),
            Point3::new(-2.0, -2.0, 1.0),
            Point3::new(2.0, -2.0, 1.0),
            Point3::new(0.0, 2.0, 1.0),
        ];
        let mesh = MeshIndex::from_triangles(&positions, &[[0, 1, 2], [3, 4, 5]]).unwrap();
        let origin_id = mesh
            .vertices()
            .iter()
            .find(|v| v.position == Point3::origin())
            .unwrap()
            .id;

        let keypoints: KeypointSet = [origin_id].into_iter().collect();
        let pose = camera::pose(&Viewpoint::new(0.0, 90.0, 0.0, 5.0)).unwrap();
        let records = project(&mesh, &CameraSettings::default(), &pose, &keypoints).unwrap();
        assert_eq!(records[0].visibility, Visibility::Occluded);

        // seen from below, nothing is in the way
        let pose = camera::pose(&Viewpoint::new(0.0, -90.0, 0.0, 5.0)).unwrap();
        let records = project(&mesh, &CameraSettings::default(), &pose, &keypoints).unwrap();
        assert!(records[0].is_visible());
    }

    #[test]
    fn test_out_of_frame_is_sentinel() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.1, 0.0, 0.0),
            Point3::new(0.0, 0.1, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        let mesh = MeshIndex::from_triangles(&positions, &[[0, 1, 2], [0, 1, 3]]).unwrap();
        let settings = CameraSettings::default().with_resolution(200, 200).with_fov_degrees(30.0);
        let pose = camera::pose(&Viewpoint::new(0.0, 90.0, 0.0, 2.0)).unwrap();

        let records = project(&mesh, &settings, &pose, &all_vertices(&mesh)).unwrap();
        let far = records
            .iter()
            .find(|r| mesh.position(r.keypoint).y == 3.0)
            .unwrap();
        assert_eq!(far.visibility, Visibility::OutOfFrame);
        assert_eq!(far.pixel_or_sentinel(), (-1, -1));
        assert_eq!(records.iter().filter(|r| r.is_visible()).count(), 3);
    }

    #[test]
    fn test_tilt_keeps_visibility_and_rotates_pixels() {
        let mesh = cube();
        let settings = CameraSettings::default().with_resolution(1000, 1000);
        let keypoints = all_vertices(&mesh);
        let projector = VisibilityProjector::new(&mesh, &settings);

        let base = camera::pose(&Viewpoint::new(35.0, 25.0, 0.0, 6.0)).unwrap();
        let tilted = camera::pose(&Viewpoint::new(35.0, 25.0, 20.0, 6.0)).unwrap();

        let a = projector.project(&base, &keypoints).unwrap();
        let b = projector.project(&tilted, &keypoints).unwrap();
        let visible_a: Vec<bool> = a.iter().map(|r| r.is_visible()).collect();
        let visible_b: Vec<bool> = b.iter().map(|r| r.is_visible()).collect();
        assert_eq!(visible_a, visible_b);

        let center = Point2::new(500.0, 500.0);
        let pa = projector.project_vertices(&base);
        let pb = projector.project_vertices(&tilted);
        for (p, q) in pa.iter().zip(&pb) {
            let (p, q) = (p.unwrap() - center, q.unwrap() - center);
            assert!((p.norm() - q.norm()).abs() < 1e-6);
            let turn = (q.y.atan2(q.x) - p.y.atan2(p.x)).rem_euclid(std::f64::consts::TAU);
            assert!((turn - 20.0_f64.to_radians()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unknown_keypoint() {
        let mesh = cube();
        let keypoints = KeypointSet::from_indices([2, 8]).unwrap();
        let pose = camera::pose(&Viewpoint::new(0.0, 0.0, 0.0, 3.0)).unwrap();
        let err = project(&mesh, &CameraSettings::default(), &pose, &keypoints).unwrap_err();
        assert!(matches!(err, Error::UnknownKeypoint { id: 8 }));
    }

    #[test]
    fn test_keypoint_at_eye_is_degenerate() {
        let positions = vec![
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let mesh = MeshIndex::from_triangles(&positions, &[[0, 1, 2]]).unwrap();
        let at_eye = mesh
            .vertices()
            .iter()
            .find(|v| v.position.x == 2.0)
            .unwrap()
            .id;
        let keypoints: KeypointSet = [at_eye].into_iter().collect();
        let pose = camera::pose(&Viewpoint::new(0.0, 0.0, 0.0, 2.0)).unwrap();
        let err = project(&mesh, &CameraSettings::default(), &pose, &keypoints).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry(_)));
    }
}
