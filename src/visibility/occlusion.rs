//! Segment-versus-triangle occlusion.
//!
//! A keypoint is occluded when the open segment from the keypoint to the eye
//! crosses any triangle that does not have the keypoint as a corner. Winding
//! and normals play no part; this is purely geometric.

use nalgebra::{Point3, Vector3};

use crate::mesh::{MeshIndex, VertexId};

/// Default parametric margin at both ends of the segment.
pub const SEGMENT_EPSILON: f64 = 1e-6;

/// Slack on barycentric bounds, so segments through a shared edge still hit.
pub const BARYCENTRIC_TOLERANCE: f64 = 1e-9;

/// Triangle stored in the form the intersection test wants.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Corner vertex ids.
    pub corners: [VertexId; 3],
    origin: Point3<f64>,
    edge1: Vector3<f64>,
    edge2: Vector3<f64>,
}

impl Triangle {
    /// Build from corner ids and positions.
    pub fn new(corners: [VertexId; 3], positions: [Point3<f64>; 3]) -> Self {
        Self {
            corners,
            origin: positions[0],
            edge1: positions[1] - positions[0],
            edge2: positions[2] - positions[0],
        }
    }

    /// Whether `v` is one of the corners.
    #[inline]
    pub fn has_corner(&self, v: VertexId) -> bool {
        self.corners.contains(&v)
    }

    /// Parametric hit of the segment `start + t * dir`, `t` in `(eps, 1 - eps)`.
    ///
    /// Moller-Trumbore with an unnormalized direction, so `t` is measured in
    /// segment lengths.
    #[inline]
    pub fn intersect_segment(&self, start: &Point3<f64>, dir: &Vector3<f64>, eps: f64) -> Option<f64> {
        let pvec = dir.cross(&self.edge2);
        let det = self.edge1.dot(&pvec);

        // parallel to the plane or degenerate triangle
        let scale = self.edge1.norm() * self.edge2.norm() * dir.norm();
        if det.abs() <= 1e-12 * scale {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = start - self.origin;
        let u = tvec.dot(&pvec) * inv_det;
        if u < -BARYCENTRIC_TOLERANCE || u > 1.0 + BARYCENTRIC_TOLERANCE {
            return None;
        }

        let qvec = tvec.cross(&self.edge1);
        let v = dir.dot(&qvec) * inv_det;
        if v < -BARYCENTRIC_TOLERANCE || u + v > 1.0 + BARYCENTRIC_TOLERANCE {
            return None;
        }

        let t = self.edge2.dot(&qvec) * inv_det;
        (t > eps && t < 1.0 - eps).then_some(t)
    }
}

/// Precompute every face of the mesh.
pub fn triangles(mesh: &MeshIndex) -> Vec<Triangle> {
    mesh.face_ids()
        .zip(mesh.faces())
        .map(|(f, corners)| Triangle::new(*corners, mesh.face_positions(f)))
        .collect()
}

/// Whether the segment from `vertex` at `position` to `eye` is blocked.
///
/// Exhaustive over `triangles`; faces incident to `vertex` are skipped.
pub fn is_occluded(
    triangles: &[Triangle],
    vertex: VertexId,
    position: &Point3<f64>,
    eye: &Point3<f64>,
    eps: f64,
) -> bool {
    let dir = eye - position;
    triangles
        .iter()
        .filter(|tri| !tri.has_corner(vertex))
        .any(|tri| tri.intersect_segment(position, &dir, eps).is_some())
}
