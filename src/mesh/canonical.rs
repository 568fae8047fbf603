//! Canonically ordered triangle mesh.
//!
//! Keypoint files refer to vertices by a derived id rather than by file order.
//! The id of a vertex is its rank after sorting all vertices on a fixed-precision
//! decimal encoding of their coordinates. Equal keys keep their merged insertion
//! order, so duplicate positions (UV seams, split normals) stay distinct vertices
//! with reproducible ids.

use nalgebra::Point3;

use super::index::{FaceId, VertexId};
use super::part::MeshPart;
use crate::error::{Error, Result};

/// Digits after the decimal point in a canonical key.
pub const KEY_PRECISION: usize = 10;

/// A vertex with its canonical id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Canonical id.
    pub id: VertexId,
    /// World-space position.
    pub position: Point3<f64>,
}

/// A triangle as three canonical vertex ids, in source winding order.
pub type Face = [VertexId; 3];

/// Merged, canonically indexed mesh geometry.
///
/// Built once per mesh and shared read-only by every view.
#[derive(Debug, Clone)]
pub struct MeshIndex {
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    part_names: Vec<String>,
}

/// Encode a position as its canonical sort key.
///
/// Each coordinate is printed with [`KEY_PRECISION`] decimals; values that round
/// to zero are printed without a sign so `-0.0` and `0.0` share a key.
pub fn canonical_key(p: &Point3<f64>) -> String {
    format!(
        "{},{},{}",
        canonical_coord(p.x),
        canonical_coord(p.y),
        canonical_coord(p.z)
    )
}

fn canonical_coord(v: f64) -> String {
    let s = format!("{:.*}", KEY_PRECISION, v);
    match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    }
}

impl MeshIndex {
    /// Merge mesh parts and assign canonical vertex ids.
    ///
    /// Fails with [`Error::EmptyMesh`] when no part has a triangle and with
    /// [`Error::InvalidVertexIndex`] when a triangle points outside its part.
    /// Triangles that repeat a corner are dropped.
    pub fn build(parts: &[MeshPart]) -> Result<Self> {
        let mut positions: Vec<Point3<f64>> = Vec::new();
        let mut triangles: Vec<[usize; 3]> = Vec::new();
        let mut dropped = 0usize;

        for part in parts {
            let offset = positions.len();
            for tri in &part.triangles {
                for &vi in tri {
                    if vi >= part.positions.len() {
                        return Err(Error::InvalidVertexIndex {
                            face: triangles.len(),
                            vertex: offset + vi,
                        });
                    }
                }
                if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                    dropped += 1;
                    continue;
                }
                triangles.push([tri[0] + offset, tri[1] + offset, tri[2] + offset]);
            }
            positions.extend_from_slice(&part.positions);
        }

        if dropped > 0 {
            log::warn!("dropped {} degenerate triangles", dropped);
        }
        if triangles.is_empty() {
            return Err(Error::EmptyMesh);
        }
        if VertexId::try_new(positions.len().saturating_sub(1)).is_none() {
            return Err(Error::invalid_param(
                "vertices",
                positions.len(),
                "canonical ids are 32-bit",
            ));
        }

        let keys: Vec<String> = positions.iter().map(canonical_key).collect();
        let mut order: Vec<usize> = (0..positions.len()).collect();
        // stable: equal keys keep insertion order
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

        let mut rank = vec![0usize; positions.len()];
        for (id, &source) in order.iter().enumerate() {
            rank[source] = id;
        }

        let vertices = order
            .iter()
            .enumerate()
            .map(|(id, &source)| Vertex {
                id: VertexId::new(id),
                position: positions[source],
            })
            .collect();

        let faces = triangles
            .iter()
            .map(|t| {
                [
                    VertexId::new(rank[t[0]]),
                    VertexId::new(rank[t[1]]),
                    VertexId::new(rank[t[2]]),
                ]
            })
            .collect();

        let part_names = parts.iter().map(|p| p.name.clone()).collect();

        Ok(Self {
            vertices,
            faces,
            part_names,
        })
    }

    /// Build from a single list of positions and triangles.
    pub fn from_triangles(positions: &[Point3<f64>], triangles: &[[usize; 3]]) -> Result<Self> {
        Self::build(&[MeshPart::new("mesh", positions.to_vec(), triangles.to_vec())])
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Names of the merged parts, in merge order.
    pub fn part_names(&self) -> &[String] {
        &self.part_names
    }

    /// Vertices in canonical id order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangles in merged order.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Whether `id` names a vertex of this mesh.
    #[inline]
    pub fn contains(&self, id: VertexId) -> bool {
        id.index() < self.vertices.len()
    }

    /// Position of a vertex.
    ///
    /// # Panics
    /// Panics if `id` is not a vertex of this mesh.
    #[inline]
    pub fn position(&self, id: VertexId) -> &Point3<f64> {
        &self.vertices[id.index()].position
    }

    /// Corner positions of a face.
    pub fn face_positions(&self, face: FaceId) -> [Point3<f64>; 3] {
        let [a, b, c] = self.faces[face.index()];
        [*self.position(a), *self.position(b), *self.position(c)]
    }

    /// Iterate over all face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }
}
