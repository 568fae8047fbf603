//! Raw mesh parts as produced by the importers.

use nalgebra::Point3;

/// One named sub-mesh: positions plus triangles indexing into them.
///
/// Indices are local to the part. [`MeshIndex::build`](super::MeshIndex::build)
/// merges parts into one vertex and face space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshPart {
    /// Sub-mesh name (object or primitive name in the source file).
    pub name: String,
    /// Vertex positions in world space.
    pub positions: Vec<Point3<f64>>,
    /// Triangles as indices into `positions`.
    pub triangles: Vec<[usize; 3]>,
}

impl MeshPart {
    /// Create a part from positions and triangles.
    pub fn new<S: Into<String>>(
        name: S,
        positions: Vec<Point3<f64>>,
        triangles: Vec<[usize; 3]>,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            triangles,
        }
    }

    /// Scale every position about the origin.
    pub fn scale(&mut self, factor: f64) {
        for p in &mut self.positions {
            p.coords *= factor;
        }
    }

    /// Append a polygon, fan-triangulating anything larger than a triangle.
    /// Polygons with fewer than three corners are ignored.
    pub fn push_polygon(&mut self, indices: &[usize]) {
        if indices.len() < 3 {
            return;
        }
        for i in 1..indices.len() - 1 {
            self.triangles.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    /// Whether the part has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_triangulation() {
        let mut part = MeshPart::default();
        part.push_polygon(&[0, 1, 2, 3, 4]);
        assert_eq!(part.triangles, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);

        part.push_polygon(&[5, 6]);
        assert_eq!(part.triangles.len(), 3);
    }

    #[test]
    fn test_scale() {
        let mut part = MeshPart::new("p", vec![Point3::new(1000.0, -2000.0, 500.0)], vec![]);
        part.scale(0.001);
        assert!((part.positions[0] - Point3::new(1.0, -2.0, 0.5)).norm() < 1e-12);
        assert!(part.is_empty());
    }
}
