//! STL (stereolithography) format support.
//!
//! Both binary and ASCII files are read. STL stores positions per triangle;
//! `stl_io` merges identical positions, and the result loads as one part.

use std::fs::File;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::mesh::MeshPart;

/// Load the mesh of an STL file.
///
/// # Example
///
/// ```no_run
/// use vantage::io::stl;
///
/// let parts = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<MeshPart>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| Error::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let positions = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let triangles: Vec<[usize; 3]> = stl.faces.iter().map(|tri| tri.vertices).collect();

    if triangles.is_empty() {
        return Err(Error::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no triangles".to_string(),
        });
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh")
        .to_string();

    Ok(vec![MeshPart::new(name, positions, triangles)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_ascii_stl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.stl");
        fs::write(
            &path,
            "solid tri
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
facet normal 0 0 1
  outer loop
    vertex 1 0 0
    vertex 1 1 0
    vertex 0 1 0
  endloop
endfacet
endsolid tri
",
        )
        .unwrap();

        let parts = load(&path).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].triangles.len(), 2);
        // shared corners are merged
        assert_eq!(parts[0].positions.len(), 4);
    }
}
