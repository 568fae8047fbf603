//! Wavefront OBJ format support.
//!
//! Each object or group in the file loads as its own part. Polygons are
//! triangulated by the importer. Indices refer to positions only, so texture
//! seams do not split vertices.

use std::path::Path;

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::mesh::MeshPart;

/// Load every object of an OBJ file as a separate part.
///
/// # Example
///
/// ```no_run
/// use vantage::io::obj;
///
/// let parts = obj::load("model.obj").unwrap();
/// for part in &parts {
///     println!("{}: {} triangles", part.name, part.triangles.len());
/// }
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<MeshPart>> {
    let path = path.as_ref();

    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };

    // materials are irrelevant to geometry
    let (models, _materials) = tobj::load_obj(path, &options).map_err(|e| Error::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let parts: Vec<MeshPart> = models
        .into_iter()
        .map(|model| {
            let positions = model
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
                .collect();
            let triangles = model
                .mesh
                .indices
                .chunks_exact(3)
                .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
                .collect();
            MeshPart::new(model.name, positions, triangles)
        })
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        return Err(Error::LoadError {
            path: path.to_path_buf(),
            message: "OBJ file contains no faces".to_string(),
        });
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_objects_load_as_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.obj");
        fs::write(
            &path,
            "o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 4 5 6 7
",
        )
        .unwrap();

        let parts = load(&path).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "first");
        assert_eq!(parts[0].triangles.len(), 1);
        assert_eq!(parts[1].name, "second");
        assert_eq!(parts[1].positions.len(), 4);
        assert_eq!(parts[1].triangles.len(), 2);
    }
}
