//! File I/O.
//!
//! Mesh import produces a list of [`MeshPart`]s, one per named sub-mesh, which
//! [`MeshIndex::build`](crate::mesh::MeshIndex::build) merges. The text formats
//! (keypoint lists, view parameters, view distributions and labels) live in
//! their own submodules.
//!
//! # Supported Mesh Formats
//!
//! | Format | Extension | Parts |
//! |--------|-----------|-------|
//! | Wavefront OBJ | `.obj` | one per object/group |
//! | PLY | `.ply` | one |
//! | STL | `.stl` | one |
//! | glTF | `.gltf`, `.glb` | one per primitive |
//!
//! ```no_run
//! use vantage::io;
//! use vantage::mesh::MeshIndex;
//!
//! let parts = io::load_parts("model.obj", 1.0).unwrap();
//! let mesh = MeshIndex::build(&parts).unwrap();
//! ```

pub mod gltf;
pub mod keypoints;
pub mod labels;
pub mod obj;
pub mod ply;
pub mod stl;
mod text;
pub mod views;

use std::path::Path;

use crate::error::{Error, Result};
use crate::mesh::{MeshIndex, MeshPart};

pub use keypoints::read_keypoints;
pub use labels::write_labels;
pub use views::{read_distribution, read_view_file, write_view_file};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// STL (stereolithography) format.
    Stl,
    /// PLY (Stanford polygon) format.
    Ply,
    /// glTF format.
    Gltf,
    /// glTF binary format.
    Glb,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            "gltf" => Some(Format::Gltf),
            "glb" => Some(Format::Glb),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// Load the parts of a mesh file, scaling positions by `scale`.
///
/// The format is determined by the file extension.
pub fn load_parts<P: AsRef<Path>>(path: P, scale: f64) -> Result<Vec<MeshPart>> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::invalid_param("scale", scale, "must be positive"));
    }

    let mut parts = match format {
        Format::Obj => obj::load(path)?,
        Format::Stl => stl::load(path)?,
        Format::Ply => ply::load(path)?,
        Format::Gltf | Format::Glb => gltf::load(path)?,
    };

    if scale != 1.0 {
        for part in &mut parts {
            part.scale(scale);
        }
    }

    log::debug!("loaded {} part(s) from {}", parts.len(), path.display());
    Ok(parts)
}

/// Load a mesh file and build its canonical index.
pub fn load_mesh<P: AsRef<Path>>(path: P, scale: f64) -> Result<MeshIndex> {
    MeshIndex::build(&load_parts(path, scale)?)
}
