//! glTF format support.
//!
//! The default scene (or the first one) is walked from its root nodes. Every
//! node that instances a mesh contributes one part per triangle primitive, with
//! positions moved into world space by the node's accumulated transform. Parts
//! are named `<node>/<mesh>/<primitive index>`. Positions keep glTF's own axes.
//!
//! A document without scenes loads each mesh once, untransformed.

use std::path::Path;

use nalgebra::{Matrix4, Point3};

use crate::error::{Error, Result};
use crate::mesh::MeshPart;

/// Load all triangle primitives from a glTF or GLB file.
///
/// # Example
///
/// ```no_run
/// use vantage::io::gltf;
///
/// let parts = gltf::load("model.glb").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<MeshPart>> {
    let path = path.as_ref();

    let (document, buffers, _images) = ::gltf::import(path).map_err(|e| Error::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut parts = Vec::new();

    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                visit(&node, &Matrix4::identity(), &buffers, &mut parts);
            }
        }
        None => {
            for mesh in document.meshes() {
                read_mesh(&mesh, "", &Matrix4::identity(), &buffers, &mut parts);
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::LoadError {
            path: path.to_path_buf(),
            message: "glTF file contains no triangle meshes".to_string(),
        });
    }

    Ok(parts)
}

fn visit(
    node: &::gltf::Node<'_>,
    parent: &Matrix4<f64>,
    buffers: &[::gltf::buffer::Data],
    parts: &mut Vec<MeshPart>,
) {
    // column-major, like nalgebra
    let local: Matrix4<f64> = Matrix4::from(node.transform().matrix()).cast();
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        let node_name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index()));
        read_mesh(&mesh, &format!("{}/", node_name), &world, buffers, parts);
    }

    for child in node.children() {
        visit(&child, &world, buffers, parts);
    }
}

fn read_mesh(
    mesh: &::gltf::Mesh<'_>,
    prefix: &str,
    transform: &Matrix4<f64>,
    buffers: &[::gltf::buffer::Data],
    parts: &mut Vec<MeshPart>,
) {
    let mesh_name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh{}", mesh.index()));

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let mut part = MeshPart {
            name: format!("{}{}/{}", prefix, mesh_name, primitive.index()),
            ..MeshPart::default()
        };

        if let Some(positions) = reader.read_positions() {
            part.positions = positions
                .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
                .map(|p| transform.transform_point(&p))
                .collect();
        }

        let indices: Vec<usize> = match reader.read_indices() {
            Some(indices) => indices.into_u32().map(|i| i as usize).collect(),
            None => (0..part.positions.len()).collect(),
        };

        match primitive.mode() {
            ::gltf::mesh::Mode::Triangles => {
                for chunk in indices.chunks_exact(3) {
                    part.triangles.push([chunk[0], chunk[1], chunk[2]]);
                }
            }
            ::gltf::mesh::Mode::TriangleStrip => {
                for i in 0..indices.len().saturating_sub(2) {
                    if i % 2 == 0 {
                        part.triangles.push([indices[i], indices[i + 1], indices[i + 2]]);
                    } else {
                        // odd triangles flip winding
                        part.triangles.push([indices[i], indices[i + 2], indices[i + 1]]);
                    }
                }
            }
            ::gltf::mesh::Mode::TriangleFan => {
                part.push_polygon(&indices);
            }
            _ => {
                // points and lines carry no surface
            }
        }

        if !part.is_empty() {
            parts.push(part);
        }
    }
}
