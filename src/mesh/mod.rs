//! Core mesh data structures.
//!
//! Importers produce one [`MeshPart`] per named sub-mesh. [`MeshIndex::build`]
//! merges the parts into a single vertex and face space and assigns every
//! vertex a canonical [`VertexId`].
//!
//! # Canonical ids
//!
//! Keypoint files name vertices by canonical id, never by file order. The id is
//! the vertex's rank after sorting all vertices by [`canonical_key`], a
//! fixed-precision decimal encoding of the position. Permuting the vertices of
//! the source file therefore yields the same id-to-position mapping.
//!
//! ```
//! use vantage::mesh::MeshIndex;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = MeshIndex::from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! // (0, 0, 0) sorts first
//! let first = mesh.vertices()[0];
//! assert_eq!(first.position, Point3::new(0.0, 0.0, 0.0));
//! ```

mod canonical;
mod index;
mod keypoints;
mod part;

pub use canonical::{canonical_key, Face, MeshIndex, Vertex, KEY_PRECISION};
pub use index::{FaceId, VertexId};
pub use keypoints::KeypointSet;
pub use part::MeshPart;
