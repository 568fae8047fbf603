//! Error types for vantage.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sampling views, indexing meshes and writing labels.
#[derive(Error, Debug)]
pub enum Error {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index (within the merged face list).
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// Geometry that would make a camera pose or an occlusion ray undefined.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A keypoint references a vertex id the mesh does not have.
    #[error("keypoint {id} is not a vertex of the mesh")]
    UnknownKeypoint {
        /// The offending canonical vertex id.
        id: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of a text input file could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        /// The file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Configuration file could not be decoded.
    #[error("invalid configuration {path}: {message}")]
    Config {
        /// The file path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// The external renderer failed for one view.
    #[error("rendering view {view} failed: {message}")]
    RenderFailed {
        /// Index of the view in the batch.
        view: usize,
        /// Failure description.
        message: String,
    },

    /// Another view of the same batch writes the same output file.
    #[error("output {} is also written by later view {later}", path.display())]
    DuplicateOutput {
        /// The shared output path.
        path: PathBuf,
        /// Index of the view that writes it.
        later: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a parse error for line `line` (1-based) of `path`.
    pub fn parse<P: Into<PathBuf>, M: Into<String>>(path: P, line: usize, message: M) -> Self {
        Error::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
