//! Keypoint list files: one canonical vertex id per line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::text::{for_each_record, parse_field};
use crate::error::{Error, Result};
use crate::mesh::{KeypointSet, VertexId};

/// Read a keypoint file.
///
/// Blank lines are skipped and repeated ids collapse. A line with anything
/// other than a single non-negative integer is a parse error.
pub fn read_keypoints<P: AsRef<Path>>(path: P) -> Result<KeypointSet> {
    let path = path.as_ref();
    parse_keypoints(BufReader::new(File::open(path)?), path)
}

/// Parse keypoints from a reader; `path` is only used in error messages.
pub fn parse_keypoints<R: BufRead>(reader: R, path: &Path) -> Result<KeypointSet> {
    let mut set = KeypointSet::new();
    for_each_record(reader, |line, fields| {
        if fields.len() != 1 {
            return Err(Error::parse(
                path,
                line,
                format!("expected one vertex id, found {} fields", fields.len()),
            ));
        }
        let id: usize = parse_field(path, line, "vertex id", fields[0])?;
        // no mesh has more than u32::MAX vertices
        let id = VertexId::try_new(id).ok_or(Error::UnknownKeypoint { id })?;
        set.insert(id);
        Ok(())
    })?;
    Ok(set)
}
