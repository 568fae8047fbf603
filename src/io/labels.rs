//! Keypoint label files.
//!
//! One line per keypoint, in ascending canonical id order:
//!
//! ```text
//! <line_index> <x> <y>
//! ```
//!
//! `line_index` is the keypoint's position in the sorted keypoint set, not its
//! vertex id. Hidden, unprojectable and out-of-frame keypoints are written as
//! `-1 -1`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;
use crate::visibility::VisibilityRecord;

/// Format records as label file text.
pub fn format_labels(records: &[VisibilityRecord]) -> String {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        let (x, y) = record.pixel_or_sentinel();
        out.push_str(&format!("{} {} {}\n", index, x, y));
    }
    out
}

/// Write a label file, creating missing parent directories.
///
/// The text goes to a uniquely named temporary file in the target directory
/// and is renamed into place, so a label file either exists complete or not at
/// all. Concurrent writers of one path never share a temporary file; the last
/// rename wins.
pub fn write_labels<P: AsRef<Path>>(path: P, records: &[VisibilityRecord]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    // removed on drop unless persisted
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        writer.write_all(format_labels(records).as_bytes())?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
