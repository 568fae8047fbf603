//! View parameter and view distribution files.
//!
//! A view parameter file holds one view per line:
//!
//! ```text
//! azimuth elevation tilt distance [image_path label_path]
//! ```
//!
//! The two paths are optional and must appear together. A distribution file
//! holds previously observed viewpoints, four numeric fields per line.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::text::{for_each_record, parse_field};
use crate::error::{Error, Result};
use crate::view::{ViewSpec, Viewpoint};

fn parse_viewpoint(path: &Path, line: usize, fields: &[&str]) -> Result<Viewpoint> {
    Ok(Viewpoint::new(
        parse_field(path, line, "azimuth", fields[0])?,
        parse_field(path, line, "elevation", fields[1])?,
        parse_field(path, line, "tilt", fields[2])?,
        parse_field(path, line, "distance", fields[3])?,
    ))
}

/// Read a view parameter file.
pub fn read_view_file<P: AsRef<Path>>(path: P) -> Result<Vec<ViewSpec>> {
    let path = path.as_ref();
    parse_view_file(BufReader::new(File::open(path)?), path)
}

/// Parse view parameters from a reader; `path` is only used in error messages.
pub fn parse_view_file<R: BufRead>(reader: R, path: &Path) -> Result<Vec<ViewSpec>> {
    let mut views = Vec::new();
    for_each_record(reader, |line, fields| {
        let spec = match fields.len() {
            4 => ViewSpec::new(parse_viewpoint(path, line, fields)?),
            6 => ViewSpec::with_outputs(parse_viewpoint(path, line, fields)?, fields[4], fields[5]),
            n => {
                return Err(Error::parse(
                    path,
                    line,
                    format!("expected 4 or 6 fields, found {}", n),
                ))
            }
        };
        views.push(spec);
        Ok(())
    })?;
    Ok(views)
}

/// Write a view parameter file, creating parent directories as needed.
pub fn write_view_file<P: AsRef<Path>>(path: P, views: &[ViewSpec]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);

    for spec in views {
        let v = &spec.viewpoint;
        write!(
            writer,
            "{:.6} {:.6} {:.6} {:.6}",
            v.azimuth, v.elevation, v.tilt, v.distance
        )?;
        if let (Some(image), Some(label)) = (&spec.image, &spec.label) {
            write!(writer, " {} {}", image.display(), label.display())?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read an empirical view distribution.
pub fn read_distribution<P: AsRef<Path>>(path: P) -> Result<Vec<Viewpoint>> {
    let path = path.as_ref();
    parse_distribution(BufReader::new(File::open(path)?), path)
}

/// Parse a view distribution from a reader; `path` is only used in error messages.
pub fn parse_distribution<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Viewpoint>> {
    let mut rows = Vec::new();
    for_each_record(reader, |line, fields| {
        if fields.len() != 4 {
            return Err(Error::parse(
                path,
                line,
                format!("expected 4 fields, found {}", fields.len()),
            ));
        }
        rows.push(parse_viewpoint(path, line, fields)?);
        Ok(())
    })?;
    Ok(rows)
}
