//! Line-oriented parsing shared by the text formats.

use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Split each non-blank line into whitespace-separated fields.
///
/// Calls `f` with the 1-based line number and the fields of every line that
/// has at least one field.
pub(crate) fn for_each_record<R, F>(reader: R, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &[&str]) -> Result<()>,
{
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        f(i + 1, &fields)?;
    }
    Ok(())
}

/// Parse one field, naming it in the error.
pub(crate) fn parse_field<T: FromStr>(path: &Path, line: usize, what: &str, token: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::parse(path, line, format!("invalid {} '{}'", what, token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_keep_numbering() {
        let input = "1 2\n\n   \n3\n";
        let mut seen = Vec::new();
        for_each_record(input.as_bytes(), |line, fields| {
            seen.push((line, fields.len()));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![(1, 2), (4, 1)]);
    }

    #[test]
    fn test_parse_field_error_names_line() {
        let err = parse_field::<f64>(Path::new("views.txt"), 3, "azimuth", "abc").unwrap_err();
        assert_eq!(err.to_string(), "views.txt:3: invalid azimuth 'abc'");
    }
}
