use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;

use tracing::debug;

use crate::driver::MZFormulatorError;

fn first_field(line: &str) -> Option<&str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .find(|t| !t.is_empty())
}

/// Read m/z values from a peak list with one peak per line.
///
/// The m/z is the first comma, tab or space separated field. Blank lines and
/// lines starting with `#` are skipped, as is a header line if it is the first
/// non-comment line and its first field is not a number.
pub fn read_peak_list<R: BufRead>(reader: R) -> Result<Vec<f64>, MZFormulatorError> {
    let mut values = Vec::new();
    let mut seen_content = false;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let is_first = !seen_content;
        seen_content = true;
        let Some(field) = first_field(text) else {
            continue;
        };
        match field.parse::<f64>() {
            Ok(mz) if mz.is_finite() && mz > 0.0 => values.push(mz),
            Ok(_) => {
                return Err(MZFormulatorError::MalformedPeakListLine {
                    line: i + 1,
                    text: text.to_string(),
                })
            }
            Err(_) if is_first => {
                debug!("Skipping peak list header {text:?}");
            }
            Err(_) => {
                return Err(MZFormulatorError::MalformedPeakListLine {
                    line: i + 1,
                    text: text.to_string(),
                })
            }
        }
    }
    Ok(values)
}

pub fn read_peak_list_path(path: &Path) -> Result<Vec<f64>, MZFormulatorError> {
    let handle = io::BufReader::new(fs::File::open(path)?);
    read_peak_list(handle)
}
