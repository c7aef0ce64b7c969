//! Small reads from sysfs and procfs nodes.
//!
//! Every read opens the node, performs one bounded read and closes it again.
//! Nothing here keeps a handle between samples.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Largest read performed on a single-value node.
const SMALL_READ: usize = 32;

fn read_small(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut buf = [0u8; SMALL_READ];
    let n = file.read(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}

/// Read a node holding a single unsigned integer.
pub fn read_u64(path: &Path) -> Option<u64> {
    match read_small(path) {
        Ok(text) => text.trim().parse().ok(),
        Err(e) => {
            tracing::trace!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

/// Read a node holding a single signed integer (temperatures can go negative).
pub fn read_i64(path: &Path) -> Option<i64> {
    match read_small(path) {
        Ok(text) => text.trim().parse().ok(),
        Err(e) => {
            tracing::trace!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

/// Find `label` in a multi-line status report and parse the number after it.
///
/// The first `skip_lines` lines are ignored. The value is the leading run of
/// digits after the label, so `GPU Utilisation: 45%` yields 45.
pub fn read_labelled_value(path: &Path, skip_lines: usize, label: &str) -> Option<u32> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::trace!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };

    let line = contents.lines().skip(skip_lines).find(|line| line.contains(label))?;
    let (_, after) = line.split_once(label)?;
    let value = after.trim_start_matches(|c: char| !c.is_ascii_digit());
    let end = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    value[..end].parse().ok()
}
