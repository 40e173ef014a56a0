//! Byte-level file comparison

use crate::types::{map_file_error, MergeError};
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// Check whether two files hold exactly the same bytes.
///
/// Sizes are compared first; equal-sized files are then streamed side by side
/// in 64KB chunks.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool, MergeError> {
    let a_len = fs::metadata(a).map_err(|e| map_file_error(a, e))?.len();
    let b_len = fs::metadata(b).map_err(|e| map_file_error(b, e))?.len();
    if a_len != b_len {
        return Ok(false);
    }

    let mut a_file = File::open(a).map_err(|e| map_file_error(a, e))?;
    let mut b_file = File::open(b).map_err(|e| map_file_error(b, e))?;

    let mut a_buf = vec![0u8; CHUNK_SIZE];
    let mut b_buf = vec![0u8; CHUNK_SIZE];

    loop {
        let a_read = fill(&mut a_file, &mut a_buf).map_err(|e| map_file_error(a, e))?;
        let b_read = fill(&mut b_file, &mut b_buf).map_err(|e| map_file_error(b, e))?;

        if a_read != b_read || a_buf[..a_read] != b_buf[..b_read] {
            return Ok(false);
        }
        if a_read == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
