//! Persisting uploaded files

use crate::error::UploadError;
use crate::logger;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

/// Copy everything from `reader` into the file at `path`, creating or
/// truncating it. Returns the number of bytes written.
pub fn save_uploaded_file<R: Read + ?Sized>(
    reader: &mut R,
    path: impl AsRef<Path>,
) -> Result<u64, UploadError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| UploadError::Create {
        path: path.to_path_buf(),
        source,
    })?;

    let mut out = BufWriter::new(file);
    let written = io::copy(reader, &mut out)
        .and_then(|n| out.flush().map(|()| n))
        .map_err(|source| UploadError::Copy {
            path: path.to_path_buf(),
            source,
        })?;

    logger::log_debug(&format!("Saved upload to {} ({written} bytes)", path.display()));
    Ok(written)
}
