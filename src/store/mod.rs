//! Per-user state persisted between runs: launch counts, pins and the
//! run dialog's case-sensitivity toggle.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

pub mod case;
pub mod pins;
pub mod usage;

/// Writes `contents` next to `path` and renames it into place, creating the
/// parent directory when needed.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, contents).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}
