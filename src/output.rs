use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Writes the document to a temporary file next to the destination and
/// renames it into place, so a failed run never leaves a partial file.
/// Creates the destination directory if needed.
pub fn write_atomic(fout: &Path, contents: &[u8]) -> Result<()> {
    let dir = match fout.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".speedchart-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| Error::io(&dir, e))?;
    debug!("writing {} bytes to {}", contents.len(), tmp.path().display());
    tmp.write_all(contents).map_err(|e| Error::io(fout, e))?;
    if let Some(perms) = target_permissions(fout) {
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|e| Error::io(fout, e))?;
    }
    tmp.as_file().sync_all().map_err(|e| Error::io(fout, e))?;
    tmp.persist(fout).map_err(|e| Error::io(fout, e.error))?;
    info!("wrote {}", fout.display());
    Ok(())
}

/// mode of the file being replaced, otherwise 0644 on unix
fn target_permissions(fout: &Path) -> Option<fs::Permissions> {
    match fs::metadata(fout) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
