//! Filesystem helpers with all-or-nothing writes.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::domain::errors::RejxError;

/// Read `path` as UTF-8, mapping a missing file to [`RejxError::NotFound`].
pub fn read_original(path: &Path) -> Result<String, RejxError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(RejxError::NotFound(path.to_path_buf()))
        }
        Err(err) => Err(RejxError::io(
            format!("failed to read {}", path.display()),
            err,
        )),
    }
}

/// Replace the contents of `path` atomically.
///
/// The data goes to a temporary file next to the file being replaced, which
/// is then renamed over it, so an interrupted write leaves the original
/// intact. Symlinks are resolved first: the link stays and its target is
/// rewritten. Existing permissions are carried over.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), RejxError> {
    let io_err = |what: &str, err| RejxError::io(format!("{what} {}", path.display()), err);
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => path.to_path_buf(),
        Err(err) => return Err(io_err("failed to resolve", err)),
    };
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(|err| io_err("failed to stage", err))?;
    temp.write_all(contents.as_bytes())
        .map_err(|err| io_err("failed to write", err))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| io_err("failed to sync", err))?;

    if let Ok(metadata) = fs::metadata(&target) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|err| io_err("failed to copy permissions for", err))?;
    }

    temp.persist(&target)
        .map_err(|err| io_err("failed to replace", err.error))?;
    Ok(())
}

/// Delete a reject file.
pub fn remove(path: &Path) -> Result<(), RejxError> {
    fs::remove_file(path)
        .map_err(|err| RejxError::io(format!("failed to delete {}", path.display()), err))
}
