//! Symlink plumbing for the fitting data farm.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// Replace `dst` with a symlink to `src`, `ln -sfn` style.
///
/// Only symlinks are ever replaced. A regular file or directory at `dst`
/// is someone's data and aborts with [`PipelineError::NotASymlink`].
///
/// # Errors
///
/// Fails when `dst` exists and is not a symlink, or on I/O errors while
/// unlinking or linking.
pub fn force_symlink(src: &Path, dst: &Path) -> PipelineResult<()> {
    match fs::symlink_metadata(dst) {
        Ok(meta) => {
            if !meta.file_type().is_symlink() {
                return Err(PipelineError::NotASymlink {
                    path: dst.to_path_buf(),
                });
            }
            fs::remove_file(dst)?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(PipelineError::Io(err)),
    }
    symlink_dir(src, dst)?;
    Ok(())
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}
