//! Filesystem helpers for build context assembly.

use std::fs;
use std::io;
use std::path::Path;

/// Recursively copy `src` into `dst`, returning the number of entries copied.
///
/// Symlinks are recreated rather than followed, regular files keep their
/// permission bits, and directories get the source mode once their contents
/// are in place. Sockets, FIFOs and device nodes are skipped.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<u64> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else if file_type.is_dir() {
            copied += copy_tree(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(&src_path, &dst_path)?;
        } else {
            tracing::warn!(path = %src_path.display(), "Skipping special file");
            continue;
        }
        copied += 1;
    }

    let perms = fs::metadata(src)?.permissions();
    fs::set_permissions(dst, perms)?;

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    if fs::symlink_metadata(dst).is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dst: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot recreate symlink {}", src.display()),
    ))
}

/// Move `src` to `dst`, copying when a rename is not possible.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst)?;
    fs::remove_file(src)
}
