//! File system utilities for staging.
//!
//! Provides filtered tree copies with symlink preservation and path-aware
//! error reporting.

use crate::packager::{
    error::{Error, ErrorExt, Result},
    filter::{EntryKind, FilterPolicy},
};
use std::{
    cell::Cell,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Counts gathered while copying a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Regular files copied.
    pub files: usize,
    /// Directories created.
    pub dirs: usize,
    /// Symbolic links recreated.
    pub links: usize,
    /// Entries left out by the filter (pruned directories count once).
    pub pruned: usize,
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Creates all of the directories of the specified path.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Copies a regular file byte for byte.
///
/// Fails if the source is not a regular file; the destination is
/// overwritten.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(from)
        .await
        .fs_context("reading metadata of", from)?;
    if !metadata.is_file() {
        return Err(Error::GenericError(format!(
            "{} is not a regular file",
            from.display()
        )));
    }
    tokio::fs::copy(from, to)
        .await
        .fs_context("copying file to", to)?;
    Ok(())
}

/// Recursively copies `from` to `to`, skipping everything `policy` excludes.
///
/// Symlinks are recreated with their original target, never followed. The
/// policy sees each entry before anything is copied, and an excluded
/// directory is never descended into. Fails if `to` already exists.
pub async fn copy_dir_filtered(
    from: &Path,
    to: &Path,
    policy: Arc<dyn FilterPolicy>,
) -> Result<CopyStats> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!(
            "{} is not a directory",
            from.display()
        )));
    }
    if to.symlink_metadata().is_ok() {
        return Err(Error::GenericError(format!(
            "staging destination {} already exists",
            to.display()
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Walking and copying is blocking work
    tokio::task::spawn_blocking(move || copy_tree_blocking(&from, &to, policy.as_ref()))
        .await
        .map_err(|e| Error::GenericError(format!("directory copy task panicked: {e}")))?
}

fn copy_tree_blocking(from: &Path, to: &Path, policy: &dyn FilterPolicy) -> Result<CopyStats> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
    }

    let mut stats = CopyStats::default();
    let pruned = Cell::new(0usize);
    let walker = walkdir::WalkDir::new(from)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let kind = EntryKind::from_file_type(entry.file_type());
            let excluded = policy.excludes(entry.path(), kind);
            if excluded {
                log::debug!("Skipping debug artifact {}", entry.path().display());
                pruned.set(pruned.get() + 1);
            }
            !excluded
        });

    for entry in walker {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path: PathBuf = to.join(rel_path);

        match EntryKind::from_file_type(entry.file_type()) {
            EntryKind::Symlink => {
                let target =
                    std::fs::read_link(entry.path()).fs_context("reading link", entry.path())?;
                let result = if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path)
                } else {
                    symlink_file(&target, &dest_path)
                };
                result.fs_context("creating link", &dest_path)?;
                stats.links += 1;
            }
            EntryKind::Directory => {
                std::fs::create_dir(&dest_path).fs_context("creating directory", &dest_path)?;
                stats.dirs += 1;
            }
            EntryKind::File => {
                std::fs::copy(entry.path(), &dest_path).fs_context("copying file to", &dest_path)?;
                stats.files += 1;
            }
            // Opening a FIFO would block until a writer shows up
            EntryKind::Other => {
                return Err(Error::SpecialFile {
                    path: entry.path().to_path_buf(),
                });
            }
        }
    }

    stats.pruned = pruned.get();
    Ok(stats)
}
