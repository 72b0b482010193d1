//! Staging root ownership and the filtered bundle copy.
//!
//! A [`StagingRoot`] is created fresh for every run and removed when the run
//! ends. [`stage`] fills it with a debug-free copy of the binary tree.

use super::{
    error::{Context, Error, ErrorExt, Result},
    filter::FilterPolicy,
    utils::fs::{self, CopyStats},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

const STAGING_PREFIX: &str = "makedmg-";

/// Uniquely named temporary directory owned by one packaging run.
///
/// Removed by [`StagingRoot::close`], which reports failures, or on drop as a
/// fallback (an early return, a panic, or a cancelled future).
#[derive(Debug)]
pub struct StagingRoot {
    dir: tempfile::TempDir,
}

impl StagingRoot {
    /// Creates a new staging root in the system temporary directory.
    pub fn create() -> Result<Self> {
        let base = std::env::temp_dir();
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&base)
            .fs_context("creating staging root in", base)?;
        log::debug!("Created staging root {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Path of the staging root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the staging root and everything in it.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .fs_context("removing staging root", &path)?;
        log::debug!("Removed staging root {}", path.display());
        Ok(())
    }
}

/// Copies `binary_root` into `destination_root/<basename of binary_root>`,
/// leaving out whatever `policy` excludes.
///
/// Returns the path of the staged copy together with copy statistics.
pub async fn stage(
    binary_root: &Path,
    destination_root: &Path,
    policy: Arc<dyn FilterPolicy>,
) -> Result<(PathBuf, CopyStats)> {
    let name = binary_root.file_name().ok_or_else(|| Error::InvalidPath {
        path: binary_root.to_path_buf(),
        reason: "binary directory has no final path component",
    })?;
    let staged = destination_root.join(name);

    log::info!(
        "Staging {} into {}",
        binary_root.display(),
        staged.display()
    );
    let stats = fs::copy_dir_filtered(binary_root, &staged, policy)
        .await
        .with_context(|| format!("staging {}", binary_root.display()))?;
    log::info!(
        "Staged {} files, {} directories, {} links; skipped {} debug artifacts",
        stats.files,
        stats.dirs,
        stats.links,
        stats.pruned
    );

    Ok((staged, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packager::filter::DebugArtifactFilter;

    #[test]
    fn staging_root_is_removed_on_close() {
        let root = StagingRoot::create().unwrap();
        let path = root.path().to_path_buf();
        std::fs::create_dir_all(path.join("nested/dir")).unwrap();
        std::fs::write(path.join("nested/dir/file"), "x").unwrap();

        root.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn staging_root_is_removed_on_drop() {
        let path = {
            let root = StagingRoot::create().unwrap();
            std::fs::write(root.path().join("file"), "x").unwrap();
            root.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn staging_roots_are_unique() {
        let a = StagingRoot::create().unwrap();
        let b = StagingRoot::create().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn stages_under_the_binary_dir_name() {
        let input = tempfile::tempdir().unwrap();
        let bin = input.path().join("install-root");
        std::fs::create_dir_all(bin.join("App.app/Contents/MacOS/App.dSYM/Contents")).unwrap();
        std::fs::write(bin.join("App.app/Contents/MacOS/App"), "exe").unwrap();

        let root = StagingRoot::create().unwrap();
        let (staged, stats) = stage(&bin, root.path(), Arc::new(DebugArtifactFilter::new(false)))
            .await
            .unwrap();

        assert_eq!(staged, root.path().join("install-root"));
        assert!(staged.join("App.app/Contents/MacOS/App").is_file());
        assert!(!staged.join("App.app/Contents/MacOS/App.dSYM").exists());
        assert_eq!(stats.pruned, 1);
        root.close().unwrap();
    }
}
