//! Adds the end-user layout to the staged tree: an `Applications` shortcut
//! for drag-to-install and the license text.

use super::{
    error::{Error, ErrorExt, Result},
    request::LICENSE_FILE,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Name of the shortcut placed next to the application bundle.
pub const APPLICATIONS_LINK: &str = "Applications";

/// Where the shortcut points.
pub const APPLICATIONS_TARGET: &str = "/Applications";

/// Adds the `Applications` link and the license file to `staged_root`.
pub async fn augment(staged_root: &Path, source_root: &Path) -> Result<()> {
    create_applications_link(staged_root)?;
    copy_license(staged_root, source_root).await?;
    Ok(())
}

/// Creates `staged_root/Applications -> /Applications`.
///
/// An existing entry of that name is a consistency error.
pub fn create_applications_link(staged_root: &Path) -> Result<PathBuf> {
    let link = staged_root.join(APPLICATIONS_LINK);
    if link.symlink_metadata().is_ok() {
        return Err(Error::LinkExists { path: link });
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(APPLICATIONS_TARGET, &link)
        .fs_context("creating Applications symlink", &link)?;

    #[cfg(not(unix))]
    crate::bail!(
        "cannot create {} on this platform: symbolic links to {} require a unix host",
        link.display(),
        APPLICATIONS_TARGET
    );

    log::debug!("Linked {} -> {}", link.display(), APPLICATIONS_TARGET);
    Ok(link)
}

/// Copies the license file from the source checkout into `staged_root`.
pub async fn copy_license(staged_root: &Path, source_root: &Path) -> Result<PathBuf> {
    let license = source_root.join(LICENSE_FILE);
    if !license.is_file() {
        return Err(Error::MissingLicense { path: license });
    }

    let dest = staged_root.join(LICENSE_FILE);
    fs::copy_file(&license, &dest).await?;
    log::debug!("Copied {} to {}", license.display(), dest.display());
    Ok(dest)
}
