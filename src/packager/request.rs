//! The immutable input of a packaging run.

use super::error::{Error, ErrorExt, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// License file copied from the source tree into every image.
pub const LICENSE_FILE: &str = "LICENSE.GPL3-EXCEPT";

/// Extension the image tool gives its output.
pub const IMAGE_EXTENSION: &str = "dmg";

/// What to package and where to put it.
///
/// All paths are absolutized at construction so that a binary directory given
/// as `.` still has a meaningful base name for the staged copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingRequest {
    target_image: PathBuf,
    volume_name: String,
    source_dir: PathBuf,
    binary_dir: PathBuf,
}

impl PackagingRequest {
    /// Builds a request from the four command line inputs.
    pub fn new(
        target_image: impl AsRef<Path>,
        volume_name: impl Into<String>,
        source_dir: impl AsRef<Path>,
        binary_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        Ok(Self {
            target_image: with_image_extension(absolutize(target_image.as_ref())?),
            volume_name: volume_name.into(),
            source_dir: absolutize(source_dir.as_ref())?,
            binary_dir: absolutize(binary_dir.as_ref())?,
        })
    }

    /// Output image path, always ending in `.dmg`.
    pub fn target_image(&self) -> &Path {
        &self.target_image
    }

    /// Label of the mounted image.
    pub fn volume_name(&self) -> &str {
        &self.volume_name
    }

    /// Source checkout root.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Directory holding the built application bundle.
    pub fn binary_dir(&self) -> &Path {
        &self.binary_dir
    }

    /// Location of the license file inside the source checkout.
    pub fn license_path(&self) -> PathBuf {
        self.source_dir.join(LICENSE_FILE)
    }

    /// Name of the directory the binary tree is staged under.
    pub fn staged_dir_name(&self) -> Result<&std::ffi::OsStr> {
        self.binary_dir.file_name().ok_or_else(|| Error::InvalidPath {
            path: self.binary_dir.clone(),
            reason: "binary directory has no final path component",
        })
    }

    /// Checks every input invariant before any work starts.
    ///
    /// Fails on a missing binary or source directory and on a missing
    /// license file, so a malformed build never reaches the image tool.
    pub fn validate(&self) -> Result<()> {
        if !self.binary_dir.is_dir() {
            return Err(Error::MissingDirectory {
                role: "binary",
                path: self.binary_dir.clone(),
            });
        }
        self.staged_dir_name()?;

        if !self.source_dir.is_dir() {
            return Err(Error::MissingDirectory {
                role: "source",
                path: self.source_dir.clone(),
            });
        }

        let license = self.license_path();
        if !license.is_file() {
            return Err(Error::MissingLicense { path: license });
        }

        if self.volume_name.trim().is_empty() {
            crate::bail!("volume name must not be empty");
        }

        Ok(())
    }
}

/// hdiutil appends `.dmg` to an output name without it, so do the same up
/// front and stat the file that actually gets written.
fn with_image_extension(path: PathBuf) -> PathBuf {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION));
    if has_extension {
        return path;
    }
    let mut name = path.into_os_string();
    name.push(".");
    name.push(IMAGE_EXTENSION);
    PathBuf::from(name)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .fs_context("resolving absolute path", path)?
        .into_owned())
}
