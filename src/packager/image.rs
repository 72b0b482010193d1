//! Disk image creation from the staged tree.
//!
//! The image tool does the encoding and compression. This module passes it
//! the right parameters, then waits for the platform to release the staging
//! volume before cleanup starts.

use super::{
    error::Result,
    settings::DmgSettings,
    tool::Tool,
    utils::fs,
};
use std::{
    future::Future,
    path::{Path, PathBuf},
};

/// Parameters of one image creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageParams<'a> {
    /// Folder whose contents become the image.
    pub source_folder: &'a Path,
    /// Label of the mounted image.
    pub volume_name: &'a str,
    /// Image format identifier (e.g. `UDBZ`).
    pub format: &'a str,
    /// Where the image is written.
    pub output: &'a Path,
    /// Replace an existing file at `output`.
    pub overwrite: bool,
    /// Size ceiling in the tool's size syntax.
    pub max_size: &'a str,
    /// Scrub temporary and hidden cruft from the image.
    pub scrub: bool,
    /// Ask the tool for verbose output.
    pub verbose: bool,
}

/// Something that turns a folder into a disk image.
pub trait ImageCreator {
    /// Creates the image described by `params`.
    fn create_image(&self, params: &ImageParams<'_>) -> impl Future<Output = Result<()>> + Send;
}

/// [`ImageCreator`] backed by `hdiutil create`.
#[derive(Debug, Clone)]
pub struct HdiUtil {
    tool: Tool,
}

impl HdiUtil {
    /// Uses `program` (a name on `PATH` or a path) as the hdiutil executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            tool: Tool::new("hdiutil", program),
        }
    }

    /// Command line for `params`. The output path goes last.
    pub fn arguments(params: &ImageParams<'_>) -> Vec<String> {
        let mut args = vec![
            "create".to_string(),
            "-srcfolder".to_string(),
            params.source_folder.to_string_lossy().into_owned(),
            "-volname".to_string(),
            params.volume_name.to_string(),
            "-format".to_string(),
            params.format.to_string(),
        ];
        if params.overwrite {
            args.push("-ov".to_string());
        }
        if params.scrub {
            args.push("-scrub".to_string());
        }
        args.push("-size".to_string());
        args.push(params.max_size.to_string());
        if params.verbose {
            args.push("-verbose".to_string());
        }
        args.push(params.output.to_string_lossy().into_owned());
        args
    }
}

impl Default for HdiUtil {
    fn default() -> Self {
        Self::new("hdiutil")
    }
}

impl ImageCreator for HdiUtil {
    async fn create_image(&self, params: &ImageParams<'_>) -> Result<()> {
        self.tool.run(Self::arguments(params)).await
    }
}

/// Builds the image at `target` from `staged_root`.
///
/// The target's parent directory is created if needed and an existing image
/// is overwritten. After the tool succeeds, waits `settings.settle` so the
/// staging volume is fully released before the caller removes it.
pub async fn build<I: ImageCreator>(
    staged_root: &Path,
    target: &Path,
    volume_name: &str,
    settings: &DmgSettings,
    creator: &I,
) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }

    let params = ImageParams {
        source_folder: staged_root,
        volume_name,
        format: &settings.format,
        output: target,
        overwrite: true,
        max_size: &settings.max_size,
        scrub: settings.scrub,
        verbose: settings.verbose,
    };

    log::info!(
        "Creating {} image {} (volume '{}', max size {})...",
        params.format,
        target.display(),
        volume_name,
        params.max_size
    );
    creator.create_image(&params).await?;
    log::info!("✓ Created {} DMG: {}", params.format, target.display());

    if !settings.settle.is_zero() {
        log::debug!(
            "Waiting {:?} for the staging volume to be released",
            settings.settle
        );
        tokio::time::sleep(settings.settle).await;
    }

    Ok(())
}
