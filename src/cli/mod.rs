//! Command line interface for makedmg.
//!
//! Parses arguments, builds the pipeline with the real external tools and
//! runs it, reporting each stage on the terminal.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::{
    error::{CliError, PackageError, Result},
    packager::{Codesign, HdiUtil, Packager, PackagingRequest, PlatformCapabilities},
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(args, OutputManager::new(false)).await
}

/// Runs one packaging request described by `args`.
///
/// Ctrl-C cancels the run; the staging root is still removed.
pub async fn execute(args: Args, output: OutputManager) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let request = PackagingRequest::new(
        &args.target_diskimage,
        args.dmg_volumename.as_str(),
        &args.source_directory,
        &args.binary_directory,
    )?;

    let capabilities = PlatformCapabilities::detect();
    let signing = args.signing_config();
    if capabilities.code_signing && !signing.is_enabled() {
        output.info("SIGNING_IDENTITY not set, the application bundle will not be signed");
    }

    let progress = output.clone();
    let packager = Packager::new(Codesign::new(&args.codesign), HdiUtil::new(&args.hdiutil))
        .with_capabilities(capabilities)
        .with_progress(move |stage| progress.stage(stage))
        .with_signing(signing)
        .with_settings(args.dmg_settings());
    log::debug!("{:?}", packager);

    output.info(&format!(
        "Packaging {} as \"{}\"",
        request.binary_dir().display(),
        request.volume_name()
    ));
    let image = tokio::select! {
        result = packager.package(&request) => result?,
        Ok(()) = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted, cleaning up");
            return Err(PackageError::Interrupted);
        }
    };

    output.image(&image);
    Ok(0)
}
