//! Code signing of the staged application bundle.
//!
//! Signing runs only on hosts with the code signing capability and only when
//! a signing identity is configured. The identity and extra flags come from
//! [`SigningConfig`], never from the packaging request.

use super::{
    error::{Error, ErrorExt, Result},
    platform::PlatformCapabilities,
    settings::SigningConfig,
    tool::Tool,
};
use std::{
    future::Future,
    path::{Path, PathBuf},
};

/// Extension that marks an application bundle.
pub const APP_BUNDLE_EXTENSION: &str = ".app";

/// Something that can sign an application bundle.
pub trait CodeSigner {
    /// Signs `bundle` with `identity`, passing `flags` through unchanged.
    fn sign(
        &self,
        bundle: &Path,
        identity: &str,
        flags: &[String],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// [`CodeSigner`] backed by Apple's `codesign` executable.
#[derive(Debug, Clone)]
pub struct Codesign {
    tool: Tool,
}

impl Codesign {
    /// Uses `program` (a name on `PATH` or a path) as the codesign executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            tool: Tool::new("codesign", program),
        }
    }

    /// Arguments for one signing call.
    pub fn arguments(bundle: &Path, identity: &str, flags: &[String]) -> Vec<String> {
        let mut args = vec![
            "--force".to_string(),
            "--deep".to_string(),
            "-s".to_string(),
            identity.to_string(),
            "-v".to_string(),
        ];
        args.extend(flags.iter().cloned());
        args.push(bundle.to_string_lossy().into_owned());
        args
    }
}

impl Default for Codesign {
    fn default() -> Self {
        Self::new("codesign")
    }
}

impl CodeSigner for Codesign {
    async fn sign(&self, bundle: &Path, identity: &str, flags: &[String]) -> Result<()> {
        self.tool
            .run(Self::arguments(bundle, identity, flags))
            .await
    }
}

/// What [`maybe_sign`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    /// The host cannot sign; nothing was inspected.
    Unsupported,
    /// No identity configured; the bundle was located but not signed.
    NotRequested,
    /// The bundle at this path was signed.
    Signed(PathBuf),
}

/// Finds the single top-level application bundle under `staged_root`.
///
/// Zero or several candidates is an input-shape error.
pub fn locate_app_bundle(staged_root: &Path) -> Result<PathBuf> {
    let entries =
        std::fs::read_dir(staged_root).fs_context("listing staged tree", staged_root)?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.fs_context("listing staged tree", staged_root)?;
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(APP_BUNDLE_EXTENSION) {
            found.push(name.to_string_lossy().into_owned());
        }
    }
    found.sort();

    match found.len() {
        0 => Err(Error::NoAppBundle {
            root: staged_root.to_path_buf(),
        }),
        1 => Ok(staged_root.join(&found[0])),
        _ => Err(Error::AmbiguousAppBundle {
            root: staged_root.to_path_buf(),
            found,
        }),
    }
}

/// Signs the staged application bundle when the host and configuration allow.
///
/// On a capable host the bundle is always located first, so a malformed tree
/// fails even when signing is not requested. A signer failure is fatal.
pub async fn maybe_sign<S: CodeSigner>(
    staged_root: &Path,
    config: &SigningConfig,
    capabilities: PlatformCapabilities,
    signer: &S,
) -> Result<SignOutcome> {
    if !capabilities.code_signing {
        log::debug!("Code signing not supported on this platform, skipping");
        return Ok(SignOutcome::Unsupported);
    }

    let bundle = locate_app_bundle(staged_root)?;

    let Some(identity) = config.identity.as_deref() else {
        log::info!("No signing identity configured, skipping signing");
        return Ok(SignOutcome::NotRequested);
    };

    log::info!("Signing {} with identity '{}'", bundle.display(), identity);
    signer.sign(&bundle, identity, &config.flags).await?;
    log::info!("✓ Successfully signed {}", bundle.display());

    Ok(SignOutcome::Signed(bundle))
}
