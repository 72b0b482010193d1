//! The packaging orchestrator.
//!
//! [`Packager`] runs the four stages strictly in order inside one
//! [`StagingRoot`]:
//!
//! 1. stage the filtered bundle copy
//! 2. sign the staged bundle (capable hosts with an identity only)
//! 3. add the `Applications` link and the license file
//! 4. build the image and let the volume settle
//!
//! The staging root is removed on every exit path. A removal failure after a
//! successful build is reported on the result, after a failed build it is
//! reported together with the original failure.

use super::{
    augment, checksum,
    error::{Context, ErrorExt},
    filter::{DebugArtifactFilter, FilterPolicy},
    image::{self, ImageCreator},
    platform::PlatformCapabilities,
    request::PackagingRequest,
    settings::{DmgSettings, SigningConfig},
    sign::{self, CodeSigner, SignOutcome},
    staging::{self, StagingRoot},
};
use crate::error::{PackageError, Stage};
use std::{path::PathBuf, sync::Arc};

/// A finished disk image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedImage {
    /// Where the image was written.
    pub path: PathBuf,
    /// Image size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the image.
    pub checksum: String,
    /// Whether the application bundle was signed.
    pub signed: bool,
    /// Set when the image is fine but the staging root could not be removed.
    pub cleanup_error: Option<String>,
}

/// Runs packaging requests.
///
/// External tools are injected, so tests can substitute fakes for the signer
/// and the image creator.
pub struct Packager<S, I> {
    signer: S,
    creator: I,
    signing: SigningConfig,
    capabilities: PlatformCapabilities,
    settings: DmgSettings,
    filter: Arc<dyn FilterPolicy>,
    progress: Option<ProgressFn>,
}

/// Callback told about each stage as it starts.
pub type ProgressFn = Box<dyn Fn(Stage) + Send + Sync>;

impl<S, I> std::fmt::Debug for Packager<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packager")
            .field("signing_enabled", &self.signing.is_enabled())
            .field("capabilities", &self.capabilities)
            .field("settings", &self.settings)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: CodeSigner, I: ImageCreator> Packager<S, I> {
    /// Creates a packager for the current host with default settings and no
    /// signing identity.
    pub fn new(signer: S, creator: I) -> Self {
        let capabilities = PlatformCapabilities::detect();
        Self {
            signer,
            creator,
            signing: SigningConfig::default(),
            capabilities,
            settings: DmgSettings::default(),
            filter: Arc::new(DebugArtifactFilter::new(capabilities.object_inspection)),
            progress: None,
        }
    }

    /// Sets the signing configuration.
    pub fn with_signing(mut self, signing: SigningConfig) -> Self {
        self.signing = signing;
        self
    }

    /// Overrides the detected platform capabilities.
    ///
    /// Also resets the filter to a [`DebugArtifactFilter`] that matches the
    /// new object inspection setting.
    pub fn with_capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.capabilities = capabilities;
        self.filter = Arc::new(DebugArtifactFilter::new(capabilities.object_inspection));
        self
    }

    /// Sets the image settings.
    pub fn with_settings(mut self, settings: DmgSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the staging filter.
    pub fn with_filter(mut self, filter: Arc<dyn FilterPolicy>) -> Self {
        self.filter = filter;
        self
    }

    /// Calls `progress` as each stage starts.
    pub fn with_progress(mut self, progress: impl Fn(Stage) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    fn report(&self, stage: Stage) {
        log::debug!("Starting stage: {}", stage);
        if let Some(progress) = &self.progress {
            progress(stage);
        }
    }

    /// Signer used for the signing stage.
    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Image creator used for the image build stage.
    pub fn creator(&self) -> &I {
        &self.creator
    }

    /// Produces the disk image described by `request`.
    pub async fn package(&self, request: &PackagingRequest) -> Result<PackagedImage, PackageError> {
        self.report(Stage::Validate);
        request
            .validate()
            .map_err(|e| PackageError::stage(Stage::Validate, e))?;

        let staging = StagingRoot::create().map_err(|e| PackageError::stage(Stage::Stage, e))?;
        let staging_path = staging.path().to_path_buf();

        let outcome = self.run_stages(request, &staging).await;

        match (outcome, staging.close()) {
            (Ok(image), Ok(())) => Ok(image),
            (Ok(mut image), Err(cleanup)) => {
                log::warn!("Image created but staging cleanup failed: {}", cleanup);
                image.cleanup_error = Some(cleanup.to_string());
                Ok(image)
            }
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup)) => Err(PackageError::CleanupAfterFailure {
                primary: Box::new(err),
                path: staging_path,
                cleanup,
            }),
        }
    }

    async fn run_stages(
        &self,
        request: &PackagingRequest,
        staging: &StagingRoot,
    ) -> Result<PackagedImage, PackageError> {
        self.report(Stage::Stage);
        let (staged_root, _stats) =
            staging::stage(request.binary_dir(), staging.path(), Arc::clone(&self.filter))
                .await
                .map_err(|e| PackageError::stage(Stage::Stage, e))?;

        self.report(Stage::Sign);
        let outcome = sign::maybe_sign(&staged_root, &self.signing, self.capabilities, &self.signer)
            .await
            .map_err(|e| PackageError::stage(Stage::Sign, e))?;

        self.report(Stage::Augment);
        augment::augment(&staged_root, request.source_dir())
            .await
            .map_err(|e| PackageError::stage(Stage::Augment, e))?;

        self.report(Stage::BuildImage);
        image::build(
            &staged_root,
            request.target_image(),
            request.volume_name(),
            &self.settings,
            &self.creator,
        )
        .await
        .map_err(|e| PackageError::stage(Stage::BuildImage, e))?;

        let target = request.target_image();
        let size = tokio::fs::metadata(target)
            .await
            .fs_context("reading metadata of", target)
            .map(|m| m.len())
            .map_err(|e| PackageError::stage(Stage::BuildImage, e))?;
        let checksum = checksum::calculate_sha256(target)
            .await
            .context("computing image checksum")
            .map_err(|e| PackageError::stage(Stage::BuildImage, e))?;

        Ok(PackagedImage {
            path: target.to_path_buf(),
            size,
            checksum,
            signed: matches!(outcome, SignOutcome::Signed(_)),
            cleanup_error: None,
        })
    }
}
