//! Pipeline configuration values.
//!
//! These are built once at startup (the CLI fills them from arguments and
//! environment variables) and handed to the pipeline, so no component reads
//! process-global state itself.

use std::time::Duration;

/// Image format handed to the image tool: bzip2-compressed, read-only.
pub const DEFAULT_FORMAT: &str = "UDBZ";

/// Static ceiling on the image size.
///
/// Not derived from the staged tree. Large bundles need a bigger value.
pub const DEFAULT_MAX_SIZE: &str = "1500m";

/// Time to let the platform release the staging volume after the image tool
/// reports completion.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(5);

/// Code signing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningConfig {
    /// Signing identity. `None` means signing was not requested.
    pub identity: Option<String>,
    /// Extra arguments forwarded verbatim to the signer.
    pub flags: Vec<String>,
}

impl SigningConfig {
    /// Builds a configuration from the raw identity and flags strings.
    ///
    /// An empty or blank identity counts as absent. Flags are split on
    /// whitespace.
    pub fn new(identity: Option<&str>, flags: Option<&str>) -> Self {
        let identity = identity
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let flags = flags
            .map(|f| f.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Self { identity, flags }
    }

    /// Whether signing was requested.
    pub fn is_enabled(&self) -> bool {
        self.identity.is_some()
    }
}

/// Disk image creation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmgSettings {
    /// Image format identifier.
    pub format: String,
    /// Maximum image size, in the image tool's size syntax (e.g. `1500m`).
    pub max_size: String,
    /// Delay after a successful build before the staging root is released.
    pub settle: Duration,
    /// Remove temporary and hidden cruft from the image.
    pub scrub: bool,
    /// Ask the image tool for verbose output.
    pub verbose: bool,
}

impl Default for DmgSettings {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            max_size: DEFAULT_MAX_SIZE.to_string(),
            settle: DEFAULT_SETTLE,
            scrub: true,
            verbose: true,
        }
    }
}
