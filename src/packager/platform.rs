//! Host platform capabilities.

/// What the host can do beyond plain copying.
///
/// Determined once at startup with [`PlatformCapabilities::detect`] and
/// consulted by the stager (object inspection) and the signer adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// The host can code sign application bundles.
    pub code_signing: bool,
    /// Regular files are inspected for debug-only object content.
    pub object_inspection: bool,
}

impl PlatformCapabilities {
    /// Capabilities of the current host.
    pub fn detect() -> Self {
        let macos = cfg!(target_os = "macos");
        let caps = Self {
            code_signing: macos,
            object_inspection: macos,
        };
        log::debug!("Platform capabilities: {:?}", caps);
        caps
    }

    /// A host that can neither sign nor inspect objects.
    pub const fn none() -> Self {
        Self {
            code_signing: false,
            object_inspection: false,
        }
    }

    /// A host with every capability enabled.
    pub const fn all() -> Self {
        Self {
            code_signing: true,
            object_inspection: true,
        }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::detect()
    }
}
