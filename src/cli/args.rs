//! Command line argument parsing and validation.
//!
//! Four positional arguments describe the run. Signing and image settings
//! are options that can also come from the environment, which is how release
//! automation usually supplies them.

use crate::packager::{DmgSettings, SigningConfig, settings};
use clap::Parser;
use regex::Regex;
use std::{path::PathBuf, sync::LazyLock, time::Duration};

static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9]+[bkmgtpe]?$").expect("size regex is valid")
});

/// Create a disk image, filtering out debug information files
#[derive(Parser, Debug, Clone)]
#[command(
    name = "makedmg",
    version,
    about = "Create a disk image, filtering out debug information files",
    long_about = "Stages a copy of the application bundle without debug information, signs it \
when configured, adds an Applications shortcut and the license file, and compresses the \
result into a read-only disk image.

Usage:
  makedmg MyApp.dmg MyApp ~/src/myapp ~/build/myapp/install

Exit code 0 = the disk image exists at target_diskimage.",
    after_help = "To sign the contents before packaging on macOS, set the SIGNING_IDENTITY \
and optionally the SIGNING_FLAGS environment variables."
)]
pub struct Args {
    /// Output .dmg file to create
    #[arg(index = 1, value_name = "TARGET_DISKIMAGE")]
    pub target_diskimage: PathBuf,

    /// Volume name to use for the disk image
    #[arg(index = 2, value_name = "DMG_VOLUMENAME")]
    pub dmg_volumename: String,

    /// Directory with the application sources (holds the license file)
    #[arg(index = 3, value_name = "SOURCE_DIRECTORY")]
    pub source_directory: PathBuf,

    /// Directory that contains the application bundle
    #[arg(index = 4, value_name = "BINARY_DIRECTORY")]
    pub binary_directory: PathBuf,

    /// Code signing identity; signing is skipped when unset
    #[arg(long, env = "SIGNING_IDENTITY", hide_env_values = true)]
    pub signing_identity: Option<String>,

    /// Extra arguments for the signer, separated by whitespace
    #[arg(long, env = "SIGNING_FLAGS", allow_hyphen_values = true)]
    pub signing_flags: Option<String>,

    /// Maximum image size (e.g. 1500m, 4g)
    #[arg(long, env = "DMG_MAX_SIZE", default_value = settings::DEFAULT_MAX_SIZE)]
    pub max_size: String,

    /// Seconds to wait after image creation before cleaning up
    #[arg(long, value_name = "SECONDS", default_value_t = settings::DEFAULT_SETTLE.as_secs())]
    pub settle_secs: u64,

    /// hdiutil executable
    #[arg(long, env = "HDIUTIL", default_value = "hdiutil")]
    pub hdiutil: PathBuf,

    /// codesign executable
    #[arg(long, env = "CODESIGN", default_value = "codesign")]
    pub codesign: PathBuf,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !SIZE_PATTERN.is_match(&self.max_size) {
            return Err(format!(
                "Invalid maximum image size: {}. Expected a number with an optional \
                 b/k/m/g/t/p/e suffix, e.g. 1500m",
                self.max_size
            ));
        }

        Ok(())
    }

    /// Signing configuration from the identity and flags options.
    pub fn signing_config(&self) -> SigningConfig {
        SigningConfig::new(self.signing_identity.as_deref(), self.signing_flags.as_deref())
    }

    /// Image settings from the size and settle options.
    pub fn dmg_settings(&self) -> DmgSettings {
        DmgSettings {
            max_size: self.max_size.clone(),
            settle: Duration::from_secs(self.settle_secs),
            ..Default::default()
        }
    }
}
