//! Disk image packaging pipeline.
//!
//! Turns a built application bundle tree into a compressed, read-only disk
//! image with a drag-to-install layout:
//!
//! ```text
//! <volume>/
//! ├── MyApp.app            (debug artifacts removed, optionally signed)
//! ├── Applications -> /Applications
//! └── LICENSE.GPL3-EXCEPT
//! ```
//!
//! # Stages
//!
//! | Stage | Module | External tool |
//! |-------|--------|---------------|
//! | Staging | [`staging`], [`filter`] | none |
//! | Signing | [`sign`] | `codesign` |
//! | Augmenting | [`augment`] | none |
//! | Image build | [`image`] | `hdiutil` |
//!
//! [`Packager`] runs them in order and guarantees the temporary staging root
//! is gone afterwards.
//!
//! # Example
//!
//! ```no_run
//! use makedmg::packager::{Codesign, HdiUtil, Packager, PackagingRequest, SigningConfig};
//!
//! # async fn example() -> Result<(), makedmg::PackageError> {
//! let request = PackagingRequest::new("out/MyApp.dmg", "MyApp", ".", "build/install")?;
//! let packager = Packager::new(Codesign::default(), HdiUtil::default())
//!     .with_signing(SigningConfig::new(Some("Developer ID Application: Example"), None));
//!
//! let image = packager.package(&request).await?;
//! println!("{} ({} bytes, sha256 {})", image.path.display(), image.size, image.checksum);
//! # Ok(())
//! # }
//! ```

pub mod augment;
pub mod checksum;
pub mod error;
pub mod filter;
pub mod image;
pub mod pipeline;
pub mod platform;
pub mod request;
pub mod settings;
pub mod sign;
pub mod staging;
pub mod tool;
pub mod utils;

pub use error::{Context, Error, ErrorExt, Result};
pub use filter::{DebugArtifactFilter, EntryKind, FilterPolicy, KeepAll};
pub use image::{HdiUtil, ImageCreator, ImageParams};
pub use pipeline::{PackagedImage, Packager, ProgressFn};
pub use platform::PlatformCapabilities;
pub use request::{IMAGE_EXTENSION, LICENSE_FILE, PackagingRequest};
pub use settings::{DmgSettings, SigningConfig};
pub use sign::{CodeSigner, Codesign, SignOutcome};
pub use staging::StagingRoot;
