//! # makedmg
//!
//! Packages a built application directory into a compressed macOS disk
//! image.
//!
//! The pipeline copies the binary directory into a private staging root
//! (skipping debug symbols), signs the contained `.app` bundle when the
//! host supports it and an identity is configured, adds an
//! `Applications` shortcut and the license file, and finally hands the
//! staged folder to `hdiutil`. The staging root is removed on every exit
//! path.
//!
//! ## Usage
//!
//! ```bash
//! makedmg out/MyApp.dmg "My App" ~/src/myapp ~/build/myapp
//! SIGNING_IDENTITY="Developer ID Application: Example" makedmg ...
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod error;
pub mod packager;

pub use cli::Args;
pub use error::{CliError, PackageError, Result, Stage};
pub use packager::{PackagedImage, Packager, PackagingRequest};
