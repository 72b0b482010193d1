//! Top-level error types for makedmg.
//!
//! Wraps pipeline errors with the stage that failed so the user always sees
//! where a run stopped, and adds recovery suggestions and exit codes.

use crate::packager;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Result type alias for makedmg operations
pub type Result<T> = std::result::Result<T, PackageError>;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Checking the request before any work starts
    Validate,
    /// Creating the staging root and copying the bundle tree
    Stage,
    /// Code signing the staged bundle
    Sign,
    /// Adding the Applications link and license file
    Augment,
    /// Running the image tool
    BuildImage,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Validate => "validating inputs",
            Stage::Stage => "staging",
            Stage::Sign => "signing",
            Stage::Augment => "augmenting",
            Stage::BuildImage => "image build",
        })
    }
}

/// Main error type for all makedmg operations
#[derive(Error, Debug)]
pub enum PackageError {
    /// A pipeline stage failed
    #[error("{stage} failed: {source}")]
    Stage {
        /// Stage that failed
        stage: Stage,
        /// Underlying error
        source: packager::Error,
    },

    /// A stage failed and removing the staging root failed as well
    #[error("{primary}; additionally failed to remove staging root {}: {cleanup}", .path.display())]
    CleanupAfterFailure {
        /// The failure that ended the run
        primary: Box<PackageError>,
        /// Staging root left behind
        path: PathBuf,
        /// Why removal failed
        cleanup: packager::Error,
    },

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// The run was interrupted by a signal
    #[error("interrupted before the disk image was finished")]
    Interrupted,

    /// Errors raised outside a pipeline stage
    #[error("{0}")]
    Packager(#[from] packager::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl PackageError {
    /// Wraps `source` as a failure of `stage`.
    pub fn stage(stage: Stage, source: packager::Error) -> Self {
        PackageError::Stage { stage, source }
    }

    /// Stage the failure is attributed to, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            PackageError::Stage { stage, .. } => Some(*stage),
            PackageError::CleanupAfterFailure { primary, .. } => primary.failed_stage(),
            _ => None,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PackageError::Cli(_) => 2,
            PackageError::Interrupted => 130,
            PackageError::CleanupAfterFailure { primary, .. } => primary.exit_code(),
            _ => 1,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use packager::Error as E;

        match self {
            PackageError::Stage { source, .. } => match source.root_cause() {
                E::MissingLicense { path } => vec![
                    format!("Make sure {} exists", path.display()),
                    "Check that source_directory points at the source checkout".to_string(),
                ],
                E::MissingDirectory { role, .. } => vec![format!(
                    "Check the {role}_directory argument; it must be an existing directory"
                )],
                E::SpecialFile { path } => vec![format!(
                    "Remove {} from binary_directory; pipes, sockets and devices cannot be packaged",
                    path.display()
                )],
                E::NoAppBundle { .. } | E::AmbiguousAppBundle { .. } => vec![
                    "binary_directory must contain exactly one .app bundle at its top level"
                        .to_string(),
                ],
                E::ToolNotFound { tool, .. } => vec![
                    format!("Install {tool} or point --hdiutil / --codesign at it"),
                    "Disk images can only be built on macOS".to_string(),
                ],
                E::ToolFailed { tool, .. } if tool == "codesign" => vec![
                    "List usable identities: security find-identity -v -p codesigning".to_string(),
                    "Check SIGNING_IDENTITY and SIGNING_FLAGS".to_string(),
                ],
                E::ToolFailed { tool, .. } if tool == "hdiutil" => vec![
                    "Raise the image size limit with --max-size or DMG_MAX_SIZE".to_string(),
                    "Check free space on the target volume".to_string(),
                ],
                _ => vec!["Check the error message above for specific details".to_string()],
            },
            PackageError::CleanupAfterFailure { primary, path, .. } => {
                let mut suggestions = primary.recovery_suggestions();
                suggestions.push(format!("Remove {} manually", path.display()));
                suggestions
            }
            PackageError::Cli(_) => vec!["Run with --help for usage".to_string()],
            PackageError::Interrupted => Vec::new(),
            PackageError::Packager(_) => {
                vec!["Check the error message above for specific details".to_string()]
            }
        }
    }
}
