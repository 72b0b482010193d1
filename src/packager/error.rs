//! Error types for packaging operations.
//!
//! Every fallible step in the pipeline returns [`Error`]. Filesystem failures
//! carry the path that caused them, external tool failures carry the tool's
//! exit status and captured stderr.
//!
//! # Example
//!
//! ```no_run
//! use makedmg::packager::{Context, ErrorExt, Result};
//! use std::path::Path;
//!
//! fn read_license(path: &Path) -> Result<String> {
//!     let text = std::fs::read_to_string(path).fs_context("reading license file", path)?;
//!     if text.is_empty() {
//!         makedmg::bail!("license file {} is empty", path.display());
//!     }
//!     Ok(text)
//! }
//!
//! fn check(path: &Path) -> Result<()> {
//!     read_license(path).context("validating release inputs")?;
//!     Ok(())
//! }
//! ```

use std::{
    fmt::Display,
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Errors returned by the packaging pipeline.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {}: {error}", .path.display())]
    Fs {
        /// Operation being performed (e.g., "copying license file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// An external tool could not be started.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// An external tool was not found on `PATH`.
    #[error("{tool} not found: {reason}")]
    ToolNotFound {
        /// Tool name or configured path
        tool: String,
        /// Why lookup failed
        reason: String,
    },

    /// An external tool ran and exited unsuccessfully.
    #[error("{tool} exited with {}: {stderr}", .code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    ToolFailed {
        /// Tool name
        tool: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// A required input directory does not exist or is not a directory.
    #[error("{role} directory {} does not exist or is not a directory", .path.display())]
    MissingDirectory {
        /// Which input this is ("binary", "source")
        role: &'static str,
        /// The offending path
        path: PathBuf,
    },

    /// The license file is missing from the source tree.
    #[error("license file {} is missing; refusing to package without it", .path.display())]
    MissingLicense {
        /// Expected license location
        path: PathBuf,
    },

    /// No application bundle at the top of the staged tree.
    #[error("no .app bundle found in {}", .root.display())]
    NoAppBundle {
        /// Staged tree that was searched
        root: PathBuf,
    },

    /// More than one application bundle at the top of the staged tree.
    #[error("found {} .app bundles in {}, expected exactly one: {}", .found.len(), .root.display(), .found.join(", "))]
    AmbiguousAppBundle {
        /// Staged tree that was searched
        root: PathBuf,
        /// Names of every bundle found, sorted
        found: Vec<String>,
    },

    /// A path could not be used (no final component, non UTF-8, ...).
    #[error("invalid path {}: {reason}", .path.display())]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// What is wrong with it
        reason: &'static str,
    },

    /// The input tree contains a FIFO, socket or device node.
    #[error("{} is a special file (FIFO, socket or device) and cannot be staged", .path.display())]
    SpecialFile {
        /// The offending entry
        path: PathBuf,
    },

    /// An entry that must be created fresh already exists in the staged tree.
    #[error("{} already exists in the staging root", .path.display())]
    LinkExists {
        /// Path of the existing entry
        path: PathBuf,
    },

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Error walking the input tree.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// The error underneath any [`Error::Context`] layers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Error::Context(_, inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but produces [`Error::Context`].
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the
    /// operation, e.g. "reading file", "creating directory".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Early return with an [`Error::GenericError`].
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::packager::Error::GenericError(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::packager::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::packager::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
