//! Error types for the zpack-core library.
//!
//! Every variant carries the path it failed on.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for zpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all zpack operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read an input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create, write or flush a generated file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the output target
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Source path is missing or cannot be inspected
    #[error("failed to stat '{path}': {source}")]
    Metadata {
        /// The source path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("failed to walk '{path}': {source}")]
    Walk {
        /// Entry (or root) where the walk stopped
        path: PathBuf,
        /// Underlying walkdir error
        #[source]
        source: walkdir::Error,
    },

    /// Path is not valid UTF-8 and cannot be used as a map key
    #[error("path is not valid UTF-8: '{path}'")]
    NonUtf8Path {
        /// The offending path
        path: PathBuf,
    },

    /// Symbol name cannot be used as a generated item name
    #[error("invalid symbol name {name:?} in '{target}' (sanitized form: {suggestion:?})")]
    InvalidSymbol {
        /// Output target the symbol belongs to
        target: PathBuf,
        /// The rejected name
        name: String,
        /// What the sanitizer would turn it into
        suggestion: String,
    },

    /// No module name could be derived for an output target
    #[error("cannot derive a module name for '{path}'")]
    InvalidModuleName {
        /// The output target
        path: PathBuf,
    },

    /// Compressing an asset failed
    #[error("failed to compress '{path}': {source}")]
    Compress {
        /// The asset being compressed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Generated encoding does not reproduce its source
    #[error("encoded form of '{path}' does not round-trip: {details}")]
    Verify {
        /// The asset that failed verification
        path: PathBuf,
        /// What went wrong
        details: String,
    },

    /// The formatter could not be started
    #[error("failed to run formatter '{program}' on '{path}': {source}")]
    FormatterSpawn {
        /// Formatter executable
        program: PathBuf,
        /// Output target being formatted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The formatter exited unsuccessfully
    #[error("formatter failed on '{path}' ({status}): {stderr}")]
    Format {
        /// Output target being formatted
        path: PathBuf,
        /// Exit status of the formatter
        status: ExitStatus,
        /// Captured diagnostic output
        stderr: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new metadata error
    pub fn metadata(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Metadata {
            path: path.into(),
            source,
        }
    }

    /// Creates a new walk error, taking the path from the walkdir error when it has one
    pub fn walk(root: impl Into<PathBuf>, source: walkdir::Error) -> Self {
        let path = source
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| root.into());
        Self::Walk { path, source }
    }

    /// Creates a new non-UTF-8 path error
    pub fn non_utf8_path(path: impl Into<PathBuf>) -> Self {
        Self::NonUtf8Path { path: path.into() }
    }

    /// Creates a new invalid symbol error
    pub fn invalid_symbol(target: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::InvalidSymbol {
            target: target.into(),
            suggestion: crate::ident::sanitize(&name),
            name,
        }
    }

    /// Creates a new invalid module name error
    pub fn invalid_module_name(path: impl Into<PathBuf>) -> Self {
        Self::InvalidModuleName { path: path.into() }
    }

    /// Creates a new compression error
    pub fn compress(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Compress {
            path: path.into(),
            source,
        }
    }

    /// Creates a new verification error
    pub fn verify(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::Verify {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Returns the path this error is about
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::FileRead { path, .. }
            | Self::FileWrite { path, .. }
            | Self::Metadata { path, .. }
            | Self::Walk { path, .. }
            | Self::NonUtf8Path { path }
            | Self::InvalidModuleName { path }
            | Self::Compress { path, .. }
            | Self::Verify { path, .. }
            | Self::FormatterSpawn { path, .. }
            | Self::Format { path, .. } => path,
            Self::InvalidSymbol { target, .. } => target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::metadata(
            "./public/missing.css",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().contains("failed to stat"));
        assert!(err.to_string().contains("./public/missing.css"));
    }

    #[test]
    fn test_invalid_symbol_suggests_sanitized_name() {
        let err = Error::invalid_symbol("assets/pack.rs", "1-logo.png");
        match &err {
            Error::InvalidSymbol { suggestion, .. } => assert_eq!(suggestion, "v1_logo_png"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.path(), std::path::Path::new("assets/pack.rs"));
    }
}
