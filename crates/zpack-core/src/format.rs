//! Source formatting of generated files.
//!
//! The emitter writes syntactically valid but loosely indented code; a
//! [`Formatter`] rewrites each finished target in place.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Rewrites a generated file in place.
///
/// Closures taking a path implement this trait, which is handy for tests
/// and for callers that want to run their own tooling:
///
/// ```
/// use zpack_core::format::Formatter;
/// use std::path::Path;
///
/// let formatter = |path: &Path| -> zpack_core::Result<()> {
///     println!("would format {}", path.display());
///     Ok(())
/// };
/// formatter.format(Path::new("src/assets/pack.rs"))?;
/// # Ok::<(), zpack_core::Error>(())
/// ```
pub trait Formatter {
    /// Format the file at `path`
    fn format(&self, path: &Path) -> Result<()>;
}

impl<F> Formatter for F
where
    F: Fn(&Path) -> Result<()>,
{
    fn format(&self, path: &Path) -> Result<()> {
        self(path)
    }
}

/// Leaves generated files untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Runs `rustfmt` on each generated file
#[derive(Debug, Clone)]
pub struct Rustfmt {
    program: PathBuf,
    edition: String,
}

impl Default for Rustfmt {
    fn default() -> Self {
        Self {
            program: PathBuf::from("rustfmt"),
            edition: "2021".to_string(),
        }
    }
}

impl Rustfmt {
    /// Creates a formatter running `rustfmt` from `PATH` with edition 2021
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the formatter executable
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the edition passed to `--edition`
    pub fn edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = edition.into();
        self
    }
}

impl Formatter for Rustfmt {
    fn format(&self, path: &Path) -> Result<()> {
        debug!("Running {} on {}", self.program.display(), path.display());

        let output = Command::new(&self.program)
            .arg("--edition")
            .arg(&self.edition)
            .arg(path)
            .output()
            .map_err(|source| Error::FormatterSpawn {
                program: self.program.clone(),
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                stderr = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(Error::Format {
                path: path.to_path_buf(),
                status: output.status,
                stderr,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_noop_formatter() {
        assert!(NoopFormatter.format(Path::new("does/not/matter.rs")).is_ok());
    }

    #[test]
    fn test_closure_formatter() {
        let seen = RefCell::new(Vec::new());
        let formatter = |path: &Path| -> Result<()> {
            seen.borrow_mut().push(path.to_path_buf());
            Ok(())
        };
        formatter.format(Path::new("a/pack.rs")).unwrap();
        assert_eq!(*seen.borrow(), vec![PathBuf::from("a/pack.rs")]);
    }

    #[test]
    fn test_missing_program() {
        let formatter = Rustfmt::new().program("zpack-no-such-formatter");
        let err = formatter.format(Path::new("pack.rs")).unwrap_err();
        assert!(matches!(err, Error::FormatterSpawn { .. }));
        assert!(err.to_string().contains("zpack-no-such-formatter"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program() {
        let formatter = Rustfmt::new().program("false");
        let err = formatter.format(Path::new("pack.rs")).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }
}
