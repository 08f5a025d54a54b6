//! Pack orchestration.
//!
//! [`Packer::pack`] walks a [`PackSpec`] target by target: each target is
//! rendered by an [`Emitter`], written to disk, and handed to the
//! configured [`Formatter`]. Everything runs sequentially in sorted order.
//!
//! The first error aborts the run. Targets already written stay on disk;
//! with [`PackConfig::staged`] every target is rendered in memory first, so
//! an unreadable source leaves the file system untouched.

use crate::emit::{module_name, Emitter, PackStats};
use crate::encode::{Encoder, EncoderConfig};
use crate::error::{Error, Result};
use crate::format::{Formatter, Rustfmt};
use crate::walk::IgnoreSet;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Symbols of one output target, keyed by symbol name
pub type TargetEntries = BTreeMap<String, PathBuf>;

/// What to pack: output target path → (symbol name → source path)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSpec {
    targets: BTreeMap<PathBuf, TargetEntries>,
}

impl PackSpec {
    /// Creates an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `source` under `symbol` to the output target `target`
    ///
    /// A repeated symbol within the same target replaces the earlier source.
    pub fn entry(
        mut self,
        target: impl Into<PathBuf>,
        symbol: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Self {
        self.insert(target, symbol, source);
        self
    }

    /// Adds `source` under `symbol` to `target` in place
    pub fn insert(
        &mut self,
        target: impl Into<PathBuf>,
        symbol: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Option<PathBuf> {
        self.targets
            .entry(target.into())
            .or_default()
            .insert(symbol.into(), source.into())
    }

    /// Iterates over targets in sorted order
    pub fn targets(&self) -> impl Iterator<Item = (&Path, &TargetEntries)> {
        self.targets.iter().map(|(k, v)| (k.as_path(), v))
    }

    /// Returns the number of output targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if there are no output targets
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl<T, S, P> FromIterator<(T, S, P)> for PackSpec
where
    T: Into<PathBuf>,
    S: Into<String>,
    P: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (T, S, P)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (target, symbol, source) in iter {
            spec.insert(target, symbol, source);
        }
        spec
    }
}

/// Configuration for a pack run
#[derive(Debug, Clone, Default)]
pub struct PackConfig {
    /// Suffixes excluded from every directory walk
    pub ignore: IgnoreSet,
    /// Encoder settings
    pub encoder: EncoderConfig,
    /// Render all targets in memory before writing any of them
    pub staged: bool,
    /// Decode every asset after encoding and compare with its source
    pub verify: bool,
}

impl PackConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ignore suffix
    pub fn ignore(mut self, suffix: impl Into<String>) -> Self {
        self.ignore.insert(suffix);
        self
    }

    /// Replaces the ignore set
    pub fn ignore_set(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    /// Sets the encoder configuration
    pub fn encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Sets whether targets are staged in memory before writing
    pub fn staged(mut self, staged: bool) -> Self {
        self.staged = staged;
        self
    }

    /// Sets whether encoded assets are verified
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

/// Outcome for one written target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    /// Output file
    pub path: PathBuf,
    /// Module the declarations were wrapped in
    pub module: String,
    /// Counters for the target
    pub stats: PackStats,
}

/// Outcome of a successful pack run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    /// Written targets in the order they were written
    pub targets: Vec<TargetReport>,
}

impl PackReport {
    /// Counters summed over all targets
    pub fn totals(&self) -> PackStats {
        let mut total = PackStats::default();
        for target in &self.targets {
            total.merge(&target.stats);
        }
        total
    }
}

/// Drives emission, writing and formatting of every target in a [`PackSpec`]
pub struct Packer {
    config: PackConfig,
    encoder: Encoder,
    formatter: Box<dyn Formatter>,
}

impl Default for Packer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Packer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Packer {
    /// Creates a packer with default config that formats with `rustfmt`
    pub fn new() -> Self {
        Self::with_config(PackConfig::default())
    }

    /// Creates a packer with custom configuration
    pub fn with_config(config: PackConfig) -> Self {
        Self {
            encoder: Encoder::with_config(config.encoder.clone()),
            config,
            formatter: Box::new(Rustfmt::default()),
        }
    }

    /// Replaces the formatter run on every written target
    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Returns the pack configuration
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Pack every target in `spec`
    pub fn pack(&self, spec: &PackSpec) -> Result<PackReport> {
        info!("Packing {} target(s)", spec.len());

        let report = if self.config.staged {
            self.pack_staged(spec)?
        } else {
            self.pack_streaming(spec)?
        };

        let totals = report.totals();
        info!(
            "Packed {} asset(s): {} literal, {} encoded, {} compressed",
            totals.assets(),
            totals.literal,
            totals.encoded,
            totals.compressed
        );
        Ok(report)
    }

    fn pack_streaming(&self, spec: &PackSpec) -> Result<PackReport> {
        let mut report = PackReport::default();

        for (target, entries) in spec.targets() {
            let module = module_name(target)?;
            check_symbols(target, entries)?;

            debug!("Writing {}", target.display());
            let file = File::create(target).map_err(|e| Error::file_write(target, e))?;
            let (writer, stats) = self.render(target, &module, entries, BufWriter::new(file))?;
            let file = writer
                .into_inner()
                .map_err(|e| Error::file_write(target, e.into_error()))?;
            drop(file);

            self.formatter.format(target)?;
            report.targets.push(TargetReport {
                path: target.to_path_buf(),
                module,
                stats,
            });
        }

        Ok(report)
    }

    fn pack_staged(&self, spec: &PackSpec) -> Result<PackReport> {
        let mut staged = Vec::with_capacity(spec.len());
        for (target, entries) in spec.targets() {
            let module = module_name(target)?;
            check_symbols(target, entries)?;

            debug!("Staging {}", target.display());
            let (buf, stats) = self.render(target, &module, entries, Vec::new())?;
            let target_report = TargetReport {
                path: target.to_path_buf(),
                module,
                stats,
            };
            staged.push((target, buf, target_report));
        }

        let mut report = PackReport::default();
        for (target, buf, target_report) in staged {
            debug!("Writing {}", target.display());
            let mut file = File::create(target).map_err(|e| Error::file_write(target, e))?;
            file.write_all(&buf)
                .map_err(|e| Error::file_write(target, e))?;
            drop(file);

            self.formatter.format(target)?;
            report.targets.push(target_report);
        }

        Ok(report)
    }

    fn render<W: Write>(
        &self,
        target: &Path,
        module: &str,
        entries: &TargetEntries,
        writer: W,
    ) -> Result<(W, PackStats)> {
        let mut emitter = Emitter::new(writer, target, &self.encoder, &self.config.ignore)
            .verify(self.config.verify);
        emitter.header(module)?;

        for (symbol, source) in entries {
            let metadata = std::fs::metadata(source).map_err(|e| Error::metadata(source, e))?;
            if metadata.is_dir() {
                emitter.dir(symbol, source)?;
            } else {
                emitter.file(symbol, source)?;
            }
        }

        emitter.finish()
    }
}

fn check_symbols(target: &Path, entries: &TargetEntries) -> Result<()> {
    match entries
        .keys()
        .find(|name| !crate::ident::is_symbol_name(name))
    {
        Some(name) => Err(Error::invalid_symbol(target, name.as_str())),
        None => Ok(()),
    }
}

/// Pack `spec` with default settings, ignoring the given suffixes
///
/// Shorthand for `Packer::with_config(PackConfig::new().ignore(..))`; the
/// generated files are formatted with `rustfmt`.
pub fn pack<I, S>(spec: &PackSpec, ignore: I) -> Result<PackReport>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let config = PackConfig::new().ignore_set(ignore.into_iter().collect());
    Packer::with_config(config).pack(spec)
}
