//! Generated source emission.
//!
//! An [`Emitter`] writes one output target: a header, a `pub mod` wrapper,
//! and one function per symbol. File symbols become
//! `fn() -> Cow<'static, [u8]>`; directory symbols become
//! `fn() -> BTreeMap<&'static str, Cow<'static, [u8]>>` keyed by walked path.
//!
//! Literal assets are returned as `Cow::Borrowed`; the decoded kinds are
//! rebuilt on every call and returned as `Cow::Owned`.

use crate::encode::{Encoder, EncodingKind};
use crate::error::{Error, Result};
use crate::ident;
use crate::walk::{IgnoreSet, Walker};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Marker comment written at the top of every generated file
pub const GENERATED_MARKER: &str = "// Code generated by zpack; DO NOT EDIT.";

const COW: &str = "::std::borrow::Cow";
const MAP: &str = "::std::collections::BTreeMap";

/// Per-kind counters for emitted assets
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PackStats {
    /// Number of file symbols
    pub file_symbols: usize,
    /// Number of directory symbols
    pub dir_symbols: usize,
    /// Assets emitted as literals
    pub literal: usize,
    /// Assets emitted as base64
    pub encoded: usize,
    /// Assets emitted as compressed base64
    pub compressed: usize,
    /// Total size of all source content
    pub bytes_in: u64,
}

impl PackStats {
    /// Total number of assets emitted
    pub fn assets(&self) -> usize {
        self.literal + self.encoded + self.compressed
    }

    fn record(&mut self, kind: EncodingKind, len: usize) {
        match kind {
            EncodingKind::Literal => self.literal += 1,
            EncodingKind::Encoded => self.encoded += 1,
            EncodingKind::CompressedEncoded => self.compressed += 1,
        }
        self.bytes_in += len as u64;
    }

    /// Add the counters of `other` to `self`
    pub fn merge(&mut self, other: &PackStats) {
        self.file_symbols += other.file_symbols;
        self.dir_symbols += other.dir_symbols;
        self.literal += other.literal;
        self.encoded += other.encoded;
        self.compressed += other.compressed;
        self.bytes_in += other.bytes_in;
    }
}

/// A single asset, ready to be written
#[derive(Debug, Clone)]
pub struct AssetEntry {
    /// Source path the content was read from
    pub path: PathBuf,
    /// Chosen encoding
    pub kind: EncodingKind,
    /// `Cow` expression wrapping the encoded content
    pub value: String,
}

/// Derive the module name for an output target.
///
/// Uses the name of the directory containing `target`, falling back to the
/// file stem when the target has no named parent (`pack.rs`, `/pack.rs`).
pub fn module_name(target: &Path) -> Result<String> {
    let from_parent = target
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str());
    let from_stem = target.file_stem().and_then(|n| n.to_str());

    from_parent
        .and_then(ident::symbol_name)
        .or_else(|| from_stem.and_then(ident::symbol_name))
        .ok_or_else(|| Error::invalid_module_name(target))
}

/// Writes the generated source for one output target
pub struct Emitter<'a, W: Write> {
    writer: W,
    target: &'a Path,
    encoder: &'a Encoder,
    ignore: &'a IgnoreSet,
    verify: bool,
    stats: PackStats,
}

impl<'a, W: Write> Emitter<'a, W> {
    /// Creates an emitter writing `target` into `writer`
    pub fn new(writer: W, target: &'a Path, encoder: &'a Encoder, ignore: &'a IgnoreSet) -> Self {
        Self {
            writer,
            target,
            encoder,
            ignore,
            verify: false,
            stats: PackStats::default(),
        }
    }

    /// Decode every asset after encoding and fail if it does not match its source
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    fn out(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.writer
            .write_fmt(args)
            .map_err(|e| Error::file_write(self.target, e))
    }

    /// Write the generation marker and open the module
    pub fn header(&mut self, module: &str) -> Result<()> {
        let module = ident::to_rust_ident(module).into_owned();
        self.out(format_args!(
            "{GENERATED_MARKER}\n\n\
             #[allow(dead_code, unused_mut, non_snake_case, clippy::all)]\n\
             pub mod {module} {{\n"
        ))
    }

    fn check_symbol(&self, name: &str) -> Result<()> {
        if ident::is_symbol_name(name) {
            Ok(())
        } else {
            Err(Error::invalid_symbol(self.target, name))
        }
    }

    /// Encode one asset and wrap it in a `Cow` expression
    pub fn asset(&mut self, path: &Path, data: &[u8]) -> Result<AssetEntry> {
        let encoding = self.encoder.encode(path, data)?;
        if self.verify {
            let decoded = encoding.decode().map_err(|e| Error::verify(path, e))?;
            if decoded != data {
                return Err(Error::verify(path, "decoded bytes differ from source"));
            }
        }

        let kind = encoding.kind();
        trace!("{} -> {} ({} bytes)", path.display(), kind, data.len());
        self.stats.record(kind, data.len());

        let value = match kind {
            EncodingKind::Literal => format!("{COW}::Borrowed({})", encoding.expr()),
            EncodingKind::Encoded | EncodingKind::CompressedEncoded => {
                format!("{COW}::Owned({})", encoding.expr())
            }
        };

        Ok(AssetEntry {
            path: path.to_path_buf(),
            kind,
            value,
        })
    }

    /// Emit a scalar symbol for a single file
    pub fn file(&mut self, name: &str, path: &Path) -> Result<()> {
        self.check_symbol(name)?;
        debug!("Packing file {} as {}", path.display(), name);

        let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
        let entry = self.asset(path, &data)?;
        let fn_name = ident::to_rust_ident(name).into_owned();

        self.out(format_args!(
            "\n    pub fn {fn_name}() -> {COW}<'static, [u8]> {{\n\
             {}\n    \
             }}\n",
            entry.value
        ))?;
        self.stats.file_symbols += 1;
        Ok(())
    }

    /// Emit a path-keyed map symbol for every file below `root`
    pub fn dir(&mut self, name: &str, root: &Path) -> Result<()> {
        self.check_symbol(name)?;
        debug!("Packing directory {} as {}", root.display(), name);

        let fn_name = ident::to_rust_ident(name).into_owned();
        self.out(format_args!(
            "\n    pub fn {fn_name}() -> {MAP}<&'static str, {COW}<'static, [u8]>> {{\n        \
             let mut map: {MAP}<&'static str, {COW}<'static, [u8]>> = {MAP}::new();\n"
        ))?;

        let ignore = self.ignore;
        let mut count = 0usize;
        for item in Walker::new(root, ignore) {
            let walked = item?;
            let entry = self.asset(&walked.path, &walked.data)?;
            self.out(format_args!(
                "        map.insert({:?}, {});\n",
                walked.key, entry.value
            ))?;
            count += 1;
        }

        self.out(format_args!("        map\n    }}\n"))?;
        debug!("Packed {} file(s) from {}", count, root.display());
        self.stats.dir_symbols += 1;
        Ok(())
    }

    /// Returns the counters collected so far
    pub fn stats(&self) -> &PackStats {
        &self.stats
    }

    /// Close the module, flush, and hand back the writer
    pub fn finish(mut self) -> Result<(W, PackStats)> {
        self.out(format_args!("}}\n"))?;
        self.writer
            .flush()
            .map_err(|e| Error::file_write(self.target, e))?;
        Ok((self.writer, self.stats))
    }
}
