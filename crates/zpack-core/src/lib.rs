//! # zpack-core
//!
//! A library for embedding files and directory trees in generated Rust source.
//!
//! This crate provides the core functionality for:
//! - Choosing a per-file encoding (raw literal, base64, or zlib + base64)
//! - Walking directory trees in a deterministic, filtered order
//! - Turning arbitrary names into valid identifiers
//! - Writing and formatting one generated module per output target
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`ident`]: Identifier sanitization
//! - [`walk`]: Sorted directory traversal with suffix filtering
//! - [`encode`]: Content classification and expression rendering
//! - [`emit`]: Generated module assembly
//! - [`format`]: Post-processing of written files
//! - [`pack`]: Orchestration over many output targets
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use zpack_core::{PackConfig, PackSpec, Packer};
//!
//! let spec = PackSpec::new()
//!     .entry("./src/db/pack.rs", "Schema", "./db/schema.sql")
//!     .entry("./src/handlers/pack.rs", "packPublic", "./public")
//!     .entry("./src/handlers/pack.rs", "packTpl", "./tpl");
//!
//! let packer = Packer::with_config(PackConfig::new().ignore(".keep"));
//! let report = packer.pack(&spec)?;
//! println!("packed {} assets", report.totals().assets());
//! # Ok::<(), zpack_core::Error>(())
//! ```
//!
//! The generated code calls into `base64` (and `flate2` when an asset was
//! compressed), so the crate including it must depend on both.
//!
//! ## Extensibility
//!
//! - [`Formatter`]: Replace or disable the `rustfmt` pass
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod emit;
pub mod encode;
pub mod error;
pub mod format;
pub mod ident;
pub mod pack;
pub mod walk;

// Re-export primary types for convenience
pub use emit::{AssetEntry, Emitter, PackStats};
pub use encode::{Encoder, EncoderConfig, Encoding, EncodingKind, COMPRESS_THRESHOLD};
pub use error::{Error, Result};
pub use format::{Formatter, NoopFormatter, Rustfmt};
pub use ident::{sanitize, symbol_name};
pub use pack::{pack, PackConfig, PackReport, PackSpec, Packer, TargetReport};
pub use walk::{IgnoreSet, Walker};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
