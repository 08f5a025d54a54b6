//! zpack - Embed files and directory trees in generated Rust source
//!
//! This tool reads files and directories and writes a Rust module exposing
//! their contents as functions, so a program can ship static assets
//! without reading them from disk at runtime.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;
use zpack_core::{
    symbol_name, IgnoreSet, NoopFormatter, PackConfig, PackReport, PackSpec, Packer, Rustfmt,
};

/// Embed files and directory trees in generated Rust source
#[derive(Parser, Debug)]
#[command(name = "zpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Generated Rust file to write
    #[arg(short, long)]
    output: PathBuf,

    /// Assets to pack, as NAME=PATH or PATH (name derived from the file name)
    #[arg(required = true, value_name = "ENTRY")]
    entries: Vec<String>,

    /// Skip files whose path ends with this suffix (repeatable)
    #[arg(short, long = "ignore", value_name = "SUFFIX")]
    ignore: Vec<String>,

    /// Do not run rustfmt on the generated file
    #[arg(long)]
    no_format: bool,

    /// rustfmt executable to run on the generated file
    #[arg(long, env = "ZPACK_RUSTFMT", default_value = "rustfmt")]
    rustfmt: PathBuf,

    /// Edition passed to rustfmt
    #[arg(long, default_value = "2021")]
    edition: String,

    /// Render everything in memory before writing
    #[arg(long)]
    staged: bool,

    /// Decode every asset after encoding and check it against the source
    #[arg(long)]
    verify: bool,

    /// Print a blake3 digest of the generated file
    #[arg(long)]
    digest: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let spec = build_spec(&cli)?;
    let report = run(&cli, &spec)?;
    print_report(&cli, &report)
}

/// Parse a `NAME=PATH` or `PATH` entry
fn parse_entry(entry: &str) -> Result<(String, PathBuf)> {
    if let Some((name, path)) = entry.split_once('=') {
        if name.is_empty() {
            bail!("Empty symbol name in entry: {}", entry);
        }
        if path.is_empty() {
            bail!("Empty path in entry: {}", entry);
        }
        return Ok((name.to_string(), PathBuf::from(path)));
    }

    let path = PathBuf::from(entry);
    let stem = Path::new(entry)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match symbol_name(stem) {
        Some(name) => Ok((name, path)),
        None => bail!(
            "Cannot derive a symbol name from '{}'; use NAME=PATH",
            entry
        ),
    }
}

/// Build the pack spec for the single output target
fn build_spec(cli: &Cli) -> Result<PackSpec> {
    let mut spec = PackSpec::new();
    for entry in &cli.entries {
        let (name, path) = parse_entry(entry)?;
        debug!("Entry {} -> {}", name, path.display());
        if spec.insert(&cli.output, name.clone(), path).is_some() {
            bail!("Symbol '{}' given more than once", name);
        }
    }
    Ok(spec)
}

/// Run the packer with the configuration from the command line
fn run(cli: &Cli, spec: &PackSpec) -> Result<PackReport> {
    if let Some(parent) = cli.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            bail!("Output directory does not exist: {}", parent.display());
        }
    }

    let ignore: IgnoreSet = cli.ignore.iter().cloned().collect();
    let config = PackConfig::new()
        .ignore_set(ignore)
        .staged(cli.staged)
        .verify(cli.verify);

    let packer = Packer::with_config(config);
    let packer = if cli.no_format {
        packer.formatter(NoopFormatter)
    } else {
        packer.formatter(
            Rustfmt::new()
                .program(&cli.rustfmt)
                .edition(&cli.edition),
        )
    };

    packer
        .pack(spec)
        .with_context(|| format!("Failed to pack {}", cli.output.display()))
}

/// Print what was written, with an optional content digest
fn print_report(cli: &Cli, report: &PackReport) -> Result<()> {
    for target in &report.targets {
        let stats = &target.stats;
        println!(
            "Wrote {} ({} assets: {} literal, {} encoded, {} compressed)",
            target.path.display(),
            stats.assets(),
            stats.literal,
            stats.encoded,
            stats.compressed
        );

        if cli.digest {
            let data = fs::read(&target.path)
                .with_context(|| format!("Failed to read output file: {}", target.path.display()))?;
            println!("{}  {}", content_digest(&data), target.path.display());
        }
    }

    info!("Packed {} bytes of input", report.totals().bytes_in);
    Ok(())
}

/// Short hex digest of generated content (first 16 chars of blake3)
fn content_digest(data: &[u8]) -> String {
    blake3::hash(data).to_hex()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_entry_named() {
        let (name, path) = parse_entry("packPublic=./public").unwrap();
        assert_eq!(name, "packPublic");
        assert_eq!(path, PathBuf::from("./public"));
    }

    #[test]
    fn test_parse_entry_derived_name() {
        let (name, path) = parse_entry("db/schema.sql").unwrap();
        assert_eq!(name, "schema");
        assert_eq!(path, PathBuf::from("db/schema.sql"));

        let (name, _) = parse_entry("assets/2x-logo.min.svg").unwrap();
        assert_eq!(name, "v2x_logo_min");
    }

    #[test]
    fn test_parse_entry_rejects_empty_parts() {
        assert!(parse_entry("=path").is_err());
        assert!(parse_entry("name=").is_err());
        assert!(parse_entry("..").is_err());
    }

    #[test]
    fn test_content_digest() {
        let a = content_digest(b"hello");
        assert_eq!(a, content_digest(b"hello"));
        assert_ne!(a, content_digest(b"world"));
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_run_without_formatter() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("hello.txt");
        fs::write(&source, "hello").unwrap();
        let output = tmp.path().join("pack.rs");

        let args: Vec<std::ffi::OsString> = vec![
            "zpack".into(),
            "--no-format".into(),
            "-o".into(),
            output.clone().into(),
            source.clone().into(),
        ];
        let cli = Cli::parse_from(args);
        let spec = build_spec(&cli).unwrap();
        let report = run(&cli, &spec).unwrap();

        assert_eq!(report.targets.len(), 1);
        let generated = fs::read_to_string(&output).unwrap();
        assert!(generated.contains("pub fn hello()"));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let cli = Cli::parse_from(["zpack", "-o", "pack.rs", "a=x.txt", "a=y.txt"]);
        assert!(build_spec(&cli).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
