//! Writes fixture assets into `OUT_DIR` and packs them into `assets/pack.rs`.

use anyhow::Context;
use std::fs;
use std::path::PathBuf;
use zpack_core::{NoopFormatter, PackConfig, PackSpec, Packer, COMPRESS_THRESHOLD};

/// Deterministic pseudo-random bytes (xorshift)
fn noise(len: usize, mut state: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        out.push((state >> 24) as u8);
    }
    out
}

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let out = PathBuf::from(std::env::var("OUT_DIR").context("OUT_DIR not set")?);
    let fixtures = out.join("fixtures");
    fs::create_dir_all(fixtures.join("tree/sub"))?;
    fs::create_dir_all(out.join("assets"))?;

    let hashes = "#".repeat(300);
    let text = format!(
        "line one\r\nsay \"hi\" and \"#tag\"## r#\"raw\"#\r\r\n\"{hashes}\nunicode: héllo 日本語\r"
    );
    fs::write(fixtures.join("text.txt"), text)?;
    fs::write(fixtures.join("empty.txt"), "")?;
    fs::write(fixtures.join("blob.bin"), [0u8, 1, 2, 0xff, 0xfe, b'"', b'#'])?;

    let mut big = noise(COMPRESS_THRESHOLD, 0x9E37_79B9);
    big.extend(std::iter::repeat(0u8).take(COMPRESS_THRESHOLD));
    fs::write(fixtures.join("big.bin"), big)?;

    fs::write(fixtures.join("tree/a.txt"), "alpha\r\n")?;
    fs::write(fixtures.join("tree/sub/b.bin"), noise(64, 7))?;
    fs::write(fixtures.join("tree/sub/.keep"), "")?;

    let target = out.join("assets/pack.rs");
    let spec = PackSpec::new()
        .entry(&target, "text", fixtures.join("text.txt"))
        .entry(&target, "empty", fixtures.join("empty.txt"))
        .entry(&target, "type", fixtures.join("blob.bin"))
        .entry(&target, "big", fixtures.join("big.bin"))
        .entry(&target, "tree", fixtures.join("tree"));

    Packer::with_config(PackConfig::new().ignore(".keep").verify(true))
        .formatter(NoopFormatter)
        .pack(&spec)
        .context("packing fixtures")?;
    Ok(())
}
