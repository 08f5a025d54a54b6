//! Content encoding for embedded assets.
//!
//! Every asset is rendered as a Rust expression by [`Encoder::encode`].
//! The kind of expression is decided from the bytes alone:
//!
//! | Content                                  | Kind                                  |
//! |------------------------------------------|---------------------------------------|
//! | valid UTF-8 without NUL bytes            | [`EncodingKind::Literal`]             |
//! | anything else, up to the threshold       | [`EncodingKind::Encoded`]             |
//! | anything else, larger than the threshold | [`EncodingKind::CompressedEncoded`]   |
//!
//! Literal assets become raw string literals and cost nothing at runtime.
//! The other two kinds become blocks that base64-decode (and inflate) on
//! every evaluation; callers wanting repeated access should keep the result.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// Content longer than this many bytes is compressed before encoding (100 KiB)
pub const COMPRESS_THRESHOLD: usize = 100 * 1024;

/// rustc limit on the `#` marks delimiting a raw string literal
const MAX_RAW_HASHES: usize = 255;

/// How an asset is represented in generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingKind {
    /// Raw string literal, content reproduced verbatim
    Literal,
    /// Base64 text decoded on use
    Encoded,
    /// Zlib-compressed, then base64; decoded and inflated on use
    CompressedEncoded,
}

impl EncodingKind {
    /// Returns a short lowercase name for logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            EncodingKind::Literal => "literal",
            EncodingKind::Encoded => "encoded",
            EncodingKind::CompressedEncoded => "compressed",
        }
    }

    /// Returns true if the generated expression allocates on every use
    pub fn is_decoded(&self) -> bool {
        !matches!(self, EncodingKind::Literal)
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the encoder
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Non-text content longer than this is compressed
    pub compress_threshold: usize,
    /// Zlib compression level
    pub compression: Compression,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            compress_threshold: COMPRESS_THRESHOLD,
            compression: Compression::default(),
        }
    }
}

impl EncoderConfig {
    /// Creates a new encoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression threshold
    pub fn compress_threshold(mut self, bytes: usize) -> Self {
        self.compress_threshold = bytes;
        self
    }

    /// Sets the zlib compression level
    pub fn compression(mut self, level: Compression) -> Self {
        self.compression = level;
        self
    }
}

/// An encoded asset: its kind plus the payload the expression is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    kind: EncodingKind,
    /// Original text for literals, base64 text otherwise
    payload: String,
}

impl Encoding {
    /// Returns the encoding kind
    pub fn kind(&self) -> EncodingKind {
        self.kind
    }

    /// Returns the literal text or base64 payload
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Render the generated Rust expression.
    ///
    /// Literals have type `&'static [u8]`; the decoded kinds evaluate to
    /// `Vec<u8>`.
    pub fn expr(&self) -> String {
        match self.kind {
            EncodingKind::Literal => literal_expr(&self.payload),
            EncodingKind::Encoded => format!(
                "{{\n\
                 use ::base64::Engine as _;\n\
                 ::base64::engine::general_purpose::STANDARD_NO_PAD\n\
                 .decode(\"{}\")\n\
                 .unwrap_or_else(|err| unreachable!(\"corrupt packed asset: {{}}\", err))\n\
                 }}",
                self.payload
            ),
            EncodingKind::CompressedEncoded => format!(
                "{{\n\
                 use ::base64::Engine as _;\n\
                 use ::std::io::Read as _;\n\
                 let z = ::base64::engine::general_purpose::STANDARD_NO_PAD\n\
                 .decode(\"{}\")\n\
                 .unwrap_or_else(|err| unreachable!(\"corrupt packed asset: {{}}\", err));\n\
                 let mut s = ::std::vec::Vec::new();\n\
                 ::flate2::read::ZlibDecoder::new(z.as_slice())\n\
                 .read_to_end(&mut s)\n\
                 .unwrap_or_else(|err| unreachable!(\"corrupt packed asset: {{}}\", err));\n\
                 s\n\
                 }}",
                self.payload
            ),
        }
    }

    /// Reverse the encoding, reproducing the original bytes
    pub fn decode(&self) -> std::result::Result<Vec<u8>, String> {
        match self.kind {
            EncodingKind::Literal => Ok(self.payload.clone().into_bytes()),
            EncodingKind::Encoded => STANDARD_NO_PAD
                .decode(&self.payload)
                .map_err(|e| format!("base64: {e}")),
            EncodingKind::CompressedEncoded => {
                let z = STANDARD_NO_PAD
                    .decode(&self.payload)
                    .map_err(|e| format!("base64: {e}"))?;
                let mut out = Vec::new();
                ZlibDecoder::new(z.as_slice())
                    .read_to_end(&mut out)
                    .map_err(|e| format!("zlib: {e}"))?;
                Ok(out)
            }
        }
    }
}

/// Encodes raw bytes into generated expressions
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: EncoderConfig,
}

impl Encoder {
    /// Creates an encoder with the default threshold and compression level
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an encoder with custom configuration
    pub fn with_config(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Returns the encoder configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Decide how `data` will be encoded
    pub fn classify(&self, data: &[u8]) -> EncodingKind {
        if !data.contains(&0) && std::str::from_utf8(data).is_ok() {
            EncodingKind::Literal
        } else if data.len() > self.config.compress_threshold {
            EncodingKind::CompressedEncoded
        } else {
            EncodingKind::Encoded
        }
    }

    /// Encode `data`; `path` is only used to annotate errors
    pub fn encode(&self, path: &Path, data: &[u8]) -> Result<Encoding> {
        let kind = self.classify(data);
        let payload = match kind {
            // Classified as valid UTF-8, so the lossy conversion is exact
            EncodingKind::Literal => String::from_utf8_lossy(data).into_owned(),
            EncodingKind::Encoded => STANDARD_NO_PAD.encode(data),
            EncodingKind::CompressedEncoded => {
                let mut z = ZlibEncoder::new(Vec::new(), self.config.compression);
                z.write_all(data).map_err(|e| Error::compress(path, e))?;
                let compressed = z.finish().map_err(|e| Error::compress(path, e))?;
                STANDARD_NO_PAD.encode(compressed)
            }
        };

        Ok(Encoding { kind, payload })
    }
}

/// Render `text` as a `&'static [u8]` expression built from raw string literals.
///
/// Raw literals keep the text verbatim except for carriage returns, which
/// Rust source cannot hold inside a raw literal; those are split out and
/// joined back with `concat!`. Text is also split after any `"` followed by
/// more `#` marks than a raw literal delimiter may have.
fn literal_expr(text: &str) -> String {
    let mut pieces = Vec::new();
    for (i, segment) in text.split('\r').enumerate() {
        if i > 0 {
            pieces.push("\"\\r\"".to_string());
        }
        for part in split_long_delimiters(segment) {
            if !part.is_empty() {
                pieces.push(raw_literal(part));
            }
        }
    }
    if pieces.is_empty() {
        pieces.push(raw_literal(""));
    }

    match pieces.len() {
        1 => format!("{}.as_bytes()", pieces[0]),
        _ => format!("concat!({}).as_bytes()", pieces.join(", ")),
    }
}

/// Split `text` right after every `"` whose following `#` run would need a
/// delimiter wider than [`MAX_RAW_HASHES`]
fn split_long_delimiters(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices('"') {
        let run = bytes[i + 1..].iter().take_while(|&&b| b == b'#').count();
        if run >= MAX_RAW_HASHES {
            parts.push(&text[start..=i]);
            start = i + 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Wrap `text` in a raw string literal whose `#` count cannot be terminated early
fn raw_literal(text: &str) -> String {
    let hashes = "#".repeat(delimiter_width(text));
    format!("r{hashes}\"{text}\"{hashes}")
}

/// Number of `#` needed so no `"#...` run inside `text` closes the literal
fn delimiter_width(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut longest = 0;
    for (i, _) in text.match_indices('"') {
        let run = bytes[i + 1..].iter().take_while(|&&b| b == b'#').count();
        longest = longest.max(run);
    }
    longest + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Deterministic pseudo-random bytes (xorshift) that are never valid UTF-8
    fn binary(len: usize) -> Vec<u8> {
        let mut state: u32 = 0x9E37_79B9;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            out.push(state as u8);
        }
        if let Some(first) = out.first_mut() {
            *first = 0xFF;
        }
        out
    }

    fn encode(data: &[u8]) -> Encoding {
        Encoder::new().encode(Path::new("test"), data).unwrap()
    }

    #[test]
    fn test_classify() {
        let encoder = Encoder::new();
        assert_eq!(encoder.classify(b""), EncodingKind::Literal);
        assert_eq!(encoder.classify(b"hello world\n"), EncodingKind::Literal);
        assert_eq!(encoder.classify("żółw".as_bytes()), EncodingKind::Literal);
        assert_eq!(encoder.classify(b"nul\0byte"), EncodingKind::Encoded);
        assert_eq!(encoder.classify(&[0xC3, 0x28]), EncodingKind::Encoded);
    }

    #[test]
    fn test_classify_threshold_boundary() {
        let encoder = Encoder::new();
        assert_eq!(encoder.classify(&binary(102_400)), EncodingKind::Encoded);
        assert_eq!(
            encoder.classify(&binary(102_401)),
            EncodingKind::CompressedEncoded
        );

        // Large text is never compressed
        let text = "a".repeat(200 * 1024);
        assert_eq!(encoder.classify(text.as_bytes()), EncodingKind::Literal);
    }

    #[test]
    fn test_custom_threshold() {
        let encoder = Encoder::with_config(EncoderConfig::new().compress_threshold(4));
        assert_eq!(encoder.classify(&[0, 0, 0, 0]), EncodingKind::Encoded);
        assert_eq!(
            encoder.classify(&[0, 0, 0, 0, 0]),
            EncodingKind::CompressedEncoded
        );
    }

    #[test]
    fn test_round_trip() {
        let text = "fn main() {\n    println!(\"hi\");\n}\n".as_bytes().to_vec();
        let inputs = vec![
            Vec::new(),
            text,
            vec![0u8],
            binary(1),
            binary(4096),
            binary(102_399),
            binary(102_400),
            binary(102_401),
            binary(300_000),
        ];

        for data in inputs {
            let encoding = encode(&data);
            assert_eq!(encoding.decode().unwrap(), data, "kind {}", encoding.kind());
        }
    }

    #[test]
    fn test_base64_has_no_padding() {
        // 1 and 2 byte inputs would need padding with the padded alphabet
        for data in [vec![0u8], vec![0u8, 1]] {
            let encoding = encode(&data);
            assert_eq!(encoding.kind(), EncodingKind::Encoded);
            assert!(!encoding.payload().contains('='));
        }
    }

    #[test]
    fn test_compressed_is_smaller_for_repetitive_data() {
        let mut data = vec![0u8; 200_000];
        data[0] = 0xFF;
        let encoding = encode(&data);
        assert_eq!(encoding.kind(), EncodingKind::CompressedEncoded);
        assert!(encoding.payload().len() < 10_000);
        assert_eq!(encoding.decode().unwrap(), data);
    }

    #[test]
    fn test_literal_expr() {
        assert_eq!(literal_expr(""), "r#\"\"#.as_bytes()");
        assert_eq!(literal_expr("plain"), "r#\"plain\"#.as_bytes()");
        assert_eq!(
            literal_expr("say \"hi\""),
            "r#\"say \"hi\"\"#.as_bytes()"
        );
        assert_eq!(
            literal_expr("a\"#b\"##c"),
            "r###\"a\"#b\"##c\"###.as_bytes()"
        );
    }

    #[test]
    fn test_literal_expr_long_hash_runs() {
        let run = "#".repeat(300);
        let text = format!("\"{run}");
        assert_eq!(
            literal_expr(&text),
            format!("concat!(r#\"\"\"#, r#\"{run}\"#).as_bytes()")
        );

        // Longest run that still fits in one literal
        let fits = format!("a\"{}", "#".repeat(254));
        let expr = literal_expr(&fits);
        assert!(!expr.starts_with("concat!"));
        assert!(expr.starts_with(&format!("r{}\"", "#".repeat(255))));

        let split = format!("a\"{}b", "#".repeat(255));
        assert_eq!(split_long_delimiters(&split).len(), 2);
        assert!(literal_expr(&split).starts_with("concat!(r#\"a\"\"#, "));
    }

    #[test]
    fn test_split_long_delimiters_keeps_text() {
        let text = format!("x\"{}y\"#z\"{}", "#".repeat(400), "#".repeat(260));
        let parts = split_long_delimiters(&text);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.concat(), text);
        for part in parts {
            assert!(delimiter_width(part) <= MAX_RAW_HASHES, "part {part:?}");
        }
    }

    #[test]
    fn test_literal_expr_carriage_returns() {
        assert_eq!(
            literal_expr("a\r\nb"),
            "concat!(r#\"a\"#, \"\\r\", r#\"\nb\"#).as_bytes()"
        );
        assert_eq!(literal_expr("\r"), "\"\\r\".as_bytes()");
        assert_eq!(
            literal_expr("\r\r"),
            "concat!(\"\\r\", \"\\r\").as_bytes()"
        );
    }

    #[test]
    fn test_delimiter_width() {
        assert_eq!(delimiter_width("no quotes"), 1);
        assert_eq!(delimiter_width("\"quoted\""), 1);
        assert_eq!(delimiter_width("\"#"), 2);
        assert_eq!(delimiter_width("x\"###y\"#"), 4);
        assert_eq!(delimiter_width("ends with quote\""), 1);
    }

    #[test]
    fn test_decoded_expr_shape() {
        let encoded = encode(&[0, 1, 2]).expr();
        assert!(encoded.contains("STANDARD_NO_PAD"));
        assert!(encoded.contains("\"AAEC\""));
        assert!(encoded.contains("unreachable!"));
        assert!(!encoded.contains("flate2"));

        let compressed = encode(&binary(102_401)).expr();
        assert!(compressed.contains("::flate2::read::ZlibDecoder"));
        assert!(compressed.contains("read_to_end"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EncodingKind::Literal.to_string(), "literal");
        assert_eq!(EncodingKind::CompressedEncoded.to_string(), "compressed");
        assert!(EncodingKind::Encoded.is_decoded());
        assert!(!EncodingKind::Literal.is_decoded());
    }
}
