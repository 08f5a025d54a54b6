//! Identifier sanitization.
//!
//! Turns arbitrary text (file names, directory names) into names that can
//! be used for items in generated code.

use std::borrow::Cow;

/// Letter prepended when a sanitized name would not start with a letter or `_`
pub const PLACEHOLDER: char = 'v';

/// Names that cannot be written as raw identifiers
const RESERVED: &[&str] = &["_", "self", "Self", "super", "crate"];

/// Keywords that must be written as `r#name`
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Letters, ASCII decimal digits and `_`; other numerics (`²`, `½`) are not digits
fn is_ident_char(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || c == '_'
}

/// Replace every run of invalid identifier characters with a single `_`.
///
/// Letters, digits and underscores are kept as-is (so `a__b` stays
/// `a__b`, while `a..b` becomes `a_b`). If the result starts with anything
/// other than a letter or underscore, [`PLACEHOLDER`] is prepended.
///
/// Empty input gives empty output; use [`symbol_name`] when an empty name
/// must be treated as an error.
pub fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 1);
    let mut replaced = false;

    for c in s.chars() {
        if is_ident_char(c) {
            out.push(c);
            replaced = false;
        } else if !replaced {
            out.push('_');
            replaced = true;
        }
    }

    if let Some(first) = out.chars().next() {
        if first != '_' && !first.is_alphabetic() {
            out.insert(0, PLACEHOLDER);
        }
    }

    out
}

/// Sanitize `s`, returning `None` when nothing usable remains.
pub fn symbol_name(s: &str) -> Option<String> {
    let name = sanitize(s);
    is_symbol_name(&name).then_some(name)
}

/// Returns true if `name` can be used as-is for a generated item.
///
/// The name must be unchanged by [`sanitize`], non-empty, and not one of
/// the names Rust refuses even as a raw identifier.
pub fn is_symbol_name(name: &str) -> bool {
    !name.is_empty() && !RESERVED.contains(&name) && sanitize(name) == name
}

/// Render a symbol name as a Rust identifier, escaping keywords.
pub fn to_rust_ident(name: &str) -> Cow<'_, str> {
    if KEYWORDS.contains(&name) {
        Cow::Owned(format!("r#{name}"))
    } else {
        Cow::Borrowed(name)
    }
}
