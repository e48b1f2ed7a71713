//! Human-readable and transport-safe text renderings
//!
//! [`to_text`] produces a readable form that always re-parses (not
//! necessarily byte-canonical); [`to_base64_text`] wraps the canonical
//! packing in a `{base64}` envelope for text-only channels.

use crate::canonical;
use crate::sexp::{Atom, Sexp, SexpNode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Binary content up to this many bytes renders as `#hex#`, longer as
/// `|base64|`.
const HEX_LIMIT: usize = 4;

/// Display rendering: tokens unquoted, other text quoted with escapes,
/// binary as hex or base64 shorthand, hints as `[...]` prefixes, lists
/// space-joined.
pub fn to_text(e: &Sexp) -> String {
    let mut out = String::new();
    render(e, &mut out);
    out
}

/// Canonical form, base64-encoded and wrapped in `{}`. Parsing the result
/// reproduces a tree equal to the original.
pub fn to_base64_text(e: &Sexp) -> String {
    format!("{{{}}}", STANDARD.encode(canonical::pack(e)))
}

fn render(e: &Sexp, out: &mut String) {
    match e.node() {
        SexpNode::Text(atom) => {
            render_hint(atom, out);
            quote_into(atom.content(), out);
        }
        SexpNode::Binary(atom) => {
            render_hint(atom, out);
            let content = atom.content();
            if content.len() <= HEX_LIMIT {
                out.push('#');
                out.push_str(&hex::encode(content));
                out.push('#');
            } else {
                out.push('|');
                out.push_str(&STANDARD.encode(content));
                out.push('|');
            }
        }
        SexpNode::List(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                render(item, out);
            }
            out.push(')');
        }
    }
}

fn render_hint(atom: &Atom, out: &mut String) {
    if let Some(h) = atom.hint() {
        out.push('[');
        quote_into(h, out);
        out.push(']');
    }
}

/// Emit bytes as a bare token when they qualify, else as a quoted string.
fn quote_into(bytes: &[u8], out: &mut String) {
    if is_strict_token(bytes) {
        for &c in bytes {
            out.push(c as char);
        }
        return;
    }
    out.push('"');
    for &c in bytes {
        match c {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            0x08 => out.push_str("\\b"),
            0x0C => out.push_str("\\f"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            0x0B => out.push_str("\\v"),
            0x20..=0x7E => out.push(c as char),
            _ => {
                out.push_str(&format!("\\x{:02x}", c));
            }
        }
    }
    out.push('"');
}

/// Strict Rivest token test for rendering: non-empty, no leading digit.
/// Stricter than what the reader accepts, so rendered tokens never collide
/// with the `N:` raw-byte spelling.
fn is_strict_token(bytes: &[u8]) -> bool {
    match bytes.first() {
        None => false,
        Some(c) if c.is_ascii_digit() => false,
        Some(_) => bytes.iter().all(|&c| {
            c.is_ascii_alphanumeric()
                || matches!(c, b'-' | b'.' | b'/' | b'_' | b':' | b'*' | b'+' | b'=')
        }),
    }
}
