//! Canonical (wire-form) serialization
//!
//! The canonical form is whitespace-free and length-prefixed: an atom is
//! `[hint-len:hint]content-len:content` (hint part only when present), a
//! list is `(` followed by its packed items followed by `)`. This is the
//! byte sequence hashing and signing must operate on; every tree has
//! exactly one canonical encoding.

use crate::error::{Result, SexpError};
use crate::sexp::{Atom, Sexp, SexpNode};

/// Exact length in bytes of the canonical serialization, computed without
/// building it.
pub fn packed_size(e: &Sexp) -> usize {
    match e.node() {
        SexpNode::Text(atom) | SexpNode::Binary(atom) => atom_size(atom),
        SexpNode::List(items) => 2 + items.iter().map(packed_size).sum::<usize>(),
    }
}

fn atom_size(atom: &Atom) -> usize {
    let n = atom.content().len();
    // a present-but-empty hint still packs as "[0:]"
    let hint = match atom.hint() {
        Some(h) => 1 + decimal_digits(h.len()) + 1 + h.len() + 1,
        None => 0,
    };
    hint + decimal_digits(n) + 1 + n
}

fn decimal_digits(mut n: usize) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

/// Serialize into a caller-supplied buffer, returning the number of bytes
/// written. Fails with [`SexpError::InsufficientSpace`] before writing
/// anything if the buffer is smaller than [`packed_size`].
pub fn pack_into(e: &Sexp, buf: &mut [u8]) -> Result<usize> {
    let needed = packed_size(e);
    if needed > buf.len() {
        return Err(SexpError::InsufficientSpace {
            needed,
            available: buf.len(),
        });
    }
    let mut pos = 0;
    write_node(e, buf, &mut pos);
    Ok(needed)
}

/// Serialize into a freshly allocated buffer of exactly the right size.
pub fn pack(e: &Sexp) -> Vec<u8> {
    let mut buf = vec![0u8; packed_size(e)];
    let mut pos = 0;
    write_node(e, &mut buf, &mut pos);
    debug_assert_eq!(pos, buf.len());
    buf
}

fn write_node(e: &Sexp, buf: &mut [u8], pos: &mut usize) {
    match e.node() {
        SexpNode::Text(atom) | SexpNode::Binary(atom) => {
            if let Some(h) = atom.hint() {
                put(buf, pos, b"[");
                put_counted(buf, pos, h);
                put(buf, pos, b"]");
            }
            put_counted(buf, pos, atom.content());
        }
        SexpNode::List(items) => {
            put(buf, pos, b"(");
            for item in items {
                write_node(item, buf, pos);
            }
            put(buf, pos, b")");
        }
    }
}

fn put_counted(buf: &mut [u8], pos: &mut usize, bytes: &[u8]) {
    put(buf, pos, bytes.len().to_string().as_bytes());
    put(buf, pos, b":");
    put(buf, pos, bytes);
}

fn put(buf: &mut [u8], pos: &mut usize, bytes: &[u8]) {
    buf[*pos..*pos + bytes.len()].copy_from_slice(bytes);
    *pos += bytes.len();
}
