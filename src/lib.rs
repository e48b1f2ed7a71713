//! Canonical S-expression reader and serializers
//!
//! Implements the S-expression format of Rivest's SDSI/SPKI Internet-Draft:
//! a compact, self-delimiting, length-prefixed tree encoding used for
//! cryptographic certificates and authorization statements. The crate
//! provides a permissive recursive-descent reader, an exact-byte canonical
//! packer, a display/base64 text renderer, structural operations over the
//! shared-ownership tree, and content hashing over canonical form.

pub mod canonical;
pub mod cursor;
pub mod error;
pub mod hash;
pub mod reader;
pub mod sexp;
pub mod text;

pub use canonical::{pack, pack_into, packed_size};
pub use cursor::{ByteCursor, SliceCursor, StreamCursor};
pub use error::{Result, SexpError};
pub use hash::ContentHash;
pub use reader::{parse, parse_bytes, read_from};
pub use sexp::{Atom, Sexp, SexpNode};
pub use text::{to_base64_text, to_text};
