//! S-expression tree definition and structural operations
//!
//! A [`Sexp`] is a cheap-to-clone handle over a shared node: cloning the
//! handle retains the sub-tree, dropping it releases it, and the node is
//! freed (recursively) when the last handle goes away. Atom buffers are
//! immutable while shared; [`Sexp::make_mut`] copies before any in-place
//! edit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Shared-ownership handle to an S-expression node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sexp {
    node: Arc<SexpNode>,
}

/// The three node shapes of an S-expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SexpNode {
    /// Atom whose content is printable text.
    Text(Atom),
    /// Atom whose content contains non-printable bytes.
    Binary(Atom),
    /// Ordered sequence of items; may be empty.
    List(Vec<Sexp>),
}

/// Atom payload: content bytes plus an optional display hint.
///
/// The hint is an opaque byte sequence naming the content's intended
/// interpretation; it is carried and compared but never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    content: Vec<u8>,
    hint: Option<Vec<u8>>,
}

impl Atom {
    pub fn new(content: impl Into<Vec<u8>>, hint: Option<Vec<u8>>) -> Self {
        Atom {
            content: content.into(),
            hint,
        }
    }

    /// Content bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Display hint bytes, if any.
    pub fn hint(&self) -> Option<&[u8]> {
        self.hint.as_deref()
    }
}

/// Decide whether decoded bytes qualify as text: printable ASCII or one of
/// the recognized whitespace controls. Evaluated once, at construction.
pub fn is_textual(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&c| (0x20..0x7F).contains(&c) || matches!(c, b'\t' | b'\r' | b'\n'))
}

impl Sexp {
    fn from_node(node: SexpNode) -> Self {
        Sexp {
            node: Arc::new(node),
        }
    }

    /// Text atom from content bytes.
    pub fn text(content: impl Into<Vec<u8>>) -> Self {
        Sexp::text_with_hint(content, None)
    }

    /// Text atom from a string slice.
    pub fn text_str(s: &str) -> Self {
        Sexp::text(s.as_bytes().to_vec())
    }

    pub fn text_with_hint(content: impl Into<Vec<u8>>, hint: Option<Vec<u8>>) -> Self {
        Sexp::from_node(SexpNode::Text(Atom::new(content, hint)))
    }

    /// Binary atom from content bytes.
    pub fn binary(content: impl Into<Vec<u8>>) -> Self {
        Sexp::binary_with_hint(content, None)
    }

    pub fn binary_with_hint(content: impl Into<Vec<u8>>, hint: Option<Vec<u8>>) -> Self {
        Sexp::from_node(SexpNode::Binary(Atom::new(content, hint)))
    }

    /// Atom from arbitrary bytes, classified text or binary by content.
    pub fn data(content: impl Into<Vec<u8>>) -> Self {
        Sexp::data_with_hint(content, None)
    }

    pub fn data_with_hint(content: impl Into<Vec<u8>>, hint: Option<Vec<u8>>) -> Self {
        let content = content.into();
        if is_textual(&content) {
            Sexp::text_with_hint(content, hint)
        } else {
            Sexp::binary_with_hint(content, hint)
        }
    }

    /// List from items; an empty `items` yields the empty list `()`.
    pub fn list(items: Vec<Sexp>) -> Self {
        Sexp::from_node(SexpNode::List(items))
    }

    pub fn empty_list() -> Self {
        Sexp::list(Vec::new())
    }

    /// List whose head is the text-atom operator `op`.
    pub fn form(op: &str, args: Vec<Sexp>) -> Self {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(Sexp::text_str(op));
        items.extend(args);
        Sexp::list(items)
    }

    /// Borrow the underlying node.
    pub fn node(&self) -> &SexpNode {
        &self.node
    }

    pub fn is_list(&self) -> bool {
        matches!(*self.node, SexpNode::List(_))
    }

    pub fn is_atom(&self) -> bool {
        !self.is_list()
    }

    pub fn is_text(&self) -> bool {
        matches!(*self.node, SexpNode::Text(_))
    }

    pub fn is_binary(&self) -> bool {
        matches!(*self.node, SexpNode::Binary(_))
    }

    /// First item of a list. Absent for atoms and the empty list.
    pub fn head(&self) -> Option<Sexp> {
        match &*self.node {
            SexpNode::List(items) => items.first().cloned(),
            _ => None,
        }
    }

    /// Remaining items of a list, as a list. Absent for atoms and for
    /// lists with fewer than two items.
    pub fn tail(&self) -> Option<Sexp> {
        match &*self.node {
            SexpNode::List(items) if items.len() >= 2 => Some(Sexp::list(items[1..].to_vec())),
            _ => None,
        }
    }

    /// Number of items; 0 for atoms and the empty list.
    pub fn len(&self) -> usize {
        match &*self.node {
            SexpNode::List(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List items, if this is a list.
    pub fn items(&self) -> Option<&[Sexp]> {
        match &*self.node {
            SexpNode::List(items) => Some(items),
            _ => None,
        }
    }

    /// Textual operator name: the head of a list if that head is a text
    /// atom, or the atom's own text if this is a text atom.
    pub fn operator(&self) -> Option<&str> {
        let node = match &*self.node {
            SexpNode::List(items) => items.first()?.node(),
            other => other,
        };
        match node {
            SexpNode::Text(atom) => std::str::from_utf8(atom.content()).ok(),
            _ => None,
        }
    }

    /// Items following the operator position of a list.
    pub fn args(&self) -> Option<&[Sexp]> {
        let (_, rest) = self.items()?.split_first()?;
        Some(rest)
    }

    /// Atom content bytes, text or binary.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &*self.node {
            SexpNode::Text(atom) | SexpNode::Binary(atom) => Some(atom.content()),
            SexpNode::List(_) => None,
        }
    }

    /// Text atom content as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match &*self.node {
            SexpNode::Text(atom) => std::str::from_utf8(atom.content()).ok(),
            _ => None,
        }
    }

    /// Display hint of an atom, if present.
    pub fn hint(&self) -> Option<&[u8]> {
        match &*self.node {
            SexpNode::Text(atom) | SexpNode::Binary(atom) => atom.hint(),
            SexpNode::List(_) => None,
        }
    }

    /// Deep copy with independent storage for every atom buffer; the
    /// result shares nothing with the source.
    pub fn deep_copy(&self) -> Sexp {
        match &*self.node {
            SexpNode::Text(atom) => {
                Sexp::text_with_hint(atom.content().to_vec(), atom.hint().map(|h| h.to_vec()))
            }
            SexpNode::Binary(atom) => {
                Sexp::binary_with_hint(atom.content().to_vec(), atom.hint().map(|h| h.to_vec()))
            }
            SexpNode::List(items) => Sexp::list(items.iter().map(Sexp::deep_copy).collect()),
        }
    }

    /// Mutable access to the node, copying first if it is shared.
    pub fn make_mut(&mut self) -> &mut SexpNode {
        Arc::make_mut(&mut self.node)
    }

    /// Number of live owners of this node (diagnostic aid).
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.node)
    }
}

impl Deref for Sexp {
    type Target = SexpNode;

    fn deref(&self) -> &SexpNode {
        &self.node
    }
}

impl PartialEq for Sexp {
    fn eq(&self, other: &Self) -> bool {
        // Same node: trivially equal without descending.
        Arc::ptr_eq(&self.node, &other.node) || *self.node == *other.node
    }
}

impl Eq for Sexp {}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::text::to_text(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Sexp::data(b"hello world".to_vec()).is_text());
        assert!(Sexp::data(b"tab\tand\r\nnewline".to_vec()).is_text());
        assert!(Sexp::data(vec![0x00, 0x01]).is_binary());
        // 0x7F is the first byte past the printable range
        assert!(Sexp::data(b"almost printable \x7f".to_vec()).is_binary());
        assert!(Sexp::data(b"fully printable ~".to_vec()).is_text());
    }

    #[test]
    fn test_list_accessors() {
        let e = Sexp::form(
            "tag",
            vec![Sexp::text_str("a"), Sexp::text_str("b")],
        );
        assert!(e.is_list());
        assert_eq!(e.len(), 3);
        assert_eq!(e.operator(), Some("tag"));
        assert_eq!(e.args().unwrap().len(), 2);
        assert_eq!(e.head().unwrap().as_str(), Some("tag"));

        let tail = e.tail().unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.head().unwrap().as_str(), Some("a"));
    }

    #[test]
    fn test_head_tail_absent() {
        let atom = Sexp::text_str("x");
        assert!(atom.head().is_none());
        assert!(atom.tail().is_none());
        assert_eq!(atom.len(), 0);
        // operator of a bare text atom is its own text
        assert_eq!(atom.operator(), Some("x"));

        let empty = Sexp::empty_list();
        assert!(empty.head().is_none());
        assert!(empty.tail().is_none());
        assert!(empty.args().is_none());
        assert_eq!(empty.len(), 0);

        let single = Sexp::list(vec![Sexp::text_str("only")]);
        assert!(single.tail().is_none());
        assert_eq!(single.args(), Some(&[][..]));
    }

    #[test]
    fn test_empty_list_is_a_value() {
        let empty = Sexp::empty_list();
        assert!(empty.is_list());
        assert_ne!(empty, Sexp::text_str(""));
    }

    #[test]
    fn test_equality_structural() {
        let a = Sexp::form("op", vec![Sexp::text_str("x"), Sexp::binary(vec![1, 2, 3])]);
        let b = Sexp::form("op", vec![Sexp::text_str("x"), Sexp::binary(vec![1, 2, 3])]);
        assert_eq!(a, b);

        let longer = Sexp::form(
            "op",
            vec![
                Sexp::text_str("x"),
                Sexp::binary(vec![1, 2, 3]),
                Sexp::text_str("extra"),
            ],
        );
        assert_ne!(a, longer);

        // tag matters even for identical bytes
        assert_ne!(Sexp::text(b"ab".to_vec()), Sexp::binary(b"ab".to_vec()));
    }

    #[test]
    fn test_hint_equality_asymmetry() {
        let plain = Sexp::text_str("abc");
        let hinted = Sexp::text_with_hint(b"abc".to_vec(), Some(b"display".to_vec()));
        let hinted2 = Sexp::text_with_hint(b"abc".to_vec(), Some(b"display".to_vec()));
        let other_hint = Sexp::text_with_hint(b"abc".to_vec(), Some(b"mime".to_vec()));

        assert_ne!(plain, hinted);
        assert_ne!(hinted, plain);
        assert_eq!(hinted, hinted2);
        assert_ne!(hinted, other_hint);
    }

    #[test]
    fn test_deep_copy_independent() {
        let shared = Sexp::text_str("shared");
        let original = Sexp::list(vec![shared.clone(), shared]);
        let copy = original.deep_copy();
        assert_eq!(original, copy);

        // mutating the copy in place must not disturb the original
        let mut copy = copy;
        if let SexpNode::List(items) = copy.make_mut() {
            items.push(Sexp::text_str("added"));
        }
        assert_eq!(original.len(), 2);
        assert_eq!(copy.len(), 3);
    }

    #[test]
    fn test_copy_on_write() {
        let mut a = Sexp::text_str("content");
        let b = a.clone();
        assert_eq!(a.owner_count(), 2);

        if let SexpNode::Text(atom) = a.make_mut() {
            atom.content.push(b'!');
        }
        assert_eq!(a.as_str(), Some("content!"));
        assert_eq!(b.as_str(), Some("content"));
    }

    #[test]
    fn test_concurrent_retain_release() {
        use std::thread;

        let tree = Sexp::form(
            "cert",
            vec![
                Sexp::form("issuer", vec![Sexp::binary(vec![0u8; 32])]),
                Sexp::form("subject", vec![Sexp::text_str("alice")]),
            ],
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = tree.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let c = shared.clone();
                        assert_eq!(c.operator(), Some("cert"));
                        let sub = c.head().unwrap();
                        drop(c);
                        assert_eq!(sub.as_str(), Some("cert"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tree.owner_count(), 1);
    }
}
