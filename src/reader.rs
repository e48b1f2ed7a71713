//! Recursive-descent reader for SDSI/SPKI S-expressions
//!
//! Accepts the permissive textual grammar: bare tokens, quoted strings
//! with escapes, `N:` raw byte counts, `#hex#` and `|base64|` blocks,
//! `{base64}` canonical sub-expressions, `(...)` lists and `[hint]atom`
//! display hints. One token of lookahead via single-byte pushback.
//!
//! The first diagnostic encountered wins, at any recursion depth.
//! Offsets in diagnostics are relative to the buffer the active cursor is
//! reading; inside a `{...}` sub-parse that is the decoded buffer, not the
//! outer input.

use crate::cursor::{ByteCursor, SliceCursor, StreamCursor};
use crate::error::{Result, SexpError};
use crate::sexp::Sexp;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurposeConfig};
use base64::alphabet;
use std::io::{BufReader, Read};

/// Upper bound on any single token, raw byte run or decoded block.
const MAX_TOKEN: usize = 1024 * 1024;

/// Base64 blocks in hand-written input may or may not carry padding.
const B64_RELAXED: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Parse one item from a string. `Ok(None)` means the input held nothing
/// but whitespace.
pub fn parse(input: &str) -> Result<Option<Sexp>> {
    Ok(parse_bytes(input.as_bytes())?.map(|(e, _)| e))
}

/// Parse one item from an in-memory byte region, returning the tree and
/// the offset of the first unconsumed byte.
pub fn parse_bytes(buf: &[u8]) -> Result<Option<(Sexp, usize)>> {
    let mut rd = Reader::new(SliceCursor::new(buf));
    match rd.item()? {
        Some(e) => {
            let pos = rd.cur.position();
            Ok(Some((e, pos)))
        }
        None => Ok(None),
    }
}

/// Read exactly one item from a byte stream, leaving the stream positioned
/// after it.
pub fn read_from<R: Read>(reader: R) -> Result<Option<Sexp>> {
    Reader::new(StreamCursor::new(BufReader::new(reader))).item()
}

struct Reader<C: ByteCursor> {
    cur: C,
}

impl<C: ByteCursor> Reader<C> {
    fn new(cur: C) -> Self {
        Reader { cur }
    }

    /// Skip whitespace, returning the first significant byte.
    fn skip_ws(&mut self) -> Result<Option<u8>> {
        loop {
            match self.cur.next()? {
                Some(b' ' | b'\t' | b'\r' | b'\n') => continue,
                other => return Ok(other),
            }
        }
    }

    fn item(&mut self) -> Result<Option<Sexp>> {
        let c = match self.skip_ws()? {
            Some(c) => c,
            None => return Ok(None),
        };
        match c {
            b'{' => {
                let open = self.cur.offset() - 1;
                let text = self.to_closing(b'}')?;
                let decoded = decode_base64(&text)
                    .ok_or(SexpError::CorruptEncodedData { offset: open })?;
                let mut inner = Reader::new(SliceCursor::new(&decoded));
                match inner.item()? {
                    Some(e) => Ok(Some(e)),
                    // decoded to whitespace or nothing: not a sub-expression
                    None => Err(SexpError::CorruptEncodedData { offset: open }),
                }
            }
            b'(' => {
                let open = self.cur.offset() - 1;
                let mut items = Vec::new();
                loop {
                    match self.skip_ws()? {
                        None => return Err(SexpError::UnclosedList { offset: open }),
                        Some(b')') => break,
                        Some(_) => {
                            self.cur.unget();
                            match self.item()? {
                                Some(e) => items.push(e),
                                None => return Err(SexpError::UnclosedList { offset: open }),
                            }
                        }
                    }
                }
                Ok(Some(Sexp::list(items)))
            }
            b'[' => {
                let open = self.cur.offset() - 1;
                let hint_item = match self.cur.next()? {
                    Some(c) => self.simple(c, None)?,
                    None => {
                        return Err(SexpError::MissingToken {
                            offset: self.cur.offset(),
                        });
                    }
                };
                match self.skip_ws()? {
                    Some(b']') => {}
                    Some(_) => {
                        self.cur.unget();
                        return Err(SexpError::MissingHintBracket { offset: open });
                    }
                    None => return Err(SexpError::MissingHintBracket { offset: open }),
                }
                if !hint_item.is_text() {
                    return Err(SexpError::IllegalDisplayHint {
                        offset: self.cur.offset(),
                    });
                }
                let hint = hint_item.as_bytes().map(|b| b.to_vec()).unwrap_or_default();
                let c = match self.skip_ws()? {
                    Some(c) => c,
                    None => {
                        return Err(SexpError::MissingToken {
                            offset: self.cur.offset(),
                        })
                    }
                };
                self.simple(c, Some(hint)).map(Some)
            }
            _ => self.simple(c, None).map(Some),
        }
    }

    /// An atom in any of its spellings. `c0` is the first significant byte,
    /// already consumed.
    fn simple(&mut self, c0: u8, hint: Option<Vec<u8>>) -> Result<Sexp> {
        let mut c = Some(c0);
        let mut count: Option<usize> = None;
        let mut digits: Vec<u8> = Vec::new();
        if c0.is_ascii_digit() {
            let mut n: usize = 0;
            while let Some(d) = c {
                if !d.is_ascii_digit() {
                    break;
                }
                n = n
                    .checked_mul(10)
                    .and_then(|v| v.checked_add((d - b'0') as usize))
                    .filter(|&v| v <= MAX_TOKEN)
                    .ok_or(SexpError::ImplausibleLength {
                        offset: self.cur.offset(),
                    })?;
                digits.push(d);
                c = self.cur.next()?;
            }
            count = Some(n);
        }
        match c {
            Some(b'"') => {
                let content = self.quoted()?;
                Ok(Sexp::text_with_hint(content, hint))
            }
            Some(b'#') => self.decoded_block(b'#', hint),
            Some(b'|') => self.decoded_block(b'|', hint),
            Some(b':') if count.is_some() => {
                let raw = self.raw_bytes(count.unwrap_or(0))?;
                Ok(Sexp::data_with_hint(raw, hint))
            }
            _ => {
                // Bare token. A leading digit run that wasn't a length
                // prefix stays part of the token: a deliberate relaxation
                // of Rivest's no-leading-digit rule.
                let mut token = digits;
                while let Some(d) = c {
                    if !is_token_char(d) {
                        break;
                    }
                    token.push(d);
                    c = self.cur.next()?;
                }
                if token.is_empty() {
                    return Err(SexpError::MissingToken {
                        offset: self.cur.offset(),
                    });
                }
                if c.is_some() {
                    self.cur.unget();
                }
                Ok(Sexp::text_with_hint(token, hint))
            }
        }
    }

    /// `#...#` or `|...|`: collect to the closing delimiter, decode, then
    /// classify the decoded bytes text-vs-binary.
    fn decoded_block(&mut self, delim: u8, hint: Option<Vec<u8>>) -> Result<Sexp> {
        let text = self.to_closing(delim)?;
        let decoded = match delim {
            b'#' => decode_hex(&text),
            _ => decode_base64(&text),
        };
        match decoded {
            Some(bytes) => Ok(Sexp::data_with_hint(bytes, hint)),
            None => Err(SexpError::CorruptEncodedData {
                offset: self.cur.offset(),
            }),
        }
    }

    fn to_closing(&mut self, end: u8) -> Result<Vec<u8>> {
        let start = self.cur.offset();
        let mut out = Vec::new();
        loop {
            match self.cur.next()? {
                Some(c) if c == end => return Ok(out),
                Some(c) => out.push(c),
                None => {
                    return Err(SexpError::MissingClosingDelimiter {
                        delim: end as char,
                        offset: start,
                    })
                }
            }
        }
    }

    fn raw_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.cur.next()? {
                Some(c) => out.push(c),
                None => {
                    return Err(SexpError::MissingRawBytes {
                        offset: self.cur.offset(),
                    })
                }
            }
        }
        Ok(out)
    }

    /// Body of a quoted string; the opening `"` is already consumed.
    fn quoted(&mut self) -> Result<Vec<u8>> {
        let start = self.cur.offset();
        let mut out = Vec::new();
        loop {
            let c = match self.cur.next()? {
                Some(c) => c,
                None => return Err(SexpError::UnclosedString { offset: start }),
            };
            if c == b'"' {
                return Ok(out);
            }
            if c != b'\\' {
                out.push(c);
                continue;
            }
            let esc_at = self.cur.offset();
            let e = match self.cur.next()? {
                Some(e) => e,
                None => return Err(SexpError::UnclosedString { offset: start }),
            };
            match e {
                // line continuations: CR[LF] or LF[CR], emitting nothing
                b'\r' => match self.cur.next()? {
                    Some(b'\n') | None => {}
                    Some(_) => self.cur.unget(),
                },
                b'\n' => match self.cur.next()? {
                    Some(b'\r') | None => {}
                    Some(_) => self.cur.unget(),
                },
                b'b' => out.push(0x08),
                b'f' => out.push(0x0C),
                b'n' => out.push(b'\n'),
                b'r' => out.push(b'\r'),
                b't' => out.push(b'\t'),
                b'v' => out.push(0x0B),
                b'0'..=b'7' => {
                    let mut oct = 0u32;
                    let mut d = e;
                    for i in 0..3 {
                        if !(b'0'..=b'7').contains(&d) {
                            return Err(SexpError::IllegalOctalEscape { offset: esc_at });
                        }
                        oct = (oct << 3) | u32::from(d - b'0');
                        if i < 2 {
                            d = match self.cur.next()? {
                                Some(d) => d,
                                None => {
                                    return Err(SexpError::IllegalOctalEscape { offset: esc_at })
                                }
                            };
                        }
                    }
                    out.push((oct & 0xFF) as u8);
                }
                b'x' => {
                    let hi = self.cur.next()?.and_then(hex_val);
                    let lo = self.cur.next()?.and_then(hex_val);
                    match (hi, lo) {
                        (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                        _ => return Err(SexpError::IllegalHexEscape { offset: esc_at }),
                    }
                }
                // `\"`, `\\` and any unrecognized escape: the char itself
                other => out.push(other),
            }
        }
    }
}

fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, b'-' | b'.' | b'/' | b'_' | b':' | b'*' | b'+' | b'=')
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode a `#...#` payload, ignoring embedded whitespace.
fn decode_hex(text: &[u8]) -> Option<Vec<u8>> {
    let compact: Vec<u8> = text
        .iter()
        .copied()
        .filter(|c| !matches!(c, b' ' | b'\t' | b'\r' | b'\n'))
        .collect();
    hex::decode(compact).ok()
}

/// Decode a `|...|` or `{...}` payload, ignoring embedded whitespace.
fn decode_base64(text: &[u8]) -> Option<Vec<u8>> {
    let compact: Vec<u8> = text
        .iter()
        .copied()
        .filter(|c| !matches!(c, b' ' | b'\t' | b'\r' | b'\n'))
        .collect();
    B64_RELAXED.decode(compact).ok()
}
