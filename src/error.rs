//! Error types for parsing and packing

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SexpError>;

/// Diagnostics carry the byte offset at which the first violation was
/// detected, as reported by the cursor that was active at the time. For a
/// `{...}` sub-parse that is the decoded buffer, not the outer input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SexpError {
    #[error("unclosed '(' at offset {offset}")]
    UnclosedList { offset: u64 },

    #[error("unclosed quoted string at offset {offset}")]
    UnclosedString { offset: u64 },

    #[error("missing closing '{delim}' at offset {offset}")]
    MissingClosingDelimiter { delim: char, offset: u64 },

    #[error("missing ] in display hint at offset {offset}")]
    MissingHintBracket { offset: u64 },

    #[error("illegal display hint at offset {offset}")]
    IllegalDisplayHint { offset: u64 },

    #[error("corrupt encoded data at offset {offset}")]
    CorruptEncodedData { offset: u64 },

    #[error("implausible token length at offset {offset}")]
    ImplausibleLength { offset: u64 },

    #[error("missing bytes in raw token at offset {offset}")]
    MissingRawBytes { offset: u64 },

    #[error("illegal octal escape at offset {offset}")]
    IllegalOctalEscape { offset: u64 },

    #[error("illegal hex escape at offset {offset}")]
    IllegalHexEscape { offset: u64 },

    #[error("missing token at offset {offset}")]
    MissingToken { offset: u64 },

    #[error("buffer too small: need {needed} bytes, have {available}")]
    InsufficientSpace { needed: usize, available: usize },

    #[error("read error at offset {offset}: {message}")]
    Io { message: String, offset: u64 },
}

impl SexpError {
    /// Byte offset associated with this diagnostic, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::UnclosedList { offset }
            | Self::UnclosedString { offset }
            | Self::MissingClosingDelimiter { offset, .. }
            | Self::MissingHintBracket { offset }
            | Self::IllegalDisplayHint { offset }
            | Self::CorruptEncodedData { offset }
            | Self::ImplausibleLength { offset }
            | Self::MissingRawBytes { offset }
            | Self::IllegalOctalEscape { offset }
            | Self::IllegalHexEscape { offset }
            | Self::MissingToken { offset }
            | Self::Io { offset, .. } => Some(*offset),
            Self::InsufficientSpace { .. } => None,
        }
    }
}
