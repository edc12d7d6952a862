use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot rejected: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// What kind of damage the normalizer worked around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    UnclosedFence,
    UnclosedInlineCode,
    UnclosedHtmlBlock,
    UnterminatedTag,
}

impl fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MalformedKind::UnclosedFence => "unclosed code fence",
            MalformedKind::UnclosedInlineCode => "unclosed inline code",
            MalformedKind::UnclosedHtmlBlock => "unclosed html block",
            MalformedKind::UnterminatedTag => "unterminated tag",
        };
        f.write_str(s)
    }
}

/// Non-fatal diagnostic: normalization degraded to best-effort stripping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed input ({kind}) near line {line}")]
pub struct MalformedInput {
    pub kind: MalformedKind,
    /// 1-based line in the raw text.
    pub line: usize,
}
