//! Content-addressed cache keys.
//!
//! A key is the MD5 digest of `"{operation}:{normalized_text}"`, rendered as
//! 32 lowercase hex characters. Changing this function invalidates every
//! entry already on disk.

use std::fmt;
use std::str::FromStr;

/// Separator placed between a composite discriminator and the text body.
pub const COMPOSITE_SEPARATOR: char = '|';

/// LLM capabilities whose results are cached.
///
/// The cache itself accepts any string as an operation tag; this enum only
/// names the tags the intelligence layer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Classify,
    Extract,
    Summarize,
    Embeddings,
}

impl Operation {
    /// All known operations, in display order.
    pub const ALL: [Operation; 4] = [
        Operation::Classify,
        Operation::Extract,
        Operation::Summarize,
        Operation::Embeddings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Classify => "classify",
            Operation::Extract => "extract",
            Operation::Summarize => "summarize",
            Operation::Embeddings => "embeddings",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown operation '{s}'. Known operations: classify, extract, summarize, embeddings"
                )
            })
    }
}

/// Collapse every run of whitespace into a single space and trim both ends.
///
/// The information separators U+001C..=U+001F count as whitespace, so keys
/// match those derived from Python's `str.split()`.
pub fn normalize(text: &str) -> String {
    text.split(is_key_whitespace)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_key_whitespace(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Derive the storage key for `(text, operation)`.
pub fn derive_key(text: &str, operation: &str) -> String {
    let content = format!("{}:{}", operation, normalize(text));
    format!("{:x}", md5::compute(content.as_bytes()))
}

/// Build the key input for results that depend on more than the raw text,
/// e.g. extraction keyed by document type.
pub fn composite_text(discriminator: &str, text: &str) -> String {
    format!("{discriminator}{COMPOSITE_SEPARATOR}{text}")
}

/// Short key prefix for log lines.
pub(crate) fn short_key(key: &str) -> &str {
    &key[..8.min(key.len())]
}
