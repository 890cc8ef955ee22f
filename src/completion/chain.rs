//! Reduction of the text before the cursor to a bare access chain
//!
//! `list.get(i).items[0].na` becomes root `list`, hops `get`, `items`, and the
//! partial member `na`.

use tracing::trace;

use crate::config::ScanLimits;
use crate::parsers::lexer::is_identifier_byte;
use crate::text::{find_closing, find_opening, DelimiterPair};

/// A dotted member-access expression ending at the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessChain {
    pub root: String,
    /// Complete segments between the root and the final `.`
    pub hops: Vec<String>,
    /// Text typed after the final `.`
    pub prefix: String,
}

impl AccessChain {
    /// Parses the text from the start of the line to the cursor
    ///
    /// Returns `None` when there is no `.` to complete after.
    pub fn parse(line_prefix: &str, limits: &ScanLimits) -> Option<Self> {
        let skeleton = normalize(line_prefix, limits);
        let (body, prefix) = skeleton.rsplit_once('.')?;

        let mut segments = body.split('.').map(str::to_string);
        let root = segments.next().filter(|root| !root.is_empty())?;
        let hops: Vec<String> = segments.collect();
        if hops.iter().any(String::is_empty) {
            trace!("Empty hop in {:?}", skeleton);
            return None;
        }

        Some(Self {
            root,
            hops,
            prefix: prefix.to_string(),
        })
    }
}

/// Strips argument lists, index expressions and leading punctuation from
/// `line_prefix`, leaving only identifiers, `.` and `$`
pub fn normalize(line_prefix: &str, limits: &ScanLimits) -> String {
    let mut text = line_prefix.to_string();

    // An unclosed `(` starts a fresh expression
    if let Some(open) = find_opening(text.as_str(), None, DelimiterPair::PARENS, limits) {
        text.replace_range(..=open, "");
    }

    strip_groups(&mut text, DelimiterPair::PARENS, limits);
    strip_groups(&mut text, DelimiterPair::BRACKETS, limits);

    let start = text
        .bytes()
        .rposition(|b| !is_chain_byte(b))
        .map_or(0, |pos| pos + 1);
    let mut chain = text[start..].trim().to_string();

    if let Some(idx) = chain.find("this.") {
        let after = chain[idx + "this.".len()..].to_string();
        // A bare `this.` completes the editing class itself
        chain = if after.contains('.') || idx > 0 { after } else { format!("this.{after}") };
    }
    chain
}

/// Removes the last complete `open ... close` group until none remain
fn strip_groups(text: &mut String, pair: DelimiterPair, limits: &ScanLimits) {
    while let Some(open) = text.rfind(pair.open as char) {
        let Some(close) = find_closing(text.as_str(), Some(open), pair, limits) else {
            break;
        };
        text.replace_range(open..=close, "");
    }
}

fn is_chain_byte(byte: u8) -> bool {
    is_identifier_byte(byte) || byte == b'.'
}
