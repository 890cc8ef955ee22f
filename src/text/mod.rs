//! Text access and delimiter matching shared by the extractor and the resolver

pub mod scope_matcher;
pub mod source;

pub use scope_matcher::{find_closing, find_opening, find_partner, DelimiterPair, LIVE_WINDOW};
pub use source::{line_prefix, TextSource};
