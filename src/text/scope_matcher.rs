//! Bracket/delimiter balancing over windowed text
//!
//! Both scan directions keep an explicit stack of unmatched opener positions. When no
//! anchor is given, the first delimiter that cannot be balanced is the answer; with an
//! anchor, the scan stops at the delimiter that balances it.
//!
//! Live buffers are paged through a fixed 64-byte window that is re-fetched whenever
//! the scan position leaves it, so peak memory does not depend on file size. Detached
//! strings are borrowed whole.

use std::borrow::Cow;

use tracing::trace;

use super::source::TextSource;
use crate::config::ScanLimits;

/// Width of the sliding window used on live buffers
pub const LIVE_WINDOW: usize = 64;

/// An ASCII opener/closer pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterPair {
    pub open: u8,
    pub close: u8,
}

impl DelimiterPair {
    pub const PARENS: Self = Self::new(b'(', b')');
    pub const BRACKETS: Self = Self::new(b'[', b']');
    pub const BRACES: Self = Self::new(b'{', b'}');
    pub const ANGLES: Self = Self::new(b'<', b'>');

    pub const fn new(open: u8, close: u8) -> Self {
        Self { open, close }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// The currently loaded slice of a source
struct Window<'a, S: TextSource + ?Sized> {
    source: &'a S,
    direction: Direction,
    step: usize,
    start: usize,
    bytes: Cow<'a, [u8]>,
}

impl<'a, S: TextSource + ?Sized> Window<'a, S> {
    fn new(source: &'a S, direction: Direction, step: usize) -> Self {
        Self {
            source,
            direction,
            step: step.max(1),
            start: 0,
            bytes: Cow::Borrowed(&[]),
        }
    }

    fn byte_at(&mut self, pos: usize) -> Option<u8> {
        if pos < self.start || pos >= self.start + self.bytes.len() {
            self.advance_to(pos);
        }
        pos.checked_sub(self.start)
            .and_then(|offset| self.bytes.get(offset).copied())
    }

    fn advance_to(&mut self, pos: usize) {
        let (start, end) = match self.direction {
            Direction::Forward => (pos, pos.saturating_add(self.step)),
            Direction::Backward => {
                let end = pos + 1;
                (end.saturating_sub(self.step), end)
            }
        };
        trace!("scope window [{}, {})", start, end);
        self.bytes = self.source.read_window(start, end);
        self.start = start;
    }
}

fn window_step<S: TextSource + ?Sized>(source: &S, ceiling: usize) -> usize {
    if source.is_live() { LIVE_WINDOW } else { ceiling }
}

/// Finds the delimiter that closes the opener at `open_pos`, scanning forward.
///
/// With `open_pos == None` the scan starts at offset 0 and returns the first closer
/// that has no opener before it. Returns `None` when the end of the source or the scan
/// ceiling is reached first.
pub fn find_closing<S: TextSource + ?Sized>(
    source: &S,
    open_pos: Option<usize>,
    pair: DelimiterPair,
    limits: &ScanLimits,
) -> Option<usize> {
    let len = source.len_bytes();
    let start = open_pos.unwrap_or(0);
    if start >= len {
        return None;
    }
    let ceiling = limits.ceiling_for(source);
    let stop = start.saturating_add(ceiling).min(len);

    let mut window = Window::new(source, Direction::Forward, window_step(source, ceiling));
    let mut stack: Vec<usize> = Vec::new();
    for pos in start..stop {
        let Some(byte) = window.byte_at(pos) else {
            break;
        };
        if byte == pair.open {
            stack.push(pos);
        } else if byte == pair.close {
            match stack.pop() {
                None if open_pos.is_none() => return Some(pos),
                None => {}
                Some(opened) if Some(opened) == open_pos => return Some(pos),
                Some(_) => {}
            }
        }
    }
    None
}

/// Finds the delimiter that opens the closer at `close_pos`, scanning backward.
///
/// With `close_pos == None` the scan starts at the last byte and returns the first
/// opener (nearest the end) that is never closed.
pub fn find_opening<S: TextSource + ?Sized>(
    source: &S,
    close_pos: Option<usize>,
    pair: DelimiterPair,
    limits: &ScanLimits,
) -> Option<usize> {
    let len = source.len_bytes();
    let start = match close_pos {
        Some(pos) if pos < len => pos,
        Some(_) => return None,
        None if len == 0 => return None,
        None => len - 1,
    };
    let ceiling = limits.ceiling_for(source);
    let lowest = (start + 1).saturating_sub(ceiling);

    let mut window = Window::new(source, Direction::Backward, window_step(source, ceiling));
    let mut stack: Vec<usize> = Vec::new();
    for pos in (lowest..=start).rev() {
        let Some(byte) = window.byte_at(pos) else {
            break;
        };
        if byte == pair.close {
            stack.push(pos);
        } else if byte == pair.open {
            match stack.pop() {
                None if close_pos.is_none() => return Some(pos),
                None => {}
                Some(closed) if Some(closed) == close_pos => return Some(pos),
                Some(_) => {}
            }
        }
    }
    None
}

/// Matches whichever delimiter of `pair` sits at `pos`
pub fn find_partner<S: TextSource + ?Sized>(
    source: &S,
    pos: usize,
    pair: DelimiterPair,
    limits: &ScanLimits,
) -> Option<usize> {
    let window = source.read_window(pos, pos + 1);
    match window.first().copied() {
        Some(byte) if byte == pair.open => find_closing(source, Some(pos), pair, limits),
        Some(byte) if byte == pair.close => find_opening(source, Some(pos), pair, limits),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};
    use ropey::Rope;
    use test_utils::generator::BalancedText;

    fn limits() -> ScanLimits {
        ScanLimits::default()
    }

    #[test]
    fn test_find_closing_nested() {
        let text = "foo(a, bar(b), c)";
        assert_eq!(find_closing(text, Some(3), DelimiterPair::PARENS, &limits()), Some(16));
        assert_eq!(find_closing(text, Some(10), DelimiterPair::PARENS, &limits()), Some(12));
    }

    #[test]
    fn test_find_opening_nested() {
        let text = "foo(a, bar(b), c)";
        assert_eq!(find_opening(text, Some(16), DelimiterPair::PARENS, &limits()), Some(3));
        assert_eq!(find_opening(text, Some(12), DelimiterPair::PARENS, &limits()), Some(10));
    }

    #[test]
    fn test_unanchored_finds_first_unmatched_closer() {
        let text = "a) b(c) d]";
        assert_eq!(find_closing(text, None, DelimiterPair::PARENS, &limits()), Some(1));
        assert_eq!(find_closing("(x) y)", None, DelimiterPair::PARENS, &limits()), Some(5));
    }

    #[test]
    fn test_unanchored_backward_finds_unclosed_opener() {
        let line = "call(first, second.third";
        assert_eq!(find_opening(line, None, DelimiterPair::PARENS, &limits()), Some(4));
        assert_eq!(find_opening("a(b)c", None, DelimiterPair::PARENS, &limits()), None);
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(find_closing("{ { }", Some(0), DelimiterPair::BRACES, &limits()), None);
        assert_eq!(find_closing("{}", Some(5), DelimiterPair::BRACES, &limits()), None);
        assert_eq!(find_opening("", None, DelimiterPair::BRACES, &limits()), None);
    }

    #[test]
    fn test_ceiling_stops_scan() {
        let tight = ScanLimits {
            live_buffer: 8,
            detached: 8,
            ..ScanLimits::default()
        };
        let text = format!("({})", " ".repeat(20));
        assert_eq!(find_closing(text.as_str(), Some(0), DelimiterPair::PARENS, &tight), None);
        assert_eq!(find_closing(text.as_str(), Some(0), DelimiterPair::PARENS, &limits()), Some(21));
    }

    #[test]
    fn test_live_buffer_crosses_many_windows() {
        let body = "x".repeat(LIVE_WINDOW * 5 + 7);
        let text = format!("class A {{ void f() {{ {} }} }}", body);
        let rope = Rope::from_str(&text);
        let open = text.find('{').unwrap();
        let expected = text.rfind('}').unwrap();
        assert_eq!(find_closing(&rope, Some(open), DelimiterPair::BRACES, &limits()), Some(expected));
        assert_eq!(find_opening(&rope, Some(expected), DelimiterPair::BRACES, &limits()), Some(open));
    }

    #[test]
    fn test_live_buffer_uses_tighter_ceiling() {
        let text = format!("({})", " ".repeat(4_000));
        let rope = Rope::from_str(&text);
        assert_eq!(find_closing(&rope, Some(0), DelimiterPair::PARENS, &limits()), None);
        assert_eq!(find_closing(text.as_str(), Some(0), DelimiterPair::PARENS, &limits()), Some(4_001));
    }

    #[test]
    fn test_round_trip_property() {
        fn prop(text: BalancedText) -> TestResult {
            let source = text.to_string();
            let pair = DelimiterPair::PARENS;
            let openers: Vec<usize> = source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'(')
                .map(|(i, _)| i)
                .collect();
            if openers.is_empty() {
                return TestResult::discard();
            }
            let rope = Rope::from_str(&source);
            for open in openers {
                let Some(close) = find_closing(source.as_str(), Some(open), pair, &ScanLimits::default()) else {
                    return TestResult::failed();
                };
                if find_opening(source.as_str(), Some(close), pair, &ScanLimits::default()) != Some(open) {
                    return TestResult::failed();
                }
                if find_closing(&rope, Some(open), pair, &ScanLimits::default()) != Some(close) {
                    return TestResult::failed();
                }
            }
            TestResult::passed()
        }
        QuickCheck::new().tests(200).max_tests(2000).quickcheck(prop as fn(BalancedText) -> TestResult);
    }
}
