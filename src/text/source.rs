//! Windowed access to text that may or may not be fully materialized
//!
//! Detached snippets (`str`/`String`) hand out borrowed slices of themselves, while a
//! live editor buffer (`ropey::Rope`) copies only the requested byte window out of its
//! chunks. All offsets are byte offsets.

use std::borrow::Cow;

use ropey::Rope;

/// A text buffer that can be read one bounded window at a time
pub trait TextSource {
    /// Total length in bytes
    fn len_bytes(&self) -> usize;

    /// Whether this is a live, pageable buffer rather than an extracted snippet.
    ///
    /// Live buffers are scanned through a small sliding window under the tighter
    /// scan ceiling.
    fn is_live(&self) -> bool;

    /// Bytes in `start..end`, clamped to the buffer length
    fn read_window(&self, start: usize, end: usize) -> Cow<'_, [u8]>;

    /// Text in `start..end`, clamped to the buffer length
    fn read_text(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.read_window(start, end)).into_owned()
    }

    fn is_empty(&self) -> bool {
        self.len_bytes() == 0
    }
}

fn clamp(start: usize, end: usize, len: usize) -> (usize, usize) {
    let end = end.min(len);
    (start.min(end), end)
}

impl TextSource for str {
    fn len_bytes(&self) -> usize {
        self.len()
    }

    fn is_live(&self) -> bool {
        false
    }

    fn read_window(&self, start: usize, end: usize) -> Cow<'_, [u8]> {
        let (start, end) = clamp(start, end, self.len());
        Cow::Borrowed(&self.as_bytes()[start..end])
    }
}

impl TextSource for String {
    fn len_bytes(&self) -> usize {
        self.len()
    }

    fn is_live(&self) -> bool {
        false
    }

    fn read_window(&self, start: usize, end: usize) -> Cow<'_, [u8]> {
        self.as_str().read_window(start, end)
    }
}

impl TextSource for Rope {
    fn len_bytes(&self) -> usize {
        Rope::len_bytes(self)
    }

    fn is_live(&self) -> bool {
        true
    }

    fn read_window(&self, start: usize, end: usize) -> Cow<'_, [u8]> {
        let (start, end) = clamp(start, end, Rope::len_bytes(self));
        let mut buf = Vec::with_capacity(end - start);
        if start == end {
            return Cow::Owned(buf);
        }

        let (chunks, chunk_start, _, _) = self.chunks_at_byte(start);
        let mut pos = chunk_start;
        for chunk in chunks {
            let bytes = chunk.as_bytes();
            let from = start.saturating_sub(pos);
            let to = (end - pos).min(bytes.len());
            if from < to {
                buf.extend_from_slice(&bytes[from..to]);
            }
            pos += bytes.len();
            if pos >= end {
                break;
            }
        }
        Cow::Owned(buf)
    }

    fn read_text(&self, start: usize, end: usize) -> String {
        let (start, end) = clamp(start, end, Rope::len_bytes(self));
        let first = self.byte_to_char(start);
        let last = self.byte_to_char(end);
        self.slice(first..last).to_string()
    }
}

/// Text of the line containing `cursor`, from the line start up to `cursor`
pub fn line_prefix<S: TextSource + ?Sized>(source: &S, cursor: usize) -> String {
    const STEP: usize = 256;
    let cursor = cursor.min(source.len_bytes());
    let mut line_start = 0;
    let mut end = cursor;
    while end > 0 {
        let start = end.saturating_sub(STEP);
        let window = source.read_window(start, end);
        if let Some(idx) = window.iter().rposition(|&b| b == b'\n') {
            line_start = start + idx + 1;
            break;
        }
        end = start;
    }
    source.read_text(line_start, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_window_is_clamped() {
        let text = "hello world";
        assert_eq!(&*text.read_window(6, 100), b"world");
        assert_eq!(&*text.read_window(20, 30), b"");
        assert!(!text.is_live());
    }

    #[test]
    fn test_rope_window_spans_chunks() {
        let line = "abcdefghij".repeat(500);
        let rope = Rope::from_str(&line);
        assert!(rope.chunks().count() > 1, "test needs a multi-chunk rope");
        let window = rope.read_window(995, 1_105);
        assert_eq!(&*window, &line.as_bytes()[995..1_105]);
        assert!(TextSource::is_live(&rope));
    }

    #[test]
    fn test_rope_read_text_respects_char_boundaries() {
        let rope = Rope::from_str("héllo wörld");
        assert_eq!(rope.read_text(0, 6), "héllo");
    }

    #[test]
    fn test_line_prefix() {
        let text = "class A {\n    Foo f = new Foo(); f.";
        assert_eq!(line_prefix(text, text.len()), "    Foo f = new Foo(); f.");
        assert_eq!(line_prefix(text, 5), "class");

        let rope = Rope::from_str(text);
        assert_eq!(line_prefix(&rope, Rope::len_bytes(&rope)), "    Foo f = new Foo(); f.");
    }
}
