// src/markup/segment.rs

//! `StringSegment`: a borrowed, copyable view over a byte range of the
//! markup source. Tag names and parameter values are handed around as
//! segments so the parser never allocates while scanning.

use std::fmt;
use std::ops::Range;

/// Characters stripped by [`StringSegment::trim`].
const BLANKS: [char; 4] = [' ', '\t', '\r', '\n'];

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct StringSegment<'a> {
    source: &'a str,
    start: usize,
    end: usize,
}

impl<'a> StringSegment<'a> {
    /// Creates a view over `source[start..end]`. Both ends must lie on char
    /// boundaries; an invalid range reads as empty.
    pub fn new(source: &'a str, start: usize, end: usize) -> Self {
        let end = end.max(start);
        Self { source, start, end }
    }

    pub fn whole(source: &'a str) -> Self {
        Self::new(source, 0, source.len())
    }

    /// An empty segment anchored at the start of `source`.
    pub fn empty(source: &'a str) -> Self {
        Self::new(source, 0, 0)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_str(&self) -> &'a str {
        self.source.get(self.start..self.end).unwrap_or("")
    }

    pub fn first_char(&self) -> Option<char> {
        self.as_str().chars().next()
    }

    pub fn last_char(&self) -> Option<char> {
        self.as_str().chars().next_back()
    }

    /// Sub-view by byte offsets relative to this segment, clamped to it.
    pub fn slice(&self, from: usize, to: usize) -> StringSegment<'a> {
        let from = (self.start + from).min(self.end);
        let to = (self.start + to).clamp(from, self.end);
        StringSegment::new(self.source, from, to)
    }

    /// Drops the first character.
    pub fn skip_first(&self) -> StringSegment<'a> {
        match self.first_char() {
            Some(c) => self.slice(c.len_utf8(), self.len()),
            None => *self,
        }
    }

    /// Drops the last character.
    pub fn skip_last(&self) -> StringSegment<'a> {
        match self.last_char() {
            Some(c) => self.slice(0, self.len() - c.len_utf8()),
            None => *self,
        }
    }

    /// Strips spaces, tabs and line breaks from both ends.
    pub fn trim(&self) -> StringSegment<'a> {
        let s = self.as_str();
        let lead = s.len() - s.trim_start_matches(&BLANKS[..]).len();
        let trail = s.len() - s.trim_end_matches(&BLANKS[..]).len();
        if lead == s.len() {
            return self.slice(0, 0);
        }
        self.slice(lead, s.len() - trail)
    }

    /// Byte offset of the first occurrence of `pattern`, relative to the segment.
    pub fn find(&self, pattern: &str) -> Option<usize> {
        self.as_str().find(pattern)
    }

    /// Splits on `sep` when the segment contains exactly one separator.
    pub fn split_pair(&self, sep: char) -> Option<(StringSegment<'a>, StringSegment<'a>)> {
        let s = self.as_str();
        let at = s.find(sep)?;
        let rest = at + sep.len_utf8();
        if s[rest..].contains(sep) {
            return None;
        }
        Some((self.slice(0, at), self.slice(rest, s.len())))
    }

    pub fn eq_str(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl fmt::Debug for StringSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}..{}", self.as_str(), self.start, self.end)
    }
}

impl fmt::Display for StringSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
