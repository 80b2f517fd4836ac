// src/markup/parser.rs

//! Tag scanner state machine.
//!
//! Consumes tokens from [`MarkupLexer`] and emits one [`CharInfo`] per visible
//! character. Malformed tag syntax never aborts parsing: the offending span is
//! emitted as literal text in the current style and scanning resumes.

use log::trace;
use std::ops::Range;

use super::lexer::{MarkupLexer, TokenKind};
use super::segment::StringSegment;
use super::tags::{apply_tag, TagScope};
use super::ParseDefaults;
use crate::glyph::CharInfo;

/// States for the tag scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParserState {
    /// Plain text; waiting for `<`.
    #[default]
    Text,
    /// Saw `<`; expecting a tag name or `/`.
    TagOpen,
    /// Read a tag name; expecting `=` or `>`.
    TagName,
    /// Inside `=value`; everything up to the next `>` is the value.
    TagValue,
    /// Saw `</`; expecting the name to close.
    CloseTag,
    /// Closed a scope; expecting `>`.
    CloseEnd,
}

/// One open tag scope: the tag name and the style to restore on close.
#[derive(Debug, Clone)]
struct StyleFrame {
    tag: Range<usize>,
    saved: CharInfo,
}

/// Markup parser. Owns its style stack as scratch space so repeated parses
/// reuse the allocation.
#[derive(Debug, Default)]
pub struct MarkupParser {
    stack: Vec<StyleFrame>,
}

impl MarkupParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scopes left open by the last parse.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn parse(&mut self, content: &str, defaults: &ParseDefaults) -> Vec<CharInfo> {
        let mut out = Vec::with_capacity(content.len());
        self.parse_into(content, defaults, &mut out);
        out
    }

    /// Parses `content` into `out`, replacing its previous contents.
    pub fn parse_into(&mut self, content: &str, defaults: &ParseDefaults, out: &mut Vec<CharInfo>) {
        out.clear();
        self.stack.clear();

        let mut current = defaults.base_char();
        let mut lexer = MarkupLexer::new(content);
        let mut state = ParserState::Text;
        let mut tag = StringSegment::empty(content);
        let mut tag_start = 0;
        let mut block_start = 0;

        while !lexer.at_end() {
            let token = lexer.next_token();
            let pos = lexer.position();
            match state {
                ParserState::Text => {
                    if token.is_symbol('<') {
                        append_chars(content, block_start, token.start, &current, out);
                        tag_start = token.start;
                        state = ParserState::TagOpen;
                    }
                }
                ParserState::TagOpen => {
                    if token.kind == TokenKind::Word {
                        tag = StringSegment::new(content, token.start, token.end);
                        state = ParserState::TagName;
                    } else if token.is_symbol('/') {
                        state = ParserState::CloseTag;
                    } else {
                        trace!("Expected tag name at byte {}", token.start);
                        append_chars(content, tag_start, pos, &current, out);
                        block_start = pos;
                        state = ParserState::Text;
                    }
                }
                ParserState::TagName => {
                    if token.is_symbol('=') {
                        block_start = pos;
                        state = ParserState::TagValue;
                    } else if token.is_symbol('>') {
                        let value = StringSegment::empty(content);
                        self.open_tag(tag, value, &mut current, out, defaults.size);
                        block_start = pos;
                        state = ParserState::Text;
                    } else {
                        trace!("Expected '=' or '>' at byte {}", token.start);
                        // Rescan the last character; it may start a new tag.
                        lexer.step_back();
                        let resume = lexer.position();
                        append_chars(content, tag_start, resume, &current, out);
                        block_start = resume;
                        state = ParserState::Text;
                    }
                }
                ParserState::TagValue => {
                    if token.is_symbol('>') {
                        let value = StringSegment::new(content, block_start, token.start);
                        self.open_tag(tag, value, &mut current, out, defaults.size);
                        block_start = pos;
                        state = ParserState::Text;
                    }
                }
                ParserState::CloseTag => {
                    let name = StringSegment::new(content, token.start, token.end);
                    let matches_top = token.kind == TokenKind::Word
                        && self
                            .stack
                            .last()
                            .and_then(|frame| content.get(frame.tag.clone()))
                            .is_some_and(|open| name.eq_str(open));
                    if matches_top {
                        if let Some(frame) = self.stack.pop() {
                            current = frame.saved;
                        }
                        state = ParserState::CloseEnd;
                    } else {
                        trace!("Unmatched closing tag {:?}", name);
                        append_chars(content, tag_start, pos, &current, out);
                        block_start = pos;
                        state = ParserState::Text;
                    }
                }
                ParserState::CloseEnd => {
                    if !token.is_symbol('>') {
                        trace!("Expected '>' at byte {}", token.start);
                        append_chars(content, tag_start, pos, &current, out);
                    }
                    block_start = pos;
                    state = ParserState::Text;
                }
            }
        }

        let end = lexer.position();
        if state == ParserState::Text {
            append_chars(content, block_start, end, &current, out);
        } else {
            trace!("Unterminated tag at byte {}", tag_start);
            append_chars(content, tag_start, end, &current, out);
        }
    }

    fn open_tag(
        &mut self,
        tag: StringSegment<'_>,
        value: StringSegment<'_>,
        current: &mut CharInfo,
        out: &mut [CharInfo],
        default_size: i32,
    ) {
        match apply_tag(tag.as_str(), value, current, out.last_mut(), default_size) {
            TagScope::Scoped(next) => {
                self.stack.push(StyleFrame {
                    tag: tag.range(),
                    saved: *current,
                });
                *current = next;
            }
            TagScope::Directive => {}
        }
    }
}

/// Emits `content[start..end]` as characters in `style`, dropping `\r`.
fn append_chars(content: &str, start: usize, end: usize, style: &CharInfo, out: &mut Vec<CharInfo>) {
    let Some(text) = content.get(start..end) else {
        return;
    };
    out.extend(text.chars().filter(|&c| c != '\r').map(|ch| CharInfo { ch, ..*style }));
}
