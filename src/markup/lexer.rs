// src/markup/lexer.rs

//! Word tokenizer for the markup scanner.
//!
//! A word is a run of `_`, ASCII letters, ASCII digits or any non-ASCII
//! character. Blanks (space, tab, CR, LF) are skipped before a word starts and
//! terminate it. Every other character is a one-character symbol token.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TokenKind {
    /// Only blanks (or nothing) remained.
    End,
    Word,
    Symbol(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token text, after any skipped blanks.
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol(c)
    }
}

fn is_word_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric() || !c.is_ascii()
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

#[derive(Debug)]
pub(super) struct MarkupLexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> MarkupLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos..).and_then(|s| s.chars().next())
    }

    /// Moves back by one character so it is scanned again.
    pub fn step_back(&mut self) {
        if let Some(c) = self.source.get(..self.pos).and_then(|s| s.chars().next_back()) {
            self.pos -= c.len_utf8();
        }
    }

    pub fn next_token(&mut self) -> Token {
        let mut start = self.pos;
        let mut in_word = false;
        while let Some(c) = self.peek() {
            if is_word_char(c) {
                in_word = true;
                self.pos += c.len_utf8();
            } else if is_blank(c) {
                if in_word {
                    break;
                }
                self.pos += c.len_utf8();
                start = self.pos;
            } else {
                if in_word {
                    break;
                }
                self.pos += c.len_utf8();
                return Token {
                    kind: TokenKind::Symbol(c),
                    start,
                    end: self.pos,
                };
            }
        }
        Token {
            kind: if in_word {
                TokenKind::Word
            } else {
                TokenKind::End
            },
            start,
            end: self.pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        let mut lexer = MarkupLexer::new(src);
        let mut out = Vec::new();
        while !lexer.at_end() {
            let tok = lexer.next_token();
            out.push((tok.kind, &src[tok.start..tok.end]));
        }
        out
    }

    #[test]
    fn splits_words_symbols_and_skips_blanks() {
        assert_eq!(
            kinds("<size = 12>"),
            vec![
                (TokenKind::Symbol('<'), "<"),
                (TokenKind::Word, "size"),
                (TokenKind::Symbol('='), "="),
                (TokenKind::Word, "12"),
                (TokenKind::Symbol('>'), ">"),
            ]
        );
    }

    #[test]
    fn non_ascii_is_part_of_words() {
        assert_eq!(kinds("字_a1"), vec![(TokenKind::Word, "字_a1")]);
    }

    #[test]
    fn trailing_blanks_yield_end_token() {
        let mut lexer = MarkupLexer::new("a  ");
        assert_eq!(lexer.next_token().kind, TokenKind::Word);
        let end = lexer.next_token();
        assert_eq!(end.kind, TokenKind::End);
        assert!(lexer.at_end());
        lexer.step_back();
        assert_eq!(lexer.position(), 2);
    }
}
